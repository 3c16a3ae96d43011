//! Back-end bound to OpenSSL.

use super::verify_output_len;
use crate::algorithm::{CipherMode, FipsStatus, HmacAlgorithm};
use crate::error::{ProviderError, ProviderResult};
use crate::provider::CryptoProvider;
use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::sign::Signer;
use openssl::symm::{Cipher, Crypter, Mode};
use tracing::{debug, error, trace};
use zeroize::Zeroizing;

/// Back-end bound to the system OpenSSL through the `openssl` crate.
#[derive(Debug, Default)]
pub struct OpenSslProvider {
    _private: (),
}

impl OpenSslProvider {
    /// Creates the back-end.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn cipher() -> Cipher {
    Cipher::aes_256_cbc()
}

fn digest(algorithm: HmacAlgorithm) -> MessageDigest {
    match algorithm {
        HmacAlgorithm::Sha1 => MessageDigest::sha1(),
        HmacAlgorithm::Sha256 => MessageDigest::sha256(),
        HmacAlgorithm::Sha512 => MessageDigest::sha512(),
    }
}

/// Logs every queued OpenSSL error and converts the stack.
fn library_error(operation: &'static str, stack: &ErrorStack) -> ProviderError {
    for err in stack.errors() {
        error!(operation, code = err.code(), "{err}");
    }
    let code = stack
        .errors()
        .first()
        .map_or(0, |err| i64::try_from(err.code()).unwrap_or(i64::MAX));
    ProviderError::library(operation, code, stack.to_string())
}

impl CryptoProvider for OpenSslProvider {
    fn name(&self) -> &'static str {
        "openssl"
    }

    fn version(&self) -> &'static str {
        openssl::version::version()
    }

    fn initialize(&self) -> ProviderResult<()> {
        openssl::init();
        debug!(version = openssl::version::version(), "openssl initialized");
        Ok(())
    }

    fn random(&self, buf: &mut [u8]) -> ProviderResult<()> {
        openssl::rand::rand_bytes(buf).map_err(|e| {
            error!(len = buf.len(), "random: RAND_bytes failed");
            library_error("RAND_bytes", &e)
        })
    }

    fn add_random(&self, entropy: &[u8]) {
        // The safe bindings expose no RAND_add; OpenSSL reseeds from the OS itself.
        trace!(
            len = entropy.len(),
            "add_random: not supported by openssl bindings"
        );
    }

    fn hmac(
        &self,
        algorithm: HmacAlgorithm,
        key: &[u8],
        input: &[u8],
        input2: Option<&[u8]>,
        out: &mut [u8],
    ) -> ProviderResult<()> {
        // PKey::hmac rejects an empty key; a single zero byte pads to the same block.
        let key = if key.is_empty() { &[0u8][..] } else { key };
        let pkey = PKey::hmac(key).map_err(|e| {
            error!(%algorithm, key_len = key.len(), "hmac: key setup failed");
            library_error("PKey::hmac", &e)
        })?;
        let mut signer = Signer::new(digest(algorithm), &pkey).map_err(|e| {
            error!(%algorithm, key_len = key.len(), "hmac: init failed");
            library_error("Signer::new", &e)
        })?;

        signer.update(input).map_err(|e| {
            error!(%algorithm, len = input.len(), "hmac: update on 1st input failed");
            library_error("Signer::update", &e)
        })?;
        if let Some(input2) = input2 {
            signer.update(input2).map_err(|e| {
                error!(%algorithm, len = input2.len(), "hmac: update on 2nd input failed");
                library_error("Signer::update", &e)
            })?;
        }

        let written = signer.sign(out).map_err(|e| {
            error!(%algorithm, "hmac: final failed");
            library_error("Signer::sign", &e)
        })?;
        verify_output_len("hmac", out.len(), written)
    }

    fn kdf(
        &self,
        algorithm: HmacAlgorithm,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> ProviderResult<()> {
        if out.is_empty() {
            trace!(%algorithm, "kdf: nothing to derive");
            return Ok(());
        }
        let rounds = usize::try_from(iterations)
            .map_err(|_| ProviderError::invalid_input("kdf", "iteration count too large"))?;
        openssl::pkcs5::pbkdf2_hmac(password, salt, rounds, digest(algorithm), out).map_err(
            |e| {
                error!(
                    %algorithm,
                    iterations,
                    key_len = out.len(),
                    "kdf: PKCS5_PBKDF2_HMAC failed"
                );
                library_error("PKCS5_PBKDF2_HMAC", &e)
            },
        )
    }

    fn cipher(
        &self,
        mode: CipherMode,
        key: &[u8],
        iv: &[u8],
        input: &[u8],
        out: &mut [u8],
    ) -> ProviderResult<()> {
        let direction = match mode {
            CipherMode::Encrypt => Mode::Encrypt,
            CipherMode::Decrypt => Mode::Decrypt,
        };

        let mut crypter = Crypter::new(cipher(), direction, key, Some(iv)).map_err(|e| {
            error!(?mode, "cipher: EVP_CipherInit_ex failed");
            library_error("EVP_CipherInit_ex", &e)
        })?;
        crypter.pad(false);

        // OpenSSL requires one spare block of output room.
        let mut buf = Zeroizing::new(vec![0u8; input.len() + cipher().block_size()]);
        let mut produced = crypter.update(input, &mut buf).map_err(|e| {
            error!(?mode, len = input.len(), "cipher: EVP_CipherUpdate failed");
            library_error("EVP_CipherUpdate", &e)
        })?;
        produced += crypter.finalize(&mut buf[produced..]).map_err(|e| {
            error!(?mode, "cipher: EVP_CipherFinal_ex failed");
            library_error("EVP_CipherFinal_ex", &e)
        })?;

        verify_output_len("cipher", input.len(), produced)?;
        out.copy_from_slice(&buf[..produced]);
        Ok(())
    }

    fn cipher_name(&self) -> &'static str {
        cipher()
            .nid()
            .short_name()
            .unwrap_or(super::CIPHER_NAME)
    }

    fn key_size(&self) -> usize {
        cipher().key_len()
    }

    fn iv_size(&self) -> usize {
        cipher().iv_len().unwrap_or(0)
    }

    fn block_size(&self) -> usize {
        cipher().block_size()
    }

    fn hmac_size(&self, algorithm: HmacAlgorithm) -> usize {
        digest(algorithm).size()
    }

    fn fips_status(&self) -> FipsStatus {
        #[cfg(feature = "fips")]
        {
            if fips_enabled() {
                FipsStatus::Enabled
            } else {
                FipsStatus::Disabled
            }
        }
        #[cfg(not(feature = "fips"))]
        {
            FipsStatus::NotApplicable
        }
    }
}

/// OpenSSL 3 moved FIPS mode into the default property query.
#[cfg(all(feature = "fips", ossl300))]
#[allow(unsafe_code)]
fn fips_enabled() -> bool {
    openssl::init();
    // SAFETY: a null library context selects the default one, which
    // `openssl::init` has set up.
    unsafe { openssl_sys::EVP_default_properties_is_fips_enabled(std::ptr::null_mut()) == 1 }
}

#[cfg(all(feature = "fips", not(ossl300), not(libressl)))]
fn fips_enabled() -> bool {
    openssl::fips::enabled()
}

/// LibreSSL has no FIPS mode.
#[cfg(all(feature = "fips", libressl))]
fn fips_enabled() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NativeProvider;

    #[test]
    fn empty_hmac_key_matches_native() {
        let openssl = OpenSslProvider::new();
        let native = NativeProvider::new();
        for alg in HmacAlgorithm::ALL {
            let mut a = vec![0u8; alg.output_size()];
            let mut b = vec![0u8; alg.output_size()];
            openssl.hmac(alg, b"", b"abc", None, &mut a).unwrap();
            native.hmac(alg, b"", b"abc", None, &mut b).unwrap();
            assert_eq!(a, b, "{alg}");
        }

        let mut out = [0u8; 32];
        openssl
            .hmac(HmacAlgorithm::Sha256, b"", b"ab", Some(b"c"), &mut out)
            .unwrap();
        assert_eq!(out[..4], [0xfd, 0x7a, 0xdb, 0x15]);
    }

    #[test]
    fn zero_length_derive_and_cipher() {
        let backend = OpenSslProvider::new();
        backend
            .kdf(HmacAlgorithm::Sha256, b"", b"", 1, &mut [])
            .unwrap();
        backend
            .cipher(CipherMode::Encrypt, &[0; 32], &[0; 16], &[], &mut [])
            .unwrap();
    }

    #[cfg(feature = "fips")]
    #[test]
    fn fips_status_is_queried() {
        let status = OpenSslProvider::new().fips_status();
        assert_ne!(status, FipsStatus::NotApplicable);
        assert_eq!(status.as_raw() == 1, fips_enabled());
    }

    #[cfg(not(feature = "fips"))]
    #[test]
    fn fips_status_without_feature() {
        assert_eq!(
            OpenSslProvider::new().fips_status(),
            FipsStatus::NotApplicable
        );
    }
}
