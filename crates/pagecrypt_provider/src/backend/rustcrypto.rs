//! Back-end bound to the RustCrypto crates.

use super::{verify_output_len, BLOCK_SIZE, CIPHER_NAME, IV_SIZE, KEY_SIZE};
use crate::algorithm::{CipherMode, HmacAlgorithm};
use crate::error::{ProviderError, ProviderResult};
use crate::provider::CryptoProvider;
use aes::Aes256;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use tracing::{error, trace};
use zeroize::Zeroize;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const VERSION: &str = "RustCrypto (aes 0.8, cbc 0.1, hmac 0.12, pbkdf2 0.12)";

/// Back-end bound to the RustCrypto crates and the operating system RNG.
///
/// This is the default back-end. It holds no library-wide state, so
/// activation only affects the handle's reference count.
#[derive(Debug, Default)]
pub struct RustCryptoProvider {
    _private: (),
}

impl RustCryptoProvider {
    /// Creates the back-end.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn compute_hmac<M>(
    algorithm: HmacAlgorithm,
    key: &[u8],
    input: &[u8],
    input2: Option<&[u8]>,
    out: &mut [u8],
) -> ProviderResult<()>
where
    M: Mac + KeyInit,
{
    let mut mac = <M as Mac>::new_from_slice(key).map_err(|e| {
        error!(%algorithm, key_len = key.len(), error = %e, "hmac: key setup failed");
        ProviderError::library("hmac init", 0, e.to_string())
    })?;

    mac.update(input);
    if let Some(input2) = input2 {
        mac.update(input2);
    }

    let mut tag = mac.finalize().into_bytes();
    let result = verify_output_len("hmac", out.len(), tag.len());
    if result.is_ok() {
        out.copy_from_slice(&tag);
    }
    tag.as_mut_slice().zeroize();
    result
}

fn derive<M>(
    algorithm: HmacAlgorithm,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    out: &mut [u8],
) -> ProviderResult<()>
where
    M: KeyInit + hmac::digest::Update + hmac::digest::FixedOutput + Clone + Sync,
{
    pbkdf2::pbkdf2::<M>(password, salt, iterations, out).map_err(|e| {
        error!(
            %algorithm,
            iterations,
            key_len = out.len(),
            error = %e,
            "kdf: pbkdf2 failed"
        );
        ProviderError::library("pbkdf2", 0, e.to_string())
    })
}

impl CryptoProvider for RustCryptoProvider {
    fn name(&self) -> &'static str {
        "rustcrypto"
    }

    fn version(&self) -> &'static str {
        VERSION
    }

    fn random(&self, buf: &mut [u8]) -> ProviderResult<()> {
        OsRng.try_fill_bytes(buf).map_err(|e| {
            let code = e.code().map_or(0, |code| i64::from(code.get()));
            error!(
                len = buf.len(),
                code,
                error = %e,
                "random: operating system RNG failed"
            );
            ProviderError::library("OsRng::try_fill_bytes", code, e.to_string())
        })
    }

    fn add_random(&self, entropy: &[u8]) {
        // The OS generator reseeds itself and takes no external input.
        trace!(
            len = entropy.len(),
            "add_random: ignored by operating system RNG"
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
        match algorithm {
            HmacAlgorithm::Sha1 => compute_hmac::<Hmac<Sha1>>(algorithm, key, input, input2, out),
            HmacAlgorithm::Sha256 => {
                compute_hmac::<Hmac<Sha256>>(algorithm, key, input, input2, out)
            }
            HmacAlgorithm::Sha512 => {
                compute_hmac::<Hmac<Sha512>>(algorithm, key, input, input2, out)
            }
        }
    }

    fn kdf(
        &self,
        algorithm: HmacAlgorithm,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> ProviderResult<()> {
        match algorithm {
            HmacAlgorithm::Sha1 => derive::<Hmac<Sha1>>(algorithm, password, salt, iterations, out),
            HmacAlgorithm::Sha256 => {
                derive::<Hmac<Sha256>>(algorithm, password, salt, iterations, out)
            }
            HmacAlgorithm::Sha512 => {
                derive::<Hmac<Sha512>>(algorithm, password, salt, iterations, out)
            }
        }
    }

    fn cipher(
        &self,
        mode: CipherMode,
        key: &[u8],
        iv: &[u8],
        input: &[u8],
        out: &mut [u8],
    ) -> ProviderResult<()> {
        let produced = match mode {
            CipherMode::Encrypt => {
                let encryptor = Aes256CbcEnc::new_from_slices(key, iv).map_err(|e| {
                    error!(?mode, key_len = key.len(), iv_len = iv.len(), "cipher: init failed");
                    ProviderError::library("cipher init", 0, e.to_string())
                })?;
                encryptor
                    .encrypt_padded_b2b_mut::<NoPadding>(input, out)
                    .map_err(|_| {
                        error!(?mode, len = input.len(), "cipher: encrypt failed");
                        ProviderError::library("cipher encrypt", 0, "input not block aligned")
                    })?
                    .len()
            }
            CipherMode::Decrypt => {
                let decryptor = Aes256CbcDec::new_from_slices(key, iv).map_err(|e| {
                    error!(?mode, key_len = key.len(), iv_len = iv.len(), "cipher: init failed");
                    ProviderError::library("cipher init", 0, e.to_string())
                })?;
                decryptor
                    .decrypt_padded_b2b_mut::<NoPadding>(input, out)
                    .map_err(|_| {
                        error!(?mode, len = input.len(), "cipher: decrypt failed");
                        ProviderError::library("cipher decrypt", 0, "input not block aligned")
                    })?
                    .len()
            }
        };

        verify_output_len("cipher", input.len(), produced)
    }

    fn cipher_name(&self) -> &'static str {
        CIPHER_NAME
    }

    fn key_size(&self) -> usize {
        KEY_SIZE
    }

    fn iv_size(&self) -> usize {
        IV_SIZE
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_splits_input() {
        let backend = RustCryptoProvider::new();
        let key = [0x0bu8; 20];

        let mut whole = [0u8; 32];
        backend
            .hmac(HmacAlgorithm::Sha256, &key, b"Hi There", None, &mut whole)
            .unwrap();

        let mut split = [0u8; 32];
        backend
            .hmac(
                HmacAlgorithm::Sha256,
                &key,
                b"Hi ",
                Some(b"There"),
                &mut split,
            )
            .unwrap();

        assert_eq!(whole, split);
    }

    #[test]
    fn cipher_roundtrip() {
        let backend = RustCryptoProvider::new();
        let key = [0x42u8; KEY_SIZE];
        let iv = [0x24u8; IV_SIZE];
        let plaintext = [0xABu8; 64];

        let mut ciphertext = [0u8; 64];
        backend
            .cipher(CipherMode::Encrypt, &key, &iv, &plaintext, &mut ciphertext)
            .unwrap();
        assert_ne!(ciphertext, plaintext);

        let mut decrypted = [0u8; 64];
        backend
            .cipher(CipherMode::Decrypt, &key, &iv, &ciphertext, &mut decrypted)
            .unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn random_fills_buffer() {
        let backend = RustCryptoProvider::new();
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        backend.random(&mut a).unwrap();
        backend.random(&mut b).unwrap();
        assert_ne!(a, b);
    }
}
