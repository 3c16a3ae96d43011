//! Back-end composed from raw primitives.
//!
//! Only the AES block function and the SHA digests come from libraries.
//! CBC chaining, HMAC (RFC 2104) and PBKDF2 (RFC 8018) are built here, and
//! the random generator is a seeded CSPRNG that exists only while the
//! back-end is activated.

use super::{verify_output_len, BLOCK_SIZE, CIPHER_NAME, IV_SIZE, KEY_SIZE};
use crate::algorithm::{CipherMode, HmacAlgorithm};
use crate::error::{ProviderError, ProviderResult};
use crate::provider::CryptoProvider;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes256, Block};
use parking_lot::Mutex;
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use tracing::{debug, error, trace};
use zeroize::{Zeroize, Zeroizing};

const VERSION: &str = concat!("pagecrypt native ", env!("CARGO_PKG_VERSION"));

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// Back-end that composes the cipher mode, HMAC and PBKDF2 itself.
///
/// Its generator is seeded from the operating system when the back-end is
/// initialized, can absorb caller entropy through `add_random`, and is
/// discarded on shutdown.
#[derive(Debug, Default)]
pub struct NativeProvider {
    rng: Mutex<Option<StdRng>>,
}

impl NativeProvider {
    /// Creates the back-end. The generator is seeded on initialization.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while the generator is seeded.
    #[must_use]
    pub fn is_seeded(&self) -> bool {
        self.rng.lock().is_some()
    }
}

/// HMAC key schedule: digests pre-loaded with the inner and outer pads.
struct HmacKey<D: Digest + Clone> {
    inner: D,
    outer: D,
}

impl<D: Digest + Clone> HmacKey<D> {
    fn new(key: &[u8], block_size: usize) -> Self {
        let mut block = Zeroizing::new(vec![0u8; block_size]);
        if key.len() > block_size {
            let hashed = D::digest(key);
            block[..hashed.len()].copy_from_slice(&hashed);
        } else {
            block[..key.len()].copy_from_slice(key);
        }

        let mut pad: Zeroizing<Vec<u8>> = Zeroizing::new(block.iter().map(|b| b ^ IPAD).collect());
        let mut inner = D::new();
        inner.update(&*pad);

        pad.iter_mut()
            .zip(block.iter())
            .for_each(|(p, b)| *p = b ^ OPAD);
        let mut outer = D::new();
        outer.update(&*pad);

        Self { inner, outer }
    }

    fn mac(&self, parts: &[&[u8]]) -> Zeroizing<Vec<u8>> {
        let mut inner = self.inner.clone();
        for part in parts {
            inner.update(part);
        }
        let mut inner_hash = inner.finalize();

        let mut outer = self.outer.clone();
        outer.update(&inner_hash);
        inner_hash.as_mut_slice().zeroize();

        Zeroizing::new(outer.finalize().to_vec())
    }
}

fn hmac_with<D: Digest + Clone>(
    algorithm: HmacAlgorithm,
    key: &[u8],
    parts: &[&[u8]],
    out: &mut [u8],
) -> ProviderResult<()> {
    let tag = HmacKey::<D>::new(key, algorithm.block_size()).mac(parts);
    verify_output_len("hmac", out.len(), tag.len())?;
    out.copy_from_slice(&tag);
    Ok(())
}

fn pbkdf2_with<D: Digest + Clone>(
    algorithm: HmacAlgorithm,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    out: &mut [u8],
) -> ProviderResult<()> {
    let prf = HmacKey::<D>::new(password, algorithm.block_size());

    for (index, chunk) in out.chunks_mut(algorithm.output_size()).enumerate() {
        let block_index = u32::try_from(index + 1).map_err(|_| {
            error!(%algorithm, "kdf: derived key too long");
            ProviderError::invalid_input("kdf", "derived key too long")
        })?;

        let mut u = prf.mac(&[salt, &block_index.to_be_bytes()[..]]);
        let mut t = u.clone();
        for _ in 1..iterations {
            u = prf.mac(&[u.as_slice()]);
            t.iter_mut().zip(u.iter()).for_each(|(t, u)| *t ^= u);
        }
        chunk.copy_from_slice(&t[..chunk.len()]);
    }

    Ok(())
}

fn xor_block(block: &mut Block, chain: &Block) {
    for (b, c) in block.iter_mut().zip(chain.iter()) {
        *b ^= c;
    }
}

fn cbc_encrypt(cipher: &Aes256, iv: &[u8], input: &[u8], out: &mut [u8]) -> usize {
    let mut chain = Block::clone_from_slice(iv);
    let mut produced = 0;

    for (src, dst) in input
        .chunks_exact(BLOCK_SIZE)
        .zip(out.chunks_exact_mut(BLOCK_SIZE))
    {
        let mut block = Block::clone_from_slice(src);
        xor_block(&mut block, &chain);
        cipher.encrypt_block(&mut block);
        dst.copy_from_slice(&block);
        chain = block;
        produced += BLOCK_SIZE;
    }

    chain.as_mut_slice().zeroize();
    produced
}

fn cbc_decrypt(cipher: &Aes256, iv: &[u8], input: &[u8], out: &mut [u8]) -> usize {
    let mut chain = Block::clone_from_slice(iv);
    let mut produced = 0;

    for (src, dst) in input
        .chunks_exact(BLOCK_SIZE)
        .zip(out.chunks_exact_mut(BLOCK_SIZE))
    {
        let mut block = Block::clone_from_slice(src);
        cipher.decrypt_block(&mut block);
        xor_block(&mut block, &chain);
        dst.copy_from_slice(&block);
        block.as_mut_slice().zeroize();
        chain.copy_from_slice(src);
        produced += BLOCK_SIZE;
    }

    produced
}

impl CryptoProvider for NativeProvider {
    fn name(&self) -> &'static str {
        "native"
    }

    fn version(&self) -> &'static str {
        VERSION
    }

    fn initialize(&self) -> ProviderResult<()> {
        let rng = StdRng::from_rng(OsRng).map_err(|e| {
            let code = e.code().map_or(0, |code| i64::from(code.get()));
            error!(code, error = %e, "initialize: seeding generator failed");
            ProviderError::library("StdRng::from_rng", code, e.to_string())
        })?;
        *self.rng.lock() = Some(rng);
        debug!("native generator seeded");
        Ok(())
    }

    fn shutdown(&self) {
        *self.rng.lock() = None;
        debug!("native generator discarded");
    }

    fn random(&self, buf: &mut [u8]) -> ProviderResult<()> {
        let mut rng = self.rng.lock();
        match rng.as_mut() {
            Some(rng) => {
                rng.fill_bytes(buf);
                Ok(())
            }
            None => {
                error!(len = buf.len(), "random: generator not seeded");
                Err(ProviderError::library("random", 0, "generator not seeded"))
            }
        }
    }

    fn add_random(&self, entropy: &[u8]) {
        let mut rng = self.rng.lock();
        let Some(rng) = rng.as_mut() else {
            trace!(
                len = entropy.len(),
                "add_random: generator not seeded, entropy dropped"
            );
            return;
        };

        let mut current = Zeroizing::new([0u8; 32]);
        rng.fill_bytes(&mut *current);

        let mut hasher = Sha256::new();
        hasher.update(&*current);
        hasher.update(entropy);
        let mut digest = hasher.finalize();

        let mut seed = [0u8; 32];
        seed.copy_from_slice(&digest);
        *rng = StdRng::from_seed(seed);

        seed.zeroize();
        digest.as_mut_slice().zeroize();
        trace!(len = entropy.len(), "add_random: generator reseeded");
    }

    fn hmac(
        &self,
        algorithm: HmacAlgorithm,
        key: &[u8],
        input: &[u8],
        input2: Option<&[u8]>,
        out: &mut [u8],
    ) -> ProviderResult<()> {
        let parts = [input, input2.unwrap_or_default()];

        match algorithm {
            HmacAlgorithm::Sha1 => hmac_with::<Sha1>(algorithm, key, &parts, out),
            HmacAlgorithm::Sha256 => hmac_with::<Sha256>(algorithm, key, &parts, out),
            HmacAlgorithm::Sha512 => hmac_with::<Sha512>(algorithm, key, &parts, out),
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
            HmacAlgorithm::Sha1 => pbkdf2_with::<Sha1>(algorithm, password, salt, iterations, out),
            HmacAlgorithm::Sha256 => {
                pbkdf2_with::<Sha256>(algorithm, password, salt, iterations, out)
            }
            HmacAlgorithm::Sha512 => {
                pbkdf2_with::<Sha512>(algorithm, password, salt, iterations, out)
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
        if iv.len() != IV_SIZE || input.len() % BLOCK_SIZE != 0 {
            error!(?mode, iv_len = iv.len(), len = input.len(), "cipher: bad iv or alignment");
            return Err(ProviderError::invalid_input(
                "cipher",
                "iv size or input alignment does not match the cipher",
            ));
        }

        let cipher = Aes256::new_from_slice(key).map_err(|e| {
            error!(?mode, key_len = key.len(), "cipher: key setup failed");
            ProviderError::library("cipher init", 0, e.to_string())
        })?;

        let produced = match mode {
            CipherMode::Encrypt => cbc_encrypt(&cipher, iv, input, out),
            CipherMode::Decrypt => cbc_decrypt(&cipher, iv, input, out),
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
    fn generator_follows_lifecycle() {
        let backend = NativeProvider::new();
        assert!(!backend.is_seeded());

        let mut buf = [0u8; 16];
        assert!(backend.random(&mut buf).is_err());

        backend.initialize().unwrap();
        assert!(backend.is_seeded());
        backend.random(&mut buf).unwrap();

        backend.shutdown();
        assert!(!backend.is_seeded());
        assert!(backend.random(&mut buf).is_err());
    }

    #[test]
    fn add_random_changes_stream() {
        let backend = NativeProvider::new();
        backend.initialize().unwrap();

        backend.add_random(b"caller entropy");
        let mut a = [0u8; 32];
        backend.random(&mut a).unwrap();

        backend.add_random(b"caller entropy");
        let mut b = [0u8; 32];
        backend.random(&mut b).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn add_random_before_seed_is_ignored() {
        let backend = NativeProvider::new();
        backend.add_random(b"dropped");
        assert!(!backend.is_seeded());
    }

    #[test]
    fn hmac_long_key_is_hashed() {
        // RFC 4231 test case 6
        let backend = NativeProvider::new();
        let key = [0xaau8; 131];
        let mut out = [0u8; 32];
        backend
            .hmac(
                HmacAlgorithm::Sha256,
                &key,
                b"Test Using Larger Than Block-Size Key - Hash Key First",
                None,
                &mut out,
            )
            .unwrap();

        let expected = [
            0x60, 0xe4, 0x31, 0x59, 0x1e, 0xe0, 0xb6, 0x7f, 0x0d, 0x8a, 0x26, 0xaa, 0xcb, 0xf5,
            0xb7, 0x7f, 0x8e, 0x0b, 0xc6, 0x21, 0x37, 0x28, 0xc5, 0x14, 0x05, 0x46, 0x04, 0x0f,
            0x0e, 0xe3, 0x7f, 0x54,
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn pbkdf2_multi_block_output() {
        // RFC 6070: 25-byte output spans two SHA-1 blocks
        let backend = NativeProvider::new();
        let mut out = [0u8; 25];
        backend
            .kdf(
                HmacAlgorithm::Sha1,
                b"passwordPASSWORDpassword",
                b"saltSALTsaltSALTsaltSALTsaltSALTsalt",
                4096,
                &mut out,
            )
            .unwrap();

        let expected = [
            0x3d, 0x2e, 0xec, 0x4f, 0xe4, 0x1c, 0x84, 0x9b, 0x80, 0xc8, 0xd8, 0x36, 0x62, 0xc0,
            0xe4, 0x4a, 0x8b, 0x29, 0x1a, 0x96, 0x4c, 0xf2, 0xf0, 0x70, 0x38,
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn cbc_chains_blocks() {
        let backend = NativeProvider::new();
        let key = [7u8; KEY_SIZE];
        let iv = [9u8; IV_SIZE];
        // Two identical plaintext blocks must not encrypt identically
        let plaintext = [0x55u8; 32];
        let mut ciphertext = [0u8; 32];
        backend
            .cipher(CipherMode::Encrypt, &key, &iv, &plaintext, &mut ciphertext)
            .unwrap();
        assert_ne!(ciphertext[..16], ciphertext[16..]);

        let mut decrypted = [0u8; 32];
        backend
            .cipher(CipherMode::Decrypt, &key, &iv, &ciphertext, &mut decrypted)
            .unwrap();
        assert_eq!(decrypted, plaintext);
    }
}
