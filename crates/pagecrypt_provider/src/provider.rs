//! The crypto provider trait.

use crate::algorithm::{CipherMode, FipsStatus, HmacAlgorithm};
use crate::error::ProviderResult;
use std::any::Any;
use std::fmt;

/// A pluggable cryptography back-end.
///
/// A provider binds the page codec's needs (random bytes, HMAC, PBKDF2 and a
/// single fixed block cipher) to a concrete cryptography library. Providers
/// are never called directly by the codec: calls go through a
/// [`Provider`](crate::Provider) handle, which validates every input before
/// it reaches the back-end.
///
/// # Invariants
///
/// Implementations may rely on the handle to guarantee that:
///
/// - `initialize` runs once when the activation count goes from 0 to 1 and
///   `shutdown` once when it returns to 0, never concurrently
/// - `hmac` receives an `out` slice of exactly `hmac_size(algorithm)` bytes
/// - `kdf` receives `iterations >= 1`
/// - `cipher` receives a key of `key_size()` bytes, an IV of `iv_size()`
///   bytes, an input that is a multiple of `block_size()` and an `out`
///   slice of exactly `input.len()` bytes
///
/// Implementations must verify that their transforms produce exactly the
/// number of bytes requested and must not retain caller buffers.
///
/// # Implementors
///
/// - [`crate::RustCryptoProvider`] - RustCrypto crates
/// - [`crate::NativeProvider`] - algorithms composed from raw primitives
/// - `OpenSslProvider` - OpenSSL (feature `openssl`)
pub trait CryptoProvider: Send + Sync {
    /// Short name of the provider, e.g. `"rustcrypto"`.
    fn name(&self) -> &'static str;

    /// Version string of the bound library.
    fn version(&self) -> &'static str;

    /// Brings up library-wide state.
    ///
    /// # Errors
    ///
    /// Returns an error if the library cannot be initialized.
    fn initialize(&self) -> ProviderResult<()> {
        Ok(())
    }

    /// Tears down library-wide state.
    fn shutdown(&self) {}

    /// Creates per-context material when a connection initializes its context.
    ///
    /// # Errors
    ///
    /// Returns an error if the material cannot be created.
    fn init_context(&self) -> ProviderResult<ContextData> {
        Ok(ContextData::empty())
    }

    /// Releases per-context material when a connection frees its context.
    fn free_context(&self, data: ContextData) {
        drop(data);
    }

    /// Fills `buf` with cryptographically secure random bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the generator fails. `buf` must then be treated
    /// as unfilled.
    fn random(&self, buf: &mut [u8]) -> ProviderResult<()>;

    /// Mixes caller-supplied entropy into the generator. Best effort.
    fn add_random(&self, entropy: &[u8]);

    /// Computes the HMAC of `input || input2` into `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if any step of the computation fails.
    fn hmac(
        &self,
        algorithm: HmacAlgorithm,
        key: &[u8],
        input: &[u8],
        input2: Option<&[u8]>,
        out: &mut [u8],
    ) -> ProviderResult<()>;

    /// Derives `out.len()` bytes with PBKDF2-HMAC.
    ///
    /// # Errors
    ///
    /// Returns an error if the derivation fails.
    fn kdf(
        &self,
        algorithm: HmacAlgorithm,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> ProviderResult<()>;

    /// Transforms `input` into `out` with the provider's cipher, no padding.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage of the transform fails or the produced
    /// byte count differs from `input.len()`.
    fn cipher(
        &self,
        mode: CipherMode,
        key: &[u8],
        iv: &[u8],
        input: &[u8],
        out: &mut [u8],
    ) -> ProviderResult<()>;

    /// Name of the configured cipher.
    fn cipher_name(&self) -> &'static str;

    /// Cipher key size in bytes.
    fn key_size(&self) -> usize;

    /// Cipher IV size in bytes.
    fn iv_size(&self) -> usize;

    /// Cipher block size in bytes.
    fn block_size(&self) -> usize;

    /// HMAC output size in bytes for `algorithm`.
    fn hmac_size(&self, algorithm: HmacAlgorithm) -> usize {
        algorithm.output_size()
    }

    /// FIPS status of the bound library.
    fn fips_status(&self) -> FipsStatus {
        FipsStatus::NotApplicable
    }
}

/// Opaque per-context material owned by a back-end.
///
/// The built-in back-ends bind directly to library-wide state and leave this
/// empty; a back-end holding e.g. a hardware session handle stores it here.
#[derive(Default)]
pub struct ContextData(Option<Box<dyn Any + Send + Sync>>);

impl ContextData {
    /// Creates an empty slot.
    #[must_use]
    pub fn empty() -> Self {
        Self(None)
    }

    /// Creates a slot holding `value`.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    /// Returns the stored value if it has type `T`.
    #[must_use]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0
            .as_ref()
            .and_then(|value| (**value).downcast_ref::<T>())
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Debug for ContextData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextData")
            .field("occupied", &self.0.is_some())
            .finish()
    }
}
