//! The validating provider handle.

use crate::algorithm::{CipherMode, FipsStatus, HmacAlgorithm};
use crate::backend::BackendKind;
use crate::config::ProviderConfig;
use crate::context::ProviderContext;
use crate::error::{ProviderError, ProviderResult};
use crate::lifecycle::ActivationManager;
use crate::provider::CryptoProvider;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, trace};

/// A back-end bound to a lifecycle manager.
///
/// The handle is what the page codec talks to. It owns the activation
/// count of its back-end, hands out [`ProviderContext`]s, and checks every
/// input before it is passed on, so a back-end never sees an unknown digest,
/// a zero iteration count, or a mis-sized key, IV or buffer.
///
/// Cloning is cheap; clones share the back-end and the activation count.
///
/// # Example
///
/// ```
/// use pagecrypt_provider::{HmacAlgorithm, Provider, ProviderConfig};
///
/// let provider = Provider::from_config(&ProviderConfig::default())?;
/// let mut ctx = provider.ctx_init()?;
///
/// let mut tag = [0u8; 32];
/// ctx.hmac(HmacAlgorithm::Sha256, &[0u8; 32], b"abc", None, &mut tag)?;
///
/// ctx.free()?;
/// # Ok::<(), pagecrypt_provider::ProviderError>(())
/// ```
#[derive(Clone)]
pub struct Provider {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn CryptoProvider>,
    lifecycle: Arc<ActivationManager>,
    /// Present when random generation is serialized.
    rand_lock: Option<Mutex<()>>,
}

impl Provider {
    /// Binds `backend` to a fresh lifecycle manager.
    #[must_use]
    pub fn setup(backend: Arc<dyn CryptoProvider>, config: &ProviderConfig) -> Self {
        Self::with_lifecycle(backend, Arc::new(ActivationManager::new()), config)
    }

    /// Binds `backend` to an existing lifecycle manager.
    ///
    /// Every handle sharing `lifecycle` must wrap the same back-end.
    #[must_use]
    pub fn with_lifecycle(
        backend: Arc<dyn CryptoProvider>,
        lifecycle: Arc<ActivationManager>,
        config: &ProviderConfig,
    ) -> Self {
        debug!(
            provider = backend.name(),
            version = backend.version(),
            serialize_random = config.serialize_random,
            "provider set up"
        );
        Self {
            inner: Arc::new(Inner {
                backend,
                lifecycle,
                rand_lock: config.serialize_random.then(|| Mutex::new(())),
            }),
        }
    }

    /// Creates the back-end named by `config` and binds it.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::BackendUnavailable`] if the configured
    /// back-end is not compiled in.
    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        let backend = config.backend.create()?;
        Ok(Self::setup(backend, config))
    }

    /// Creates a handle for `kind` with otherwise default settings.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::BackendUnavailable`] if `kind` is not
    /// compiled in.
    pub fn for_backend(kind: BackendKind) -> ProviderResult<Self> {
        Self::from_config(&ProviderConfig::default().backend(kind))
    }

    /// Returns the bound back-end.
    #[must_use]
    pub fn backend(&self) -> &dyn CryptoProvider {
        self.inner.backend.as_ref()
    }

    /// Returns the lifecycle manager.
    #[must_use]
    pub fn lifecycle(&self) -> &Arc<ActivationManager> {
        &self.inner.lifecycle
    }

    /// Returns the number of outstanding activations.
    #[must_use]
    pub fn activation_count(&self) -> usize {
        self.inner.lifecycle.count()
    }

    /// Registers one more owner of the back-end's library state.
    ///
    /// # Errors
    ///
    /// Returns the back-end's error if bring-up fails.
    pub fn activate(&self) -> ProviderResult<()> {
        self.inner.lifecycle.activate(self.backend())
    }

    /// Releases one owner of the back-end's library state.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::ActivationUnderflow`] if nothing is active.
    pub fn deactivate(&self) -> ProviderResult<()> {
        self.inner.lifecycle.deactivate(self.backend())
    }

    /// Creates and initializes a context for one connection.
    ///
    /// # Errors
    ///
    /// Returns an error if activation or the back-end's per-context setup
    /// fails. Nothing stays activated in that case.
    pub fn ctx_init(&self) -> ProviderResult<ProviderContext> {
        let mut ctx = ProviderContext::new(self.clone());
        ctx.init()?;
        Ok(ctx)
    }

    /// Provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.backend().name()
    }

    /// Version string of the bound library.
    #[must_use]
    pub fn version(&self) -> &'static str {
        self.backend().version()
    }

    /// Name of the configured cipher.
    #[must_use]
    pub fn cipher_name(&self) -> &'static str {
        self.backend().cipher_name()
    }

    /// Cipher key size in bytes.
    #[must_use]
    pub fn key_size(&self) -> usize {
        self.backend().key_size()
    }

    /// Cipher IV size in bytes.
    #[must_use]
    pub fn iv_size(&self) -> usize {
        self.backend().iv_size()
    }

    /// Cipher block size in bytes.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.backend().block_size()
    }

    /// HMAC output size in bytes.
    #[must_use]
    pub fn hmac_size(&self, algorithm: HmacAlgorithm) -> usize {
        self.backend().hmac_size(algorithm)
    }

    /// HMAC output size for a raw algorithm id; 0 if the id is unknown.
    #[must_use]
    pub fn hmac_size_for_id(&self, id: i32) -> usize {
        HmacAlgorithm::from_id(id).map_or(0, |algorithm| self.hmac_size(algorithm))
    }

    /// FIPS status of the bound library.
    #[must_use]
    pub fn fips_status(&self) -> FipsStatus {
        self.backend().fips_status()
    }

    pub(crate) fn random(&self, buf: &mut [u8]) -> ProviderResult<()> {
        let guard = self.inner.rand_lock.as_ref().map(|lock| {
            trace!(len = buf.len(), "random: entering rand lock");
            let guard = lock.lock();
            trace!("random: entered rand lock");
            guard
        });
        let result = self.backend().random(buf);
        if guard.is_some() {
            trace!("random: leaving rand lock");
        }
        result
    }

    pub(crate) fn add_random(&self, entropy: &[u8]) {
        let guard = self.inner.rand_lock.as_ref().map(|lock| {
            trace!(len = entropy.len(), "add_random: entering rand lock");
            let guard = lock.lock();
            trace!("add_random: entered rand lock");
            guard
        });
        self.backend().add_random(entropy);
        if guard.is_some() {
            trace!("add_random: leaving rand lock");
        }
    }

    pub(crate) fn hmac(
        &self,
        algorithm: HmacAlgorithm,
        key: &[u8],
        input: &[u8],
        input2: Option<&[u8]>,
        out: &mut [u8],
    ) -> ProviderResult<()> {
        let size = self.hmac_size(algorithm);
        if out.len() < size {
            error!(
                %algorithm,
                needed = size,
                available = out.len(),
                "hmac: output buffer too small"
            );
            return Err(ProviderError::invalid_input(
                "hmac",
                format!(
                    "output buffer holds {} bytes, {algorithm} needs {size}",
                    out.len()
                ),
            ));
        }
        self.backend()
            .hmac(algorithm, key, input, input2, &mut out[..size])
    }

    pub(crate) fn kdf(
        &self,
        algorithm: HmacAlgorithm,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> ProviderResult<()> {
        if iterations == 0 {
            error!(%algorithm, "kdf: iteration count is zero");
            return Err(ProviderError::invalid_input(
                "kdf",
                "iteration count must be at least 1",
            ));
        }
        self.backend()
            .kdf(algorithm, password, salt, iterations, out)
    }

    pub(crate) fn cipher(
        &self,
        mode: CipherMode,
        key: &[u8],
        iv: &[u8],
        input: &[u8],
        out: &mut [u8],
    ) -> ProviderResult<()> {
        let backend = self.backend();

        if key.len() != backend.key_size() {
            error!(
                ?mode,
                key_len = key.len(),
                expected = backend.key_size(),
                "cipher: bad key length"
            );
            return Err(ProviderError::invalid_input(
                "cipher",
                format!(
                    "key is {} bytes, expected {}",
                    key.len(), backend.key_size()
                ),
            ));
        }
        if iv.len() != backend.iv_size() {
            error!(
                ?mode,
                iv_len = iv.len(),
                expected = backend.iv_size(),
                "cipher: bad IV length"
            );
            return Err(ProviderError::invalid_input(
                "cipher",
                format!(
                    "IV is {} bytes, expected {}",
                    iv.len(), backend.iv_size()
                ),
            ));
        }
        if input.len() % backend.block_size() != 0 {
            error!(
                ?mode,
                len = input.len(),
                block = backend.block_size(),
                "cipher: input not block aligned"
            );
            return Err(ProviderError::invalid_input(
                "cipher",
                format!(
                    "input of {} bytes is not a multiple of the {}-byte block",
                    input.len(), backend.block_size()
                ),
            ));
        }
        if out.len() < input.len() {
            error!(
                ?mode,
                len = input.len(),
                available = out.len(),
                "cipher: output buffer too small"
            );
            return Err(ProviderError::invalid_input(
                "cipher",
                format!(
                    "output buffer holds {} bytes, input is {}",
                    out.len(), input.len()
                ),
            ));
        }

        backend.cipher(mode, key, iv, input, &mut out[..input.len()])
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("backend", &self.name())
            .field("activations", &self.activation_count())
            .field("serialize_random", &self.inner.rand_lock.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NativeProvider, RustCryptoProvider};

    fn provider() -> Provider {
        Provider::setup(
            Arc::new(RustCryptoProvider::new()),
            &ProviderConfig::default(),
        )
    }

    #[test]
    fn metadata() {
        let provider = provider();
        assert_eq!(provider.name(), "rustcrypto");
        assert_eq!(provider.cipher_name(), "aes-256-cbc");
        assert_eq!(provider.key_size(), 32);
        assert_eq!(provider.iv_size(), 16);
        assert_eq!(provider.block_size(), 16);
        assert_eq!(provider.hmac_size_for_id(0), 20);
        assert_eq!(provider.hmac_size_for_id(1), 32);
        assert_eq!(provider.hmac_size_for_id(2), 64);
        assert_eq!(provider.hmac_size_for_id(3), 0);
        assert_eq!(provider.hmac_size_for_id(-1), 0);
        assert_eq!(provider.fips_status(), FipsStatus::NotApplicable);
    }

    #[test]
    fn clones_share_activation_count() {
        let provider = provider();
        let clone = provider.clone();

        provider.activate().unwrap();
        assert_eq!(clone.activation_count(), 1);
        clone.deactivate().unwrap();
        assert_eq!(provider.activation_count(), 0);
    }

    #[test]
    fn injected_lifecycle_is_shared() {
        let lifecycle = Arc::new(ActivationManager::new());
        let backend: Arc<dyn CryptoProvider> = Arc::new(NativeProvider::new());
        let a = Provider::with_lifecycle(
            backend.clone(),
            lifecycle.clone(),
            &ProviderConfig::default(),
        );
        let b = Provider::with_lifecycle(backend, lifecycle.clone(), &ProviderConfig::default());

        let ctx_a = a.ctx_init().unwrap();
        let ctx_b = b.ctx_init().unwrap();
        assert_eq!(lifecycle.count(), 2);

        drop(ctx_a);
        drop(ctx_b);
        assert_eq!(lifecycle.count(), 0);
    }

    #[test]
    fn rejects_short_hmac_output() {
        let provider = provider();
        let mut out = [0u8; 31];
        let err = provider
            .hmac(HmacAlgorithm::Sha256, b"key", b"data", None, &mut out)
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput { operation: "hmac", .. }));
    }

    #[test]
    fn hmac_writes_only_digest_size() {
        let provider = provider();
        let mut out = [0xEEu8; 40];
        provider
            .hmac(HmacAlgorithm::Sha1, b"key", b"data", None, &mut out)
            .unwrap();
        assert!(out[20..].iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn rejects_zero_iterations() {
        let provider = provider();
        let mut out = [0u8; 32];
        let err = provider
            .kdf(HmacAlgorithm::Sha256, b"password", b"salt", 0, &mut out)
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput { operation: "kdf", .. }));
    }

    #[test]
    fn rejects_bad_cipher_parameters() {
        let provider = provider();
        let key = [0u8; 32];
        let iv = [0u8; 16];
        let mut out = [0u8; 64];

        let short_key = provider.cipher(CipherMode::Encrypt, &key[..16], &iv, &[0u8; 16], &mut out);
        assert!(matches!(short_key, Err(ProviderError::InvalidInput { .. })));

        let long_iv = provider.cipher(CipherMode::Encrypt, &key, &[0u8; 17], &[0u8; 16], &mut out);
        assert!(matches!(long_iv, Err(ProviderError::InvalidInput { .. })));

        let unaligned = provider.cipher(CipherMode::Encrypt, &key, &iv, &[0u8; 15], &mut out);
        assert!(matches!(unaligned, Err(ProviderError::InvalidInput { .. })));

        let small_out = provider.cipher(CipherMode::Encrypt, &key, &iv, &[0u8; 32], &mut out[..16]);
        assert!(matches!(small_out, Err(ProviderError::InvalidInput { .. })));
    }

    #[test]
    fn empty_cipher_input_is_accepted() {
        let provider = provider();
        let mut out = [0u8; 0];
        provider
            .cipher(CipherMode::Decrypt, &[0u8; 32], &[0u8; 16], &[], &mut out)
            .unwrap();
    }

    #[test]
    fn random_without_serialization() {
        let provider = Provider::setup(
            Arc::new(RustCryptoProvider::new()),
            &ProviderConfig::new().serialize_random(false),
        );
        let mut buf = [0u8; 16];
        provider.random(&mut buf).unwrap();
        provider.add_random(b"entropy");
        assert!(format!("{provider:?}").contains("serialize_random: false"));
    }
}
