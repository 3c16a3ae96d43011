//! Per-connection provider contexts.

use crate::algorithm::{CipherMode, HmacAlgorithm};
use crate::error::{ProviderError, ProviderResult};
use crate::handle::Provider;
use crate::provider::ContextData;
use tracing::{error, trace};

/// State of a [`ProviderContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextState {
    /// Not initialized, or freed.
    Uninitialized,
    /// Initialized; crypto operations are allowed.
    Active,
}

/// One connection's view of a provider.
///
/// A context holds one activation of its provider while it is
/// [`Active`](ContextState::Active). Crypto operations through a context
/// that is not active fail with [`ProviderError::NotActive`].
///
/// Dropping an active context frees it.
#[derive(Debug)]
pub struct ProviderContext {
    provider: Provider,
    state: ContextState,
    data: ContextData,
}

impl ProviderContext {
    /// Creates an uninitialized context.
    #[must_use]
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            state: ContextState::Uninitialized,
            data: ContextData::empty(),
        }
    }

    /// Activates the provider and sets up per-context material.
    ///
    /// Calling this on an active context does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if activation or the back-end's per-context setup
    /// fails; the context stays uninitialized.
    pub fn init(&mut self) -> ProviderResult<()> {
        if self.is_active() {
            trace!(
                provider = self.provider.name(),
                "ctx_init: context already active"
            );
            return Ok(());
        }

        self.provider.activate()?;
        match self.provider.backend().init_context() {
            Ok(data) => {
                self.data = data;
                self.state = ContextState::Active;
                trace!(provider = self.provider.name(), "ctx_init: context active");
                Ok(())
            }
            Err(e) => {
                error!(
                    provider = self.provider.name(),
                    error = %e,
                    "ctx_init: per-context setup failed"
                );
                if let Err(release) = self.provider.deactivate() {
                    error!(error = %release, "ctx_init: releasing activation failed");
                }
                Err(e)
            }
        }
    }

    /// Releases per-context material and deactivates the provider.
    ///
    /// Calling this on an uninitialized context does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if deactivation fails. The context is uninitialized
    /// afterwards regardless.
    pub fn free(&mut self) -> ProviderResult<()> {
        if !self.is_active() {
            trace!(
                provider = self.provider.name(),
                "ctx_free: context not active"
            );
            return Ok(());
        }

        self.state = ContextState::Uninitialized;
        let data = std::mem::take(&mut self.data);
        self.provider.backend().free_context(data);
        trace!(
            provider = self.provider.name(),
            "ctx_free: context released"
        );
        self.provider.deactivate()
    }

    /// Returns the context state.
    #[must_use]
    pub const fn state(&self) -> ContextState {
        self.state
    }

    /// Returns true if the context is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == ContextState::Active
    }

    /// Returns the provider this context belongs to.
    #[must_use]
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Returns the back-end's per-context material.
    #[must_use]
    pub fn data(&self) -> &ContextData {
        &self.data
    }

    fn ensure_active(&self, operation: &'static str) -> ProviderResult<()> {
        if self.is_active() {
            Ok(())
        } else {
            error!(
                operation,
                provider = self.provider.name(),
                "context is not active"
            );
            Err(ProviderError::not_active(operation))
        }
    }

    /// Fills `buf` with random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotActive`] on an inactive context, or the
    /// back-end's error if the generator fails.
    pub fn random(&self, buf: &mut [u8]) -> ProviderResult<()> {
        self.ensure_active("random")?;
        self.provider.random(buf)
    }

    /// Mixes `entropy` into the generator. Always succeeds.
    pub fn add_random(&self, entropy: &[u8]) {
        self.provider.add_random(entropy);
    }

    /// Computes the HMAC of `input || input2`, writing the digest to the
    /// front of `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is inactive, `out` is shorter than
    /// the digest, or the back-end fails.
    pub fn hmac(
        &self,
        algorithm: HmacAlgorithm,
        key: &[u8],
        input: &[u8],
        input2: Option<&[u8]>,
        out: &mut [u8],
    ) -> ProviderResult<()> {
        self.ensure_active("hmac")?;
        self.provider.hmac(algorithm, key, input, input2, out)
    }

    /// [`hmac`](Self::hmac) with a raw algorithm id.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidAlgorithm`] for an unknown id, before
    /// anything reaches the back-end.
    pub fn hmac_raw(
        &self,
        algorithm: i32,
        key: &[u8],
        input: &[u8],
        input2: Option<&[u8]>,
        out: &mut [u8],
    ) -> ProviderResult<()> {
        self.ensure_active("hmac")?;
        let algorithm = parse_algorithm("hmac", algorithm)?;
        self.provider.hmac(algorithm, key, input, input2, out)
    }

    /// Derives `out.len()` bytes with PBKDF2.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is inactive, `iterations` is zero, or
    /// the back-end fails.
    pub fn kdf(
        &self,
        algorithm: HmacAlgorithm,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> ProviderResult<()> {
        self.ensure_active("kdf")?;
        self.provider.kdf(algorithm, password, salt, iterations, out)
    }

    /// [`kdf`](Self::kdf) with a raw algorithm id.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidAlgorithm`] for an unknown id, before
    /// anything reaches the back-end.
    pub fn kdf_raw(
        &self,
        algorithm: i32,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> ProviderResult<()> {
        self.ensure_active("kdf")?;
        let algorithm = parse_algorithm("kdf", algorithm)?;
        self.provider.kdf(algorithm, password, salt, iterations, out)
    }

    /// Encrypts or decrypts `input` into the front of `out`, no padding.
    ///
    /// # Errors
    ///
    /// Returns an error if the context is inactive, the key, IV or buffers
    /// have the wrong size, or the back-end fails.
    pub fn cipher(
        &self,
        mode: CipherMode,
        key: &[u8],
        iv: &[u8],
        input: &[u8],
        out: &mut [u8],
    ) -> ProviderResult<()> {
        self.ensure_active("cipher")?;
        self.provider.cipher(mode, key, iv, input, out)
    }
}

fn parse_algorithm(operation: &'static str, id: i32) -> ProviderResult<HmacAlgorithm> {
    HmacAlgorithm::from_id(id).map_err(|e| {
        error!(operation, algorithm = id, "invalid algorithm");
        e
    })
}

impl Drop for ProviderContext {
    fn drop(&mut self) {
        if let Err(e) = self.free() {
            error!(error = %e, "failed to free provider context on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RustCryptoProvider;
    use crate::config::ProviderConfig;
    use std::sync::Arc;

    fn provider() -> Provider {
        Provider::setup(
            Arc::new(RustCryptoProvider::new()),
            &ProviderConfig::default(),
        )
    }

    #[test]
    fn state_machine() {
        let provider = provider();
        let mut ctx = ProviderContext::new(provider.clone());
        assert_eq!(ctx.state(), ContextState::Uninitialized);

        ctx.init().unwrap();
        assert_eq!(ctx.state(), ContextState::Active);
        assert_eq!(provider.activation_count(), 1);

        // Second init is a no-op
        ctx.init().unwrap();
        assert_eq!(provider.activation_count(), 1);

        ctx.free().unwrap();
        assert_eq!(ctx.state(), ContextState::Uninitialized);
        assert_eq!(provider.activation_count(), 0);

        // Second free is a no-op
        ctx.free().unwrap();
        assert_eq!(provider.activation_count(), 0);
    }

    #[test]
    fn inactive_context_rejects_crypto() {
        let ctx = ProviderContext::new(provider());
        let mut out = [0u8; 64];

        let err = ctx.random(&mut out).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::NotActive { operation: "random" }
        ));

        let err = ctx
            .hmac(HmacAlgorithm::Sha256, b"k", b"m", None, &mut out)
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::NotActive { operation: "hmac" }
        ));

        let err = ctx
            .kdf(HmacAlgorithm::Sha1, b"p", b"s", 1, &mut out)
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotActive { operation: "kdf" }));

        let err = ctx
            .cipher(
                CipherMode::Encrypt,
                &[0u8; 32],
                &[0u8; 16],
                &[0u8; 16],
                &mut out,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::NotActive { operation: "cipher" }
        ));

        // add_random keeps its always-succeeds contract
        ctx.add_random(b"entropy");
    }

    #[test]
    fn freed_context_rejects_crypto() {
        let mut ctx = provider().ctx_init().unwrap();
        ctx.free().unwrap();
        let mut buf = [0u8; 8];
        assert!(matches!(
            ctx.random(&mut buf),
            Err(ProviderError::NotActive { .. })
        ));
    }

    #[test]
    fn drop_releases_activation() {
        let provider = provider();
        {
            let _ctx = provider.ctx_init().unwrap();
            assert_eq!(provider.activation_count(), 1);
        }
        assert_eq!(provider.activation_count(), 0);
    }

    #[test]
    fn raw_ids() {
        let ctx = provider().ctx_init().unwrap();
        let mut out = [0u8; 64];

        ctx.hmac_raw(2, b"key", b"data", None, &mut out).unwrap();
        ctx.kdf_raw(0, b"password", b"salt", 1, &mut out[..20])
            .unwrap();

        let err = ctx
            .hmac_raw(3, b"key", b"data", None, &mut out)
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidAlgorithm { id: 3 }));
        let err = ctx.kdf_raw(-1, b"p", b"s", 1, &mut out).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidAlgorithm { id: -1 }));
    }
}
