//! A back-end wrapper that records what reaches the library.

use pagecrypt_provider::{
    CipherMode, ContextData, CryptoProvider, FipsStatus, HmacAlgorithm, ProviderResult,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Snapshot of a [`CountingProvider`]'s counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// Calls to `initialize`.
    pub initialized: usize,
    /// Calls to `shutdown`.
    pub shut_down: usize,
    /// Crypto calls (`random`, `add_random`, `hmac`, `kdf`, `cipher`).
    pub crypto: usize,
    /// Times `initialize` or `shutdown` overlapped another transition.
    pub overlapping_transitions: usize,
}

/// Wraps a back-end and counts calls into it.
pub struct CountingProvider {
    inner: Arc<dyn CryptoProvider>,
    initialized: AtomicUsize,
    shut_down: AtomicUsize,
    crypto: AtomicUsize,
    overlapping: AtomicUsize,
    in_transition: AtomicBool,
}

impl CountingProvider {
    /// Wraps `inner`.
    pub fn new(inner: Arc<dyn CryptoProvider>) -> Self {
        Self {
            inner,
            initialized: AtomicUsize::new(0),
            shut_down: AtomicUsize::new(0),
            crypto: AtomicUsize::new(0),
            overlapping: AtomicUsize::new(0),
            in_transition: AtomicBool::new(false),
        }
    }

    /// Returns the current counters.
    pub fn counts(&self) -> CallCounts {
        CallCounts {
            initialized: self.initialized.load(Ordering::SeqCst),
            shut_down: self.shut_down.load(Ordering::SeqCst),
            crypto: self.crypto.load(Ordering::SeqCst),
            overlapping_transitions: self.overlapping.load(Ordering::SeqCst),
        }
    }

    fn crypto_call(&self) {
        self.crypto.fetch_add(1, Ordering::SeqCst);
    }

    fn transition<T>(&self, counter: &AtomicUsize, f: impl FnOnce() -> T) -> T {
        if self.in_transition.swap(true, Ordering::SeqCst) {
            self.overlapping.fetch_add(1, Ordering::SeqCst);
        }
        counter.fetch_add(1, Ordering::SeqCst);
        let result = f();
        self.in_transition.store(false, Ordering::SeqCst);
        result
    }
}

impl CryptoProvider for CountingProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn version(&self) -> &'static str {
        self.inner.version()
    }

    fn initialize(&self) -> ProviderResult<()> {
        self.transition(&self.initialized, || self.inner.initialize())
    }

    fn shutdown(&self) {
        self.transition(&self.shut_down, || self.inner.shutdown());
    }

    fn init_context(&self) -> ProviderResult<ContextData> {
        self.inner.init_context()
    }

    fn free_context(&self, data: ContextData) {
        self.inner.free_context(data);
    }

    fn random(&self, buf: &mut [u8]) -> ProviderResult<()> {
        self.crypto_call();
        self.inner.random(buf)
    }

    fn add_random(&self, entropy: &[u8]) {
        self.crypto_call();
        self.inner.add_random(entropy);
    }

    fn hmac(
        &self,
        algorithm: HmacAlgorithm,
        key: &[u8],
        input: &[u8],
        input2: Option<&[u8]>,
        out: &mut [u8],
    ) -> ProviderResult<()> {
        self.crypto_call();
        self.inner.hmac(algorithm, key, input, input2, out)
    }

    fn kdf(
        &self,
        algorithm: HmacAlgorithm,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
        out: &mut [u8],
    ) -> ProviderResult<()> {
        self.crypto_call();
        self.inner.kdf(algorithm, password, salt, iterations, out)
    }

    fn cipher(
        &self,
        mode: CipherMode,
        key: &[u8],
        iv: &[u8],
        input: &[u8],
        out: &mut [u8],
    ) -> ProviderResult<()> {
        self.crypto_call();
        self.inner.cipher(mode, key, iv, input, out)
    }

    fn cipher_name(&self) -> &'static str {
        self.inner.cipher_name()
    }

    fn key_size(&self) -> usize {
        self.inner.key_size()
    }

    fn iv_size(&self) -> usize {
        self.inner.iv_size()
    }

    fn block_size(&self) -> usize {
        self.inner.block_size()
    }

    fn hmac_size(&self, algorithm: HmacAlgorithm) -> usize {
        self.inner.hmac_size(algorithm)
    }

    fn fips_status(&self) -> FipsStatus {
        self.inner.fips_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecrypt_provider::{Provider, ProviderConfig, RustCryptoProvider};

    #[test]
    fn counts_calls_and_transitions() {
        let counting = Arc::new(CountingProvider::new(Arc::new(RustCryptoProvider::new())));
        let provider = Provider::setup(counting.clone(), &ProviderConfig::default());

        let ctx = provider.ctx_init().unwrap();
        let mut buf = [0u8; 8];
        ctx.random(&mut buf).unwrap();
        drop(ctx);

        assert_eq!(
            counting.counts(),
            CallCounts {
                initialized: 1,
                shut_down: 1,
                crypto: 1,
                overlapping_transitions: 0,
            }
        );
    }
}
