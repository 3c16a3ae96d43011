//! Reference-counted activation of a back-end's library-wide state.

use crate::error::{ProviderError, ProviderResult};
use crate::provider::CryptoProvider;
use parking_lot::Mutex;
use tracing::{debug, error, trace};

/// Counts the logical owners that have activated a back-end.
///
/// The back-end's [`initialize`](CryptoProvider::initialize) runs when the
/// count goes from 0 to 1 and [`shutdown`](CryptoProvider::shutdown) when it
/// returns to 0. The count and both transitions are serialized by a single
/// dedicated lock, so concurrent activations from several connections never
/// race.
///
/// A manager is owned by whoever hands out provider handles: the process
/// registry for the C ABI, or a test that wants to observe the count. Handles
/// that share a manager must share the same back-end.
#[derive(Debug, Default)]
pub struct ActivationManager {
    count: Mutex<usize>,
}

impl ActivationManager {
    /// Creates a manager with a count of zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the count, bringing the back-end up on the first activation.
    ///
    /// # Errors
    ///
    /// Returns the back-end's error if bring-up fails. The count is left
    /// unchanged in that case.
    pub fn activate(&self, backend: &dyn CryptoProvider) -> ProviderResult<()> {
        trace!(
            provider = backend.name(),
            "activate: entering activation lock"
        );
        let mut count = self.count.lock();
        trace!(
            provider = backend.name(),
            "activate: entered activation lock"
        );

        if *count == 0 {
            debug!(provider = backend.name(), "initializing crypto library");
            if let Err(e) = backend.initialize() {
                error!(
                    provider = backend.name(),
                    error = %e,
                    "activate: library initialization failed"
                );
                return Err(e);
            }
        }
        *count += 1;

        trace!(
            provider = backend.name(),
            count = *count,
            "activate: leaving activation lock"
        );
        Ok(())
    }

    /// Decrements the count, tearing the back-end down on the last release.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::ActivationUnderflow`] if the count is already
    /// zero; the count stays at zero.
    pub fn deactivate(&self, backend: &dyn CryptoProvider) -> ProviderResult<()> {
        trace!(
            provider = backend.name(),
            "deactivate: entering activation lock"
        );
        let mut count = self.count.lock();
        trace!(
            provider = backend.name(),
            "deactivate: entered activation lock"
        );

        if *count == 0 {
            error!(
                provider = backend.name(),
                "deactivate: no outstanding activation"
            );
            return Err(ProviderError::ActivationUnderflow);
        }
        *count -= 1;
        if *count == 0 {
            debug!(provider = backend.name(), "shutting down crypto library");
            backend.shutdown();
        }

        trace!(
            provider = backend.name(),
            count = *count,
            "deactivate: leaving activation lock"
        );
        Ok(())
    }

    /// Returns the current activation count.
    #[must_use]
    pub fn count(&self) -> usize {
        *self.count.lock()
    }
}
