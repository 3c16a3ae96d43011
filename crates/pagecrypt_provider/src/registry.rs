//! Process-wide provider registration.
//!
//! The C ABI has no place to carry a handle between calls, so it resolves
//! the provider through this registry. The first call to [`global`] creates
//! the provider from the environment unless [`install`] ran first.

use crate::config::ProviderConfig;
use crate::error::ProviderResult;
use crate::handle::Provider;
use std::sync::OnceLock;
use tracing::{debug, warn};

static PROVIDER: OnceLock<Provider> = OnceLock::new();

/// Installs `provider` as the process-wide provider.
///
/// Returns `false` if a provider is already registered; the existing one is
/// kept.
pub fn install(provider: Provider) -> bool {
    let name = provider.name();
    match PROVIDER.set(provider) {
        Ok(()) => {
            debug!(provider = name, "provider installed");
            true
        }
        Err(_) => {
            warn!(provider = name, "a provider is already installed");
            false
        }
    }
}

/// Returns the process-wide provider, creating it from
/// [`ProviderConfig::from_env`] on first use.
///
/// # Errors
///
/// Returns an error if the configured back-end is not compiled in.
pub fn global() -> ProviderResult<&'static Provider> {
    if let Some(provider) = PROVIDER.get() {
        return Ok(provider);
    }

    let provider = Provider::from_config(&ProviderConfig::from_env())?;
    // A concurrent first call may have won; its provider is kept.
    Ok(PROVIDER.get_or_init(|| provider))
}

/// Returns the process-wide provider if one is registered.
#[must_use]
pub fn get() -> Option<&'static Provider> {
    PROVIDER.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_is_stable() {
        let a = global().unwrap();
        let b = global().unwrap();
        assert!(std::ptr::eq(a, b));
        let native = Provider::for_backend(crate::BackendKind::Native).unwrap();
        assert!(!install(native));
        assert!(std::ptr::eq(get().unwrap(), a));
    }
}
