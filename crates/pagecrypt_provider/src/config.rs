//! Provider configuration.

use crate::backend::BackendKind;
use tracing::warn;

/// Environment variable selecting the back-end (`rustcrypto`, `native`, `openssl`).
pub const BACKEND_ENV: &str = "PAGECRYPT_BACKEND";

/// Environment variable controlling random-generator serialization (`0`/`false` disables).
pub const SERIALIZE_RANDOM_ENV: &str = "PAGECRYPT_SERIALIZE_RANDOM";

/// Configuration for setting up a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Which back-end to bind.
    pub backend: BackendKind,

    /// Whether `random` and `add_random` are serialized behind a dedicated lock.
    ///
    /// Needed for libraries whose generator is not safe to call concurrently.
    pub serialize_random: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::RustCrypto,
            serialize_random: true,
        }
    }
}

impl ProviderConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the back-end.
    #[must_use]
    pub const fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Sets whether random generation is serialized.
    #[must_use]
    pub const fn serialize_random(mut self, value: bool) -> Self {
        self.serialize_random = value;
        self
    }

    /// Builds a configuration from `PAGECRYPT_*` environment variables.
    ///
    /// Unset or unparseable variables fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup(BACKEND_ENV) {
            match value.parse::<BackendKind>() {
                Ok(kind) => config.backend = kind,
                Err(e) => {
                    warn!(
                        variable = BACKEND_ENV,
                        %value,
                        error = %e,
                        "ignoring back-end selection"
                    );
                }
            }
        }

        if let Some(value) = lookup(SERIALIZE_RANDOM_ENV) {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.serialize_random = true,
                "0" | "false" | "no" | "off" => config.serialize_random = false,
                _ => warn!(variable = SERIALIZE_RANDOM_ENV, %value, "ignoring unrecognized flag"),
            }
        }

        config
    }
}
