//! Concrete crypto back-ends.
//!
//! Every back-end serves the same fixed cipher, AES-256 in CBC mode with
//! padding disabled, and the same three HMAC/PBKDF2 digests.

mod native;
#[cfg(feature = "openssl")]
mod ossl;
mod rustcrypto;

pub use native::NativeProvider;
#[cfg(feature = "openssl")]
pub use ossl::OpenSslProvider;
pub use rustcrypto::RustCryptoProvider;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::CryptoProvider;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Name of the configured cipher.
pub const CIPHER_NAME: &str = "aes-256-cbc";
/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;
/// CBC IV size in bytes.
pub const IV_SIZE: usize = 16;
/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Selects one of the compiled-in back-ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// [`RustCryptoProvider`], bound to the RustCrypto crates.
    RustCrypto,
    /// [`NativeProvider`], built from raw primitives.
    Native,
    /// `OpenSslProvider`, bound to OpenSSL (feature `openssl`).
    OpenSsl,
}

impl BackendKind {
    /// All back-end kinds, available or not.
    pub const ALL: [BackendKind; 3] = [Self::RustCrypto, Self::Native, Self::OpenSsl];

    /// Returns the back-end's provider name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RustCrypto => "rustcrypto",
            Self::Native => "native",
            Self::OpenSsl => "openssl",
        }
    }

    /// Returns true if this back-end is compiled into the build.
    #[must_use]
    pub const fn is_available(self) -> bool {
        match self {
            Self::RustCrypto | Self::Native => true,
            Self::OpenSsl => cfg!(feature = "openssl"),
        }
    }

    /// Returns the back-ends compiled into this build.
    #[must_use]
    pub fn available() -> Vec<BackendKind> {
        Self::ALL
            .into_iter()
            .filter(|kind| kind.is_available())
            .collect()
    }

    /// Instantiates the back-end.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::BackendUnavailable`] if the back-end is not
    /// compiled in.
    pub fn create(self) -> ProviderResult<Arc<dyn CryptoProvider>> {
        match self {
            Self::RustCrypto => Ok(Arc::new(RustCryptoProvider::new())),
            Self::Native => Ok(Arc::new(NativeProvider::new())),
            #[cfg(feature = "openssl")]
            Self::OpenSsl => Ok(Arc::new(OpenSslProvider::new())),
            #[cfg(not(feature = "openssl"))]
            Self::OpenSsl => Err(ProviderError::BackendUnavailable {
                name: self.name().to_string(),
            }),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> ProviderResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rustcrypto" | "rust-crypto" | "library" => Ok(Self::RustCrypto),
            "native" | "custom" => Ok(Self::Native),
            "openssl" => Ok(Self::OpenSsl),
            other => Err(ProviderError::invalid_input(
                "backend",
                format!(
                    "unknown back-end '{other}', expected one of rustcrypto, native, openssl"
                ),
            )),
        }
    }
}

/// Checks that a transform wrote exactly the requested number of bytes.
pub(crate) fn verify_output_len(
    operation: &'static str,
    expected: usize,
    actual: usize,
) -> ProviderResult<()> {
    if expected == actual {
        Ok(())
    } else {
        tracing::error!(operation, expected, actual, "output length mismatch");
        Err(ProviderError::size_mismatch(operation, expected, actual))
    }
}
