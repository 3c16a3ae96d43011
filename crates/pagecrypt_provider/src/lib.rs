//! # pagecrypt provider
//!
//! Pluggable cryptography provider for an encrypted-database page codec.
//!
//! The codec needs a handful of primitives: random bytes, HMAC over a
//! two-part input, PBKDF2 key derivation, and one fixed block cipher
//! (AES-256-CBC without padding). This crate defines that contract as the
//! [`CryptoProvider`] trait and binds it to concrete libraries.
//!
//! ## Design Principles
//!
//! - Callers go through a [`Provider`] handle, never a back-end directly
//! - Library-wide state is reference counted by an [`ActivationManager`]
//! - Each connection holds a [`ProviderContext`]; crypto calls through an
//!   inactive context fail with [`ProviderError::NotActive`]
//! - Inputs are validated before any back-end call
//!
//! ## Available Back-ends
//!
//! - [`RustCryptoProvider`] - RustCrypto crates and the OS RNG (default)
//! - [`NativeProvider`] - HMAC, PBKDF2 and CBC composed from raw primitives
//! - `OpenSslProvider` - system OpenSSL (feature `openssl`)
//!
//! ## Example
//!
//! ```rust
//! use pagecrypt_provider::{CipherMode, Provider, ProviderConfig};
//!
//! let provider = Provider::from_config(&ProviderConfig::default()).unwrap();
//! let ctx = provider.ctx_init().unwrap();
//!
//! let key = [7u8; 32];
//! let iv = [9u8; 16];
//! let page = [0u8; 64];
//! let mut sealed = [0u8; 64];
//! ctx.cipher(CipherMode::Encrypt, &key, &iv, &page, &mut sealed).unwrap();
//!
//! let mut opened = [0u8; 64];
//! ctx.cipher(CipherMode::Decrypt, &key, &iv, &sealed, &mut opened).unwrap();
//! assert_eq!(opened, page);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod algorithm;
mod backend;
mod config;
mod context;
mod error;
mod handle;
mod lifecycle;
mod provider;
pub mod registry;

pub use algorithm::{CipherMode, FipsStatus, HmacAlgorithm};
#[cfg(feature = "openssl")]
pub use backend::OpenSslProvider;
pub use backend::{
    BackendKind, NativeProvider, RustCryptoProvider, BLOCK_SIZE, CIPHER_NAME, IV_SIZE, KEY_SIZE,
};
pub use config::{ProviderConfig, BACKEND_ENV, SERIALIZE_RANDOM_ENV};
pub use context::{ContextState, ProviderContext};
pub use error::{ProviderError, ProviderResult, ResultCode};
pub use handle::Provider;
pub use lifecycle::ActivationManager;
pub use provider::{ContextData, CryptoProvider};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
