//! # pagecrypt Testkit
//!
//! Test utilities for pagecrypt providers.
//!
//! This crate provides:
//! - Known-answer vectors (HMAC, PBKDF2, AES-256-CBC), exportable as JSON
//! - A conformance suite run against every back-end
//! - A call-counting back-end wrapper
//! - Property-based test generators using proptest
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use pagecrypt_provider::BackendKind;
//! use pagecrypt_testkit::run_conformance;
//!
//! for kind in BackendKind::available() {
//!     let report = run_conformance(kind.create().unwrap());
//!     assert!(report.passed(), "{kind}: {:?}", report.failures().collect::<Vec<_>>());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod conformance;
pub mod counting;
pub mod generators;
pub mod hex;
pub mod stress;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::conformance::*;
    pub use crate::counting::*;
    pub use crate::generators::*;
    pub use crate::hex::*;
    pub use crate::stress::*;
    pub use crate::vectors::*;
}

pub use conformance::*;
pub use counting::*;
pub use generators::*;
pub use hex::*;
pub use stress::*;
pub use vectors::*;
