//! # pagecrypt FFI
//!
//! C ABI for the pagecrypt provider.
//!
//! A host fills a [`PagecryptProvider`] function table with
//! [`pagecrypt_provider_setup`] and drives the provider through it. The
//! table entries resolve the process-wide provider from
//! [`pagecrypt_provider::registry`].
//!
//! This crate provides:
//! - The function table and its setup entry point
//! - Opaque per-connection contexts owned by the caller between
//!   `ctx_init` and `ctx_free`
//! - Result codes and a per-thread last-error message

#![warn(missing_docs)]

mod error;
mod ops;
mod table;

pub use error::{
    clear_last_error, pagecrypt_clear_error, pagecrypt_get_last_error, set_last_error,
    PagecryptResult, PAGECRYPT_ERROR, PAGECRYPT_MISUSE, PAGECRYPT_OK,
};
pub use table::{
    pagecrypt_provider_setup, CipherFn, ContextFn, HmacFn, HmacSizeFn, KdfFn, LabelFn,
    LifecycleFn, PagecryptProvider, RandomFn, SizeFn,
};
