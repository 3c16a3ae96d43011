//! The provider function table.

use crate::error::{clear_last_error, set_last_error, PAGECRYPT_ERROR, PAGECRYPT_OK};
use crate::ops;
use pagecrypt_provider::registry;
use std::ffi::{c_char, c_int, c_uchar, c_void};
use tracing::{debug, error};

/// `fn(ctx) -> rc`
pub type LifecycleFn = unsafe extern "C" fn(*mut c_void) -> c_int;
/// `fn(ctx) -> static string`
pub type LabelFn = unsafe extern "C" fn(*mut c_void) -> *const c_char;
/// `fn(ctx) -> size`
pub type SizeFn = unsafe extern "C" fn(*mut c_void) -> c_int;
/// `fn(ctx, buffer, length) -> rc`
pub type RandomFn = unsafe extern "C" fn(*mut c_void, *mut c_void, c_int) -> c_int;
/// `fn(ctx, algorithm, key, key_sz, in, in_sz, in2, in2_sz, out) -> rc`
pub type HmacFn = unsafe extern "C" fn(
    *mut c_void,
    c_int,
    *const c_uchar,
    c_int,
    *const c_uchar,
    c_int,
    *const c_uchar,
    c_int,
    *mut c_uchar,
) -> c_int;
/// `fn(ctx, algorithm, pass, pass_sz, salt, salt_sz, workfactor, key_sz, key) -> rc`
pub type KdfFn = unsafe extern "C" fn(
    *mut c_void,
    c_int,
    *const c_uchar,
    c_int,
    *const c_uchar,
    c_int,
    c_int,
    c_int,
    *mut c_uchar,
) -> c_int;
/// `fn(ctx, mode, key, key_sz, iv, in, in_sz, out) -> rc`
pub type CipherFn = unsafe extern "C" fn(
    *mut c_void,
    c_int,
    *const c_uchar,
    c_int,
    *const c_uchar,
    *const c_uchar,
    c_int,
    *mut c_uchar,
) -> c_int;
/// `fn(ctx, algorithm) -> size`
pub type HmacSizeFn = unsafe extern "C" fn(*mut c_void, c_int) -> c_int;
/// `fn(&ctx) -> rc`
pub type ContextFn = unsafe extern "C" fn(*mut *mut c_void) -> c_int;

/// Function table through which a host drives the provider.
///
/// `ctx_init` stores an opaque context in the slot it is given; that
/// context is passed as the first argument of the crypto entries and must
/// be released with `ctx_free`. Entries return `PAGECRYPT_OK`,
/// `PAGECRYPT_ERROR`, or `PAGECRYPT_MISUSE` for a context that is not
/// initialized.
///
/// Field order matches the host's provider struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PagecryptProvider {
    /// Takes one activation of the library.
    pub activate: Option<LifecycleFn>,
    /// Releases one activation of the library.
    pub deactivate: Option<LifecycleFn>,
    /// Returns the provider name.
    pub get_provider_name: Option<LabelFn>,
    /// Mixes entropy into the generator. Always succeeds.
    pub add_random: Option<RandomFn>,
    /// Fills a buffer with random bytes.
    pub random: Option<RandomFn>,
    /// HMAC over one or two inputs.
    pub hmac: Option<HmacFn>,
    /// PBKDF2 key derivation.
    pub kdf: Option<KdfFn>,
    /// AES-256-CBC without padding; mode 1 encrypts, anything else decrypts.
    pub cipher: Option<CipherFn>,
    /// Returns the cipher name.
    pub get_cipher: Option<LabelFn>,
    /// Returns the key size.
    pub get_key_sz: Option<SizeFn>,
    /// Returns the IV size.
    pub get_iv_sz: Option<SizeFn>,
    /// Returns the block size.
    pub get_block_sz: Option<SizeFn>,
    /// Returns the HMAC size for an algorithm, 0 if unknown.
    pub get_hmac_sz: Option<HmacSizeFn>,
    /// Creates a context and stores it in the slot.
    ///
    /// # Safety
    ///
    /// The slot must be writable. Its previous content is never read, so an
    /// uninitialized slot is fine, but a live context left in it is leaked:
    /// release it with `ctx_free` before reusing the slot.
    pub ctx_init: Option<ContextFn>,
    /// Frees a context.
    pub ctx_free: Option<ContextFn>,
    /// Returns 1 if the library is in FIPS mode.
    pub fips_status: Option<SizeFn>,
    /// Returns the library version.
    pub get_provider_version: Option<LabelFn>,
}

impl PagecryptProvider {
    /// Returns a fully populated table.
    pub fn table() -> Self {
        Self {
            activate: Some(ops::activate),
            deactivate: Some(ops::deactivate),
            get_provider_name: Some(ops::get_provider_name),
            add_random: Some(ops::add_random),
            random: Some(ops::random),
            hmac: Some(ops::hmac),
            kdf: Some(ops::kdf),
            cipher: Some(ops::cipher),
            get_cipher: Some(ops::get_cipher),
            get_key_sz: Some(ops::get_key_sz),
            get_iv_sz: Some(ops::get_iv_sz),
            get_block_sz: Some(ops::get_block_sz),
            get_hmac_sz: Some(ops::get_hmac_sz),
            ctx_init: Some(ops::ctx_init),
            ctx_free: Some(ops::ctx_free),
            fips_status: Some(ops::fips_status),
            get_provider_version: Some(ops::get_provider_version),
        }
    }
}

/// Populates `provider` with the registered provider's entries.
///
/// The process-wide provider is created from the `PAGECRYPT_*`
/// environment variables if none was installed.
///
/// # Returns
///
/// `PAGECRYPT_OK` on success, `PAGECRYPT_ERROR` if `provider` is null or
/// no back-end is available.
///
/// # Safety
///
/// `provider` must be null or point to writable memory for a
/// `PagecryptProvider`.
#[no_mangle]
pub unsafe extern "C" fn pagecrypt_provider_setup(provider: *mut PagecryptProvider) -> c_int {
    clear_last_error();

    if provider.is_null() {
        set_last_error("null pointer argument");
        return PAGECRYPT_ERROR;
    }

    match registry::global() {
        Ok(registered) => {
            debug!(provider = registered.name(), "provider table populated");
            provider.write(PagecryptProvider::table());
            PAGECRYPT_OK
        }
        Err(e) => {
            error!(error = %e, "provider setup failed");
            set_last_error(e.to_string());
            PAGECRYPT_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_empty() {
        let table = PagecryptProvider::default();
        assert!(table.activate.is_none());
        assert!(table.get_provider_version.is_none());
    }

    #[test]
    fn setup_rejects_null() {
        // Safety: null is handled
        let rc = unsafe { pagecrypt_provider_setup(std::ptr::null_mut()) };
        assert_eq!(rc, PAGECRYPT_ERROR);
    }
}
