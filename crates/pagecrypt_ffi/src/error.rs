//! Result codes and the per-thread last error.

use pagecrypt_provider::{ProviderError, ResultCode};
use std::cell::RefCell;
use std::ffi::{c_char, c_int, CString};

/// Operation succeeded.
pub const PAGECRYPT_OK: c_int = 0;
/// Operation failed.
pub const PAGECRYPT_ERROR: c_int = 1;
/// Operation issued through a context that is not active.
pub const PAGECRYPT_MISUSE: c_int = 21;

/// Result code for FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagecryptResult {
    /// Operation succeeded.
    Ok = 0,
    /// Operation failed; see `pagecrypt_get_last_error`.
    Error = 1,
    /// The context is not active.
    Misuse = 21,
}

impl PagecryptResult {
    /// Returns true if the result indicates success.
    pub fn is_ok(self) -> bool {
        self == PagecryptResult::Ok
    }

    /// Returns the raw code.
    pub fn code(self) -> c_int {
        self as c_int
    }
}

impl From<ResultCode> for PagecryptResult {
    fn from(code: ResultCode) -> Self {
        match code {
            ResultCode::Ok => PagecryptResult::Ok,
            ResultCode::Error => PagecryptResult::Error,
            ResultCode::NotActive => PagecryptResult::Misuse,
        }
    }
}

impl From<c_int> for PagecryptResult {
    fn from(code: c_int) -> Self {
        match code {
            PAGECRYPT_OK => PagecryptResult::Ok,
            PAGECRYPT_MISUSE => PagecryptResult::Misuse,
            _ => PagecryptResult::Error,
        }
    }
}

// Thread-local storage for last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Sets the last error message.
pub fn set_last_error(message: impl Into<String>) {
    let msg = message.into();
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clears the last error.
pub fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Records `result`'s error, if any, and returns its code.
pub(crate) fn report<T>(result: &Result<T, ProviderError>) -> c_int {
    match result {
        Ok(_) => PAGECRYPT_OK,
        Err(e) => {
            set_last_error(e.to_string());
            PagecryptResult::from(e.result_code()).code()
        }
    }
}

/// Gets the last error message as a C string.
///
/// Returns null if no error is set.
///
/// # Safety
///
/// The returned pointer is valid until the next FFI call on this thread.
#[no_mangle]
pub extern "C" fn pagecrypt_get_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => std::ptr::null(),
    })
}

/// Clears the last error message.
#[no_mangle]
pub extern "C" fn pagecrypt_clear_error() {
    clear_last_error();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_codes() {
        assert_eq!(PagecryptResult::Ok.code(), 0);
        assert_eq!(PagecryptResult::Error.code(), 1);
        assert_eq!(PagecryptResult::Misuse.code(), 21);
        assert_eq!(PagecryptResult::from(21), PagecryptResult::Misuse);
        assert_eq!(PagecryptResult::from(99), PagecryptResult::Error);
        assert_eq!(
            PagecryptResult::from(ResultCode::NotActive),
            PagecryptResult::Misuse
        );
    }

    #[test]
    fn report_sets_message() {
        clear_last_error();
        let result: Result<(), _> = Err(ProviderError::InvalidAlgorithm { id: 9 });
        assert_eq!(report(&result), PAGECRYPT_ERROR);

        let ptr = pagecrypt_get_last_error();
        assert!(!ptr.is_null());
        // Safety: we just set it
        let msg = unsafe { std::ffi::CStr::from_ptr(ptr) };
        assert_eq!(msg.to_str().unwrap(), "invalid algorithm identifier 9");

        pagecrypt_clear_error();
        assert!(pagecrypt_get_last_error().is_null());
    }
}
