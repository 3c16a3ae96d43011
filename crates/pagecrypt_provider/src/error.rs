//! Error types for provider operations.
//!
//! Callers of the provider only ever need to distinguish success from
//! failure (see [`ResultCode`]). The variants of [`ProviderError`] carry the
//! finer-grained cause for diagnostics.

use thiserror::Error;

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Coarse result code surfaced across the provider contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// Operation succeeded.
    Ok,
    /// Operation failed; the cause is only available in diagnostics.
    Error,
    /// A crypto operation was issued through a context that is not active.
    NotActive,
}

/// Errors that can occur in provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The algorithm identifier is not one of the recognized digests.
    #[error("invalid algorithm identifier {id}")]
    InvalidAlgorithm {
        /// The raw identifier that was rejected.
        id: i32,
    },

    /// A required input buffer was missing.
    #[error("{operation}: required input is null")]
    NullInput {
        /// Operation that received the null input.
        operation: &'static str,
    },

    /// An input had an unusable length, alignment or parameter value.
    #[error("{operation}: {message}")]
    InvalidInput {
        /// Operation that rejected the input.
        operation: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// The bound cryptography library reported a failure.
    #[error("{operation} failed with code {code}: {message}")]
    Library {
        /// Library call that failed.
        operation: &'static str,
        /// Numeric code reported by the library (0 if it reports none).
        code: i64,
        /// Library-supplied description.
        message: String,
    },

    /// A transform produced a different number of bytes than requested.
    #[error("{operation} produced {actual} bytes, expected {expected}")]
    SizeMismatch {
        /// Operation that produced the output.
        operation: &'static str,
        /// Number of bytes that should have been produced.
        expected: usize,
        /// Number of bytes actually produced.
        actual: usize,
    },

    /// The provider context is not active.
    #[error("{operation}: provider context is not active")]
    NotActive {
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// `deactivate` was called more times than `activate`.
    #[error("deactivate called with no outstanding activation")]
    ActivationUnderflow,

    /// The requested back-end is not compiled into this build.
    #[error("crypto back-end '{name}' is not available in this build")]
    BackendUnavailable {
        /// Name of the requested back-end.
        name: String,
    },
}

impl ProviderError {
    /// Creates an invalid input error.
    pub fn invalid_input(operation: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            operation,
            message: message.into(),
        }
    }

    /// Creates a library failure error.
    pub fn library(operation: &'static str, code: i64, message: impl Into<String>) -> Self {
        Self::Library {
            operation,
            code,
            message: message.into(),
        }
    }

    /// Creates a size mismatch error.
    pub fn size_mismatch(operation: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            operation,
            expected,
            actual,
        }
    }

    /// Creates a not-active error.
    pub fn not_active(operation: &'static str) -> Self {
        Self::NotActive { operation }
    }

    /// Maps this error to the coarse code surfaced to callers.
    #[must_use]
    pub fn result_code(&self) -> ResultCode {
        match self {
            Self::NotActive { .. } => ResultCode::NotActive,
            _ => ResultCode::Error,
        }
    }

    /// Returns true if the error indicates corrupted output rather than bad input.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::SizeMismatch { .. })
    }
}

impl<T> From<&ProviderResult<T>> for ResultCode {
    fn from(result: &ProviderResult<T>) -> Self {
        match result {
            Ok(_) => ResultCode::Ok,
            Err(e) => e.result_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_codes() {
        let ok: ProviderResult<()> = Ok(());
        assert_eq!(ResultCode::from(&ok), ResultCode::Ok);

        let err: ProviderResult<()> = Err(ProviderError::InvalidAlgorithm { id: 7 });
        assert_eq!(ResultCode::from(&err), ResultCode::Error);

        let inactive: ProviderResult<()> = Err(ProviderError::not_active("cipher"));
        assert_eq!(ResultCode::from(&inactive), ResultCode::NotActive);
    }

    #[test]
    fn messages_carry_context() {
        let err = ProviderError::library("RAND_bytes", 3, "entropy source failure");
        assert_eq!(
            err.to_string(),
            "RAND_bytes failed with code 3: entropy source failure"
        );

        let err = ProviderError::size_mismatch("cipher", 4096, 4080);
        assert!(err.is_corruption());
        assert_eq!(err.to_string(), "cipher produced 4080 bytes, expected 4096");
    }
}
