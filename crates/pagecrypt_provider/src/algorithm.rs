//! Algorithm identifiers, cipher direction and FIPS status.

use crate::error::{ProviderError, ProviderResult};
use std::fmt;

/// Digest used for HMAC and PBKDF2.
///
/// The raw identifiers are part of the C ABI and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HmacAlgorithm {
    /// SHA-1 (20-byte output).
    Sha1,
    /// SHA-256 (32-byte output).
    Sha256,
    /// SHA-512 (64-byte output).
    Sha512,
}

impl HmacAlgorithm {
    /// All supported digests.
    pub const ALL: [HmacAlgorithm; 3] = [Self::Sha1, Self::Sha256, Self::Sha512];

    /// Parses a raw algorithm identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidAlgorithm`] for any value other than 0, 1 or 2.
    pub fn from_id(id: i32) -> ProviderResult<Self> {
        match id {
            0 => Ok(Self::Sha1),
            1 => Ok(Self::Sha256),
            2 => Ok(Self::Sha512),
            _ => Err(ProviderError::InvalidAlgorithm { id }),
        }
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn id(self) -> i32 {
        match self {
            Self::Sha1 => 0,
            Self::Sha256 => 1,
            Self::Sha512 => 2,
        }
    }

    /// Returns the digest output size in bytes.
    #[must_use]
    pub const fn output_size(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }

    /// Returns the digest's internal block size in bytes.
    #[must_use]
    pub const fn block_size(self) -> usize {
        match self {
            Self::Sha1 | Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }

    /// Returns the lowercase digest name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Parses a digest name such as `sha256` or `SHA-256`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Some(Self::Sha1),
            "sha256" => Some(Self::Sha256),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

impl TryFrom<i32> for HmacAlgorithm {
    type Error = ProviderError;

    fn try_from(id: i32) -> ProviderResult<Self> {
        Self::from_id(id)
    }
}

impl fmt::Display for HmacAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Direction of a cipher transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherMode {
    /// Plaintext to ciphertext.
    Encrypt,
    /// Ciphertext to plaintext.
    Decrypt,
}

impl CipherMode {
    /// Interprets a raw mode value: 1 encrypts, anything else decrypts.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        if raw == 1 {
            Self::Encrypt
        } else {
            Self::Decrypt
        }
    }

    /// Returns the raw mode value.
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        match self {
            Self::Encrypt => 1,
            Self::Decrypt => 0,
        }
    }
}

/// Whether the bound library runs in a certified-restricted (FIPS) mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FipsStatus {
    /// The library is operating in FIPS mode.
    Enabled,
    /// The library supports FIPS mode but it is off.
    Disabled,
    /// This build or back-end has no FIPS mode.
    NotApplicable,
}

impl FipsStatus {
    /// Returns the raw status value (1 when enabled, 0 otherwise).
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        match self {
            Self::Enabled => 1,
            Self::Disabled | Self::NotApplicable => 0,
        }
    }
}

impl fmt::Display for FipsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::NotApplicable => "not applicable",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_ids_roundtrip() {
        for alg in HmacAlgorithm::ALL {
            assert_eq!(HmacAlgorithm::from_id(alg.id()).unwrap(), alg);
        }
    }

    #[test]
    fn unknown_ids_rejected() {
        for id in [-1, 3, 4, 255, i32::MAX] {
            let err = HmacAlgorithm::from_id(id).unwrap_err();
            assert!(matches!(err, ProviderError::InvalidAlgorithm { id: got } if got == id));
        }
    }

    #[test]
    fn output_sizes() {
        assert_eq!(HmacAlgorithm::Sha1.output_size(), 20);
        assert_eq!(HmacAlgorithm::Sha256.output_size(), 32);
        assert_eq!(HmacAlgorithm::Sha512.output_size(), 64);
    }

    #[test]
    fn names() {
        assert_eq!(
            HmacAlgorithm::from_name("SHA-256"),
            Some(HmacAlgorithm::Sha256)
        );
        assert_eq!(
            HmacAlgorithm::from_name("sha512"),
            Some(HmacAlgorithm::Sha512)
        );
        assert_eq!(HmacAlgorithm::from_name("md5"), None);
        assert_eq!(HmacAlgorithm::Sha1.to_string(), "sha1");
    }

    #[test]
    fn cipher_mode_raw() {
        assert_eq!(CipherMode::from_raw(1), CipherMode::Encrypt);
        assert_eq!(CipherMode::from_raw(0), CipherMode::Decrypt);
        assert_eq!(CipherMode::from_raw(42), CipherMode::Decrypt);
        assert_eq!(CipherMode::Encrypt.as_raw(), 1);
    }

    #[test]
    fn fips_raw() {
        assert_eq!(FipsStatus::Enabled.as_raw(), 1);
        assert_eq!(FipsStatus::NotApplicable.as_raw(), 0);
    }
}
