//! Hexadecimal helpers for vectors and command-line input.

use thiserror::Error;

/// Error decoding a hexadecimal string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    /// The string has an odd number of digits.
    #[error("odd number of hex digits ({0})")]
    OddLength(usize),
    /// A character is not a hex digit.
    #[error("invalid hex digit {found:?} at position {position}")]
    InvalidDigit {
        /// The offending character.
        found: char,
        /// Its position after whitespace removal.
        position: usize,
    },
}

/// Encodes bytes as lowercase hexadecimal.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decodes hexadecimal, ignoring whitespace.
///
/// # Errors
///
/// Returns [`HexError`] for an odd digit count or a non-hex character.
pub fn hex_decode(hex: &str) -> Result<Vec<u8>, HexError> {
    let digits: Vec<char> = hex.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(HexError::OddLength(digits.len()));
    }

    let nibble = |position: usize| {
        let found = digits[position];
        found
            .to_digit(16)
            .map(|d| d as u8)
            .ok_or(HexError::InvalidDigit { found, position })
    };

    (0..digits.len())
        .step_by(2)
        .map(|i| Ok((nibble(i)? << 4) | nibble(i + 1)?))
        .collect()
}
