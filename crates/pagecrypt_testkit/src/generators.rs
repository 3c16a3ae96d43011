//! Property-based test generators using proptest.

use pagecrypt_provider::{CipherMode, HmacAlgorithm, BLOCK_SIZE, IV_SIZE, KEY_SIZE};
use proptest::prelude::*;

/// Strategy for the supported digests.
pub fn hmac_algorithm_strategy() -> impl Strategy<Value = HmacAlgorithm> {
    prop::sample::select(HmacAlgorithm::ALL.to_vec())
}

/// Strategy for raw algorithm ids that no digest uses.
pub fn invalid_algorithm_id_strategy() -> impl Strategy<Value = i32> {
    prop_oneof![i32::MIN..0, 3..=i32::MAX]
}

/// Strategy for the cipher direction.
pub fn cipher_mode_strategy() -> impl Strategy<Value = CipherMode> {
    prop_oneof![Just(CipherMode::Encrypt), Just(CipherMode::Decrypt)]
}

/// Strategy for cipher keys.
pub fn key_strategy() -> impl Strategy<Value = [u8; KEY_SIZE]> {
    any::<[u8; KEY_SIZE]>()
}

/// Strategy for cipher IVs.
pub fn iv_strategy() -> impl Strategy<Value = [u8; IV_SIZE]> {
    any::<[u8; IV_SIZE]>()
}

/// Strategy for block-aligned cipher input of up to `max_blocks` blocks.
pub fn aligned_data_strategy(max_blocks: usize) -> impl Strategy<Value = Vec<u8>> {
    (0..=max_blocks).prop_flat_map(|blocks| prop::collection::vec(any::<u8>(), blocks * BLOCK_SIZE))
}

/// Strategy for input lengths that are not a multiple of the block size.
pub fn unaligned_len_strategy(max: usize) -> impl Strategy<Value = usize> {
    (1..max).prop_filter("length must not be block aligned", |len| {
        len % BLOCK_SIZE != 0
    })
}

/// Strategy for arbitrary HMAC keys, passwords and messages.
pub fn bytes_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..max_len)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn aligned_data_is_aligned(data in aligned_data_strategy(8)) {
            prop_assert_eq!(data.len() % BLOCK_SIZE, 0);
            prop_assert!(data.len() <= 8 * BLOCK_SIZE);
        }

        #[test]
        fn invalid_ids_are_invalid(id in invalid_algorithm_id_strategy()) {
            prop_assert!(HmacAlgorithm::from_id(id).is_err());
        }

        #[test]
        fn unaligned_lengths(len in unaligned_len_strategy(4096)) {
            prop_assert_ne!(len % BLOCK_SIZE, 0);
        }
    }
}
