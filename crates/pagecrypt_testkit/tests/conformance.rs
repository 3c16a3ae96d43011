//! Runs the conformance suite and stress helpers against every back-end.

use pagecrypt_provider::{
    ActivationManager, BackendKind, CipherMode, Provider, ProviderConfig, ProviderError,
    RustCryptoProvider,
};
use pagecrypt_testkit::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

#[test]
fn every_backend_conforms() {
    for kind in BackendKind::available() {
        let report = run_conformance(kind.create().unwrap());
        let failures: Vec<_> = report.failures().collect();
        assert!(failures.is_empty(), "{kind}: {failures:?}");
        assert_eq!(report.provider, kind.name());
    }
}

#[test]
fn report_serializes() {
    let report = run_conformance(BackendKind::RustCrypto.create().unwrap());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["provider"], "rustcrypto");
    assert!(json["checks"].as_array().unwrap().len() > 5);
}

#[test]
fn page_cipher_stress_on_every_backend() {
    let config = StressConfig {
        threads: 4,
        operations: 25,
        page_size: 1024,
    };
    for kind in BackendKind::available() {
        let provider = Provider::for_backend(kind).unwrap();
        let result = stress_page_cipher(&provider, &config);
        assert_eq!(result.failed_ops, 0, "{kind}");
        assert_eq!(provider.activation_count(), 0, "{kind}");
    }
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn one_transition_per_bring_up(threads in 2usize..10, operations in 1usize..20) {
        let counting = Arc::new(CountingProvider::new(Arc::new(RustCryptoProvider::new())));
        let lifecycle = Arc::new(ActivationManager::new());
        let provider = Provider::with_lifecycle(
            counting.clone(),
            lifecycle.clone(),
            &ProviderConfig::default(),
        );

        let config = StressConfig { threads, operations, ..StressConfig::default() };
        let result = stress_context_lifecycle(&provider, &config);

        prop_assert_eq!(result.failed_ops, 0);
        prop_assert_eq!(lifecycle.count(), 0);
        let counts = counting.counts();
        prop_assert_eq!(counts.initialized, counts.shut_down);
        prop_assert!(counts.initialized >= 1);
        prop_assert_eq!(counts.overlapping_transitions, 0);
        prop_assert_eq!(counts.crypto, threads * operations);
    }

    #[test]
    fn unaligned_input_rejected(
        len in unaligned_len_strategy(1024),
        key in key_strategy(),
        iv in iv_strategy(),
        mode in cipher_mode_strategy(),
    ) {
        let provider = Provider::for_backend(BackendKind::Native).unwrap();
        let ctx = provider.ctx_init().unwrap();
        let input = vec![0u8; len];
        let mut out = vec![0u8; len];
        let result = ctx.cipher(mode, &key, &iv, &input, &mut out);
        let is_invalid_input = matches!(result, Err(ProviderError::InvalidInput { .. }));
        prop_assert!(is_invalid_input);
    }

    #[test]
    fn hmac_length_matches_size(
        alg in hmac_algorithm_strategy(),
        key in bytes_strategy(200),
        message in bytes_strategy(512),
    ) {
        for kind in BackendKind::available() {
            let provider = Provider::for_backend(kind).unwrap();
            let ctx = provider.ctx_init().unwrap();
            let mut out = vec![0u8; provider.hmac_size(alg)];
            ctx.hmac(alg, &key, &message, None, &mut out).unwrap();
            prop_assert_eq!(out.len(), alg.output_size());
        }
    }

    #[test]
    fn roundtrip_any_aligned_page(
        data in aligned_data_strategy(32),
        key in key_strategy(),
        iv in iv_strategy(),
    ) {
        let provider = Provider::for_backend(BackendKind::RustCrypto).unwrap();
        let ctx = provider.ctx_init().unwrap();
        let mut sealed = vec![0u8; data.len()];
        let mut opened = vec![0u8; data.len()];
        ctx.cipher(CipherMode::Encrypt, &key, &iv, &data, &mut sealed).unwrap();
        ctx.cipher(CipherMode::Decrypt, &key, &iv, &sealed, &mut opened).unwrap();
        prop_assert_eq!(opened, data);
    }
}
