//! Conformance suite every back-end must pass.
//!
//! The suite wraps the back-end in a [`CountingProvider`] and drives it
//! through a [`Provider`] handle with its own lifecycle manager, so it can
//! also verify that rejected input never reaches the library and that the
//! activation count is balanced afterwards.

use crate::counting::CountingProvider;
use crate::hex::{hex_decode, hex_encode};
use crate::vectors::{cipher_vectors, hmac_vectors, kdf_vectors};
use pagecrypt_provider::{
    ActivationManager, CipherMode, CryptoProvider, HmacAlgorithm, Provider, ProviderConfig,
    ProviderContext, ProviderError,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    /// Check name.
    pub name: &'static str,
    /// Failure description, `None` if the check passed.
    pub error: Option<String>,
}

/// Outcome of a full conformance run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConformanceReport {
    /// Name of the back-end under test.
    pub provider: &'static str,
    /// Version string of the back-end under test.
    pub version: &'static str,
    /// Per-check outcomes, in execution order.
    pub checks: Vec<CheckOutcome>,
}

impl ConformanceReport {
    /// Returns true if every check passed.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|check| check.error.is_none())
    }

    /// Returns the failed checks.
    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.checks.iter().filter(|check| check.error.is_some())
    }
}

type CheckResult = Result<(), String>;

struct Harness {
    counting: Arc<CountingProvider>,
    provider: Provider,
}

impl Harness {
    fn ctx(&self) -> Result<ProviderContext, String> {
        self.provider
            .ctx_init()
            .map_err(|e| format!("ctx_init: {e}"))
    }
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> CheckResult {
    if condition {
        Ok(())
    } else {
        Err(message())
    }
}

fn decode(hex: &str) -> Result<Vec<u8>, String> {
    hex_decode(hex).map_err(|e| format!("bad vector hex: {e}"))
}

fn algorithm(name: &str) -> Result<HmacAlgorithm, String> {
    HmacAlgorithm::from_name(name).ok_or_else(|| format!("unknown digest {name}"))
}

fn check_metadata(h: &Harness) -> CheckResult {
    let p = &h.provider;
    ensure(p.cipher_name().eq_ignore_ascii_case("aes-256-cbc"), || {
        format!("cipher name {}", p.cipher_name())
    })?;
    ensure(p.key_size() == 32, || format!("key size {}", p.key_size()))?;
    ensure(p.iv_size() == 16, || format!("iv size {}", p.iv_size()))?;
    ensure(p.block_size() == 16, || {
        format!("block size {}", p.block_size())
    })?;
    for (id, size) in [(0, 20), (1, 32), (2, 64), (3, 0), (-1, 0)] {
        let got = p.hmac_size_for_id(id);
        ensure(got == size, || {
            format!("hmac size for id {id}: {got}, expected {size}")
        })?;
    }
    ensure(!p.name().is_empty() && !p.version().is_empty(), || {
        "empty provider name or version".into()
    })
}

fn check_hmac_vectors(h: &Harness) -> CheckResult {
    let ctx = h.ctx()?;
    for v in hmac_vectors() {
        let alg = algorithm(&v.algorithm)?;
        let key = decode(&v.key_hex)?;
        let input = decode(&v.input_hex)?;
        let input2 = v.input2_hex.as_deref().map(decode).transpose()?;
        let mut out = vec![0u8; alg.output_size()];
        ctx.hmac(alg, &key, &input, input2.as_deref(), &mut out)
            .map_err(|e| format!("{}: {e}", v.id))?;
        ensure(hex_encode(&out) == v.expected_hex, || {
            format!("{}: got {}", v.id, hex_encode(&out))
        })?;
    }
    Ok(())
}

fn check_kdf_vectors(h: &Harness) -> CheckResult {
    let ctx = h.ctx()?;
    for v in kdf_vectors() {
        let alg = algorithm(&v.algorithm)?;
        let expected = decode(&v.expected_hex)?;
        let mut out = vec![0u8; expected.len()];
        ctx.kdf(
            alg,
            &decode(&v.password_hex)?,
            &decode(&v.salt_hex)?,
            v.iterations,
            &mut out,
        )
        .map_err(|e| format!("{}: {e}", v.id))?;
        ensure(out == expected, || {
            format!("{}: got {}", v.id, hex_encode(&out))
        })?;
    }
    Ok(())
}

fn check_cipher_vectors(h: &Harness) -> CheckResult {
    let ctx = h.ctx()?;
    for v in cipher_vectors() {
        let key = decode(&v.key_hex)?;
        let iv = decode(&v.iv_hex)?;
        let plaintext = decode(&v.plaintext_hex)?;
        let ciphertext = decode(&v.ciphertext_hex)?;
        let mut out = vec![0u8; plaintext.len()];

        ctx.cipher(CipherMode::Encrypt, &key, &iv, &plaintext, &mut out)
            .map_err(|e| format!("{} encrypt: {e}", v.id))?;
        ensure(out == ciphertext, || {
            format!("{} encrypt: got {}", v.id, hex_encode(&out))
        })?;

        ctx.cipher(CipherMode::Decrypt, &key, &iv, &ciphertext, &mut out)
            .map_err(|e| format!("{} decrypt: {e}", v.id))?;
        ensure(out == plaintext, || {
            format!("{} decrypt: got {}", v.id, hex_encode(&out))
        })?;
    }
    Ok(())
}

fn check_hmac_output_size(h: &Harness) -> CheckResult {
    const FILL: u8 = 0xA5;
    let ctx = h.ctx()?;
    for alg in HmacAlgorithm::ALL {
        let size = h.provider.hmac_size(alg);
        let mut out = vec![FILL; size + 16];
        ctx.hmac(alg, b"key", b"message", Some(b"tail"), &mut out)
            .map_err(|e| format!("{alg}: {e}"))?;
        ensure(out[size..].iter().all(|&b| b == FILL), || {
            format!("{alg}: wrote past {size} bytes")
        })?;
        ensure(out[..size].iter().any(|&b| b != FILL), || {
            format!("{alg}: nothing written")
        })?;

        let mut short = vec![0u8; size - 1];
        let result = ctx.hmac(alg, b"key", b"message", None, &mut short);
        ensure(matches!(result, Err(ProviderError::InvalidInput { .. })), || {
            format!("{alg}: short output accepted")
        })?;
    }
    Ok(())
}

fn check_cipher_roundtrip(h: &Harness) -> CheckResult {
    let ctx = h.ctx()?;
    let mut key = [0u8; 32];
    let mut iv = [0u8; 16];
    ctx.random(&mut key).map_err(|e| e.to_string())?;
    ctx.random(&mut iv).map_err(|e| e.to_string())?;

    for len in [0usize, 16, 64, 1024, 4096] {
        let page: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let mut sealed = vec![0u8; len];
        let mut opened = vec![0u8; len];
        ctx.cipher(CipherMode::Encrypt, &key, &iv, &page, &mut sealed)
            .map_err(|e| format!("encrypt {len}: {e}"))?;
        ctx.cipher(CipherMode::Decrypt, &key, &iv, &sealed, &mut opened)
            .map_err(|e| format!("decrypt {len}: {e}"))?;
        ensure(opened == page, || {
            format!("round trip of {len} bytes differs")
        })?;
        ensure(len == 0 || sealed != page, || {
            format!("{len} bytes unchanged by encryption")
        })?;

        // Decrypt-then-encrypt restores the original as well.
        ctx.cipher(CipherMode::Decrypt, &key, &iv, &page, &mut opened)
            .map_err(|e| format!("decrypt {len}: {e}"))?;
        ctx.cipher(CipherMode::Encrypt, &key, &iv, &opened, &mut sealed)
            .map_err(|e| format!("encrypt {len}: {e}"))?;
        ensure(sealed == page, || {
            format!("reverse round trip of {len} bytes differs")
        })?;
    }
    Ok(())
}

fn check_kdf_sensitivity(h: &Harness) -> CheckResult {
    let ctx = h.ctx()?;
    let derive = |alg, password: &[u8], salt: &[u8], iterations| {
        let mut out = [0u8; 32];
        ctx.kdf(alg, password, salt, iterations, &mut out)
            .map(|()| out)
            .map_err(|e| e.to_string())
    };

    let base = derive(HmacAlgorithm::Sha512, b"secret", b"pepper", 8)?;
    ensure(base == derive(HmacAlgorithm::Sha512, b"secret", b"pepper", 8)?, || {
        "not deterministic".into()
    })?;
    ensure(base != derive(HmacAlgorithm::Sha512, b"secreT", b"pepper", 8)?, || {
        "password ignored".into()
    })?;
    ensure(base != derive(HmacAlgorithm::Sha512, b"secret", b"peppeR", 8)?, || {
        "salt ignored".into()
    })?;
    ensure(base != derive(HmacAlgorithm::Sha512, b"secret", b"pepper", 9)?, || {
        "iterations ignored".into()
    })?;
    ensure(base != derive(HmacAlgorithm::Sha256, b"secret", b"pepper", 8)?, || {
        "algorithm ignored".into()
    })
}

fn check_random(h: &Harness) -> CheckResult {
    let ctx = h.ctx()?;
    let mut seen = HashSet::new();
    for _ in 0..256 {
        let mut buf = [0u8; 16];
        ctx.random(&mut buf).map_err(|e| e.to_string())?;
        ensure(seen.insert(buf), || "repeated random output".into())?;
    }
    ctx.add_random(b"caller entropy");
    let mut buf = [0u8; 16];
    ctx.random(&mut buf).map_err(|e| e.to_string())?;
    ensure(seen.insert(buf), || {
        "repeated random output after add_random".into()
    })
}

fn check_rejections(h: &Harness) -> CheckResult {
    let ctx = h.ctx()?;
    let before = h.counting.counts().crypto;
    let mut out = [0u8; 64];

    for id in [-1, 3, 255] {
        let result = ctx.hmac_raw(id, b"key", b"data", None, &mut out);
        ensure(matches!(result, Err(ProviderError::InvalidAlgorithm { .. })), || {
            format!("hmac accepted algorithm {id}")
        })?;
        let result = ctx.kdf_raw(id, b"password", b"salt", 1, &mut out);
        ensure(matches!(result, Err(ProviderError::InvalidAlgorithm { .. })), || {
            format!("kdf accepted algorithm {id}")
        })?;
    }

    let invalid = [
        (
            "unaligned input",
            ctx.cipher(CipherMode::Encrypt, &[0; 32], &[0; 16], &[0; 17], &mut out),
        ),
        (
            "short key",
            ctx.cipher(CipherMode::Encrypt, &[0; 16], &[0; 16], &[0; 16], &mut out),
        ),
        (
            "short iv",
            ctx.cipher(CipherMode::Decrypt, &[0; 32], &[0; 8], &[0; 16], &mut out),
        ),
        (
            "zero iterations",
            ctx.kdf(HmacAlgorithm::Sha1, b"p", b"s", 0, &mut out),
        ),
    ];
    for (what, result) in invalid {
        ensure(matches!(result, Err(ProviderError::InvalidInput { .. })), || {
            format!("{what} accepted")
        })?;
    }

    let after = h.counting.counts().crypto;
    ensure(before == after, || {
        format!("{} rejected calls reached the back-end", after - before)
    })
}

fn check_edge_inputs(h: &Harness) -> CheckResult {
    let ctx = h.ctx()?;

    for alg in HmacAlgorithm::ALL {
        let mut empty_key = vec![0u8; alg.output_size()];
        let mut zero_key = vec![0u8; alg.output_size()];
        ctx.hmac(alg, b"", b"page", Some(b""), &mut empty_key)
            .map_err(|e| format!("{alg} empty key: {e}"))?;
        ctx.hmac(alg, &[0], b"page", None, &mut zero_key)
            .map_err(|e| format!("{alg} zero key: {e}"))?;
        ensure(empty_key == zero_key, || {
            format!("{alg}: empty key differs from a zero key")
        })?;
    }

    let mut tag = [0u8; 32];
    ctx.hmac(HmacAlgorithm::Sha256, b"", b"", None, &mut tag)
        .map_err(|e| format!("empty key and message: {e}"))?;
    ensure(
        hex_encode(&tag) == "b613679a0814d9ec772f95d778c35fc5ff1697c493715653c6c712144292c5ad",
        || format!("empty key and message: got {}", hex_encode(&tag)),
    )?;

    let mut key = [0u8; 32];
    ctx.kdf(HmacAlgorithm::Sha256, b"", b"", 1, &mut key)
        .map_err(|e| format!("empty password and salt: {e}"))?;
    ensure(
        hex_encode(&key) == "f7ce0b653d2d72a4108cf5abe912ffdd777616dbbb27a70e8204f3ae2d0f6fad",
        || format!("empty password and salt: got {}", hex_encode(&key)),
    )?;

    for alg in HmacAlgorithm::ALL {
        ctx.kdf(alg, b"password", b"salt", 1, &mut [])
            .map_err(|e| format!("{alg} zero-length derive: {e}"))?;
    }

    for mode in [CipherMode::Encrypt, CipherMode::Decrypt] {
        ctx.cipher(mode, &[0x11; 32], &[0x22; 16], &[], &mut [])
            .map_err(|e| format!("{mode:?} empty input: {e}"))?;
    }
    Ok(())
}

fn check_inactive_context(h: &Harness) -> CheckResult {
    let mut ctx = h.ctx()?;
    ctx.free().map_err(|e| e.to_string())?;
    let mut out = [0u8; 32];
    let result = ctx.random(&mut out);
    ensure(matches!(result, Err(ProviderError::NotActive { .. })), || {
        "random through a freed context".into()
    })?;
    let result = ctx.hmac(HmacAlgorithm::Sha256, b"k", b"m", None, &mut out);
    ensure(matches!(result, Err(ProviderError::NotActive { .. })), || {
        "hmac through a freed context".into()
    })
}

fn check_lifecycle(h: &Harness) -> CheckResult {
    let count = h.provider.activation_count();
    ensure(count == 0, || format!("{count} activations outstanding"))?;
    let counts = h.counting.counts();
    ensure(counts.initialized == counts.shut_down, || {
        format!(
            "{} initializations, {} shutdowns",
            counts.initialized, counts.shut_down
        )
    })?;
    ensure(counts.overlapping_transitions == 0, || {
        "overlapping transitions".into()
    })?;
    let result = h.provider.deactivate();
    ensure(matches!(result, Err(ProviderError::ActivationUnderflow)), || {
        "deactivate below zero accepted".into()
    })
}

const CHECKS: &[(&str, fn(&Harness) -> CheckResult)] = &[
    ("metadata", check_metadata),
    ("hmac_vectors", check_hmac_vectors),
    ("kdf_vectors", check_kdf_vectors),
    ("cipher_vectors", check_cipher_vectors),
    ("hmac_output_size", check_hmac_output_size),
    ("cipher_roundtrip", check_cipher_roundtrip),
    ("kdf_sensitivity", check_kdf_sensitivity),
    ("random", check_random),
    ("edge_inputs", check_edge_inputs),
    ("rejections", check_rejections),
    ("inactive_context", check_inactive_context),
    ("lifecycle", check_lifecycle),
];

/// Runs every check against `backend`.
pub fn run_conformance(backend: Arc<dyn CryptoProvider>) -> ConformanceReport {
    let counting = Arc::new(CountingProvider::new(backend));
    let provider = Provider::with_lifecycle(
        counting.clone(),
        Arc::new(ActivationManager::new()),
        &ProviderConfig::default(),
    );
    let harness = Harness { counting, provider };

    let checks = CHECKS
        .iter()
        .map(|&(name, check)| CheckOutcome {
            name,
            error: check(&harness).err(),
        })
        .collect();

    ConformanceReport {
        provider: harness.provider.name(),
        version: harness.provider.version(),
        checks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecrypt_provider::NativeProvider;

    #[test]
    fn native_backend_conforms() {
        let report = run_conformance(Arc::new(NativeProvider::new()));
        let failures: Vec<_> = report.failures().collect();
        assert!(failures.is_empty(), "{failures:?}");
        assert_eq!(report.checks.len(), CHECKS.len());
    }

    #[test]
    fn edge_inputs_accepted_by_every_backend() {
        for kind in pagecrypt_provider::BackendKind::available() {
            let report = run_conformance(kind.create().unwrap());
            let edge = report
                .checks
                .iter()
                .find(|check| check.name == "edge_inputs")
                .unwrap();
            assert_eq!(edge.error, None, "{kind}");
        }
    }
}
