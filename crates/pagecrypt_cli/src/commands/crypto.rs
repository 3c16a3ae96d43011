//! Commands that drive one crypto operation through a fresh context.

use crate::Format;
use pagecrypt_provider::{CipherMode, HmacAlgorithm, Provider};
use pagecrypt_testkit::{hex_decode, hex_encode};
use serde::Serialize;

/// Output of a single operation.
#[derive(Debug, Serialize)]
pub struct OperationResult {
    /// Operation name.
    pub operation: &'static str,
    /// Digest used, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<&'static str>,
    /// Provider that produced the output.
    pub provider: &'static str,
    /// Hex-encoded output.
    pub output_hex: String,
}

fn print(result: &OperationResult, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(result)?),
        Format::Text => println!("{}", result.output_hex),
    }
    Ok(())
}

/// Runs the random command.
pub fn random(
    provider: &Provider,
    length: usize,
    seed: Option<&str>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = provider.ctx_init()?;
    if let Some(seed) = seed {
        ctx.add_random(&hex_decode(seed)?);
    }
    let mut out = vec![0u8; length];
    ctx.random(&mut out)?;

    print(
        &OperationResult {
            operation: "random",
            algorithm: None,
            provider: provider.name(),
            output_hex: hex_encode(&out),
        },
        format,
    )
}

/// Runs the hmac command.
pub fn hmac(
    provider: &Provider,
    algorithm: HmacAlgorithm,
    key: &str,
    input: &str,
    input2: Option<&str>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let key = hex_decode(key)?;
    let input = hex_decode(input)?;
    let input2 = input2.map(hex_decode).transpose()?;

    let ctx = provider.ctx_init()?;
    let mut out = vec![0u8; provider.hmac_size(algorithm)];
    ctx.hmac(algorithm, &key, &input, input2.as_deref(), &mut out)?;

    print(
        &OperationResult {
            operation: "hmac",
            algorithm: Some(algorithm.name()),
            provider: provider.name(),
            output_hex: hex_encode(&out),
        },
        format,
    )
}

/// Arguments of the kdf command.
#[derive(Debug)]
pub struct KdfParams<'a> {
    /// Digest.
    pub algorithm: HmacAlgorithm,
    /// Password text.
    pub password: &'a str,
    /// Hex-encoded salt.
    pub salt: &'a str,
    /// Iteration count.
    pub iterations: u32,
    /// Derived key length.
    pub length: usize,
}

/// Runs the kdf command.
pub fn kdf(
    provider: &Provider,
    params: &KdfParams<'_>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let salt = hex_decode(params.salt)?;

    let ctx = provider.ctx_init()?;
    let mut out = vec![0u8; params.length];
    ctx.kdf(
        params.algorithm,
        params.password.as_bytes(),
        &salt,
        params.iterations,
        &mut out,
    )?;

    print(
        &OperationResult {
            operation: "kdf",
            algorithm: Some(params.algorithm.name()),
            provider: provider.name(),
            output_hex: hex_encode(&out),
        },
        format,
    )
}

/// Runs the cipher command.
pub fn cipher(
    provider: &Provider,
    decrypt: bool,
    key: &str,
    iv: &str,
    input: &str,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let key = hex_decode(key)?;
    let iv = hex_decode(iv)?;
    let input = hex_decode(input)?;
    let mode = if decrypt {
        CipherMode::Decrypt
    } else {
        CipherMode::Encrypt
    };

    let ctx = provider.ctx_init()?;
    let mut out = vec![0u8; input.len()];
    ctx.cipher(mode, &key, &iv, &input, &mut out)?;

    print(
        &OperationResult {
            operation: if decrypt { "decrypt" } else { "encrypt" },
            algorithm: None,
            provider: provider.name(),
            output_hex: hex_encode(&out),
        },
        format,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecrypt_provider::BackendKind;

    #[test]
    fn rejects_bad_hex() {
        let provider = Provider::for_backend(BackendKind::RustCrypto).unwrap();
        let err = hmac(
            &provider,
            HmacAlgorithm::Sha256,
            "zz",
            "00",
            None,
            Format::Text,
        );
        assert!(err.is_err());
        assert_eq!(provider.activation_count(), 0);
    }

    #[test]
    fn rejects_unaligned_cipher_input() {
        let provider = Provider::for_backend(BackendKind::RustCrypto).unwrap();
        let key = "00".repeat(32);
        let iv = "00".repeat(16);
        let result = cipher(&provider, false, &key, &iv, "0011", Format::Json);
        assert!(result.is_err());
        assert_eq!(provider.activation_count(), 0);
    }
}
