//! Info command implementation.

use crate::Format;
use pagecrypt_provider::{HmacAlgorithm, Provider};
use serde::Serialize;

/// Provider metadata.
#[derive(Debug, Serialize)]
pub struct InfoResult {
    /// Provider name.
    pub name: &'static str,
    /// Provider version.
    pub version: &'static str,
    /// Cipher name.
    pub cipher: &'static str,
    /// Key size in bytes.
    pub key_size: usize,
    /// IV size in bytes.
    pub iv_size: usize,
    /// Block size in bytes.
    pub block_size: usize,
    /// HMAC output size per digest.
    pub hmac_sizes: Vec<HmacSize>,
    /// FIPS mode of the library.
    pub fips: String,
}

/// Output size of one digest.
#[derive(Debug, Serialize)]
pub struct HmacSize {
    /// Digest name.
    pub algorithm: &'static str,
    /// Raw algorithm id.
    pub id: i32,
    /// Output size in bytes.
    pub size: usize,
}

/// Collects the metadata of `provider`. Needs no active context.
pub fn collect(provider: &Provider) -> InfoResult {
    InfoResult {
        name: provider.name(),
        version: provider.version(),
        cipher: provider.cipher_name(),
        key_size: provider.key_size(),
        iv_size: provider.iv_size(),
        block_size: provider.block_size(),
        hmac_sizes: HmacAlgorithm::ALL
            .iter()
            .map(|&alg| HmacSize {
                algorithm: alg.name(),
                id: alg.id(),
                size: provider.hmac_size(alg),
            })
            .collect(),
        fips: provider.fips_status().to_string(),
    }
}

/// Runs the info command.
pub fn run(provider: &Provider, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let info = collect(provider);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&info)?),
        Format::Text => {
            println!("Provider: {} {}", info.name, info.version);
            println!("Cipher: {}", info.cipher);
            println!("Key size: {} bytes", info.key_size);
            println!("IV size: {} bytes", info.iv_size);
            println!("Block size: {} bytes", info.block_size);
            for size in &info.hmac_sizes {
                println!(
                    "HMAC {} (id {}): {} bytes",
                    size.algorithm, size.id, size.size
                );
            }
            println!("FIPS mode: {}", info.fips);
        }
    }

    Ok(())
}
