//! pagecrypt CLI
//!
//! Command-line tools for inspecting and exercising pagecrypt providers.
//!
//! # Commands
//!
//! - `info` - Display provider metadata
//! - `random` - Draw random bytes
//! - `hmac` - Compute an HMAC over one or two inputs
//! - `kdf` - Derive a key with PBKDF2
//! - `cipher` - Encrypt or decrypt block-aligned data
//! - `selftest` - Run the conformance suite against back-ends
//! - `vectors` - Export the known-answer vectors as JSON

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use pagecrypt_provider::{BackendKind, HmacAlgorithm, Provider, ProviderConfig};
use tracing_subscriber::EnvFilter;

/// pagecrypt command-line provider tools.
#[derive(Parser)]
#[command(name = "pagecrypt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Back-end to use (rustcrypto, native, openssl); defaults to PAGECRYPT_BACKEND
    #[arg(global = true, short, long)]
    backend: Option<BackendKind>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value = "text")]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

/// Output format shared by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable text
    Text,
    /// JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Display provider metadata
    Info,

    /// Draw random bytes
    Random {
        /// Number of bytes
        #[arg(short, long, default_value = "32")]
        length: usize,

        /// Hex-encoded entropy to mix in first
        #[arg(short, long)]
        seed: Option<String>,
    },

    /// Compute an HMAC over the concatenation of one or two inputs
    Hmac {
        /// Digest (sha1, sha256, sha512)
        #[arg(short, long, default_value = "sha512", value_parser = parse_algorithm)]
        algorithm: HmacAlgorithm,

        /// Hex-encoded key
        #[arg(short, long)]
        key: String,

        /// Hex-encoded first input
        input: String,

        /// Hex-encoded second input
        input2: Option<String>,
    },

    /// Derive a key with PBKDF2
    Kdf {
        /// Digest (sha1, sha256, sha512)
        #[arg(short, long, default_value = "sha512", value_parser = parse_algorithm)]
        algorithm: HmacAlgorithm,

        /// Password, taken as UTF-8 text
        #[arg(short, long)]
        password: String,

        /// Hex-encoded salt
        #[arg(short, long)]
        salt: String,

        /// Iteration count
        #[arg(short, long, default_value = "256000")]
        iterations: u32,

        /// Derived key length in bytes
        #[arg(short, long, default_value = "32")]
        length: usize,
    },

    /// Encrypt or decrypt block-aligned data with AES-256-CBC
    Cipher {
        /// Decrypt instead of encrypt
        #[arg(short, long)]
        decrypt: bool,

        /// Hex-encoded 32-byte key
        #[arg(short, long)]
        key: String,

        /// Hex-encoded 16-byte IV
        #[arg(short, long)]
        iv: String,

        /// Hex-encoded input, a multiple of 16 bytes
        input: String,
    },

    /// Run the conformance suite
    Selftest {
        /// Test every compiled-in back-end instead of the selected one
        #[arg(short, long)]
        all: bool,
    },

    /// Export the known-answer vectors as JSON
    Vectors,

    /// Show version information
    Version,
}

fn parse_algorithm(s: &str) -> Result<HmacAlgorithm, String> {
    HmacAlgorithm::from_name(s).ok_or_else(|| format!("unknown digest: {s}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ProviderConfig::from_env();
    if let Some(backend) = cli.backend {
        config = config.backend(backend);
    }

    match cli.command {
        Commands::Info => {
            let provider = Provider::from_config(&config)?;
            commands::info::run(&provider, cli.format)?;
        }
        Commands::Random { length, seed } => {
            let provider = Provider::from_config(&config)?;
            commands::crypto::random(&provider, length, seed.as_deref(), cli.format)?;
        }
        Commands::Hmac {
            algorithm,
            key,
            input,
            input2,
        } => {
            let provider = Provider::from_config(&config)?;
            commands::crypto::hmac(
                &provider,
                algorithm,
                &key,
                &input,
                input2.as_deref(),
                cli.format,
            )?;
        }
        Commands::Kdf {
            algorithm,
            password,
            salt,
            iterations,
            length,
        } => {
            let provider = Provider::from_config(&config)?;
            let params = commands::crypto::KdfParams {
                algorithm,
                password: &password,
                salt: &salt,
                iterations,
                length,
            };
            commands::crypto::kdf(&provider, &params, cli.format)?;
        }
        Commands::Cipher {
            decrypt,
            key,
            iv,
            input,
        } => {
            let provider = Provider::from_config(&config)?;
            commands::crypto::cipher(&provider, decrypt, &key, &iv, &input, cli.format)?;
        }
        Commands::Selftest { all } => {
            let kinds = if all {
                BackendKind::available()
            } else {
                vec![config.backend]
            };
            commands::selftest::run(&kinds, cli.format)?;
        }
        Commands::Vectors => {
            commands::vectors::run()?;
        }
        Commands::Version => {
            println!("pagecrypt CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("pagecrypt provider v{}", pagecrypt_provider::VERSION);
            println!("Back-ends: {:?}", BackendKind::available());
        }
    }

    Ok(())
}
