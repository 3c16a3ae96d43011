//! Stress tests for provider handles.
//!
//! These drive one provider from many threads at once, the way a database
//! with many connections does.

use pagecrypt_provider::{CipherMode, HmacAlgorithm, Provider, ProviderError, ProviderResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {name} ===");
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent threads.
    pub threads: usize,
    /// Operations per thread.
    pub operations: usize,
    /// Page size for cipher operations, a multiple of the block size.
    pub page_size: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            operations: 200,
            page_size: 4096,
        }
    }
}

fn run_threads<F>(config: &StressConfig, op: F) -> StressTestResult
where
    F: Fn(usize, usize) -> ProviderResult<()> + Send + Sync + 'static,
{
    let op = Arc::new(op);
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(config.threads));
    let operations = config.operations;

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let op = Arc::clone(&op);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();
                for i in 0..operations {
                    match op(t, i) {
                        Ok(()) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Each operation opens a context, draws random bytes and frees it.
pub fn stress_context_lifecycle(provider: &Provider, config: &StressConfig) -> StressTestResult {
    let provider = provider.clone();
    run_threads(config, move |_, _| {
        let mut ctx = provider.ctx_init()?;
        let mut buf = [0u8; 16];
        ctx.random(&mut buf)?;
        ctx.free()
    })
}

/// Each operation seals, opens and authenticates a page through a fresh context.
pub fn stress_page_cipher(provider: &Provider, config: &StressConfig) -> StressTestResult {
    let provider = provider.clone();
    let page_size = config.page_size;
    run_threads(config, move |t, i| {
        let ctx = provider.ctx_init()?;
        let key = [t as u8; 32];
        let mut iv = [0u8; 16];
        ctx.random(&mut iv)?;

        let page = vec![i as u8; page_size];
        let mut sealed = vec![0u8; page_size];
        let mut opened = vec![0u8; page_size];
        ctx.cipher(CipherMode::Encrypt, &key, &iv, &page, &mut sealed)?;
        ctx.cipher(CipherMode::Decrypt, &key, &iv, &sealed, &mut opened)?;

        let mut tag = [0u8; 64];
        ctx.hmac(
            HmacAlgorithm::Sha512,
            &key,
            &sealed,
            Some(&iv[..]),
            &mut tag,
        )?;

        if opened == page {
            Ok(())
        } else {
            Err(ProviderError::library(
                "page round trip",
                0,
                "decrypted page differs",
            ))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecrypt_provider::ProviderConfig;

    #[test]
    fn lifecycle_stress_balances() {
        let provider = Provider::from_config(&ProviderConfig::default()).unwrap();
        let config = StressConfig {
            threads: 4,
            operations: 50,
            ..StressConfig::default()
        };

        let result = stress_context_lifecycle(&provider, &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.successful_ops, 200);
        assert_eq!(provider.activation_count(), 0);
    }
}
