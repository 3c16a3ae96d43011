//! Selftest command implementation.

use crate::Format;
use pagecrypt_provider::BackendKind;
use pagecrypt_testkit::{run_conformance, ConformanceReport};
use tracing::{info, warn};

/// Runs the conformance suite against each back-end in `kinds`.
pub fn run(kinds: &[BackendKind], format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let mut reports: Vec<ConformanceReport> = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        info!(backend = %kind, "running conformance suite");
        reports.push(run_conformance(kind.create()?));
    }

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        Format::Text => {
            for report in &reports {
                println!("=== {} {} ===", report.provider, report.version);
                for check in &report.checks {
                    match &check.error {
                        None => println!("  ok    {}", check.name),
                        Some(error) => println!("  FAIL  {}: {error}", check.name),
                    }
                }
            }
        }
    }

    let failed = reports.iter().filter(|r| !r.passed()).count();
    if failed > 0 {
        warn!(failed, "conformance failures");
        return Err(
            format!("{failed} back-end(s) failed the conformance suite").into(),
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_backends_pass() {
        run(&BackendKind::available(), Format::Json).unwrap();
    }
}
