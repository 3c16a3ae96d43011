//! Vectors command implementation.

use pagecrypt_testkit::all_vectors_json;

/// Prints every known-answer vector as JSON.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", all_vectors_json()?);
    Ok(())
}
