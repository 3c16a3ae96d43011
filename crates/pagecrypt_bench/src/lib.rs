//! Benchmark utilities.

use pagecrypt_provider::{BackendKind, Provider};
use rand::Rng;

/// Page sizes exercised by the cipher benchmarks.
pub const PAGE_SIZES: [usize; 4] = [1024, 4096, 16384, 65536];

/// Generate random data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// A fixed-size random buffer.
pub fn random_array<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::thread_rng().fill(&mut buf[..]);
    buf
}

/// One provider handle per compiled-in back-end.
pub fn providers() -> Vec<Provider> {
    BackendKind::available()
        .into_iter()
        .filter_map(|kind| Provider::for_backend(kind).ok())
        .collect()
}
