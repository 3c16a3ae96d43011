//! Page cipher benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pagecrypt_bench::{providers, random_array, random_data, PAGE_SIZES};
use pagecrypt_provider::{CipherMode, IV_SIZE, KEY_SIZE};

fn bench_cipher(c: &mut Criterion, mode: CipherMode, group_name: &str) {
    let mut group = c.benchmark_group(group_name);
    let key: [u8; KEY_SIZE] = random_array();
    let iv: [u8; IV_SIZE] = random_array();

    for provider in providers() {
        let ctx = provider.ctx_init().unwrap();
        for &size in &PAGE_SIZES {
            let page = random_data(size);
            let mut out = vec![0u8; size];

            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(provider.name(), size), &size, |b, _| {
                b.iter(|| {
                    ctx.cipher(mode, &key, &iv, black_box(&page), &mut out)
                        .unwrap();
                    black_box(&out);
                });
            });
        }
    }

    group.finish();
}

/// Benchmark page encryption.
fn bench_encrypt(c: &mut Criterion) {
    bench_cipher(c, CipherMode::Encrypt, "page_encrypt");
}

/// Benchmark page decryption.
fn bench_decrypt(c: &mut Criterion) {
    bench_cipher(c, CipherMode::Decrypt, "page_decrypt");
}

/// Benchmark a full context bring-up and tear-down.
fn bench_context_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("context_lifecycle");

    for provider in providers() {
        group.bench_function(provider.name(), |b| {
            b.iter(|| {
                let ctx = provider.ctx_init().unwrap();
                black_box(&ctx);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_encrypt,
    bench_decrypt,
    bench_context_lifecycle
);
criterion_main!(benches);
