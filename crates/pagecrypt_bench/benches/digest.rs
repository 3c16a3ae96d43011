//! HMAC, PBKDF2 and RNG benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pagecrypt_bench::{providers, random_array, random_data, PAGE_SIZES};
use pagecrypt_provider::HmacAlgorithm;

/// Benchmark page HMAC for each digest, with the page number as second input.
fn bench_hmac(c: &mut Criterion) {
    let mut group = c.benchmark_group("page_hmac");
    let key: [u8; 64] = random_array();
    let pgno = 7u32.to_le_bytes();

    for provider in providers() {
        let ctx = provider.ctx_init().unwrap();
        for alg in HmacAlgorithm::ALL {
            let page = random_data(4096);
            let mut out = vec![0u8; alg.output_size()];

            group.throughput(Throughput::Bytes(page.len() as u64));
            group.bench_function(BenchmarkId::new(provider.name(), alg), |b| {
                b.iter(|| {
                    ctx.hmac(alg, &key, black_box(&page), Some(&pgno), &mut out)
                        .unwrap();
                    black_box(&out);
                });
            });
        }
    }

    group.finish();
}

/// Benchmark PBKDF2 key derivation.
fn bench_kdf(c: &mut Criterion) {
    let mut group = c.benchmark_group("kdf");
    group.sample_size(10);
    let salt: [u8; 16] = random_array();

    for provider in providers() {
        let ctx = provider.ctx_init().unwrap();
        for iterations in [1_000u32, 10_000] {
            let mut out = [0u8; 32];
            group.bench_with_input(
                BenchmarkId::new(provider.name(), iterations),
                &iterations,
                |b, &iterations| {
                    b.iter(|| {
                        ctx.kdf(
                            HmacAlgorithm::Sha512,
                            b"passphrase",
                            &salt,
                            iterations,
                            &mut out,
                        )
                        .unwrap();
                        black_box(&out);
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark random generation.
fn bench_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("random");

    for provider in providers() {
        let ctx = provider.ctx_init().unwrap();
        for &size in &PAGE_SIZES[..2] {
            let mut out = vec![0u8; size];
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(provider.name(), size), &size, |b, _| {
                b.iter(|| {
                    ctx.random(&mut out).unwrap();
                    black_box(&out);
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_hmac, bench_kdf, bench_random);
criterion_main!(benches);
