use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sentinel_types::NetworkId;

fn sha256_bench(c: &mut Criterion) {
    let data = [0xABu8; 256];

    c.bench_function("sha256_256B", |b| {
        b.iter(|| sentinel_crypto::sha256(black_box(&data)))
    });
}

fn sha256_4kb_bench(c: &mut Criterion) {
    let data = vec![0xCDu8; 4096];

    c.bench_function("sha256_4KB", |b| {
        b.iter(|| sentinel_crypto::sha256(black_box(&data)))
    });
}

fn address_validation_bench(c: &mut Criterion) {
    let address = "Xags3HEXJ4G4Uuf8va2eSxLCw2KCyEhiJ7";

    c.bench_function("validate_payment_address", |b| {
        b.iter(|| sentinel_crypto::validate_payment_address(black_box(address), NetworkId::Mainnet))
    });
}

fn distance_bench(c: &mut Criterion) {
    let a = sentinel_crypto::sha256(b"left");
    let z = sentinel_crypto::sha256(b"right");

    c.bench_function("abs_distance_256", |b| {
        b.iter(|| sentinel_crypto::abs_distance(black_box(&a), black_box(&z)))
    });
}

criterion_group!(
    benches,
    sha256_bench,
    sha256_4kb_bench,
    address_validation_bench,
    distance_bench
);
criterion_main!(benches);
