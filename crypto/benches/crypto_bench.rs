use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn sign_compact_bench(c: &mut Criterion) {
    let kp = meridian_crypto::keypair_from_seed(&[42u8; 32]);
    let msg = meridian_crypto::hash256(&[42u8; 128]);

    c.bench_function("sign_compact", |b| {
        b.iter(|| meridian_crypto::sign_compact(black_box(&msg), &kp.private))
    });
}

fn recover_compact_bench(c: &mut Criterion) {
    let kp = meridian_crypto::keypair_from_seed(&[42u8; 32]);
    let msg = meridian_crypto::hash256(&[42u8; 128]);
    let sig = meridian_crypto::sign_compact(&msg, &kp.private).unwrap();

    c.bench_function("recover_compact", |b| {
        b.iter(|| meridian_crypto::recover_compact(black_box(&msg), sig.as_bytes()))
    });
}

fn hash256_bench(c: &mut Criterion) {
    let data = [0xABu8; 256];

    c.bench_function("hash256_256B", |b| {
        b.iter(|| meridian_crypto::hash256(black_box(&data)))
    });
}

criterion_group!(
    benches,
    sign_compact_bench,
    recover_compact_bench,
    hash256_bench
);
criterion_main!(benches);
