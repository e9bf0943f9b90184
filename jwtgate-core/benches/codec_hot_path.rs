//! Performance benchmarks for the token hot paths
//!
//! Every gated request pays one verify; every login or refresh pays one mint.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jwtgate_core::*;
use std::sync::Arc;
use std::time::Duration;

const NOW: UnixTime = 1_700_000_000;

fn codec_for(algorithm: Algorithm) -> TokenCodec {
    let key: &[u8] = match algorithm {
        Algorithm::EdDSA => &[7u8; 32],
        _ => b"bench secret key",
    };
    let signer = signer_for(algorithm, key).unwrap();
    TokenCodec::new(signer, Duration::from_secs(3600), true)
}

fn bench_mint(c: &mut Criterion) {
    let mut group = c.benchmark_group("mint");

    for algorithm in [Algorithm::HS256, Algorithm::HS512, Algorithm::EdDSA] {
        let codec = codec_for(algorithm);
        group.bench_with_input(
            BenchmarkId::from_parameter(algorithm),
            &algorithm,
            |b, _| {
                b.iter(|| black_box(codec.mint_at(black_box("alice"), None, NOW).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("verify");

    for algorithm in [Algorithm::HS256, Algorithm::HS512, Algorithm::EdDSA] {
        let codec = codec_for(algorithm);
        let token = codec.mint_at("alice", None, NOW).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(algorithm),
            &algorithm,
            |b, _| {
                b.iter(|| black_box(codec.verify_at(black_box(&token), NOW).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_refresh(c: &mut Criterion) {
    let codec = codec_for(Algorithm::HS256);
    let token = codec.mint_at("alice", None, NOW).unwrap();
    let claims = codec.verify_at(&token, NOW).unwrap();
    let window = Duration::from_secs(7 * 24 * 3600);

    c.bench_function("refresh_hs256", |b| {
        b.iter(|| black_box(codec.refresh_at(&claims, window, NOW + 60).unwrap()));
    });
}

fn bench_rejections(c: &mut Criterion) {
    let codec = codec_for(Algorithm::HS256);
    let other = TokenCodec::new(
        Arc::new(HmacSigner::new(Algorithm::HS256, b"other key").unwrap()),
        Duration::from_secs(3600),
        false,
    );
    let foreign = other.mint_at("mallory", None, NOW).unwrap();

    let mut group = c.benchmark_group("reject");
    group.bench_function("bad_signature", |b| {
        b.iter(|| black_box(codec.verify_at(black_box(&foreign), NOW).is_err()));
    });
    group.bench_function("malformed", |b| {
        b.iter(|| black_box(codec.verify_at(black_box("not.a.token"), NOW).is_err()));
    });
    group.finish();
}

criterion_group!(benches, bench_mint, bench_verify, bench_refresh, bench_rejections);
criterion_main!(benches);
