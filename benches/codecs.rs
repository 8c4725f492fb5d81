use criterion::*;
use mimalloc::MiMalloc;
use tokenlayer::chain::Network;
use tokenlayer::consensus::*;
use tokenlayer::primitives::*;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn bench_base58(c: &mut Criterion) {
    let payload = hex::decode("65a16059864a2fdbc7c99a4723a8395bc6f188eb").unwrap();
    let address = base58::check_encode(&payload, ADDRESS_VERSION_MAINNET);

    c.bench_function("base58 check encode", |b| {
        b.iter(|| base58::check_encode(black_box(&payload), ADDRESS_VERSION_MAINNET))
    });

    c.bench_function("base58 check decode", |b| {
        b.iter(|| base58::check_decode(black_box(&address), ADDRESS_VERSION_MAINNET).unwrap())
    });
}

fn bench_multisig(c: &mut Criterion) {
    let address = "1_1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2_1AGNa15ZQXAZUgFiqJ2i7Z2DPU2J6hW62i_2";

    c.bench_function("multisig canonical address", |b| {
        b.iter(|| {
            multisig::canonical_address(black_box(address), ADDRESS_VERSION_MAINNET).unwrap()
        })
    });
}

fn bench_asset_ids(c: &mut Criterion) {
    let gate = ProtocolGate::with_default_changes(Network::Mainnet).unwrap();

    c.bench_function("generate alphabetic asset id", |b| {
        b.iter(|| generate_asset_id(black_box("PEPECASH"), 400_000, &gate).unwrap())
    });

    c.bench_function("generate numeric asset name", |b| {
        b.iter(|| generate_asset_name(black_box(u64::MAX - 1), 400_000, &gate).unwrap())
    });
}

pub fn codecs_benchmark(c: &mut Criterion) {
    bench_base58(c);
    bench_multisig(c);
    bench_asset_ids(c);
}

criterion_group!(benches, codecs_benchmark);
criterion_main!(benches);
