use rand::Rng;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use ngham::framing::{scramble, Codec};
use ngham::rs::{Params, RSState, ReedSolomon};

fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen()).collect()
}

fn bench_encode(c: &mut Criterion) {
    let codec = Codec::new().unwrap();
    let payload = random_bytes(220);

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("max_payload", |b| {
        b.iter(|| codec.encode(&payload, 0).unwrap());
    });
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let codec = Codec::new().unwrap();
    let packet = codec.encode(&random_bytes(220), 0).unwrap();
    let mut noisy = packet.clone();
    // some errors in the protected region
    for i in [20, 60, 100, 140, 180, 220] {
        noisy[i] ^= 0x5a;
    }

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(packet.len() as u64));
    group.bench_function("clean", |b| {
        b.iter(|| {
            let outcome = codec.decode(&packet);
            assert_eq!(outcome.corrections(), 0);
        });
    });
    group.bench_function("noisy", |b| {
        b.iter(|| {
            let outcome = codec.decode(&noisy);
            assert_eq!(outcome.corrections(), 6, "expected 6 corrections; got {outcome:?}");
        });
    });
    group.finish();
}

fn bench_rs_correct_codeword(c: &mut Criterion) {
    let rs = ReedSolomon::new(Params::builder().nroots(32).build()).unwrap();
    let mut codeword = random_bytes(rs.data_len());
    let parity = rs.encode(&codeword).unwrap();
    codeword.extend_from_slice(&parity);

    let mut rng = rand::thread_rng();
    for _ in 0..16 {
        let idx = rng.gen_range(0..codeword.len());
        codeword[idx] = codeword[idx].wrapping_add(1);
    }

    let mut group = c.benchmark_group("rs");
    group.throughput(Throughput::Bytes(codeword.len() as u64));
    group.bench_function("correct_codeword", |b| {
        b.iter(|| {
            let block = rs.decode(&codeword, &[]).unwrap();
            assert!(
                matches!(block.state, RSState::Corrected(_)),
                "expected to have corrected codeword; got {:?}",
                block.state
            );
        });
    });
    group.bench_function("construct", |b| {
        b.iter(|| ReedSolomon::new(Params::builder().nroots(32).build()).unwrap());
    });
    group.finish();
}

fn bench_scramble(c: &mut Criterion) {
    let buf = random_bytes(255);

    let mut group = c.benchmark_group("scramble");
    group.throughput(Throughput::Bytes(buf.len() as u64));
    group.bench_function("loop", |b| {
        b.iter(|| {
            let mut dat = buf.clone();
            scramble(&mut dat);
            dat
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_rs_correct_codeword,
    bench_scramble,
);
criterion_main!(benches);
