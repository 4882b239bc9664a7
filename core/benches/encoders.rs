use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sealwrap::{
    BatchEncoder, CkksEncoder, CoeffModulus, Context, EncryptionParameters, HostArray, IntegerEncoder, PlainModulus,
    Plaintext, SchemeType, SecurityLevel,
};

fn context(scheme: SchemeType, log_n: u32) -> Context {
    sealwrap::load().unwrap();
    let n: u64 = 1 << log_n;
    let mut parms: EncryptionParameters = EncryptionParameters::new(scheme).unwrap();
    parms.set_poly_modulus_degree(n).unwrap();
    parms
        .set_coeff_modulus(&CoeffModulus::bfv_default(n, SecurityLevel::Tc128).unwrap())
        .unwrap();
    if scheme == SchemeType::Bfv {
        parms.set_plain_modulus(&PlainModulus::batching(n, 20).unwrap()).unwrap();
    }
    Context::new(&parms, true, SecurityLevel::Tc128).unwrap()
}

fn bench_batch_encoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_encoder");

    for log_n in [12, 13] {
        let encoder: BatchEncoder = BatchEncoder::new(&context(SchemeType::Bfv, log_n)).unwrap();
        let values: HostArray = HostArray::Int32((0..1 << log_n).map(|i| i % 4096 - 2048).collect());
        let plain: Plaintext = encoder.encode(&values).unwrap();
        let mut destination: Plaintext = Plaintext::new().unwrap();

        group.bench_with_input(BenchmarkId::new("encode", 1 << log_n), &values, |b, values| {
            b.iter(|| encoder.encode_into(black_box(values), &mut destination).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("decode", 1 << log_n), &plain, |b, plain| {
            b.iter(|| encoder.decode(black_box(plain), true).unwrap())
        });
    }

    group.finish();
}

fn bench_ckks_encoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("ckks_encoder");

    for log_n in [12, 13] {
        let encoder: CkksEncoder = CkksEncoder::new(&context(SchemeType::Ckks, log_n)).unwrap();
        let slots: usize = encoder.slot_count().unwrap();
        let values: HostArray = HostArray::Float64((0..slots).map(|i| i as f64 / slots as f64).collect());
        let scale: f64 = 2f64.powi(30);
        let plain: Plaintext = encoder.encode(&values, scale, None).unwrap();
        let mut destination: Plaintext = Plaintext::new().unwrap();

        group.bench_with_input(BenchmarkId::new("encode", slots), &values, |b, values| {
            b.iter(|| encoder.encode_into(black_box(values), scale, None, &mut destination).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("decode", slots), &plain, |b, plain| {
            b.iter(|| encoder.decode(black_box(plain)).unwrap())
        });
    }

    group.finish();
}

fn bench_integer_encoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("integer_encoder");

    let encoder: IntegerEncoder = IntegerEncoder::new(&context(SchemeType::Bfv, 12)).unwrap();
    let plain: Plaintext = encoder.encode_i64(-0x1234_5678_9abc).unwrap();

    group.bench_function("encode_i64", |b| b.iter(|| encoder.encode_i64(black_box(-0x1234_5678_9abc)).unwrap()));
    group.bench_function("decode_i64", |b| b.iter(|| encoder.decode_i64(black_box(&plain)).unwrap()));

    group.finish();
}

criterion_group!(benches, bench_batch_encoder, bench_ckks_encoder, bench_integer_encoder);
criterion_main!(benches);
