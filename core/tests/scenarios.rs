mod common;

use sealwrap::{
    BatchEncoder, CkksEncoder, CoeffModulus, Context, EncryptionParameters, HostArray, ParmsId, Plaintext,
    PlainModulus, SchemeType, SecurityLevel,
};

fn default_bfv(degree: u64) -> EncryptionParameters {
    common::init();
    let mut parms: EncryptionParameters = EncryptionParameters::new(SchemeType::Bfv).unwrap();
    parms.set_poly_modulus_degree(degree).unwrap();
    parms
        .set_coeff_modulus(&CoeffModulus::bfv_default(degree, SecurityLevel::Tc128).unwrap())
        .unwrap();
    parms.set_plain_modulus(&PlainModulus::batching(degree, 20).unwrap()).unwrap();
    parms
}

#[test]
fn parms_id_is_stable_across_rebuilds() {
    let a: EncryptionParameters = default_bfv(4096);
    let b: EncryptionParameters = default_bfv(4096);
    assert_eq!(a.parms_id().unwrap(), b.parms_id().unwrap());
    assert_ne!(a.parms_id().unwrap(), ParmsId::ZERO);
    assert_ne!(a.parms_id().unwrap(), default_bfv(2048).parms_id().unwrap());

    let context: Context = Context::new(&a, true, SecurityLevel::Tc128).unwrap();
    assert!(context.parameters_set().unwrap());
    assert_eq!(context.key_parms_id().unwrap(), a.parms_id().unwrap());
    assert_eq!(
        context.key_context_data().unwrap().parms().unwrap().parms_id().unwrap(),
        b.parms_id().unwrap()
    );
}

#[test]
fn batch_encoding_is_exact() {
    let context: Context = Context::new(&default_bfv(4096), true, SecurityLevel::Tc128).unwrap();
    let encoder: BatchEncoder = BatchEncoder::new(&context).unwrap();
    assert_eq!(encoder.slot_count().unwrap(), 4096);

    let signed: Vec<i32> = (0..4096).map(|i| (i % 1000) - 500).collect();
    let plain: Plaintext = encoder.encode(&HostArray::Int32(signed.clone())).unwrap();
    assert_eq!(encoder.decode(&plain, true).unwrap(), HostArray::Int32(signed));

    let unsigned: Vec<u32> = (0..4096).map(|i| i * 101 % 65536).collect();
    let plain: Plaintext = encoder.encode(&HostArray::Uint32(unsigned.clone())).unwrap();
    assert_eq!(encoder.decode(&plain, false).unwrap(), HostArray::Uint32(unsigned));

    let wide: Vec<i64> = vec![-1, 2, -3];
    let plain: Plaintext = encoder.encode(&HostArray::BigInt64(wide.clone())).unwrap();
    let HostArray::BigInt64(decoded) = encoder.decode_bigint(&plain, true).unwrap() else {
        panic!("expected BigInt64Array");
    };
    assert_eq!(decoded[..3], wide[..]);
    assert!(decoded[3..].iter().all(|x| *x == 0));
}

#[test]
fn ckks_encoding_is_close() {
    common::init();
    let mut parms: EncryptionParameters = EncryptionParameters::new(SchemeType::Ckks).unwrap();
    parms.set_poly_modulus_degree(4096).unwrap();
    parms.set_coeff_modulus(&CoeffModulus::create(4096, &[36, 36, 37]).unwrap()).unwrap();
    let context: Context = Context::new(&parms, true, SecurityLevel::Tc128).unwrap();
    let encoder: CkksEncoder = CkksEncoder::new(&context).unwrap();
    assert_eq!(encoder.slot_count().unwrap(), 2048);

    let values: Vec<f64> = (0..2048).map(|i| (i as f64 * 0.01).sin() * 10.0).collect();
    let plain: Plaintext = encoder.encode(&HostArray::Float64(values.clone()), 2f64.powi(30), None).unwrap();
    let HostArray::Float64(decoded) = encoder.decode(&plain).unwrap() else {
        panic!("expected Float64Array");
    };
    assert_eq!(decoded.len(), 2048);
    values
        .iter()
        .zip(&decoded)
        .for_each(|(a, b)| assert!((a - b).abs() < 1e-5, "{a} vs {b}"));
}
