mod common;

use common::Tools;
use sealwrap::{
    BatchEncoder, Ciphertext, CkksEncoder, ErrorCategory, FaultKind, HostArray, IntegerEncoder, ParmsId, Plaintext,
};

fn assert_close(expected: &[f64], decoded: &HostArray, tolerance: f64) {
    let HostArray::Float64(decoded) = decoded else {
        panic!("expected Float64Array, got {}", decoded.type_name());
    };
    expected
        .iter()
        .zip(decoded)
        .for_each(|(a, b)| assert!((a - b).abs() < tolerance, "{a} vs {b}"));
}

#[test]
fn bfv_slots_survive_evaluation() {
    let mut tools: Tools = Tools::new(common::bfv_context());
    let encoder: BatchEncoder = BatchEncoder::new(&tools.context).unwrap();

    let x: Vec<i32> = (0..256).map(|i| i - 128).collect();
    let y: Vec<i32> = (0..256).map(|i| 3 * i).collect();
    let px: Plaintext = encoder.encode(&HostArray::Int32(x.clone())).unwrap();
    let py: Plaintext = encoder.encode(&HostArray::Int32(y.clone())).unwrap();
    let cx: Ciphertext = tools.encryptor.encrypt(&px).unwrap();
    let cy: Ciphertext = tools.encryptor.encrypt_symmetric(&py).unwrap();

    let decode = |tools: &Tools, c: &Ciphertext| -> HostArray {
        encoder.decode(&tools.decryptor.decrypt(c).unwrap(), true).unwrap()
    };

    let sum: Ciphertext = tools.evaluator.add(&cx, &cy).unwrap();
    let expected: Vec<i32> = x.iter().zip(&y).map(|(a, b)| a + b).collect();
    assert_eq!(decode(&tools, &sum), HostArray::Int32(expected));

    let diff: Ciphertext = tools.evaluator.sub(&cx, &cy).unwrap();
    let expected: Vec<i32> = x.iter().zip(&y).map(|(a, b)| a - b).collect();
    assert_eq!(decode(&tools, &diff), HostArray::Int32(expected));

    let mut negated: Ciphertext = cx.deep_copy().unwrap();
    tools.evaluator.negate_inplace(&mut negated).unwrap();
    let expected: Vec<i32> = x.iter().map(|a| -a).collect();
    assert_eq!(decode(&tools, &negated), HostArray::Int32(expected));

    let mut shifted: Ciphertext = Ciphertext::new(None).unwrap();
    tools.evaluator.add_plain_into(&cx, &py, &mut shifted).unwrap();
    tools.evaluator.sub_plain_inplace(&mut shifted, &px).unwrap();
    assert_eq!(decode(&tools, &shifted), HostArray::Int32(y.clone()));

    let product: Ciphertext = tools.evaluator.multiply_plain(&cx, &py).unwrap();
    let expected: Vec<i32> = x.iter().zip(&y).map(|(a, b)| a * b).collect();
    assert_eq!(decode(&tools, &product), HostArray::Int32(expected));
    assert!(tools.decryptor.invariant_noise_budget(&product).unwrap() < tools.decryptor.invariant_noise_budget(&cx).unwrap());
}

#[test]
fn bfv_switching_keeps_the_message() {
    let mut tools: Tools = Tools::new(common::bfv_context());
    let encoder: IntegerEncoder = IntegerEncoder::new(&tools.context).unwrap();
    let cipher: Ciphertext = tools.encryptor.encrypt(&encoder.encode_i64(-1234).unwrap()).unwrap();
    assert_eq!(cipher.parms_id().unwrap(), tools.context.first_parms_id().unwrap());
    assert_eq!(cipher.coeff_modulus_size().unwrap(), 2);

    let last: ParmsId = tools.context.last_parms_id().unwrap();
    let switched: Ciphertext = tools.evaluator.mod_switch_to(&cipher, &last).unwrap();
    assert_eq!(switched.parms_id().unwrap(), last);
    assert_eq!(switched.coeff_modulus_size().unwrap(), 1);
    let plain: Plaintext = tools.decryptor.decrypt(&switched).unwrap();
    assert_eq!(encoder.decode_i64(&plain).unwrap(), -1234);

    // the end of the chain and the way back up both fail
    let err = tools.evaluator.mod_switch_to_next(&switched).unwrap_err();
    assert_eq!(err.kind(), FaultKind::InvalidArgument);
    let first: ParmsId = tools.context.first_parms_id().unwrap();
    let err = tools.evaluator.mod_switch_to(&switched, &first).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NativeFault);
}

#[test]
fn ckks_reals_survive_evaluation() {
    let mut tools: Tools = Tools::new(common::ckks_context());
    let encoder: CkksEncoder = CkksEncoder::new(&tools.context).unwrap();
    let scale: f64 = 2f64.powi(40);
    let slots: usize = encoder.slot_count().unwrap();
    assert_eq!(slots, 128);

    let x: Vec<f64> = (0..slots).map(|i| i as f64 / 16.0 - 4.0).collect();
    let px: Plaintext = encoder.encode(&HostArray::Float64(x.clone()), scale, None).unwrap();
    let two: Plaintext = encoder.encode(&HostArray::Float64(vec![2.0; slots]), scale, None).unwrap();
    let cx: Ciphertext = tools.encryptor.encrypt(&px).unwrap();
    assert_eq!(cx.scale().unwrap(), scale);

    let doubled: Ciphertext = tools.evaluator.add(&cx, &cx).unwrap();
    let expected: Vec<f64> = x.iter().map(|a| a * 2.0).collect();
    assert_close(&expected, &encoder.decode(&tools.decryptor.decrypt(&doubled).unwrap()).unwrap(), 1e-4);

    let mut product: Ciphertext = tools.evaluator.multiply_plain(&cx, &two).unwrap();
    assert_eq!(product.scale().unwrap(), scale * scale);
    tools.evaluator.rescale_to_next_inplace(&mut product).unwrap();
    let next: ParmsId = tools.context.first_context_data().unwrap().next().unwrap().unwrap().parms_id().unwrap();
    assert_eq!(product.parms_id().unwrap(), next);
    assert!((product.scale().unwrap().log2() - 40.0).abs() < 0.1);
    assert_close(&expected, &encoder.decode(&tools.decryptor.decrypt(&product).unwrap()).unwrap(), 1e-4);

    // operands at different levels or scales do not mix
    let err = tools.evaluator.add(&cx, &product).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NativeFault);
    let lowered: Plaintext = tools.evaluator.plain_mod_switch_to_next(&px).unwrap();
    assert_eq!(lowered.parms_id().unwrap(), next);
    let dropped: Ciphertext = tools.evaluator.mod_switch_to_next(&cx).unwrap();
    let sum: Ciphertext = tools.evaluator.add_plain(&dropped, &lowered).unwrap();
    assert_close(&expected, &encoder.decode(&tools.decryptor.decrypt(&sum).unwrap()).unwrap(), 1e-4);
}

#[test]
fn decryption_needs_the_matching_key() {
    let mut tools: Tools = Tools::new(common::bfv_context());
    let other: Tools = Tools::new(common::bfv_context());
    let encoder: BatchEncoder = BatchEncoder::new(&tools.context).unwrap();
    let values: HostArray = HostArray::Uint32(vec![7; 256]);
    let cipher: Ciphertext = tools.encryptor.encrypt(&encoder.encode(&values).unwrap()).unwrap();

    // same parameters, so the foreign decryptor accepts the ciphertext but
    // recovers noise
    let garbage: Plaintext = other.decryptor.decrypt(&cipher).unwrap();
    assert_ne!(encoder.decode(&garbage, false).ok(), Some(values.clone()));
    assert_eq!(encoder.decode(&tools.decryptor.decrypt(&cipher).unwrap(), false).unwrap(), values);
}
