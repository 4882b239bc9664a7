#![allow(dead_code)]

use sealwrap::{
    CoeffModulus, Context, Decryptor, EncryptionParameters, Encryptor, Evaluator, KeyGenerator, PlainModulus,
    PublicKey, SchemeType, SecretKey, SecurityLevel,
};

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
    sealwrap::load().unwrap();
}

pub fn bfv_parms(degree: u64, bit_sizes: &[i32], plain_bits: i32) -> EncryptionParameters {
    init();
    let mut parms: EncryptionParameters = EncryptionParameters::new(SchemeType::Bfv).unwrap();
    parms.set_poly_modulus_degree(degree).unwrap();
    parms.set_coeff_modulus(&CoeffModulus::create(degree, bit_sizes).unwrap()).unwrap();
    parms.set_plain_modulus(&PlainModulus::batching(degree, plain_bits).unwrap()).unwrap();
    parms
}

/// Batching BFV context: 256 coefficients, three 40-bit primes.
pub fn bfv_context() -> Context {
    Context::new(&bfv_parms(256, &[40, 40, 40], 20), true, SecurityLevel::None).unwrap()
}

/// CKKS context: 256 coefficients, a 60-bit special prime and two 40-bit
/// data primes.
pub fn ckks_context() -> Context {
    init();
    let mut parms: EncryptionParameters = EncryptionParameters::new(SchemeType::Ckks).unwrap();
    parms.set_poly_modulus_degree(256).unwrap();
    parms.set_coeff_modulus(&CoeffModulus::create(256, &[60, 40, 40, 60]).unwrap()).unwrap();
    Context::new(&parms, true, SecurityLevel::None).unwrap()
}

pub struct Tools {
    pub context: Context,
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
    pub encryptor: Encryptor,
    pub decryptor: Decryptor,
    pub evaluator: Evaluator,
}

impl Tools {
    pub fn new(context: Context) -> Tools {
        let mut keygen: KeyGenerator = KeyGenerator::new(&context).unwrap();
        let secret_key: SecretKey = keygen.secret_key().unwrap();
        let public_key: PublicKey = keygen.create_public_key().unwrap();
        let encryptor: Encryptor = Encryptor::new(&context, Some(&public_key), Some(&secret_key)).unwrap();
        let decryptor: Decryptor = Decryptor::new(&context, &secret_key).unwrap();
        let evaluator: Evaluator = Evaluator::new(&context).unwrap();
        Tools {
            context,
            secret_key,
            public_key,
            encryptor,
            decryptor,
            evaluator,
        }
    }
}
