//! Reference lattice engine: BFV and CKKS over an RNS coefficient modulus
//! with negacyclic NTTs. Only public-key operations are provided; there are
//! no relinearization or Galois keys.

pub mod arith;
pub mod ciphertext;
pub mod context;
pub mod decryptor;
pub mod encoders;
pub mod encryptor;
pub mod evaluator;
pub mod keys;
pub mod memory;
pub mod modulus;
pub mod ntt;
pub mod parameters;
pub mod plaintext;
pub(crate) mod poly;
pub mod rns;
pub mod serialization;
pub mod vector;
