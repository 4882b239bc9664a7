//! # sealwrap-backend
//!
//! Reference lattice homomorphic encryption engine (BFV and CKKS over the
//! ring `Z[X]/(X^N + 1)` in RNS form) and its C ABI.
//!
//! The [`engine`] module holds the arithmetic and the object model: moduli,
//! encryption parameters, the modulus switching chain, plaintexts,
//! ciphertexts, keys, the three encoders and the key-free evaluator.
//!
//! The [`ffi`] module is the only surface meant for bindings. Objects cross
//! it as opaque pointers, every call returns an `HRESULT` and failures are
//! parked in a per-thread fault registry as a [`NativeFault`].

pub mod engine;
pub mod fault;
pub mod ffi;

pub use fault::{FaultKind, NativeFault, Result};
