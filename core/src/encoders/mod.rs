//! Encoders turning host values into plaintexts and back.
//!
//! [`BatchEncoder`] packs one integer per slot (BFV), [`CkksEncoder`] packs
//! approximate reals (CKKS) and [`IntegerEncoder`] writes a single integer
//! as its binary expansion (BFV).

mod batch;
mod ckks;
mod integer;

pub use batch::BatchEncoder;
pub use ckks::CkksEncoder;
pub use integer::IntegerEncoder;

use crate::error::Error;
use crate::exception::{RawFault, translate};
use crate::vector::HostArray;

/// Rejects a host array whose kind the encoder does not accept.
fn mismatch(expected: &'static str, found: &HostArray) -> Error {
    Error::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}

/// Host-side bound violation, reported like an engine `out_of_range`.
fn out_of_range(message: &str) -> Error {
    Error::from_record(translate(&RawFault::Structured {
        kind: "out_of_range",
        message,
    }))
}
