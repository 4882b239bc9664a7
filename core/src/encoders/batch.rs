use backend::ffi;

use crate::context::Context;
use crate::encoders::{mismatch, out_of_range};
use crate::error::Result;
use crate::handle::Handle;
use crate::kinds::BatchEncoderKind;
use crate::native;
use crate::plaintext::Plaintext;
use crate::vector::HostArray;

const ACCEPTED: &str = "Int32Array, Uint32Array, BigInt64Array or BigUint64Array";

/// Packs up to [`BatchEncoder::slot_count`] integers modulo the plain
/// modulus into one plaintext. Needs a batching plain modulus.
pub type BatchEncoder = Handle<BatchEncoderKind>;

impl BatchEncoder {
    pub fn new(context: &Context) -> Result<BatchEncoder> {
        let context: *const ffi::context_t = context.as_const()?;
        native::construct(|out| unsafe { ffi::encoders::seal_batch_encoder_create(context, out) })
    }

    /// Equal to the polynomial modulus degree.
    pub fn slot_count(&self) -> Result<usize> {
        let this: *const ffi::batch_encoder_t = self.as_const()?;
        native::read(|out| unsafe { ffi::encoders::seal_batch_encoder_slot_count(this, out) }).map(|n: u64| n as usize)
    }

    pub fn encode(&self, values: &HostArray) -> Result<Plaintext> {
        let mut destination: Plaintext = Plaintext::new()?;
        self.encode_into(values, &mut destination)?;
        Ok(destination)
    }

    /// Signed arrays must lie in `[-(t-1)/2, (t-1)/2]`, unsigned ones in
    /// `[0, t)`. Unused slots are zero.
    pub fn encode_into(&self, values: &HostArray, destination: &mut Plaintext) -> Result<()> {
        match values {
            HostArray::Int32(v) => {
                let wide: Vec<i64> = v.iter().map(|x| i64::from(*x)).collect();
                self.encode_signed(&wide, destination)
            }
            HostArray::BigInt64(v) => self.encode_signed(v, destination),
            HostArray::Uint32(v) => {
                let wide: Vec<u64> = v.iter().map(|x| u64::from(*x)).collect();
                self.encode_unsigned(&wide, destination)
            }
            HostArray::BigUint64(v) => self.encode_unsigned(v, destination),
            HostArray::Float64(_) | HostArray::Untyped(_) => Err(mismatch(ACCEPTED, values)),
        }
    }

    fn encode_signed(&self, values: &[i64], destination: &mut Plaintext) -> Result<()> {
        let this: *const ffi::batch_encoder_t = self.as_const()?;
        native::check(unsafe {
            ffi::encoders::seal_batch_encoder_encode_i64(this, values.as_ptr(), values.len() as u64, destination.as_ptr()?)
        })?;
        Ok(())
    }

    fn encode_unsigned(&self, values: &[u64], destination: &mut Plaintext) -> Result<()> {
        let this: *const ffi::batch_encoder_t = self.as_const()?;
        native::check(unsafe {
            ffi::encoders::seal_batch_encoder_encode_u64(this, values.as_ptr(), values.len() as u64, destination.as_ptr()?)
        })?;
        Ok(())
    }

    fn decode_signed(&self, plain: &Plaintext) -> Result<Vec<i64>> {
        let this: *const ffi::batch_encoder_t = self.as_const()?;
        let plain: *const ffi::plaintext_t = plain.as_const()?;
        native::read_buffer(|buf, len| unsafe { ffi::encoders::seal_batch_encoder_decode_i64(this, plain, buf, len) })
    }

    fn decode_unsigned(&self, plain: &Plaintext) -> Result<Vec<u64>> {
        let this: *const ffi::batch_encoder_t = self.as_const()?;
        let plain: *const ffi::plaintext_t = plain.as_const()?;
        native::read_buffer(|buf, len| unsafe { ffi::encoders::seal_batch_encoder_decode_u64(this, plain, buf, len) })
    }

    /// Every slot as an `Int32Array` (centered) or a `Uint32Array`. Fails
    /// with a range error when a slot does not fit 32 bits; use
    /// [`BatchEncoder::decode_bigint`] for wide plain moduli.
    pub fn decode(&self, plain: &Plaintext, signed: bool) -> Result<HostArray> {
        if signed {
            let values: Vec<i32> = self
                .decode_signed(plain)?
                .into_iter()
                .map(|v| i32::try_from(v).map_err(|_| out_of_range(&format!("slot value {v} does not fit Int32"))))
                .collect::<Result<Vec<i32>>>()?;
            return Ok(HostArray::Int32(values));
        }
        let values: Vec<u32> = self
            .decode_unsigned(plain)?
            .into_iter()
            .map(|v| u32::try_from(v).map_err(|_| out_of_range(&format!("slot value {v} does not fit Uint32"))))
            .collect::<Result<Vec<u32>>>()?;
        Ok(HostArray::Uint32(values))
    }

    /// Every slot as a `BigInt64Array` (centered) or a `BigUint64Array`.
    pub fn decode_bigint(&self, plain: &Plaintext, signed: bool) -> Result<HostArray> {
        match signed {
            true => self.decode_signed(plain).map(HostArray::BigInt64),
            false => self.decode_unsigned(plain).map(HostArray::BigUint64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::{bfv_context, ckks_context};
    use crate::error::ErrorCategory;
    use crate::vector::HostScalar;

    #[test]
    fn signed_and_unsigned_are_exact() {
        let encoder: BatchEncoder = BatchEncoder::new(&bfv_context()).unwrap();
        assert_eq!(encoder.slot_count().unwrap(), 64);

        let signed: Vec<i32> = (0..64).map(|i| i * 3 - 90).collect();
        let plain: Plaintext = encoder.encode(&HostArray::Int32(signed.clone())).unwrap();
        assert_eq!(encoder.decode(&plain, true).unwrap(), HostArray::Int32(signed));

        let unsigned: Vec<u64> = vec![0, 1, 2, 40000];
        let plain: Plaintext = encoder.encode(&HostArray::BigUint64(unsigned.clone())).unwrap();
        let mut padded: Vec<u64> = unsigned;
        padded.resize(64, 0);
        assert_eq!(encoder.decode_bigint(&plain, false).unwrap(), HostArray::BigUint64(padded));
    }

    #[test]
    fn unsupported_arrays_are_type_mismatches() {
        let encoder: BatchEncoder = BatchEncoder::new(&bfv_context()).unwrap();
        let err = encoder.encode(&HostArray::Float64(vec![1.0])).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::TypeMismatch);
        let err = encoder.encode(&HostArray::Untyped(vec![HostScalar::Int32(1)])).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::TypeMismatch);
    }

    #[test]
    fn bounds_are_range_errors() {
        let encoder: BatchEncoder = BatchEncoder::new(&bfv_context()).unwrap();
        let too_many: HostArray = HostArray::Uint32(vec![1; 65]);
        assert_eq!(encoder.encode(&too_many).unwrap_err().category(), ErrorCategory::Range);
        let too_large: HostArray = HostArray::BigUint64(vec![u64::MAX]);
        assert_eq!(encoder.encode(&too_large).unwrap_err().category(), ErrorCategory::Range);
        let too_negative: HostArray = HostArray::Int32(vec![i32::MIN]);
        assert_eq!(encoder.encode(&too_negative).unwrap_err().category(), ErrorCategory::Range);
    }

    #[test]
    fn needs_a_batching_context() {
        let err = BatchEncoder::new(&ckks_context()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Construction);
    }
}
