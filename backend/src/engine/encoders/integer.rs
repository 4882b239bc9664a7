use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::engine::context::Context;
use crate::engine::parameters::{ParmsId, SchemeType};
use crate::engine::plaintext::Plaintext;
use crate::fault::{NativeFault, Result};

/// Encodes a single integer as its binary expansion: bit `i` becomes the
/// coefficient of `x^i`. Negative integers use `t - 1` for their set bits.
pub struct IntegerEncoder {
    plain_modulus: u64,
}

impl IntegerEncoder {
    pub fn new(context: &Context) -> Result<IntegerEncoder> {
        context.require_set()?;
        if context.scheme() != SchemeType::Bfv {
            return Err(NativeFault::invalid_argument("unsupported scheme"));
        }
        let plain_modulus: u64 = context.first_context_data().plain_modulus();
        if plain_modulus < 2 {
            return Err(NativeFault::invalid_argument("plain_modulus must be at least 2"));
        }
        Ok(IntegerEncoder { plain_modulus })
    }

    pub fn plain_modulus(&self) -> u64 {
        self.plain_modulus
    }

    fn encode_bits(&self, magnitude: u64, digit: u64, destination: &mut Plaintext) {
        let len: usize = (u64::BITS - magnitude.leading_zeros()) as usize;
        let data: Vec<u64> = (0..len)
            .map(|i| if (magnitude >> i) & 1 == 1 { digit } else { 0 })
            .collect();
        destination.assign(data, ParmsId::ZERO, 1.0);
    }

    pub fn encode_u64(&self, value: u64, destination: &mut Plaintext) {
        self.encode_bits(value, 1, destination);
    }

    pub fn encode_i64(&self, value: i64, destination: &mut Plaintext) {
        let digit: u64 = if value < 0 { self.plain_modulus - 1 } else { 1 };
        self.encode_bits(value.unsigned_abs(), digit, destination);
    }

    /// Evaluates the plaintext at 2, reading coefficients above `t/2` as
    /// negative.
    fn decode_bigint(&self, plain: &Plaintext) -> Result<BigInt> {
        if !plain.parms_id().is_zero() {
            return Err(NativeFault::invalid_argument("plain cannot be at a ciphertext level"));
        }
        let t: u64 = self.plain_modulus;
        let threshold: u64 = (t + 1) >> 1;
        plain.data().iter().rev().try_fold(BigInt::default(), |acc, c| {
            if *c >= t {
                return Err(NativeFault::invalid_argument("plain does not represent a valid plaintext polynomial"));
            }
            let digit: BigInt = if *c >= threshold {
                BigInt::from(*c) - BigInt::from(t)
            } else {
                BigInt::from(*c)
            };
            Ok((acc << 1u32) + digit)
        })
    }

    fn out_of_range() -> NativeFault {
        NativeFault::out_of_range("output out of range")
    }

    pub fn decode_u64(&self, plain: &Plaintext) -> Result<u64> {
        self.decode_bigint(plain)?.to_u64().ok_or_else(Self::out_of_range)
    }

    pub fn decode_i64(&self, plain: &Plaintext) -> Result<i64> {
        self.decode_bigint(plain)?.to_i64().ok_or_else(Self::out_of_range)
    }

    pub fn decode_u32(&self, plain: &Plaintext) -> Result<u32> {
        self.decode_bigint(plain)?.to_u32().ok_or_else(Self::out_of_range)
    }

    pub fn decode_i32(&self, plain: &Plaintext) -> Result<i32> {
        self.decode_bigint(plain)?.to_i32().ok_or_else(Self::out_of_range)
    }
}
