use std::sync::Arc;

use crate::engine::arith::bit_reverse;
use crate::engine::context::{Context, ContextData};
use crate::engine::ntt::NttTable;
use crate::engine::parameters::ParmsId;
use crate::engine::plaintext::Plaintext;
use crate::fault::{NativeFault, Result};

/// Packs `n` integers modulo a prime `t = 1 mod 2n` into one plaintext.
///
/// Slots form a `2 x n/2` matrix: slot `i` of row 0 sits at the root
/// `psi^(5^i)`, slot `i` of row 1 at `psi^(-5^i)`.
pub struct BatchEncoder {
    level: Arc<ContextData>,
    slots: usize,
    index_map: Vec<usize>,
}

impl BatchEncoder {
    pub fn new(context: &Context) -> Result<BatchEncoder> {
        context.require_set()?;
        let level: Arc<ContextData> = context.first_context_data().clone();
        if !level.qualifiers().using_batching {
            return Err(NativeFault::invalid_argument(
                "encryption parameters are not valid for batching",
            ));
        }
        let slots: usize = level.poly_modulus_degree();
        Ok(BatchEncoder {
            index_map: Self::index_map(slots),
            level,
            slots,
        })
    }

    /// Position in the plain NTT output of every matrix slot.
    fn index_map(n: usize) -> Vec<usize> {
        let log_n: u32 = n.trailing_zeros();
        let row: usize = n >> 1;
        let m: u64 = 2 * n as u64;
        let mut map: Vec<usize> = vec![0; n];
        let mut pos: u64 = 1;
        for i in 0..row {
            map[i] = bit_reverse(((pos - 1) >> 1) as usize, log_n);
            map[row + i] = bit_reverse(((m - pos - 1) >> 1) as usize, log_n);
            pos = pos * 5 % m;
        }
        map
    }

    pub fn slot_count(&self) -> usize {
        self.slots
    }

    fn plain_modulus(&self) -> u64 {
        self.level.plain_modulus()
    }

    fn table(&self) -> Result<&NttTable> {
        self.level
            .plain_ntt()
            .ok_or_else(|| NativeFault::logic_error("plain modulus does not support batching"))
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len > self.slots {
            return Err(NativeFault::out_of_range(format!(
                "values has size {len}, larger than slot count {}",
                self.slots
            )));
        }
        Ok(())
    }

    fn encode_slots(&self, slots: Vec<u64>, destination: &mut Plaintext) -> Result<()> {
        let mut temp: Vec<u64> = vec![0; self.slots];
        slots.into_iter().enumerate().for_each(|(i, v)| temp[self.index_map[i]] = v);
        self.table()?.backward_inplace(&mut temp);
        destination.assign(temp, ParmsId::ZERO, 1.0);
        Ok(())
    }

    pub fn encode_u64(&self, values: &[u64], destination: &mut Plaintext) -> Result<()> {
        self.check_len(values.len())?;
        let t: u64 = self.plain_modulus();
        if let Some(v) = values.iter().find(|v| **v >= t) {
            return Err(NativeFault::out_of_range(format!("value {v} is not reduced modulo {t}")));
        }
        self.encode_slots(values.to_vec(), destination)
    }

    pub fn encode_i64(&self, values: &[i64], destination: &mut Plaintext) -> Result<()> {
        self.check_len(values.len())?;
        let t: u64 = self.plain_modulus();
        let bound: u64 = t >> 1;
        if let Some(v) = values.iter().find(|v| v.unsigned_abs() > bound) {
            return Err(NativeFault::out_of_range(format!("value {v} does not fit in [-{bound}, {bound}]")));
        }
        let slots: Vec<u64> = values
            .iter()
            .map(|v| if *v < 0 { t - v.unsigned_abs() } else { *v as u64 })
            .collect();
        self.encode_slots(slots, destination)
    }

    fn decode_slots(&self, plain: &Plaintext) -> Result<Vec<u64>> {
        if !plain.parms_id().is_zero() {
            return Err(NativeFault::invalid_argument("plain cannot be at a ciphertext level"));
        }
        if plain.coeff_count() > self.slots {
            return Err(NativeFault::invalid_argument("plain is not valid for encryption parameters"));
        }
        let t: u64 = self.plain_modulus();
        if plain.data().iter().any(|c| *c >= t) {
            return Err(NativeFault::invalid_argument("plain coefficient is not reduced"));
        }
        let mut temp: Vec<u64> = plain.data().to_vec();
        temp.resize(self.slots, 0);
        self.table()?.forward_inplace(&mut temp);
        Ok(self.index_map.iter().map(|pos| temp[*pos]).collect())
    }

    pub fn decode_u64(&self, plain: &Plaintext) -> Result<Vec<u64>> {
        self.decode_slots(plain)
    }

    pub fn decode_i64(&self, plain: &Plaintext) -> Result<Vec<i64>> {
        let t: u64 = self.plain_modulus();
        let half: u64 = t >> 1;
        Ok(self
            .decode_slots(plain)?
            .into_iter()
            .map(|v| if v > half { -((t - v) as i64) } else { v as i64 })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::tests::{bfv_context, ckks_context};
    use crate::fault::FaultKind;

    #[test]
    fn index_map_is_a_permutation() {
        let mut map: Vec<usize> = BatchEncoder::index_map(64);
        map.sort_unstable();
        assert_eq!(map, (0..64).collect::<Vec<usize>>());
    }

    #[test]
    fn encode_decode_signed_and_unsigned() {
        let context: Arc<Context> = bfv_context(64, &[40, 40], 17);
        let encoder: BatchEncoder = BatchEncoder::new(&context).unwrap();
        assert_eq!(encoder.slot_count(), 64);
        let t: u64 = context.first_context_data().plain_modulus();

        let unsigned: Vec<u64> = (0..64).map(|i| (i * 977) % t).collect();
        let mut plain: Plaintext = Plaintext::default();
        encoder.encode_u64(&unsigned, &mut plain).unwrap();
        assert_eq!(plain.coeff_count(), 64);
        assert_eq!(encoder.decode_u64(&plain).unwrap(), unsigned);

        let signed: Vec<i64> = (0..64).map(|i| if i % 2 == 0 { -(i * 31) } else { i * 17 }).collect();
        encoder.encode_i64(&signed, &mut plain).unwrap();
        assert_eq!(encoder.decode_i64(&plain).unwrap(), signed);
    }

    #[test]
    fn short_inputs_are_zero_padded() {
        let context: Arc<Context> = bfv_context(64, &[40, 40], 17);
        let encoder: BatchEncoder = BatchEncoder::new(&context).unwrap();
        let mut plain: Plaintext = Plaintext::default();
        encoder.encode_u64(&[7, 8, 9], &mut plain).unwrap();
        let decoded: Vec<u64> = encoder.decode_u64(&plain).unwrap();
        assert_eq!(&decoded[..3], &[7, 8, 9]);
        assert!(decoded[3..].iter().all(|v| *v == 0));
    }

    #[test]
    fn range_violations() {
        let context: Arc<Context> = bfv_context(64, &[40, 40], 17);
        let encoder: BatchEncoder = BatchEncoder::new(&context).unwrap();
        let t: u64 = context.first_context_data().plain_modulus();
        let mut plain: Plaintext = Plaintext::default();
        assert_eq!(encoder.encode_u64(&[t], &mut plain).unwrap_err().kind, FaultKind::OutOfRange);
        assert_eq!(
            encoder.encode_i64(&[(t / 2 + 1) as i64], &mut plain).unwrap_err().kind,
            FaultKind::OutOfRange
        );
        assert_eq!(encoder.encode_u64(&[0; 65], &mut plain).unwrap_err().kind, FaultKind::OutOfRange);
    }

    #[test]
    fn ckks_parameters_cannot_batch() {
        let context: Arc<Context> = ckks_context(64, &[40, 40]);
        assert_eq!(
            BatchEncoder::new(&context).err().map(|e| e.kind),
            Some(FaultKind::InvalidArgument)
        );
    }
}
