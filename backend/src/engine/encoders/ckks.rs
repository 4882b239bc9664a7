use std::f64::consts::PI;
use std::sync::Arc;

use num_complex::Complex64;
use num_traits::{ToPrimitive, Zero};

use crate::engine::arith::{bit_reverse, reduce_i64};
use crate::engine::context::{Context, ContextData};
use crate::engine::parameters::{ParmsId, SchemeType};
use crate::engine::plaintext::Plaintext;
use crate::engine::rns::RnsBase;
use crate::fault::{NativeFault, Result};

/// Largest coefficient magnitude, in bits, the encoder will produce.
const MAX_COEFF_BIT_COUNT: u32 = 62;

/// Approximate encoder for vectors of up to `n/2` reals.
///
/// A message `z` is mapped to the real polynomial `m` with
/// `m(zeta^(5^i)) = z_i` and `m(zeta^(-5^i)) = conj(z_i)` where `zeta` is a
/// primitive `2n`-th complex root, then scaled and rounded.
pub struct CkksEncoder {
    context: Arc<Context>,
    n: usize,
    slots: usize,
    /// Position of slot `i` among the odd roots `zeta^(2k+1)`, and of its
    /// conjugate.
    slot_index: Vec<(usize, usize)>,
    twist: Vec<Complex64>,
}

impl CkksEncoder {
    pub fn new(context: Arc<Context>) -> Result<CkksEncoder> {
        context.require_set()?;
        if context.scheme() != SchemeType::Ckks {
            return Err(NativeFault::invalid_argument("unsupported scheme"));
        }
        let n: usize = context.first_context_data().poly_modulus_degree();
        let slots: usize = n >> 1;
        let m: u64 = 2 * n as u64;
        let mut g: u64 = 1;
        let slot_index: Vec<(usize, usize)> = (0..slots)
            .map(|_| {
                let index: (usize, usize) = (((g - 1) >> 1) as usize, ((m - g - 1) >> 1) as usize);
                g = g * 5 % m;
                index
            })
            .collect();
        let twist: Vec<Complex64> = (0..n)
            .map(|j| Complex64::from_polar(1.0, PI * j as f64 / n as f64))
            .collect();
        Ok(CkksEncoder {
            context,
            n,
            slots,
            slot_index,
            twist,
        })
    }

    pub fn slot_count(&self) -> usize {
        self.slots
    }

    /// Encodes `values` at `parms_id` (the first level when `None`).
    pub fn encode_f64(&self, values: &[f64], parms_id: Option<&ParmsId>, scale: f64, destination: &mut Plaintext) -> Result<()> {
        let parms_id: ParmsId = parms_id.copied().unwrap_or_else(|| self.context.first_parms_id());
        let level: Arc<ContextData> = self.context.level(&parms_id, "parms_id")?.clone();
        if values.len() > self.slots {
            return Err(NativeFault::out_of_range(format!(
                "values has size {}, larger than slot count {}",
                values.len(),
                self.slots
            )));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(NativeFault::out_of_range("scale must be positive"));
        }
        if scale.log2() + 1.0 >= level.total_coeff_modulus_bit_count() as f64 {
            return Err(NativeFault::out_of_range("scale out of bounds"));
        }
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(NativeFault::invalid_argument(format!("value {v} is not finite")));
        }

        let mut evaluations: Vec<Complex64> = vec![Complex64::zero(); self.n];
        values.iter().zip(&self.slot_index).for_each(|(v, (k, k_conj))| {
            evaluations[*k] = Complex64::new(*v, 0.0);
            evaluations[*k_conj] = Complex64::new(*v, 0.0);
        });
        fft(&mut evaluations, true);

        let bound: f64 = (MAX_COEFF_BIT_COUNT as f64).exp2();
        let coeffs: Vec<i64> = evaluations
            .iter()
            .zip(&self.twist)
            .map(|(e, w)| {
                let c: f64 = (e * w.conj()).re * scale / self.n as f64;
                let rounded: f64 = c.round();
                if rounded.abs() >= bound {
                    return Err(NativeFault::out_of_range("encoded values are too large"));
                }
                Ok(rounded as i64)
            })
            .collect::<Result<Vec<i64>>>()?;

        let data: Vec<u64> = level
            .moduli()
            .into_iter()
            .flat_map(|q| coeffs.iter().map(move |c| reduce_i64(*c, q)).collect::<Vec<u64>>())
            .collect();
        destination.assign(data, parms_id, scale);
        Ok(())
    }

    pub fn decode_f64(&self, plain: &Plaintext) -> Result<Vec<f64>> {
        if plain.parms_id().is_zero() {
            return Err(NativeFault::invalid_argument("plain is not at a ciphertext level"));
        }
        plain.validate(&self.context)?;
        let level: Arc<ContextData> = self.context.level(&plain.parms_id(), "plain parms_id")?.clone();
        let base: &RnsBase = level.base()?;
        let n: usize = self.n;
        let k: usize = level.coeff_modulus_size();
        let scale: f64 = plain.scale();

        let mut evaluations: Vec<Complex64> = (0..n)
            .map(|j| {
                let residues: Vec<u64> = (0..k).map(|i| plain.data()[i * n + j]).collect();
                let c: f64 = base.compose_centered(&residues).to_f64().unwrap_or(0.0) / scale;
                self.twist[j] * c
            })
            .collect();
        fft(&mut evaluations, false);
        Ok(self.slot_index.iter().map(|(k, _)| evaluations[*k].re).collect())
    }
}

/// In-place radix-2 DFT: `a_k <- sum_j a_j w^(jk)` with `w = exp(2 pi i / n)`,
/// or its conjugate when `inverse` is set. Unnormalized.
fn fft(a: &mut [Complex64], inverse: bool) {
    let n: usize = a.len();
    let log_n: u32 = n.trailing_zeros();
    for i in 0..n {
        let j: usize = bit_reverse(i, log_n);
        if i < j {
            a.swap(i, j);
        }
    }
    let sign: f64 = if inverse { -1.0 } else { 1.0 };
    let mut len: usize = 2;
    while len <= n {
        let w_len: Complex64 = Complex64::from_polar(1.0, sign * 2.0 * PI / len as f64);
        for start in (0..n).step_by(len) {
            let mut w: Complex64 = Complex64::new(1.0, 0.0);
            for j in 0..len / 2 {
                let u: Complex64 = a[start + j];
                let v: Complex64 = a[start + j + len / 2] * w;
                a[start + j] = u + v;
                a[start + j + len / 2] = u - v;
                w *= w_len;
            }
        }
        len <<= 1;
    }
}
