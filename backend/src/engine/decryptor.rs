use std::sync::Arc;

use num_bigint::{BigInt, BigUint};
use num_traits::{Signed, ToPrimitive};

use crate::engine::ciphertext::Ciphertext;
use crate::engine::context::{Context, ContextData};
use crate::engine::keys::SecretKey;
use crate::engine::parameters::{ParmsId, SchemeType};
use crate::engine::plaintext::Plaintext;
use crate::engine::poly;
use crate::engine::rns::RnsBase;
use crate::fault::{NativeFault, Result};

pub struct Decryptor {
    context: Arc<Context>,
    secret_key: SecretKey,
}

impl Decryptor {
    pub fn new(context: Arc<Context>, secret_key: &SecretKey) -> Result<Decryptor> {
        secret_key.validate(&context)?;
        Ok(Decryptor {
            context,
            secret_key: secret_key.clone(),
        })
    }

    /// `c0 + c1*s` at the ciphertext's level, in coefficient form.
    fn phase(&self, encrypted: &Ciphertext) -> Result<(Arc<ContextData>, Vec<u64>)> {
        let level: Arc<ContextData> = self.context.level(&encrypted.parms_id(), "encrypted parms_id")?.clone();
        if encrypted.size() != 2 {
            return Err(NativeFault::invalid_argument(format!(
                "encrypted size {} is not supported, expected 2",
                encrypted.size()
            )));
        }
        if encrypted.poly_modulus_degree() != level.poly_modulus_degree()
            || encrypted.coeff_modulus_size() != level.coeff_modulus_size()
        {
            return Err(NativeFault::invalid_argument("encrypted is not valid for encryption parameters"));
        }
        let n: usize = level.poly_modulus_degree();
        let k: usize = level.coeff_modulus_size();
        let moduli: Vec<u64> = level.moduli();
        let mut phase: Vec<u64> = poly::multiply_ntt(
            encrypted.poly(1),
            self.secret_key.ntt_prefix(n, k),
            level.ntt_tables(),
            &moduli,
        );
        poly::add_assign(&mut phase, encrypted.poly(0), n, &moduli);
        Ok((level, phase))
    }

    /// Residues of coefficient `j` across all moduli.
    fn residues(phase: &[u64], n: usize, k: usize, j: usize) -> Vec<u64> {
        (0..k).map(|i| phase[i * n + j]).collect()
    }

    pub fn decrypt(&self, encrypted: &Ciphertext) -> Result<Plaintext> {
        let (level, phase) = self.phase(encrypted)?;
        let n: usize = level.poly_modulus_degree();
        let k: usize = level.coeff_modulus_size();
        let mut plain: Plaintext = Plaintext::default();
        match self.context.scheme() {
            SchemeType::Bfv => {
                let base: &RnsBase = level.base()?;
                let t: BigUint = BigUint::from(level.plain_modulus());
                let q: &BigUint = base.product();
                let half_q: BigUint = q >> 1u32;
                let data: Vec<u64> = (0..n)
                    .map(|j| {
                        let x: BigUint = base.compose(&Self::residues(&phase, n, k, j));
                        let m: BigUint = ((&x * &t + &half_q) / q) % &t;
                        m.to_u64().unwrap_or(0)
                    })
                    .collect();
                plain.assign(data, ParmsId::ZERO, 1.0);
            }
            SchemeType::Ckks => plain.assign(phase, level.parms_id(), encrypted.scale()),
            SchemeType::None => return Err(NativeFault::logic_error("unsupported scheme")),
        }
        Ok(plain)
    }

    /// Bits of room left before BFV decryption fails:
    /// `log2(Q) - log2(|t * (c0 + c1*s) mod Q|_inf) - 1`, floored at zero.
    pub fn invariant_noise_budget(&self, encrypted: &Ciphertext) -> Result<i32> {
        if self.context.scheme() != SchemeType::Bfv {
            return Err(NativeFault::logic_error("unsupported scheme"));
        }
        let (level, phase) = self.phase(encrypted)?;
        let n: usize = level.poly_modulus_degree();
        let k: usize = level.coeff_modulus_size();
        let base: &RnsBase = level.base()?;
        let t: u64 = level.plain_modulus();
        let scaled: Vec<u64> = phase
            .chunks_exact(n)
            .zip(base.moduli())
            .flat_map(|(residues, q)| {
                residues
                    .iter()
                    .map(|c| crate::engine::arith::mul_mod(*c, t % q, *q))
                    .collect::<Vec<u64>>()
            })
            .collect();
        let norm: BigInt = (0..n)
            .map(|j| base.compose_centered(&Self::residues(&scaled, n, k, j)).abs())
            .max()
            .unwrap_or_default();
        let budget: i64 = level.total_coeff_modulus_bit_count() as i64 - norm.bits() as i64 - 1;
        Ok(budget.max(0) as i32)
    }
}
