use std::sync::Arc;

use itertools::izip;

use crate::engine::arith::{add_mod, mul_mod};
use crate::engine::ciphertext::Ciphertext;
use crate::engine::context::{Context, ContextData};
use crate::engine::parameters::{ParmsId, SchemeType};
use crate::engine::plaintext::Plaintext;
use crate::engine::poly;
use crate::fault::{NativeFault, Result};

/// Relative tolerance when comparing CKKS scales.
const SCALE_TOLERANCE: f64 = 1e-9;

fn scales_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= SCALE_TOLERANCE * a.abs().max(b.abs())
}

/// Homomorphic operations that need no evaluation keys.
pub struct Evaluator {
    context: Arc<Context>,
}

impl Evaluator {
    pub fn new(context: Arc<Context>) -> Result<Evaluator> {
        context.require_set()?;
        Ok(Evaluator { context })
    }

    fn level_of(&self, encrypted: &Ciphertext, what: &str) -> Result<Arc<ContextData>> {
        let level: Arc<ContextData> = self.context.level(&encrypted.parms_id(), what)?.clone();
        if encrypted.chain_id() != self.context.key_parms_id() {
            return Err(NativeFault::invalid_argument(format!("{what} belongs to a different context")));
        }
        if encrypted.size() < 2 {
            return Err(NativeFault::invalid_argument(format!("{what} is empty")));
        }
        Ok(level)
    }

    pub fn negate(&self, encrypted: &Ciphertext) -> Result<Ciphertext> {
        let level: Arc<ContextData> = self.level_of(encrypted, "encrypted")?;
        let mut data: Vec<u64> = encrypted.data().to_vec();
        let n: usize = level.poly_modulus_degree();
        let moduli: Vec<u64> = level.moduli();
        data.chunks_exact_mut(encrypted.poly_len())
            .for_each(|p| poly::neg_assign(p, n, &moduli));
        Ok(self.rebuild(&level, encrypted, encrypted.size(), data, encrypted.scale()))
    }

    pub fn add(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        self.combine(a, b, poly::add_assign)
    }

    pub fn sub(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        self.combine(a, b, poly::sub_assign)
    }

    fn combine(&self, a: &Ciphertext, b: &Ciphertext, op: fn(&mut [u64], &[u64], usize, &[u64])) -> Result<Ciphertext> {
        let level: Arc<ContextData> = self.level_of(a, "encrypted1")?;
        self.level_of(b, "encrypted2")?;
        if a.parms_id() != b.parms_id() {
            return Err(NativeFault::invalid_argument("encrypted1 and encrypted2 parameter mismatch"));
        }
        if !scales_match(a.scale(), b.scale()) {
            return Err(NativeFault::invalid_argument("scale mismatch"));
        }
        let n: usize = level.poly_modulus_degree();
        let moduli: Vec<u64> = level.moduli();
        let poly_len: usize = a.poly_len();
        let size: usize = a.size().max(b.size());
        let mut data: Vec<u64> = vec![0; size * poly_len];
        izip!(data.chunks_exact_mut(poly_len), a.polys()).for_each(|(out, p)| out.copy_from_slice(p));
        // Missing polynomials of the shorter operand count as zero.
        izip!(data.chunks_exact_mut(poly_len), b.polys()).for_each(|(out, p)| op(out, p, n, &moduli));
        Ok(self.rebuild(&level, a, size, data, a.scale()))
    }

    /// Message contribution of `plain` in the residues of `level`.
    fn plain_residues(&self, level: &ContextData, encrypted: &Ciphertext, plain: &Plaintext, scaled: bool) -> Result<Vec<u64>> {
        plain.validate(&self.context)?;
        let n: usize = level.poly_modulus_degree();
        match self.context.scheme() {
            SchemeType::Bfv => {
                if !plain.parms_id().is_zero() {
                    return Err(NativeFault::invalid_argument("BFV plaintext cannot carry a level"));
                }
                let threshold: u64 = level.plain_upper_half_threshold();
                let residues: Vec<u64> = izip!(
                    level.moduli(),
                    level.coeff_div_plain_modulus(),
                    level.plain_upper_half_increment()
                )
                .flat_map(|(q, delta, increment)| {
                    (0..n).map(move |j| {
                        let m: u64 = plain.data().get(j).copied().unwrap_or(0);
                        if scaled {
                            mul_mod(m, *delta, q)
                        } else if m >= threshold {
                            add_mod(m % q, *increment, q)
                        } else {
                            m % q
                        }
                    })
                })
                .collect();
                Ok(residues)
            }
            SchemeType::Ckks => {
                if plain.parms_id() != encrypted.parms_id() {
                    return Err(NativeFault::invalid_argument("encrypted and plain parameter mismatch"));
                }
                Ok(plain.data().to_vec())
            }
            SchemeType::None => Err(NativeFault::logic_error("unsupported scheme")),
        }
    }

    pub fn add_plain(&self, encrypted: &Ciphertext, plain: &Plaintext) -> Result<Ciphertext> {
        self.combine_plain(encrypted, plain, poly::add_assign)
    }

    pub fn sub_plain(&self, encrypted: &Ciphertext, plain: &Plaintext) -> Result<Ciphertext> {
        self.combine_plain(encrypted, plain, poly::sub_assign)
    }

    fn combine_plain(
        &self,
        encrypted: &Ciphertext,
        plain: &Plaintext,
        op: fn(&mut [u64], &[u64], usize, &[u64]),
    ) -> Result<Ciphertext> {
        let level: Arc<ContextData> = self.level_of(encrypted, "encrypted")?;
        if self.context.scheme() == SchemeType::Ckks && !scales_match(encrypted.scale(), plain.scale()) {
            return Err(NativeFault::invalid_argument("scale mismatch"));
        }
        let message: Vec<u64> = self.plain_residues(&level, encrypted, plain, true)?;
        let n: usize = level.poly_modulus_degree();
        let mut data: Vec<u64> = encrypted.data().to_vec();
        op(&mut data[..encrypted.poly_len()], &message, n, &level.moduli());
        Ok(self.rebuild(&level, encrypted, encrypted.size(), data, encrypted.scale()))
    }

    pub fn multiply_plain(&self, encrypted: &Ciphertext, plain: &Plaintext) -> Result<Ciphertext> {
        let level: Arc<ContextData> = self.level_of(encrypted, "encrypted")?;
        if plain.is_zero() {
            return Err(NativeFault::logic_error("result ciphertext is transparent"));
        }
        let mut lifted: Vec<u64> = self.plain_residues(&level, encrypted, plain, false)?;
        let n: usize = level.poly_modulus_degree();
        let moduli: Vec<u64> = level.moduli();
        poly::forward(&mut lifted, level.ntt_tables());

        let scale: f64 = match self.context.scheme() {
            SchemeType::Ckks => {
                let scale: f64 = encrypted.scale() * plain.scale();
                if scale.log2() >= level.total_coeff_modulus_bit_count() as f64 {
                    return Err(NativeFault::out_of_range("scale out of bounds"));
                }
                scale
            }
            _ => encrypted.scale(),
        };

        let data: Vec<u64> = encrypted
            .polys()
            .flat_map(|p| poly::multiply_ntt(p, &lifted, level.ntt_tables(), &moduli))
            .collect();
        debug_assert_eq!(data.len(), encrypted.size() * n * moduli.len());
        Ok(self.rebuild(&level, encrypted, encrypted.size(), data, scale))
    }

    fn next_level(&self, level: &ContextData) -> Result<Arc<ContextData>> {
        level
            .next_context_data()
            .ok_or_else(|| NativeFault::invalid_argument("end of modulus switching chain reached"))
    }

    /// Moves to the next level. BFV divides by the dropped prime with
    /// rounding; CKKS keeps the scale and only drops the residues.
    pub fn mod_switch_to_next(&self, encrypted: &Ciphertext) -> Result<Ciphertext> {
        let level: Arc<ContextData> = self.level_of(encrypted, "encrypted")?;
        let next: Arc<ContextData> = self.next_level(&level)?;
        let n: usize = level.poly_modulus_degree();
        let data: Vec<u64> = match self.context.scheme() {
            SchemeType::Bfv => poly::divide_round_by_last(encrypted.data(), n, &level.moduli()),
            SchemeType::Ckks => poly::drop_last(encrypted.data(), n, level.coeff_modulus_size()),
            SchemeType::None => return Err(NativeFault::logic_error("unsupported scheme")),
        };
        Ok(self.rebuild(&next, encrypted, encrypted.size(), data, encrypted.scale()))
    }

    pub fn mod_switch_to(&self, encrypted: &Ciphertext, parms_id: &ParmsId) -> Result<Ciphertext> {
        let level: Arc<ContextData> = self.level_of(encrypted, "encrypted")?;
        let target: Arc<ContextData> = self.context.level(parms_id, "parms_id")?.clone();
        if target.chain_index() > level.chain_index() {
            return Err(NativeFault::invalid_argument("cannot switch to higher level modulus"));
        }
        let mut current: Ciphertext = encrypted.clone();
        while current.parms_id() != *parms_id {
            current = self.mod_switch_to_next(&current)?;
        }
        Ok(current)
    }

    /// Drops the last residue of a CKKS plaintext.
    pub fn plain_mod_switch_to_next(&self, plain: &Plaintext) -> Result<Plaintext> {
        if plain.parms_id().is_zero() {
            return Err(NativeFault::invalid_argument("plain has no level to switch from"));
        }
        plain.validate(&self.context)?;
        let level: Arc<ContextData> = self.context.level(&plain.parms_id(), "plain parms_id")?.clone();
        let next: Arc<ContextData> = self.next_level(&level)?;
        let data: Vec<u64> = poly::drop_last(plain.data(), level.poly_modulus_degree(), level.coeff_modulus_size());
        let mut out: Plaintext = Plaintext::default();
        out.assign(data, next.parms_id(), plain.scale());
        Ok(out)
    }

    /// Divides a CKKS ciphertext by its last prime and drops it, dividing
    /// the scale accordingly.
    pub fn rescale_to_next(&self, encrypted: &Ciphertext) -> Result<Ciphertext> {
        if self.context.scheme() != SchemeType::Ckks {
            return Err(NativeFault::invalid_argument("unsupported operation for scheme type"));
        }
        let level: Arc<ContextData> = self.level_of(encrypted, "encrypted")?;
        let next: Arc<ContextData> = self.next_level(&level)?;
        let moduli: Vec<u64> = level.moduli();
        let q_last: u64 = moduli[moduli.len() - 1];
        let data: Vec<u64> = poly::divide_round_by_last(encrypted.data(), level.poly_modulus_degree(), &moduli);
        Ok(self.rebuild(&next, encrypted, encrypted.size(), data, encrypted.scale() / q_last as f64))
    }

    fn rebuild(&self, level: &ContextData, like: &Ciphertext, size: usize, data: Vec<u64>, scale: f64) -> Ciphertext {
        Ciphertext::from_parts(level, like.chain_id(), size, data, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::tests::bfv_context;
    use crate::engine::decryptor::Decryptor;
    use crate::engine::encryptor::Encryptor;
    use crate::engine::keys::{KeyGenerator, PublicKey};

    struct Fixture {
        context: Arc<Context>,
        encryptor: Encryptor,
        decryptor: Decryptor,
        evaluator: Evaluator,
    }

    fn fixture() -> Fixture {
        let context: Arc<Context> = bfv_context(64, &[40, 40, 40, 40], 17);
        let mut keygen: KeyGenerator = KeyGenerator::new(context.clone()).unwrap();
        let public_key: PublicKey = keygen.create_public_key();
        Fixture {
            encryptor: Encryptor::new(context.clone(), Some(&public_key), None).unwrap(),
            decryptor: Decryptor::new(context.clone(), keygen.secret_key()).unwrap(),
            evaluator: Evaluator::new(context.clone()).unwrap(),
            context,
        }
    }

    fn constant(value: u64) -> Plaintext {
        let mut plain: Plaintext = Plaintext::new(1, None).unwrap();
        plain.set_coeff(0, value).unwrap();
        plain
    }

    #[test]
    fn arithmetic_on_constants() {
        let mut f: Fixture = fixture();
        let t: u64 = f.context.first_context_data().plain_modulus();
        let a: Ciphertext = f.encryptor.encrypt(&constant(5)).unwrap();
        let b: Ciphertext = f.encryptor.encrypt(&constant(9)).unwrap();

        let sum: Ciphertext = f.evaluator.add(&a, &b).unwrap();
        assert_eq!(f.decryptor.decrypt(&sum).unwrap().coeff(0).unwrap(), 14);

        let diff: Ciphertext = f.evaluator.sub(&a, &b).unwrap();
        assert_eq!(f.decryptor.decrypt(&diff).unwrap().coeff(0).unwrap(), t - 4);

        let neg: Ciphertext = f.evaluator.negate(&a).unwrap();
        assert_eq!(f.decryptor.decrypt(&neg).unwrap().coeff(0).unwrap(), t - 5);

        let plus: Ciphertext = f.evaluator.add_plain(&a, &constant(3)).unwrap();
        assert_eq!(f.decryptor.decrypt(&plus).unwrap().coeff(0).unwrap(), 8);

        let minus: Ciphertext = f.evaluator.sub_plain(&a, &constant(3)).unwrap();
        assert_eq!(f.decryptor.decrypt(&minus).unwrap().coeff(0).unwrap(), 2);

        let product: Ciphertext = f.evaluator.multiply_plain(&a, &constant(t - 2)).unwrap();
        assert_eq!(f.decryptor.decrypt(&product).unwrap().coeff(0).unwrap(), t - 10);
    }

    #[test]
    fn modulus_switching_preserves_the_message() {
        let mut f: Fixture = fixture();
        let ct: Ciphertext = f.encryptor.encrypt(&constant(11)).unwrap();
        let budget: i32 = f.decryptor.invariant_noise_budget(&ct).unwrap();
        let next: Ciphertext = f.evaluator.mod_switch_to_next(&ct).unwrap();
        assert_eq!(next.coeff_modulus_size(), ct.coeff_modulus_size() - 1);
        assert_eq!(f.decryptor.decrypt(&next).unwrap().coeff(0).unwrap(), 11);
        assert!(f.decryptor.invariant_noise_budget(&next).unwrap() < budget);

        let last: Ciphertext = f.evaluator.mod_switch_to(&ct, &f.context.last_parms_id()).unwrap();
        assert_eq!(last.parms_id(), f.context.last_parms_id());
        assert_eq!(f.decryptor.decrypt(&last).unwrap().coeff(0).unwrap(), 11);
        assert!(f.evaluator.mod_switch_to_next(&last).is_err());
        assert!(f.evaluator.mod_switch_to(&last, &f.context.first_parms_id()).is_err());
    }

    #[test]
    fn mismatched_levels_are_rejected() {
        let mut f: Fixture = fixture();
        let a: Ciphertext = f.encryptor.encrypt(&constant(1)).unwrap();
        let b: Ciphertext = f.evaluator.mod_switch_to_next(&a).unwrap();
        assert!(f.evaluator.add(&a, &b).is_err());
        assert!(f.evaluator.rescale_to_next(&a).is_err());
        assert!(f.evaluator.multiply_plain(&a, &Plaintext::new(1, None).unwrap()).is_err());
    }
}
