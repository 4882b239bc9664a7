use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, ToPrimitive, Zero};

use crate::engine::arith::{inv_mod, mul_mod};

/// Residue number system over pairwise coprime word-size moduli, with the
/// constants needed for CRT reconstruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RnsBase {
    moduli: Vec<u64>,
    product: BigUint,
    half_product: BigUint,
    punctured: Vec<BigUint>,
    inv_punctured: Vec<u64>,
}

impl RnsBase {
    /// Returns `None` when the moduli are not pairwise coprime.
    pub fn new(moduli: &[u64]) -> Option<RnsBase> {
        if moduli.is_empty() {
            return None;
        }
        let product: BigUint = moduli
            .iter()
            .fold(BigUint::one(), |acc, q| acc * BigUint::from(*q));
        let punctured: Vec<BigUint> = moduli.iter().map(|q| &product / BigUint::from(*q)).collect();
        let inv_punctured: Vec<u64> = moduli
            .iter()
            .zip(punctured.iter())
            .map(|(q, p)| {
                let residue: u64 = (p % BigUint::from(*q)).to_u64()?;
                inv_mod(residue, *q)
            })
            .collect::<Option<Vec<u64>>>()?;
        Some(RnsBase {
            moduli: moduli.to_vec(),
            half_product: &product >> 1u32,
            product,
            punctured,
            inv_punctured,
        })
    }

    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    pub fn len(&self) -> usize {
        self.moduli.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moduli.is_empty()
    }

    pub fn product(&self) -> &BigUint {
        &self.product
    }

    /// Unique `x` in `[0, Q)` with `x = residues[i] mod q_i`.
    pub fn compose(&self, residues: &[u64]) -> BigUint {
        debug_assert_eq!(residues.len(), self.moduli.len());
        let sum: BigUint = residues
            .iter()
            .zip(self.moduli.iter())
            .zip(self.punctured.iter().zip(self.inv_punctured.iter()))
            .fold(BigUint::zero(), |acc, ((r, q), (p, inv))| {
                acc + p * BigUint::from(mul_mod(*r, *inv, *q))
            });
        sum % &self.product
    }

    /// Like [`RnsBase::compose`], mapped to the centered range `(-Q/2, Q/2]`.
    pub fn compose_centered(&self, residues: &[u64]) -> BigInt {
        let x: BigUint = self.compose(residues);
        if x > self.half_product {
            BigInt::from_biguint(Sign::Minus, &self.product - x)
        } else {
            BigInt::from_biguint(Sign::Plus, x)
        }
    }

    pub fn decompose(&self, x: &BigUint) -> Vec<u64> {
        self.moduli
            .iter()
            .map(|q| (x % BigUint::from(*q)).to_u64().unwrap_or(0))
            .collect()
    }
}
