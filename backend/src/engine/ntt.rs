use itertools::izip;

use crate::engine::arith::{ShoupMul, add_mod, bit_reverse, inv_mod, mul_mod, pow_mod, primitive_root, sub_mod};

/// Negacyclic number theoretic transform over `Z_q[X]/(X^n + 1)`.
///
/// The forward transform maps coefficients to evaluations at the odd powers
/// of a primitive `2n`-th root `psi`, stored in bit-reversed order: slot `k`
/// holds the evaluation at `psi^(2 * rev(k) + 1)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NttTable {
    q: u64,
    n: usize,
    log_n: u32,
    psi: u64,
    psi_forward_rev: Vec<ShoupMul>,
    psi_backward_rev: Vec<ShoupMul>,
    n_inv: ShoupMul,
}

impl NttTable {
    /// Returns `None` if `q` does not admit a primitive `2n`-th root of unity.
    pub fn new(q: u64, n: usize) -> Option<NttTable> {
        assert!(
            n.is_power_of_two(),
            "invalid argument: n = {} is not a power of two",
            n
        );
        let psi: u64 = primitive_root(2 * n as u64, q)?;
        let psi_inv: u64 = inv_mod(psi, q)?;
        let log_n: u32 = n.trailing_zeros();

        let mut psi_forward_rev: Vec<ShoupMul> = vec![ShoupMul::default(); n];
        let mut psi_backward_rev: Vec<ShoupMul> = vec![ShoupMul::default(); n];

        let mut powers_forward: u64 = 1;
        let mut powers_backward: u64 = 1;
        for i in 0..n {
            let i_rev: usize = bit_reverse(i, log_n);
            psi_forward_rev[i_rev] = ShoupMul::new(powers_forward, q);
            psi_backward_rev[i_rev] = ShoupMul::new(powers_backward, q);
            powers_forward = mul_mod(powers_forward, psi, q);
            powers_backward = mul_mod(powers_backward, psi_inv, q);
        }

        let n_inv: u64 = inv_mod(n as u64 % q, q)?;

        Some(Self {
            q,
            n,
            log_n,
            psi,
            psi_forward_rev,
            psi_backward_rev,
            n_inv: ShoupMul::new(n_inv, q),
        })
    }

    pub fn q(&self) -> u64 {
        self.q
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn psi(&self) -> u64 {
        self.psi
    }

    /// Evaluation point held by NTT slot `k`.
    pub fn slot_root(&self, k: usize) -> u64 {
        pow_mod(self.psi, 2 * bit_reverse(k, self.log_n) as u64 + 1, self.q)
    }

    pub fn forward_inplace(&self, a: &mut [u64]) {
        assert_eq!(a.len(), self.n, "invalid a.len()={} != n={}", a.len(), self.n);
        let q: u64 = self.q;
        for layer in 0..self.log_n {
            let m: usize = 1 << layer;
            let size: usize = self.n >> (layer + 1);
            izip!(a.chunks_exact_mut(2 * size), &self.psi_forward_rev[m..]).for_each(|(a, psi)| {
                let (a, b) = a.split_at_mut(size);
                izip!(a, b).for_each(|(a, b)| {
                    let u: u64 = *a;
                    let v: u64 = psi.mul(*b, q);
                    *a = add_mod(u, v, q);
                    *b = sub_mod(u, v, q);
                });
            });
        }
    }

    pub fn backward_inplace(&self, a: &mut [u64]) {
        assert_eq!(a.len(), self.n, "invalid a.len()={} != n={}", a.len(), self.n);
        let q: u64 = self.q;
        for layer in (0..self.log_n).rev() {
            let h: usize = 1 << layer;
            let size: usize = self.n >> (layer + 1);
            izip!(a.chunks_exact_mut(2 * size), &self.psi_backward_rev[h..]).for_each(|(a, psi)| {
                let (a, b) = a.split_at_mut(size);
                izip!(a, b).for_each(|(a, b)| {
                    let u: u64 = *a;
                    let v: u64 = *b;
                    *a = add_mod(u, v, q);
                    *b = psi.mul(sub_mod(u, v, q), q);
                });
            });
        }
        a.iter_mut().for_each(|x| *x = self.n_inv.mul(*x, q));
    }

    /// Negacyclic product `a * b mod (X^n + 1, q)` of two reduced polynomials.
    pub fn multiply(&self, a: &[u64], b: &[u64]) -> Vec<u64> {
        let mut a_ntt: Vec<u64> = a.to_vec();
        let mut b_ntt: Vec<u64> = b.to_vec();
        self.forward_inplace(&mut a_ntt);
        self.forward_inplace(&mut b_ntt);
        izip!(a_ntt.iter_mut(), b_ntt.iter()).for_each(|(a, b)| *a = mul_mod(*a, *b, self.q));
        self.backward_inplace(&mut a_ntt);
        a_ntt
    }
}
