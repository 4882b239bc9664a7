//! Residue-polynomial helpers. A polynomial at a level with `k` moduli is
//! stored as `k` consecutive blocks of `n` residues.

use itertools::izip;
use sampling::distributions::Distribution;
use sampling::source::Source;

use crate::engine::arith::{add_mod, mul_mod, neg_mod, reduce_i64, sub_mod};
use crate::engine::ntt::NttTable;

pub(crate) fn from_signed(coeffs: &[i64], moduli: &[u64]) -> Vec<u64> {
    moduli
        .iter()
        .flat_map(|q| coeffs.iter().map(move |c| reduce_i64(*c, *q)))
        .collect()
}

pub(crate) fn sample(dist: Distribution, source: &mut Source, n: usize, moduli: &[u64]) -> Vec<u64> {
    from_signed(&dist.sample(source, n), moduli)
}

pub(crate) fn uniform(source: &mut Source, n: usize, moduli: &[u64]) -> Vec<u64> {
    moduli
        .iter()
        .flat_map(|q| (0..n).map(|_| source.next_u64_mod(*q)).collect::<Vec<u64>>())
        .collect()
}

pub(crate) fn forward(data: &mut [u64], tables: &[NttTable]) {
    let n: usize = tables[0].n();
    izip!(data.chunks_exact_mut(n), tables).for_each(|(poly, table)| table.forward_inplace(poly));
}

pub(crate) fn backward(data: &mut [u64], tables: &[NttTable]) {
    let n: usize = tables[0].n();
    izip!(data.chunks_exact_mut(n), tables).for_each(|(poly, table)| table.backward_inplace(poly));
}

pub(crate) fn add_assign(a: &mut [u64], b: &[u64], n: usize, moduli: &[u64]) {
    izip!(a.chunks_exact_mut(n), b.chunks_exact(n), moduli).for_each(|(a, b, q)| {
        izip!(a, b).for_each(|(a, b)| *a = add_mod(*a, *b, *q));
    });
}

pub(crate) fn sub_assign(a: &mut [u64], b: &[u64], n: usize, moduli: &[u64]) {
    izip!(a.chunks_exact_mut(n), b.chunks_exact(n), moduli).for_each(|(a, b, q)| {
        izip!(a, b).for_each(|(a, b)| *a = sub_mod(*a, *b, *q));
    });
}

pub(crate) fn neg_assign(a: &mut [u64], n: usize, moduli: &[u64]) {
    izip!(a.chunks_exact_mut(n), moduli).for_each(|(a, q)| a.iter_mut().for_each(|a| *a = neg_mod(*a, *q)));
}

/// Pointwise product; both operands in the NTT domain.
pub(crate) fn mul_assign(a: &mut [u64], b: &[u64], n: usize, moduli: &[u64]) {
    izip!(a.chunks_exact_mut(n), b.chunks_exact(n), moduli).for_each(|(a, b, q)| {
        izip!(a, b).for_each(|(a, b)| *a = mul_mod(*a, *b, *q));
    });
}

/// Negacyclic product of `a` (coefficient form) with `b_ntt` (NTT form).
pub(crate) fn multiply_ntt(a: &[u64], b_ntt: &[u64], tables: &[NttTable], moduli: &[u64]) -> Vec<u64> {
    let n: usize = tables[0].n();
    let mut out: Vec<u64> = a.to_vec();
    forward(&mut out, tables);
    mul_assign(&mut out, b_ntt, n, moduli);
    backward(&mut out, tables);
    out
}

/// Divides by the last modulus with rounding and drops it. `data` holds
/// whole polynomials at a level with `moduli`.
pub(crate) fn divide_round_by_last(data: &[u64], n: usize, moduli: &[u64]) -> Vec<u64> {
    let k: usize = moduli.len();
    let q_last: u64 = moduli[k - 1];
    let half: u64 = q_last >> 1;
    data.chunks_exact(n * k)
        .flat_map(|poly| {
            let last: &[u64] = &poly[(k - 1) * n..];
            izip!(poly.chunks_exact(n), &moduli[..k - 1])
                .flat_map(|(residues, q)| {
                    let q_last_inv: u64 = crate::engine::arith::inv_mod(q_last % q, *q).unwrap_or(0);
                    let half_mod: u64 = half % q;
                    izip!(residues, last)
                        .map(|(c, r)| {
                            let shifted: u64 = ((*r as u128 + half as u128) % q_last as u128) as u64;
                            let num: u64 = sub_mod(add_mod(*c, half_mod, *q), shifted % q, *q);
                            mul_mod(num, q_last_inv, *q)
                        })
                        .collect::<Vec<u64>>()
                })
                .collect::<Vec<u64>>()
        })
        .collect()
}

/// Drops the residues of the last modulus.
pub(crate) fn drop_last(data: &[u64], n: usize, k: usize) -> Vec<u64> {
    data.chunks_exact(n * k)
        .flat_map(|poly| poly[..(k - 1) * n].iter().copied())
        .collect()
}
