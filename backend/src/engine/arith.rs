//! Word-size modular arithmetic and NTT-friendly prime generation.

#[inline(always)]
pub fn add_mod(a: u64, b: u64, q: u64) -> u64 {
    debug_assert!(a < q && b < q, "add_mod operands must be reduced: a={a} b={b} q={q}");
    let s: u64 = a + b;
    if s >= q { s - q } else { s }
}

#[inline(always)]
pub fn sub_mod(a: u64, b: u64, q: u64) -> u64 {
    debug_assert!(a < q && b < q, "sub_mod operands must be reduced: a={a} b={b} q={q}");
    if a >= b { a - b } else { a + q - b }
}

#[inline(always)]
pub fn neg_mod(a: u64, q: u64) -> u64 {
    if a == 0 { 0 } else { q - a }
}

#[inline(always)]
pub fn mul_mod(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 * b as u128) % q as u128) as u64
}

pub fn pow_mod(mut base: u64, mut exp: u64, q: u64) -> u64 {
    let mut acc: u64 = 1 % q;
    base %= q;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, q);
        }
        base = mul_mod(base, base, q);
        exp >>= 1;
    }
    acc
}

/// Inverse of `a` modulo `q`, if it exists. `q` need not be prime.
pub fn inv_mod(a: u64, q: u64) -> Option<u64> {
    if q < 2 {
        return None;
    }
    let (mut old_r, mut r): (i128, i128) = ((a % q) as i128, q as i128);
    let (mut old_s, mut s): (i128, i128) = (1, 0);
    while r != 0 {
        let quotient: i128 = old_r / r;
        (old_r, r) = (r, old_r - quotient * r);
        (old_s, s) = (s, old_s - quotient * s);
    }
    if old_r != 1 {
        return None;
    }
    Some(old_s.rem_euclid(q as i128) as u64)
}

pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[inline(always)]
pub fn reduce_i64(x: i64, q: u64) -> u64 {
    (x as i128).rem_euclid(q as i128) as u64
}

/// Centered representative of `x` in `(-q/2, q/2]`.
#[inline(always)]
pub fn center(x: u64, q: u64) -> i64 {
    if x > q >> 1 { x as i64 - q as i64 } else { x as i64 }
}

/// Number of significant bits of `x`.
#[inline(always)]
pub fn bit_count(x: u64) -> u32 {
    u64::BITS - x.leading_zeros()
}

#[inline(always)]
pub fn bit_reverse(i: usize, bits: u32) -> usize {
    if bits == 0 { 0 } else { i.reverse_bits() >> (usize::BITS - bits) }
}

/// Multiplication by a fixed operand with a precomputed quotient (Shoup).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShoupMul {
    pub operand: u64,
    pub quotient: u64,
}

impl ShoupMul {
    pub fn new(operand: u64, q: u64) -> Self {
        debug_assert!(operand < q, "operand={operand} must be reduced modulo q={q}");
        Self {
            operand,
            quotient: (((operand as u128) << 64) / q as u128) as u64,
        }
    }

    /// Returns `operand * b mod q` for `b < 2^64`, `q < 2^63`.
    #[inline(always)]
    pub fn mul(&self, b: u64, q: u64) -> u64 {
        let hi: u64 = ((self.quotient as u128 * b as u128) >> 64) as u64;
        let r: u64 = self.operand.wrapping_mul(b).wrapping_sub(hi.wrapping_mul(q));
        if r >= q { r - q } else { r }
    }
}

const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Deterministic Miller-Rabin for 64-bit integers.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for p in WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }
    let s: u32 = (n - 1).trailing_zeros();
    let d: u64 = (n - 1) >> s;
    'witness: for a in WITNESSES {
        let mut x: u64 = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Returns the `count` largest primes of exactly `bit_size` bits that are
/// congruent to 1 modulo `factor`, in decreasing order.
pub fn generate_primes(bit_size: u32, factor: u64, count: usize) -> Option<Vec<u64>> {
    if !(2..=62).contains(&bit_size) || factor == 0 {
        return None;
    }
    let lower: u64 = 1u64 << (bit_size - 1);
    let upper: u64 = 1u64 << bit_size;
    if factor >= upper {
        return None;
    }
    let mut primes: Vec<u64> = Vec::with_capacity(count);
    let mut candidate: u64 = upper - factor + 1;
    while primes.len() < count && candidate > lower {
        if is_prime(candidate) {
            primes.push(candidate);
        }
        if candidate <= factor {
            break;
        }
        candidate -= factor;
    }
    if primes.len() == count { Some(primes) } else { None }
}

/// A primitive `order`-th root of unity modulo the prime `q`, where `order`
/// is a power of two dividing `q - 1`.
pub fn primitive_root(order: u64, q: u64) -> Option<u64> {
    if order < 2 || (q - 1) % order != 0 {
        return None;
    }
    let cofactor: u64 = (q - 1) / order;
    (2..q.min(1 << 20)).find_map(|x| {
        let g: u64 = pow_mod(x, cofactor, q);
        (pow_mod(g, order >> 1, q) == q - 1).then_some(g)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miller_rabin_agrees_with_known_primes() {
        [2u64, 3, 5, 65537, 12289, 2_305_843_009_213_693_951]
            .iter()
            .for_each(|p| assert!(is_prime(*p), "{p} should be prime"));
        [0u64, 1, 4, 561, 65535, 2_305_843_009_213_693_953]
            .iter()
            .for_each(|c| assert!(!is_prime(*c), "{c} should be composite"));
    }

    #[test]
    fn generated_primes_are_ntt_friendly() {
        let primes: Vec<u64> = generate_primes(40, 2 * 4096, 3).unwrap();
        assert_eq!(primes.len(), 3);
        primes.iter().for_each(|q| {
            assert!(is_prime(*q));
            assert_eq!(bit_count(*q), 40);
            assert_eq!(q % 8192, 1);
        });
        assert!(primes.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn inverse_and_roots() {
        let q: u64 = 12289;
        (1..50u64).for_each(|a| assert_eq!(mul_mod(a, inv_mod(a, q).unwrap(), q), 1));
        assert_eq!(inv_mod(6, 9), None);
        let psi: u64 = primitive_root(2048, q).unwrap();
        assert_eq!(pow_mod(psi, 1024, q), q - 1);
        assert_eq!(pow_mod(psi, 2048, q), 1);
    }

    #[test]
    fn shoup_matches_naive() {
        let q: u64 = (1u64 << 61) - 1;
        let w: ShoupMul = ShoupMul::new(123_456_789_012_345, q);
        [0u64, 1, q - 1, 987_654_321_987, 1u64 << 60]
            .iter()
            .for_each(|b| assert_eq!(w.mul(*b, q), mul_mod(w.operand, *b, q)));
    }
}
