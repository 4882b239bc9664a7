use std::collections::BTreeMap;
use std::io::{Read, Result as IoResult, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::engine::arith::{bit_count, generate_primes, is_prime};
use crate::engine::serialization::{ReaderFrom, WriterTo, invalid_data};
use crate::fault::{NativeFault, Result};

pub const MAX_MODULUS_BIT_COUNT: u32 = 61;
pub const MIN_USER_MODULUS_BIT_COUNT: u32 = 2;
pub const MAX_USER_MODULUS_BIT_COUNT: u32 = 60;
pub const MAX_COEFF_MODULUS_COUNT: usize = 64;
pub const MIN_POLY_MODULUS_DEGREE: u64 = 2;
pub const MAX_POLY_MODULUS_DEGREE: u64 = 32768;

/// Security level targeted when validating parameters, following the
/// HomomorphicEncryption.org standard for ternary secrets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum SecurityLevel {
    None = 0,
    #[default]
    Tc128 = 128,
    Tc192 = 192,
    Tc256 = 256,
}

impl SecurityLevel {
    pub fn from_i32(value: i32) -> Option<SecurityLevel> {
        match value {
            0 => Some(SecurityLevel::None),
            128 => Some(SecurityLevel::Tc128),
            192 => Some(SecurityLevel::Tc192),
            256 => Some(SecurityLevel::Tc256),
            _ => None,
        }
    }
}

/// An integer modulus of at most 61 bits. The value zero stands for an
/// unset modulus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modulus {
    value: u64,
    bit_count: u32,
    is_prime: bool,
}

impl Modulus {
    pub fn new(value: u64) -> Result<Modulus> {
        if value == 1 {
            return Err(NativeFault::invalid_argument("value can't be 1"));
        }
        let bits: u32 = bit_count(value);
        if bits > MAX_MODULUS_BIT_COUNT {
            return Err(NativeFault::invalid_argument(format!(
                "value can be at most {MAX_MODULUS_BIT_COUNT} bits, got {bits}"
            )));
        }
        Ok(Modulus {
            value,
            bit_count: bits,
            is_prime: is_prime(value),
        })
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn bit_count(&self) -> u32 {
        self.bit_count
    }

    pub fn is_prime(&self) -> bool {
        self.is_prime
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }
}

impl WriterTo for Modulus {
    fn write_to<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        writer.write_u64::<LittleEndian>(self.value)
    }
}

impl ReaderFrom for Modulus {
    fn read_from<R: Read>(&mut self, reader: &mut R) -> IoResult<()> {
        let value: u64 = reader.read_u64::<LittleEndian>()?;
        *self = Modulus::new(value).map_err(|fault| invalid_data(fault.message))?;
        Ok(())
    }
}

fn check_degree(poly_modulus_degree: u64) -> Result<()> {
    if !poly_modulus_degree.is_power_of_two()
        || !(MIN_POLY_MODULUS_DEGREE..=MAX_POLY_MODULUS_DEGREE).contains(&poly_modulus_degree)
    {
        return Err(NativeFault::invalid_argument(format!(
            "poly_modulus_degree {poly_modulus_degree} is not a power of two in [{MIN_POLY_MODULUS_DEGREE}, {MAX_POLY_MODULUS_DEGREE}]"
        )));
    }
    Ok(())
}

/// Largest total coefficient modulus bit count allowed at `sec_level`, or 0
/// when the degree is not covered by the standard tables.
pub fn max_bit_count(poly_modulus_degree: u64, sec_level: SecurityLevel) -> u32 {
    let table: [(u64, u32); 6] = match sec_level {
        SecurityLevel::None => return u32::MAX,
        SecurityLevel::Tc128 => [(1024, 27), (2048, 54), (4096, 109), (8192, 218), (16384, 438), (32768, 881)],
        SecurityLevel::Tc192 => [(1024, 19), (2048, 37), (4096, 75), (8192, 152), (16384, 305), (32768, 611)],
        SecurityLevel::Tc256 => [(1024, 14), (2048, 29), (4096, 58), (8192, 118), (16384, 237), (32768, 476)],
    };
    table
        .iter()
        .find(|(n, _)| *n == poly_modulus_degree)
        .map(|(_, bits)| *bits)
        .unwrap_or(0)
}

/// Bit sizes of the default BFV coefficient modulus at each security level.
fn bfv_default_bit_sizes(poly_modulus_degree: u64, sec_level: SecurityLevel) -> Option<Vec<u32>> {
    let sizes: Vec<u32> = match (sec_level, poly_modulus_degree) {
        (SecurityLevel::Tc128, 1024) => vec![27],
        (SecurityLevel::Tc128, 2048) => vec![54],
        (SecurityLevel::Tc128, 4096) => vec![36, 36, 37],
        (SecurityLevel::Tc128, 8192) => vec![43, 43, 44, 44, 44],
        (SecurityLevel::Tc128, 16384) => vec![48, 48, 48, 49, 49, 49, 49, 49, 49],
        (SecurityLevel::Tc128, 32768) => [vec![55; 15], vec![56]].concat(),
        (SecurityLevel::Tc192, 1024) => vec![19],
        (SecurityLevel::Tc192, 2048) => vec![37],
        (SecurityLevel::Tc192, 4096) => vec![25, 25, 25],
        (SecurityLevel::Tc192, 8192) => vec![38, 38, 38, 38],
        (SecurityLevel::Tc192, 16384) => vec![50, 50, 50, 50, 50, 55],
        (SecurityLevel::Tc192, 32768) => [vec![56; 10], vec![51]].concat(),
        (SecurityLevel::Tc256, 1024) => vec![14],
        (SecurityLevel::Tc256, 2048) => vec![29],
        (SecurityLevel::Tc256, 4096) => vec![58],
        (SecurityLevel::Tc256, 8192) => vec![39, 39, 40],
        (SecurityLevel::Tc256, 16384) => vec![47, 47, 47, 48, 48],
        (SecurityLevel::Tc256, 32768) => [vec![53; 8], vec![52]].concat(),
        _ => return None,
    };
    Some(sizes)
}

pub struct CoeffModulus;

impl CoeffModulus {
    /// Distinct primes `q_i = 1 mod 2n` with the requested bit sizes, in the
    /// order of `bit_sizes`.
    pub fn create(poly_modulus_degree: u64, bit_sizes: &[i32]) -> Result<Vec<Modulus>> {
        check_degree(poly_modulus_degree)?;
        if bit_sizes.is_empty() || bit_sizes.len() > MAX_COEFF_MODULUS_COUNT {
            return Err(NativeFault::invalid_argument(format!(
                "bit_sizes must hold between 1 and {MAX_COEFF_MODULUS_COUNT} entries, got {}",
                bit_sizes.len()
            )));
        }
        if let Some(bad) = bit_sizes.iter().find(|size| {
            **size < MIN_USER_MODULUS_BIT_COUNT as i32 || **size > MAX_USER_MODULUS_BIT_COUNT as i32
        }) {
            return Err(NativeFault::invalid_argument(format!(
                "bit size {bad} is outside [{MIN_USER_MODULUS_BIT_COUNT}, {MAX_USER_MODULUS_BIT_COUNT}]"
            )));
        }

        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        bit_sizes
            .iter()
            .for_each(|size| *counts.entry(*size as u32).or_insert(0) += 1);

        let factor: u64 = 2 * poly_modulus_degree;
        let mut pools: BTreeMap<u32, std::vec::IntoIter<u64>> = BTreeMap::new();
        for (size, count) in counts {
            let primes: Vec<u64> = generate_primes(size, factor, count).ok_or_else(|| {
                NativeFault::logic_error(format!(
                    "failed to find {count} primes of {size} bits congruent to 1 mod {factor}"
                ))
            })?;
            pools.insert(size, primes.into_iter());
        }

        bit_sizes
            .iter()
            .map(|size| {
                let q: u64 = pools
                    .get_mut(&(*size as u32))
                    .and_then(|pool| pool.next())
                    .ok_or_else(|| NativeFault::logic_error("prime pool exhausted"))?;
                Modulus::new(q)
            })
            .collect()
    }

    pub fn bfv_default(poly_modulus_degree: u64, sec_level: SecurityLevel) -> Result<Vec<Modulus>> {
        let sizes: Vec<u32> = bfv_default_bit_sizes(poly_modulus_degree, sec_level).ok_or_else(|| {
            NativeFault::invalid_argument(format!(
                "no default coefficient modulus for poly_modulus_degree {poly_modulus_degree} at {sec_level:?}"
            ))
        })?;
        let sizes: Vec<i32> = sizes.iter().map(|s| *s as i32).collect();
        Self::create(poly_modulus_degree, &sizes)
    }

    pub fn max_bit_count(poly_modulus_degree: u64, sec_level: SecurityLevel) -> u32 {
        max_bit_count(poly_modulus_degree, sec_level)
    }
}

pub struct PlainModulus;

impl PlainModulus {
    /// A prime of `bit_size` bits supporting batching at this degree.
    pub fn batching(poly_modulus_degree: u64, bit_size: i32) -> Result<Modulus> {
        let mut primes: Vec<Modulus> = CoeffModulus::create(poly_modulus_degree, &[bit_size])?;
        primes
            .pop()
            .ok_or_else(|| NativeFault::logic_error("no batching prime generated"))
    }

    pub fn batching_many(poly_modulus_degree: u64, bit_sizes: &[i32]) -> Result<Vec<Modulus>> {
        CoeffModulus::create(poly_modulus_degree, bit_sizes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modulus_rejects_one_and_oversized_values() {
        assert!(Modulus::new(1).is_err());
        assert!(Modulus::new(1u64 << 61).is_err());
        let zero: Modulus = Modulus::new(0).unwrap();
        assert!(zero.is_zero());
        let m: Modulus = Modulus::new(65537).unwrap();
        assert_eq!(m.bit_count(), 17);
        assert!(m.is_prime());
        assert!(!Modulus::new(65535).unwrap().is_prime());
    }

    #[test]
    fn create_keeps_requested_order_and_distinctness() {
        let moduli: Vec<Modulus> = CoeffModulus::create(4096, &[36, 40, 36, 50]).unwrap();
        let bits: Vec<u32> = moduli.iter().map(|m| m.bit_count()).collect();
        assert_eq!(bits, vec![36, 40, 36, 50]);
        assert_ne!(moduli[0], moduli[2]);
        moduli.iter().for_each(|m| {
            assert!(m.is_prime());
            assert_eq!(m.value() % 8192, 1);
        });
    }

    #[test]
    fn create_rejects_bad_inputs() {
        assert!(CoeffModulus::create(4096, &[]).is_err());
        assert!(CoeffModulus::create(4096, &[61]).is_err());
        assert!(CoeffModulus::create(4096, &[1]).is_err());
        assert!(CoeffModulus::create(3000, &[40]).is_err());
    }

    #[test]
    fn defaults_fit_security_tables() {
        for sec in [SecurityLevel::Tc128, SecurityLevel::Tc192, SecurityLevel::Tc256] {
            for n in [1024u64, 2048, 4096, 8192] {
                let moduli: Vec<Modulus> = CoeffModulus::bfv_default(n, sec).unwrap();
                let total: u32 = moduli.iter().map(|m| m.bit_count()).sum();
                assert!(total <= max_bit_count(n, sec), "n={n} sec={sec:?} total={total}");
            }
        }
        assert_eq!(max_bit_count(4096, SecurityLevel::Tc128), 109);
        assert_eq!(max_bit_count(512, SecurityLevel::Tc128), 0);
    }

    #[test]
    fn batching_prime_supports_slots() {
        let t: Modulus = PlainModulus::batching(4096, 20).unwrap();
        assert_eq!(t.bit_count(), 20);
        assert_eq!(t.value() % 8192, 1);
    }
}
