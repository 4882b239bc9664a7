use std::fmt::Write as _;
use std::io::{Read, Result as IoResult, Write};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::engine::context::{Context, ContextData};
use crate::engine::memory::{MemoryPool, record_words};
use crate::engine::parameters::{ParmsId, SchemeType};
use crate::engine::serialization::{ReaderFrom, WriterTo, invalid_data, read_count, read_u64_vec, write_u64_slice};
use crate::fault::{NativeFault, Result};

pub const MAX_PLAINTEXT_COEFF_COUNT: usize = 1 << 27;

/// Polynomial plaintext. BFV plaintexts carry the zero parms id and hold
/// coefficients modulo the plain modulus; CKKS plaintexts are tagged with a
/// level and hold one residue polynomial per coefficient modulus.
#[derive(Clone, Debug, PartialEq)]
pub struct Plaintext {
    data: Vec<u64>,
    capacity: usize,
    parms_id: ParmsId,
    scale: f64,
}

impl Default for Plaintext {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            capacity: 0,
            parms_id: ParmsId::ZERO,
            scale: 1.0,
        }
    }
}

fn check_count(count: usize, what: &str) -> Result<()> {
    if count > MAX_PLAINTEXT_COEFF_COUNT {
        return Err(NativeFault::invalid_argument(format!(
            "{what} {count} exceeds the maximum of {MAX_PLAINTEXT_COEFF_COUNT}"
        )));
    }
    Ok(())
}

impl Plaintext {
    pub fn new(coeff_count: usize, pool: Option<&Arc<MemoryPool>>) -> Result<Plaintext> {
        Self::with_capacity(coeff_count, coeff_count, pool)
    }

    pub fn with_capacity(capacity: usize, coeff_count: usize, pool: Option<&Arc<MemoryPool>>) -> Result<Plaintext> {
        check_count(capacity, "capacity")?;
        if capacity < coeff_count {
            return Err(NativeFault::invalid_argument(format!(
                "capacity {capacity} cannot be smaller than coeff_count {coeff_count}"
            )));
        }
        record_words(pool, capacity);
        Ok(Plaintext {
            data: vec![0; coeff_count],
            capacity,
            ..Default::default()
        })
    }

    /// Parses a polynomial such as `7FFx^3 + 1x^1 + 3`: hexadecimal
    /// coefficients, decimal exponents.
    pub fn from_hex_poly(poly: &str, pool: Option<&Arc<MemoryPool>>) -> Result<Plaintext> {
        let invalid = |term: &str| NativeFault::invalid_argument(format!("invalid polynomial term {term:?}"));
        let mut terms: Vec<(usize, u64)> = Vec::new();
        for term in poly.split('+') {
            let term: &str = term.trim();
            if term.is_empty() {
                return Err(invalid(term));
            }
            let (coeff, degree): (&str, usize) = match term.split_once("x^") {
                Some((coeff, degree)) => (coeff.trim(), degree.trim().parse().map_err(|_| invalid(term))?),
                None => (term, 0),
            };
            if coeff.is_empty() || coeff.starts_with('-') {
                return Err(invalid(term));
            }
            let coeff: u64 = u64::from_str_radix(coeff, 16).map_err(|_| invalid(term))?;
            check_count(degree + 1, "degree")?;
            terms.push((degree, coeff));
        }
        let coeff_count: usize = terms.iter().map(|(d, _)| d + 1).max().unwrap_or(0);
        let mut plain: Plaintext = Plaintext::new(coeff_count, pool)?;
        for (degree, coeff) in terms {
            plain.data[degree] = coeff;
        }
        Ok(plain)
    }

    pub fn coeff_count(&self) -> usize {
        self.data.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn reserve(&mut self, capacity: usize) -> Result<()> {
        check_count(capacity, "capacity")?;
        if capacity < self.data.len() {
            return Err(NativeFault::invalid_argument(format!(
                "capacity {capacity} cannot be smaller than coeff_count {}",
                self.data.len()
            )));
        }
        self.data.reserve_exact(capacity - self.data.len());
        self.capacity = capacity;
        Ok(())
    }

    pub fn shrink_to_fit(&mut self) {
        self.data.shrink_to_fit();
        self.capacity = self.data.len();
    }

    pub fn resize(&mut self, coeff_count: usize) -> Result<()> {
        check_count(coeff_count, "coeff_count")?;
        self.data.resize(coeff_count, 0);
        self.capacity = self.capacity.max(coeff_count);
        Ok(())
    }

    pub fn set_zero(&mut self) {
        self.data.iter_mut().for_each(|c| *c = 0);
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|c| *c == 0)
    }

    pub fn significant_coeff_count(&self) -> usize {
        self.data.iter().rposition(|c| *c != 0).map_or(0, |i| i + 1)
    }

    pub fn nonzero_coeff_count(&self) -> usize {
        self.data.iter().filter(|c| **c != 0).count()
    }

    pub fn coeff(&self, index: usize) -> Result<u64> {
        self.data.get(index).copied().ok_or_else(|| {
            NativeFault::out_of_range(format!(
                "coefficient index {index} is out of range for coeff_count {}",
                self.data.len()
            ))
        })
    }

    pub fn set_coeff(&mut self, index: usize, value: u64) -> Result<()> {
        let len: usize = self.data.len();
        let slot: &mut u64 = self.data.get_mut(index).ok_or_else(|| {
            NativeFault::out_of_range(format!("coefficient index {index} is out of range for coeff_count {len}"))
        })?;
        *slot = value;
        Ok(())
    }

    pub fn parms_id(&self) -> ParmsId {
        self.parms_id
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    pub fn data(&self) -> &[u64] {
        &self.data
    }

    /// Replaces the content with `data` tagged at `parms_id`.
    pub(crate) fn assign(&mut self, data: Vec<u64>, parms_id: ParmsId, scale: f64) {
        self.capacity = self.capacity.max(data.len());
        self.data = data;
        self.parms_id = parms_id;
        self.scale = scale;
    }

    pub fn to_hex_poly(&self) -> String {
        let mut out: String = String::new();
        for (degree, coeff) in self.data.iter().enumerate().rev().filter(|(_, c)| **c != 0) {
            if !out.is_empty() {
                out.push_str(" + ");
            }
            let _ = match degree {
                0 => write!(out, "{coeff:X}"),
                _ => write!(out, "{coeff:X}x^{degree}"),
            };
        }
        if out.is_empty() {
            out.push('0');
        }
        out
    }

    /// Checks that this plaintext is consistent with `context`.
    pub fn validate(&self, context: &Context) -> Result<()> {
        context.require_set()?;
        if self.parms_id.is_zero() {
            if context.scheme() != SchemeType::Bfv {
                return Err(NativeFault::invalid_argument("plaintext has no level for a non-BFV context"));
            }
            let first: &Arc<ContextData> = context.first_context_data();
            if self.data.len() > first.poly_modulus_degree() {
                return Err(NativeFault::invalid_argument(format!(
                    "plaintext coeff_count {} exceeds poly_modulus_degree {}",
                    self.data.len(),
                    first.poly_modulus_degree()
                )));
            }
            let t: u64 = first.plain_modulus();
            if self.data.iter().any(|c| *c >= t) {
                return Err(NativeFault::invalid_argument("plaintext coefficient is not reduced modulo plain_modulus"));
            }
            return Ok(());
        }
        let level: &Arc<ContextData> = context.level(&self.parms_id, "plaintext parms_id")?;
        let n: usize = level.poly_modulus_degree();
        if self.data.len() != n * level.coeff_modulus_size() {
            return Err(NativeFault::invalid_argument(format!(
                "plaintext holds {} coefficients, expected {}",
                self.data.len(),
                n * level.coeff_modulus_size()
            )));
        }
        let reduced: bool = self
            .data
            .chunks_exact(n)
            .zip(level.moduli())
            .all(|(poly, q)| poly.iter().all(|c| *c < q));
        if !reduced {
            return Err(NativeFault::invalid_argument("plaintext residue is not reduced modulo coeff_modulus"));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(NativeFault::invalid_argument("plaintext scale is not a positive finite number"));
        }
        Ok(())
    }
}

impl WriterTo for Plaintext {
    fn write_to<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        self.parms_id.write_to(writer)?;
        writer.write_u64::<LittleEndian>(self.data.len() as u64)?;
        writer.write_u64::<LittleEndian>(self.scale.to_bits())?;
        write_u64_slice(writer, &self.data)
    }
}

impl ReaderFrom for Plaintext {
    fn read_from<R: Read>(&mut self, reader: &mut R) -> IoResult<()> {
        let parms_id: ParmsId = ParmsId::read_from(reader)?;
        let len: usize = read_count(reader, "plaintext coefficient")?;
        let scale: f64 = f64::from_bits(reader.read_u64::<LittleEndian>()?);
        if !scale.is_finite() {
            return Err(invalid_data("plaintext scale is not finite"));
        }
        let data: Vec<u64> = read_u64_vec(reader, len)?;
        *self = Plaintext {
            capacity: data.len(),
            data,
            parms_id,
            scale,
        };
        Ok(())
    }
}
