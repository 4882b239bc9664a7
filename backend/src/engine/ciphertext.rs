use std::io::{Read, Result as IoResult, Write};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::engine::context::{Context, ContextData};
use crate::engine::memory::{MemoryPool, record_words};
use crate::engine::modulus::MAX_COEFF_MODULUS_COUNT;
use crate::engine::parameters::ParmsId;
use crate::engine::serialization::{
    MAX_ELEMENT_COUNT, ReaderFrom, WriterTo, invalid_data, read_count, read_u64_vec, write_u64_slice,
};
use crate::fault::{NativeFault, Result};

pub const MIN_CIPHERTEXT_SIZE: usize = 2;
pub const MAX_CIPHERTEXT_SIZE: usize = 16;

/// A ciphertext of `size` polynomials, each stored as `coeff_modulus_size`
/// residue polynomials of `poly_modulus_degree` coefficients.
#[derive(Clone, Debug, PartialEq)]
pub struct Ciphertext {
    data: Vec<u64>,
    size: usize,
    poly_modulus_degree: usize,
    coeff_modulus_size: usize,
    parms_id: ParmsId,
    chain_id: ParmsId,
    scale: f64,
}

impl Default for Ciphertext {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            size: 0,
            poly_modulus_degree: 0,
            coeff_modulus_size: 0,
            parms_id: ParmsId::ZERO,
            chain_id: ParmsId::ZERO,
            scale: 1.0,
        }
    }
}

fn check_size(size: usize) -> Result<()> {
    if size != 0 && !(MIN_CIPHERTEXT_SIZE..=MAX_CIPHERTEXT_SIZE).contains(&size) {
        return Err(NativeFault::invalid_argument(format!(
            "ciphertext size {size} must be 0 or in [{MIN_CIPHERTEXT_SIZE}, {MAX_CIPHERTEXT_SIZE}]"
        )));
    }
    Ok(())
}

impl Ciphertext {
    /// Zero ciphertext of `size` polynomials at the level `parms_id`.
    pub fn with_context(
        context: &Context,
        parms_id: &ParmsId,
        size: usize,
        pool: Option<&Arc<MemoryPool>>,
    ) -> Result<Ciphertext> {
        context.require_set()?;
        check_size(size)?;
        let level: &Arc<ContextData> = context.level(parms_id, "parms_id")?;
        let n: usize = level.poly_modulus_degree();
        let k: usize = level.coeff_modulus_size();
        record_words(pool, size * n * k);
        Ok(Ciphertext {
            data: vec![0; size * n * k],
            size,
            poly_modulus_degree: n,
            coeff_modulus_size: k,
            parms_id: *parms_id,
            chain_id: context.key_parms_id(),
            scale: 1.0,
        })
    }

    /// Ciphertext of `size` polynomials at `level` holding `data`.
    pub(crate) fn from_parts(level: &ContextData, chain_id: ParmsId, size: usize, data: Vec<u64>, scale: f64) -> Ciphertext {
        debug_assert_eq!(data.len(), size * level.poly_modulus_degree() * level.coeff_modulus_size());
        Ciphertext {
            data,
            size,
            poly_modulus_degree: level.poly_modulus_degree(),
            coeff_modulus_size: level.coeff_modulus_size(),
            parms_id: level.parms_id(),
            chain_id,
            scale,
        }
    }

    pub fn resize(&mut self, context: &Context, size: usize) -> Result<()> {
        check_size(size)?;
        if self.parms_id.is_zero() {
            return Err(NativeFault::logic_error("ciphertext has no level to resize at"));
        }
        let level: &Arc<ContextData> = context.level(&self.parms_id, "ciphertext parms_id")?;
        let poly_len: usize = level.poly_modulus_degree() * level.coeff_modulus_size();
        self.data.resize(size * poly_len, 0);
        self.size = size;
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn poly_modulus_degree(&self) -> usize {
        self.poly_modulus_degree
    }

    pub fn coeff_modulus_size(&self) -> usize {
        self.coeff_modulus_size
    }

    pub fn parms_id(&self) -> ParmsId {
        self.parms_id
    }

    pub fn chain_id(&self) -> ParmsId {
        self.chain_id
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

    pub(crate) fn poly_len(&self) -> usize {
        self.poly_modulus_degree * self.coeff_modulus_size
    }

    /// Residues of polynomial `index`, modulus-major.
    pub fn poly(&self, index: usize) -> &[u64] {
        let len: usize = self.poly_len();
        &self.data[index * len..(index + 1) * len]
    }

    pub(crate) fn polys(&self) -> std::slice::ChunksExact<'_, u64> {
        self.data.chunks_exact(self.poly_len().max(1))
    }

    /// True when every polynomial past the first is zero.
    pub fn is_transparent(&self) -> bool {
        self.size < MIN_CIPHERTEXT_SIZE || self.data[self.poly_len()..].iter().all(|c| *c == 0)
    }

    /// Deep-copies `src` into `self`; rejected when the two belong to the
    /// chains of different contexts.
    pub fn assign_from(&mut self, src: &Ciphertext) -> Result<()> {
        if !self.chain_id.is_zero() && !src.chain_id.is_zero() && self.chain_id != src.chain_id {
            return Err(NativeFault::invalid_argument(
                "cannot assign a ciphertext created under a different context",
            ));
        }
        self.clone_from(src);
        Ok(())
    }

    /// Checks consistency with `context` and binds the ciphertext to its chain.
    pub fn validate(&mut self, context: &Context) -> Result<()> {
        context.require_set()?;
        let level: &Arc<ContextData> = context.level(&self.parms_id, "ciphertext parms_id")?;
        if self.poly_modulus_degree != level.poly_modulus_degree() || self.coeff_modulus_size != level.coeff_modulus_size()
        {
            return Err(NativeFault::invalid_argument("ciphertext dimensions do not match its level"));
        }
        check_size(self.size)?;
        if self.data.len() != self.size * self.poly_len() {
            return Err(NativeFault::invalid_argument("ciphertext data length does not match its size"));
        }
        let n: usize = self.poly_modulus_degree;
        let moduli: Vec<u64> = level.moduli();
        let reduced: bool = self.polys().all(|poly| {
            poly.chunks_exact(n)
                .zip(moduli.iter())
                .all(|(residues, q)| residues.iter().all(|c| c < q))
        });
        if !reduced {
            return Err(NativeFault::invalid_argument("ciphertext residue is not reduced modulo coeff_modulus"));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(NativeFault::invalid_argument("ciphertext scale is not a positive finite number"));
        }
        self.chain_id = context.key_parms_id();
        Ok(())
    }
}

impl WriterTo for Ciphertext {
    fn write_to<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        self.parms_id.write_to(writer)?;
        writer.write_u64::<LittleEndian>(self.size as u64)?;
        writer.write_u64::<LittleEndian>(self.poly_modulus_degree as u64)?;
        writer.write_u64::<LittleEndian>(self.coeff_modulus_size as u64)?;
        writer.write_u64::<LittleEndian>(self.scale.to_bits())?;
        write_u64_slice(writer, &self.data)
    }
}

impl ReaderFrom for Ciphertext {
    fn read_from<R: Read>(&mut self, reader: &mut R) -> IoResult<()> {
        let parms_id: ParmsId = ParmsId::read_from(reader)?;
        let size: usize = read_count(reader, "ciphertext polynomial")?;
        let n: usize = read_count(reader, "poly_modulus_degree")?;
        let k: usize = read_count(reader, "coeff_modulus")?;
        if size > MAX_CIPHERTEXT_SIZE || k > MAX_COEFF_MODULUS_COUNT {
            return Err(invalid_data(format!(
                "ciphertext metadata out of bounds: size={size} coeff_modulus_size={k}"
            )));
        }
        let len: u64 = (size * n * k) as u64;
        if len > MAX_ELEMENT_COUNT {
            return Err(invalid_data(format!("ciphertext data length {len} exceeds {MAX_ELEMENT_COUNT}")));
        }
        let scale: f64 = f64::from_bits(reader.read_u64::<LittleEndian>()?);
        let data: Vec<u64> = read_u64_vec(reader, len as usize)?;
        *self = Ciphertext {
            data,
            size,
            poly_modulus_degree: n,
            coeff_modulus_size: k,
            parms_id,
            chain_id: ParmsId::ZERO,
            scale,
        };
        Ok(())
    }
}
