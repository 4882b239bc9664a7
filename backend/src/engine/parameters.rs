use std::fmt;
use std::io::{Read, Result as IoResult, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use sha2::{Digest, Sha256};

use crate::engine::modulus::{MAX_COEFF_MODULUS_COUNT, Modulus};
use crate::engine::serialization::{ReaderFrom, WriterTo, invalid_data, read_count};
use crate::fault::{NativeFault, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SchemeType {
    #[default]
    None = 0,
    Bfv = 1,
    Ckks = 2,
}

impl SchemeType {
    pub fn from_u8(value: u8) -> Option<SchemeType> {
        match value {
            0 => Some(SchemeType::None),
            1 => Some(SchemeType::Bfv),
            2 => Some(SchemeType::Ckks),
            _ => None,
        }
    }
}

/// Fingerprint of a parameter set, used to tag objects with the level of
/// the modulus chain they belong to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(C)]
pub struct ParmsId(pub [u64; 4]);

impl ParmsId {
    pub const ZERO: ParmsId = ParmsId([0; 4]);

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub(crate) fn write_to<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        self.0
            .iter()
            .try_for_each(|w| writer.write_u64::<LittleEndian>(*w))
    }

    pub(crate) fn read_from<R: Read>(reader: &mut R) -> IoResult<ParmsId> {
        let mut words: [u64; 4] = [0; 4];
        reader.read_u64_into::<LittleEndian>(&mut words)?;
        Ok(ParmsId(words))
    }
}

impl fmt::Debug for ParmsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ParmsId({:016X} {:016X} {:016X} {:016X})",
            self.0[0], self.0[1], self.0[2], self.0[3]
        )
    }
}

/// User-facing parameter set. The fingerprint is recomputed after every
/// mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptionParameters {
    scheme: SchemeType,
    poly_modulus_degree: u64,
    coeff_modulus: Vec<Modulus>,
    plain_modulus: Modulus,
    parms_id: ParmsId,
}

impl Default for EncryptionParameters {
    fn default() -> Self {
        Self::new(SchemeType::None)
    }
}

impl EncryptionParameters {
    pub fn new(scheme: SchemeType) -> Self {
        let mut parms: EncryptionParameters = Self {
            scheme,
            poly_modulus_degree: 0,
            coeff_modulus: Vec::new(),
            plain_modulus: Modulus::default(),
            parms_id: ParmsId::ZERO,
        };
        parms.compute_parms_id();
        parms
    }

    pub fn from_parts(
        scheme: SchemeType,
        poly_modulus_degree: u64,
        coeff_modulus: &[Modulus],
        plain_modulus: Modulus,
    ) -> Result<Self> {
        let mut parms: EncryptionParameters = EncryptionParameters::new(scheme);
        parms.set_poly_modulus_degree(poly_modulus_degree)?;
        parms.set_coeff_modulus(coeff_modulus)?;
        parms.set_plain_modulus(plain_modulus)?;
        Ok(parms)
    }

    pub fn scheme(&self) -> SchemeType {
        self.scheme
    }

    pub fn poly_modulus_degree(&self) -> u64 {
        self.poly_modulus_degree
    }

    pub fn coeff_modulus(&self) -> &[Modulus] {
        &self.coeff_modulus
    }

    pub fn plain_modulus(&self) -> &Modulus {
        &self.plain_modulus
    }

    pub fn parms_id(&self) -> ParmsId {
        self.parms_id
    }

    pub fn set_poly_modulus_degree(&mut self, poly_modulus_degree: u64) -> Result<()> {
        if self.scheme == SchemeType::None && poly_modulus_degree != 0 {
            return Err(NativeFault::logic_error("poly_modulus_degree is not supported for this scheme"));
        }
        self.poly_modulus_degree = poly_modulus_degree;
        self.compute_parms_id();
        Ok(())
    }

    pub fn set_coeff_modulus(&mut self, coeff_modulus: &[Modulus]) -> Result<()> {
        if self.scheme == SchemeType::None && !coeff_modulus.is_empty() {
            return Err(NativeFault::logic_error("coeff_modulus is not supported for this scheme"));
        }
        if coeff_modulus.len() > MAX_COEFF_MODULUS_COUNT {
            return Err(NativeFault::invalid_argument(format!(
                "coeff_modulus holds {} moduli, at most {MAX_COEFF_MODULUS_COUNT} are allowed",
                coeff_modulus.len()
            )));
        }
        self.coeff_modulus = coeff_modulus.to_vec();
        self.compute_parms_id();
        Ok(())
    }

    pub fn set_plain_modulus(&mut self, plain_modulus: Modulus) -> Result<()> {
        if self.scheme != SchemeType::Bfv && !plain_modulus.is_zero() {
            return Err(NativeFault::logic_error("plain_modulus is not supported for this scheme"));
        }
        self.plain_modulus = plain_modulus;
        self.compute_parms_id();
        Ok(())
    }

    /// Copy of these parameters with the last coefficient modulus removed.
    pub(crate) fn drop_last_modulus(&self) -> EncryptionParameters {
        let mut next: EncryptionParameters = self.clone();
        next.coeff_modulus.pop();
        next.compute_parms_id();
        next
    }

    fn compute_parms_id(&mut self) {
        if self.scheme == SchemeType::None {
            self.parms_id = ParmsId::ZERO;
            return;
        }
        let mut hasher: Sha256 = Sha256::new();
        hasher.update((self.scheme as u64).to_le_bytes());
        hasher.update(self.poly_modulus_degree.to_le_bytes());
        hasher.update((self.coeff_modulus.len() as u64).to_le_bytes());
        self.coeff_modulus
            .iter()
            .for_each(|q| hasher.update(q.value().to_le_bytes()));
        hasher.update(self.plain_modulus.value().to_le_bytes());
        let digest = hasher.finalize();
        let mut words: [u64; 4] = [0; 4];
        words.iter_mut().zip(digest.chunks_exact(8)).for_each(|(w, chunk)| {
            let mut bytes: [u8; 8] = [0; 8];
            bytes.copy_from_slice(chunk);
            *w = u64::from_le_bytes(bytes);
        });
        self.parms_id = ParmsId(words);
    }
}

impl WriterTo for EncryptionParameters {
    fn write_to<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        writer.write_u8(self.scheme as u8)?;
        writer.write_u64::<LittleEndian>(self.poly_modulus_degree)?;
        writer.write_u64::<LittleEndian>(self.coeff_modulus.len() as u64)?;
        self.coeff_modulus.iter().try_for_each(|q| q.write_to(writer))?;
        self.plain_modulus.write_to(writer)
    }
}

impl ReaderFrom for EncryptionParameters {
    fn read_from<R: Read>(&mut self, reader: &mut R) -> IoResult<()> {
        let code: u8 = reader.read_u8()?;
        let scheme: SchemeType =
            SchemeType::from_u8(code).ok_or_else(|| invalid_data(format!("unsupported scheme {code}")))?;
        let degree: u64 = reader.read_u64::<LittleEndian>()?;
        let count: usize = read_count(reader, "coeff_modulus")?;
        if count > MAX_COEFF_MODULUS_COUNT {
            return Err(invalid_data(format!("coeff_modulus count {count} exceeds {MAX_COEFF_MODULUS_COUNT}")));
        }
        let mut coeff_modulus: Vec<Modulus> = vec![Modulus::default(); count];
        coeff_modulus
            .iter_mut()
            .try_for_each(|q| q.read_from(reader))?;
        let mut plain_modulus: Modulus = Modulus::default();
        plain_modulus.read_from(reader)?;

        *self = EncryptionParameters::from_parts(scheme, degree, &coeff_modulus, plain_modulus)
            .map_err(|fault| invalid_data(fault.message))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::serialization::{ComprMode, load, save};

    fn bfv() -> EncryptionParameters {
        let mut parms: EncryptionParameters = EncryptionParameters::new(SchemeType::Bfv);
        parms.set_poly_modulus_degree(4096).unwrap();
        parms
            .set_coeff_modulus(&[Modulus::new(68719403009).unwrap(), Modulus::new(68719230977).unwrap()])
            .unwrap();
        parms.set_plain_modulus(Modulus::new(786433).unwrap()).unwrap();
        parms
    }

    #[test]
    fn parms_id_tracks_every_field() {
        let parms: EncryptionParameters = bfv();
        let mut other: EncryptionParameters = parms.clone();
        assert_eq!(parms.parms_id(), other.parms_id());
        other.set_plain_modulus(Modulus::new(65537).unwrap()).unwrap();
        assert_ne!(parms.parms_id(), other.parms_id());
        assert_ne!(parms.drop_last_modulus().parms_id(), parms.parms_id());
        assert!(EncryptionParameters::new(SchemeType::None).parms_id().is_zero());
    }

    #[test]
    fn ckks_rejects_plain_modulus() {
        let mut parms: EncryptionParameters = EncryptionParameters::new(SchemeType::Ckks);
        let err: NativeFault = parms.set_plain_modulus(Modulus::new(65537).unwrap()).unwrap_err();
        assert_eq!(err.kind, crate::fault::FaultKind::LogicError);
    }

    #[test]
    fn serialization_preserves_parms_id() {
        let parms: EncryptionParameters = bfv();
        let bytes: Vec<u8> = save(&parms, ComprMode::Zstd).unwrap();
        let loaded: EncryptionParameters = load(&bytes).unwrap();
        assert_eq!(loaded, parms);
        assert_eq!(loaded.parms_id(), parms.parms_id());
    }
}
