//! Moduli and the helpers choosing them.

use backend::ffi;

pub use backend::ffi::SecurityLevel;

use crate::error::Result;
use crate::handle::Handle;
use crate::kinds::{ModulusKind, ModulusVectorKind};
use crate::native;
use crate::serialization::serializable;

/// A modulus of at most 61 bits.
pub type Modulus = Handle<ModulusKind>;

impl Modulus {
    pub fn new(value: u64) -> Result<Modulus> {
        native::construct(|out| unsafe { ffi::modulus::seal_modulus_create(value, out) })
    }

    pub fn value(&self) -> Result<u64> {
        let this: *const ffi::modulus_t = self.as_const()?;
        native::read(|out| unsafe { ffi::modulus::seal_modulus_value(this, out) })
    }

    pub fn bit_count(&self) -> Result<i32> {
        let this: *const ffi::modulus_t = self.as_const()?;
        native::read(|out| unsafe { ffi::modulus::seal_modulus_bit_count(this, out) })
    }

    pub fn is_prime(&self) -> Result<bool> {
        let this: *const ffi::modulus_t = self.as_const()?;
        native::read(|out| unsafe { ffi::modulus::seal_modulus_is_prime(this, out) })
    }
}

serializable!(
    Modulus,
    ffi::modulus_t,
    ffi::modulus::seal_modulus_save,
    ffi::modulus::seal_modulus_load
);

/// Reference counted list of moduli. Clones made with
/// [`Handle::shallow_clone`] observe each other's writes; a
/// [`Handle::deep_copy`] does not.
pub type ModulusVector = Handle<ModulusVectorKind>;

impl ModulusVector {
    pub fn new(values: &[u64]) -> Result<ModulusVector> {
        native::construct(|out| unsafe {
            ffi::modulus::seal_modulus_vector_create(values.as_ptr(), values.len() as u64, out)
        })
    }

    pub fn len(&self) -> Result<usize> {
        let this: *const ffi::modulus_vector_t = self.as_const()?;
        native::read(|out| unsafe { ffi::modulus::seal_modulus_vector_size(this, out) }).map(|n: u64| n as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Copy of element `index`, `None` past the end.
    pub fn get(&self, index: usize) -> Result<Option<Modulus>> {
        let this: *const ffi::modulus_vector_t = self.as_const()?;
        native::produce_optional(|out| unsafe { ffi::modulus::seal_modulus_vector_get(this, index as u64, out) })
    }

    /// Overwrites element `index`; out of bounds writes nothing and returns
    /// `false`.
    pub fn set(&self, index: usize, modulus: &Modulus) -> Result<bool> {
        let this: *const ffi::modulus_vector_t = self.as_const()?;
        native::check_found(unsafe { ffi::modulus::seal_modulus_vector_set(this, index as u64, modulus.as_const()?) })
    }

    pub fn push(&self, modulus: &Modulus) -> Result<()> {
        let this: *const ffi::modulus_vector_t = self.as_const()?;
        native::check(unsafe { ffi::modulus::seal_modulus_vector_push(this, modulus.as_const()?) })?;
        Ok(())
    }

    pub fn values(&self) -> Result<Vec<u64>> {
        let this: *const ffi::modulus_vector_t = self.as_const()?;
        native::read_buffer(|buf, len| unsafe { ffi::modulus::seal_modulus_vector_values(this, buf, len) })
    }
}

/// Coefficient modulus selection.
pub struct CoeffModulus;

impl CoeffModulus {
    /// NTT-friendly primes of the requested bit sizes for `poly_modulus_degree`.
    pub fn create(poly_modulus_degree: u64, bit_sizes: &[i32]) -> Result<ModulusVector> {
        native::construct(|out| unsafe {
            ffi::modulus::seal_coeff_modulus_create(poly_modulus_degree, bit_sizes.as_ptr(), bit_sizes.len() as u64, out)
        })
    }

    /// Default BFV moduli at `sec_level`.
    pub fn bfv_default(poly_modulus_degree: u64, sec_level: SecurityLevel) -> Result<ModulusVector> {
        native::construct(|out| unsafe {
            ffi::modulus::seal_coeff_modulus_bfv_default(poly_modulus_degree, sec_level as i32, out)
        })
    }

    /// Largest total coefficient modulus bit count allowed at `sec_level`.
    pub fn max_bit_count(poly_modulus_degree: u64, sec_level: SecurityLevel) -> Result<i32> {
        native::read(|out| unsafe { ffi::modulus::seal_coeff_modulus_max_bit_count(poly_modulus_degree, sec_level as i32, out) })
    }
}

pub struct PlainModulus;

impl PlainModulus {
    /// Prime of `bit_size` bits congruent to 1 modulo `2 * poly_modulus_degree`.
    pub fn batching(poly_modulus_degree: u64, bit_size: i32) -> Result<Modulus> {
        native::construct(|out| unsafe { ffi::modulus::seal_plain_modulus_batching(poly_modulus_degree, bit_size, out) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorCategory};
    use crate::serialization::{ComprMode, Load, Save};
    use crate::tests::init;

    #[test]
    fn modulus_properties() {
        init();
        let q: Modulus = Modulus::new(65537).unwrap();
        assert_eq!(q.value().unwrap(), 65537);
        assert_eq!(q.bit_count().unwrap(), 17);
        assert!(q.is_prime().unwrap());
        assert!(!Modulus::new(65536).unwrap().is_prime().unwrap());

        let err: Error = Modulus::new(1 << 62).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Construction);
    }

    #[test]
    fn modulus_round_trip() {
        init();
        let q: Modulus = Modulus::new(97).unwrap();
        let bytes: Vec<u8> = q.save_to_vec(ComprMode::Zstd).unwrap();
        assert_eq!(Modulus::load_from_vec(&bytes).unwrap().value().unwrap(), 97);
        assert!(Modulus::load_from_vec(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn shared_vector_sees_writes() {
        init();
        let a: ModulusVector = ModulusVector::new(&[17, 97]).unwrap();
        let b: ModulusVector = a.shallow_clone().unwrap();
        let copy: ModulusVector = a.deep_copy().unwrap();
        b.set(0, &Modulus::new(193).unwrap()).unwrap();
        assert_eq!(a.values().unwrap(), vec![193, 97]);
        assert_eq!(copy.values().unwrap(), vec![17, 97]);
        assert!(!a.set(5, &Modulus::new(3).unwrap()).unwrap());
        assert!(a.get(5).unwrap().is_none());
        assert_eq!(a.get(1).unwrap().unwrap().value().unwrap(), 97);
    }

    #[test]
    fn coeff_modulus_helpers() {
        init();
        let moduli: ModulusVector = CoeffModulus::create(4096, &[36, 36, 37]).unwrap();
        assert_eq!(moduli.len().unwrap(), 3);
        assert!(moduli.values().unwrap().iter().all(|q| q % 8192 == 1));
        assert_eq!(CoeffModulus::max_bit_count(4096, SecurityLevel::Tc128).unwrap(), 109);
        assert!(!CoeffModulus::bfv_default(4096, SecurityLevel::Tc128).unwrap().is_empty().unwrap());
        let t: Modulus = PlainModulus::batching(4096, 20).unwrap();
        assert_eq!(t.value().unwrap() % 8192, 1);
    }
}
