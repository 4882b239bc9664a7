use backend::ffi;

use crate::error::Result;
use crate::handle::Handle;
use crate::kinds::PlaintextKind;
use crate::memory::{MemoryPoolHandle, pool_ptr};
use crate::native;
use crate::parameters::ParmsId;
use crate::serialization::serializable;

/// Polynomial with coefficients modulo the plain modulus (BFV) or in NTT
/// form at one level of the chain (CKKS).
pub type Plaintext = Handle<PlaintextKind>;

impl Plaintext {
    /// Empty plaintext allocated from the global pool.
    pub fn new() -> Result<Plaintext> {
        Self::with_capacity(0, 0, None)
    }

    /// Zero polynomial of `coeff_count` coefficients with room for
    /// `capacity`.
    pub fn with_capacity(capacity: usize, coeff_count: usize, pool: Option<&MemoryPoolHandle>) -> Result<Plaintext> {
        let pool: *const ffi::memory_pool_t = pool_ptr(pool)?;
        native::construct(|out| unsafe {
            ffi::plaintext::seal_plaintext_create(capacity as u64, coeff_count as u64, pool, out)
        })
    }

    /// Parses the polynomial form produced by [`Plaintext::to_poly_string`],
    /// e.g. `7FFx^3 + 1x^1 + 3`, with hexadecimal coefficients.
    pub fn from_hex(poly: &str, pool: Option<&MemoryPoolHandle>) -> Result<Plaintext> {
        let pool: *const ffi::memory_pool_t = pool_ptr(pool)?;
        native::construct(|out| unsafe {
            ffi::plaintext::seal_plaintext_from_hex(poly.as_ptr(), poly.len() as u64, pool, out)
        })
    }

    pub fn coeff_count(&self) -> Result<usize> {
        let this: *const ffi::plaintext_t = self.as_const()?;
        native::read(|out| unsafe { ffi::plaintext::seal_plaintext_coeff_count(this, out) }).map(|n: u64| n as usize)
    }

    pub fn capacity(&self) -> Result<usize> {
        let this: *const ffi::plaintext_t = self.as_const()?;
        native::read(|out| unsafe { ffi::plaintext::seal_plaintext_capacity(this, out) }).map(|n: u64| n as usize)
    }

    pub fn reserve(&mut self, capacity: usize) -> Result<()> {
        let this: *mut ffi::plaintext_t = self.as_ptr()?;
        native::check(unsafe { ffi::plaintext::seal_plaintext_reserve(this, capacity as u64) })?;
        Ok(())
    }

    pub fn shrink_to_fit(&mut self) -> Result<()> {
        let this: *mut ffi::plaintext_t = self.as_ptr()?;
        native::check(unsafe { ffi::plaintext::seal_plaintext_shrink_to_fit(this) })?;
        Ok(())
    }

    pub fn resize(&mut self, coeff_count: usize) -> Result<()> {
        let this: *mut ffi::plaintext_t = self.as_ptr()?;
        native::check(unsafe { ffi::plaintext::seal_plaintext_resize(this, coeff_count as u64) })?;
        Ok(())
    }

    pub fn set_zero(&mut self) -> Result<()> {
        let this: *mut ffi::plaintext_t = self.as_ptr()?;
        native::check(unsafe { ffi::plaintext::seal_plaintext_set_zero(this) })?;
        Ok(())
    }

    pub fn is_zero(&self) -> Result<bool> {
        let this: *const ffi::plaintext_t = self.as_const()?;
        native::read(|out| unsafe { ffi::plaintext::seal_plaintext_is_zero(this, out) })
    }

    /// Coefficients up to and including the highest nonzero one.
    pub fn significant_coeff_count(&self) -> Result<usize> {
        let this: *const ffi::plaintext_t = self.as_const()?;
        native::read(|out| unsafe { ffi::plaintext::seal_plaintext_significant_coeff_count(this, out) })
            .map(|n: u64| n as usize)
    }

    pub fn nonzero_coeff_count(&self) -> Result<usize> {
        let this: *const ffi::plaintext_t = self.as_const()?;
        native::read(|out| unsafe { ffi::plaintext::seal_plaintext_nonzero_coeff_count(this, out) })
            .map(|n: u64| n as usize)
    }

    /// Fails with a range error past [`Plaintext::coeff_count`].
    pub fn coeff(&self, index: usize) -> Result<u64> {
        let this: *const ffi::plaintext_t = self.as_const()?;
        native::read(|out| unsafe { ffi::plaintext::seal_plaintext_get_coeff(this, index as u64, out) })
    }

    pub fn set_coeff(&mut self, index: usize, value: u64) -> Result<()> {
        let this: *mut ffi::plaintext_t = self.as_ptr()?;
        native::check(unsafe { ffi::plaintext::seal_plaintext_set_coeff(this, index as u64, value) })?;
        Ok(())
    }

    /// Zero unless the plaintext is in NTT form at some level.
    pub fn parms_id(&self) -> Result<ParmsId> {
        let this: *const ffi::plaintext_t = self.as_const()?;
        ParmsId::read(|out| unsafe { ffi::plaintext::seal_plaintext_parms_id(this, out) })
    }

    pub fn scale(&self) -> Result<f64> {
        let this: *const ffi::plaintext_t = self.as_const()?;
        native::read(|out| unsafe { ffi::plaintext::seal_plaintext_scale(this, out) })
    }

    pub fn set_scale(&mut self, scale: f64) -> Result<()> {
        let this: *mut ffi::plaintext_t = self.as_ptr()?;
        native::check(unsafe { ffi::plaintext::seal_plaintext_set_scale(this, scale) })?;
        Ok(())
    }

    pub fn to_poly_string(&self) -> Result<String> {
        let this: *const ffi::plaintext_t = self.as_const()?;
        native::read_string(|buf, len| unsafe { ffi::plaintext::seal_plaintext_to_string(this, buf, len) })
    }
}

serializable!(
    Plaintext,
    ffi::plaintext_t,
    ffi::plaintext::seal_plaintext_save,
    context: ffi::plaintext::seal_plaintext_load
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::context::tests::bfv_context;
    use crate::error::ErrorCategory;
    use crate::serialization::{ComprMode, LoadWithContext, Save};
    use crate::tests::init;

    #[test]
    fn coefficients() {
        init();
        let mut plain: Plaintext = Plaintext::from_hex("3x^2 + 1", None).unwrap();
        assert_eq!(plain.coeff_count().unwrap(), 3);
        assert_eq!(plain.coeff(2).unwrap(), 3);
        assert_eq!(plain.coeff(3).unwrap_err().category(), ErrorCategory::Range);

        plain.set_coeff(1, 0xAB).unwrap();
        assert_eq!(plain.to_poly_string().unwrap(), "3x^2 + ABx^1 + 1");
        assert_eq!(plain.nonzero_coeff_count().unwrap(), 3);

        plain.resize(8).unwrap();
        assert_eq!(plain.significant_coeff_count().unwrap(), 3);
        plain.reserve(32).unwrap();
        assert!(plain.capacity().unwrap() >= 32);
        plain.shrink_to_fit().unwrap();
        assert_eq!(plain.capacity().unwrap(), 8);

        plain.set_zero().unwrap();
        assert!(plain.is_zero().unwrap());
        assert_eq!(plain.to_poly_string().unwrap(), "0");
    }

    #[test]
    fn malformed_text_fails_construction() {
        init();
        let err = Plaintext::from_hex("x^2 + ", None).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Construction);
    }

    #[test]
    fn load_checks_the_context() {
        let context: Context = bfv_context();
        let plain: Plaintext = Plaintext::from_hex("10x^1 + 5", None).unwrap();
        let bytes: Vec<u8> = plain.save_to_vec(ComprMode::Lz4).unwrap();
        let loaded: Plaintext = Plaintext::load_from_vec(&context, &bytes).unwrap();
        assert_eq!(loaded.to_poly_string().unwrap(), "10x^1 + 5");

        let wide: Plaintext = Plaintext::from_hex("FFFFFFFF", None).unwrap();
        let bytes: Vec<u8> = wide.save_to_vec(ComprMode::None).unwrap();
        assert!(Plaintext::load_from_vec(&context, &bytes).is_err());
    }
}
