use backend::ffi;

use crate::context::Context;
use crate::error::Result;
use crate::handle::Handle;
use crate::kinds::CiphertextKind;
use crate::memory::{MemoryPoolHandle, pool_ptr};
use crate::native;
use crate::parameters::ParmsId;
use crate::serialization::serializable;

/// A ciphertext of `size` polynomials at one level of a context's chain.
/// [`Handle::copy_from`] refuses a source created under another context.
pub type Ciphertext = Handle<CiphertextKind>;

impl Ciphertext {
    /// Empty ciphertext bound to no level; the usual destination of an
    /// encryption or evaluation.
    pub fn new(pool: Option<&MemoryPoolHandle>) -> Result<Ciphertext> {
        let pool: *const ffi::memory_pool_t = pool_ptr(pool)?;
        native::construct(|out| unsafe { ffi::ciphertext::seal_ciphertext_create(pool, out) })
    }

    /// Zero ciphertext of `size` polynomials at `parms_id`, or at the first
    /// data level when `parms_id` is `None`.
    pub fn with_context(
        context: &Context,
        parms_id: Option<&ParmsId>,
        size: usize,
        pool: Option<&MemoryPoolHandle>,
    ) -> Result<Ciphertext> {
        let context: *const ffi::context_t = context.as_const()?;
        let parms_id: *const u64 = parms_id.map_or(std::ptr::null(), ParmsId::as_ptr);
        let pool: *const ffi::memory_pool_t = pool_ptr(pool)?;
        native::construct(|out| unsafe {
            ffi::ciphertext::seal_ciphertext_create_with_context(context, parms_id, size as u64, pool, out)
        })
    }

    pub fn resize(&mut self, context: &Context, size: usize) -> Result<()> {
        let this: *mut ffi::ciphertext_t = self.as_ptr()?;
        native::check(unsafe { ffi::ciphertext::seal_ciphertext_resize(this, context.as_const()?, size as u64) })?;
        Ok(())
    }

    pub fn size(&self) -> Result<usize> {
        let this: *const ffi::ciphertext_t = self.as_const()?;
        native::read(|out| unsafe { ffi::ciphertext::seal_ciphertext_size(this, out) }).map(|n: u64| n as usize)
    }

    pub fn poly_modulus_degree(&self) -> Result<usize> {
        let this: *const ffi::ciphertext_t = self.as_const()?;
        native::read(|out| unsafe { ffi::ciphertext::seal_ciphertext_poly_modulus_degree(this, out) })
            .map(|n: u64| n as usize)
    }

    pub fn coeff_modulus_size(&self) -> Result<usize> {
        let this: *const ffi::ciphertext_t = self.as_const()?;
        native::read(|out| unsafe { ffi::ciphertext::seal_ciphertext_coeff_modulus_size(this, out) })
            .map(|n: u64| n as usize)
    }

    pub fn parms_id(&self) -> Result<ParmsId> {
        let this: *const ffi::ciphertext_t = self.as_const()?;
        ParmsId::read(|out| unsafe { ffi::ciphertext::seal_ciphertext_parms_id(this, out) })
    }

    pub fn scale(&self) -> Result<f64> {
        let this: *const ffi::ciphertext_t = self.as_const()?;
        native::read(|out| unsafe { ffi::ciphertext::seal_ciphertext_scale(this, out) })
    }

    pub fn set_scale(&mut self, scale: f64) -> Result<()> {
        let this: *mut ffi::ciphertext_t = self.as_ptr()?;
        native::check(unsafe { ffi::ciphertext::seal_ciphertext_set_scale(this, scale) })?;
        Ok(())
    }

    /// True when every polynomial past the first is zero.
    pub fn is_transparent(&self) -> Result<bool> {
        let this: *const ffi::ciphertext_t = self.as_const()?;
        native::read(|out| unsafe { ffi::ciphertext::seal_ciphertext_is_transparent(this, out) })
    }
}

serializable!(
    Ciphertext,
    ffi::ciphertext_t,
    ffi::ciphertext::seal_ciphertext_save,
    context: ffi::ciphertext::seal_ciphertext_load
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::bfv_context;
    use crate::error::{ErrorCategory, Result};
    use crate::modulus::{CoeffModulus, SecurityLevel};
    use crate::parameters::{EncryptionParameters, SchemeType};
    use crate::serialization::{ComprMode, LoadWithContext, Save};
    use crate::tests::init;

    #[test]
    fn sized_at_a_level() {
        let context: Context = bfv_context();
        let last: ParmsId = context.last_parms_id().unwrap();
        let mut encrypted: Ciphertext = Ciphertext::with_context(&context, Some(&last), 2, None).unwrap();
        assert_eq!(encrypted.size().unwrap(), 2);
        assert_eq!(encrypted.coeff_modulus_size().unwrap(), 1);
        assert_eq!(encrypted.poly_modulus_degree().unwrap(), 64);
        assert_eq!(encrypted.parms_id().unwrap(), last);
        assert!(encrypted.is_transparent().unwrap());

        encrypted.resize(&context, 3).unwrap();
        assert_eq!(encrypted.size().unwrap(), 3);
        let err = encrypted.resize(&context, 1).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NativeFault);

        encrypted.set_scale(4.0).unwrap();
        assert_eq!(encrypted.scale().unwrap(), 4.0);
    }

    #[test]
    fn default_level_is_first() {
        let context: Context = bfv_context();
        let encrypted: Ciphertext = Ciphertext::with_context(&context, None, 2, None).unwrap();
        assert_eq!(encrypted.parms_id().unwrap(), context.first_parms_id().unwrap());
        assert_eq!(encrypted.coeff_modulus_size().unwrap(), 2);
    }

    #[test]
    fn unknown_level_fails_construction() {
        let context: Context = bfv_context();
        let result: Result<Ciphertext> = Ciphertext::with_context(&context, Some(&ParmsId([1, 2, 3, 4])), 2, None);
        assert_eq!(result.unwrap_err().category(), ErrorCategory::Construction);
    }

    #[test]
    fn round_trip_and_copy() {
        let context: Context = bfv_context();
        let encrypted: Ciphertext = Ciphertext::with_context(&context, None, 2, None).unwrap();
        let text: String = encrypted.save_to_base64(ComprMode::Zstd).unwrap();
        let loaded: Ciphertext = Ciphertext::load_from_base64(&context, &text).unwrap();
        assert_eq!(loaded.parms_id().unwrap(), encrypted.parms_id().unwrap());

        let mut empty: Ciphertext = Ciphertext::new(None).unwrap();
        assert!(empty.parms_id().unwrap().is_zero());
        empty.copy_from(&loaded).unwrap();
        assert_eq!(empty.size().unwrap(), 2);
    }

    #[test]
    fn copy_across_contexts_is_rejected() {
        init();
        let mut parms: EncryptionParameters = EncryptionParameters::new(SchemeType::Bfv).unwrap();
        parms.set_poly_modulus_degree(128).unwrap();
        parms.set_coeff_modulus(&CoeffModulus::create(128, &[40, 40]).unwrap()).unwrap();
        parms.set_plain_modulus_value(257).unwrap();
        let other: Context = Context::new(&parms, true, SecurityLevel::None).unwrap();

        let a: Ciphertext = Ciphertext::with_context(&other, None, 2, None).unwrap();
        let mut b: Ciphertext = Ciphertext::with_context(&bfv_context(), None, 2, None).unwrap();
        assert!(b.copy_from(&a).is_err());
        assert_eq!(b.poly_modulus_degree().unwrap(), 64);
    }
}
