use std::fmt;

use backend::ffi::{self, HRESULT};

pub use backend::ffi::SchemeType;

use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::kinds::ParmsKind;
use crate::modulus::{Modulus, ModulusVector};
use crate::native;
use crate::serialization::serializable;

/// Fingerprint of a parameter set. The zero value is bound to no parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParmsId(pub [u64; 4]);

impl ParmsId {
    pub const ZERO: ParmsId = ParmsId([0; 4]);

    pub fn is_zero(&self) -> bool {
        *self == ParmsId::ZERO
    }

    pub(crate) fn as_ptr(&self) -> *const u64 {
        self.0.as_ptr()
    }

    /// Reads the four words an engine call writes through its out-pointer.
    pub(crate) fn read(f: impl FnOnce(*mut u64) -> HRESULT) -> Result<ParmsId> {
        let mut words: [u64; 4] = [0; 4];
        native::check(f(words.as_mut_ptr()))?;
        Ok(ParmsId(words))
    }
}

impl fmt::Display for ParmsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|word| write!(f, "{word:016x}"))
    }
}

pub type EncryptionParameters = Handle<ParmsKind>;

impl EncryptionParameters {
    pub fn new(scheme: SchemeType) -> Result<EncryptionParameters> {
        native::construct(|out| unsafe { ffi::parameters::seal_parms_create(scheme as u8, out) })
    }

    pub fn scheme(&self) -> Result<SchemeType> {
        let this: *const ffi::parms_t = self.as_const()?;
        let code: u8 = native::read(|out| unsafe { ffi::parameters::seal_parms_scheme(this, out) })?;
        SchemeType::from_u8(code).ok_or(Error::TypeMismatch {
            expected: "scheme type",
            found: "unknown scheme code",
        })
    }

    pub fn set_poly_modulus_degree(&mut self, degree: u64) -> Result<()> {
        let this: *mut ffi::parms_t = self.as_ptr()?;
        native::check(unsafe { ffi::parameters::seal_parms_set_poly_modulus_degree(this, degree) })?;
        Ok(())
    }

    pub fn poly_modulus_degree(&self) -> Result<u64> {
        let this: *const ffi::parms_t = self.as_const()?;
        native::read(|out| unsafe { ffi::parameters::seal_parms_poly_modulus_degree(this, out) })
    }

    /// Copies the current contents of `coeff_modulus`; later writes to the
    /// vector are not seen.
    pub fn set_coeff_modulus(&mut self, coeff_modulus: &ModulusVector) -> Result<()> {
        let this: *mut ffi::parms_t = self.as_ptr()?;
        native::check(unsafe { ffi::parameters::seal_parms_set_coeff_modulus(this, coeff_modulus.as_const()?) })?;
        Ok(())
    }

    pub fn coeff_modulus(&self) -> Result<ModulusVector> {
        let this: *const ffi::parms_t = self.as_const()?;
        native::produce(|out| unsafe { ffi::parameters::seal_parms_coeff_modulus(this, out) })
    }

    pub fn set_plain_modulus(&mut self, plain_modulus: &Modulus) -> Result<()> {
        let this: *mut ffi::parms_t = self.as_ptr()?;
        native::check(unsafe { ffi::parameters::seal_parms_set_plain_modulus(this, plain_modulus.as_const()?) })?;
        Ok(())
    }

    pub fn set_plain_modulus_value(&mut self, value: u64) -> Result<()> {
        let this: *mut ffi::parms_t = self.as_ptr()?;
        native::check(unsafe { ffi::parameters::seal_parms_set_plain_modulus_value(this, value) })?;
        Ok(())
    }

    pub fn plain_modulus(&self) -> Result<Modulus> {
        let this: *const ffi::parms_t = self.as_const()?;
        native::produce(|out| unsafe { ffi::parameters::seal_parms_plain_modulus(this, out) })
    }

    pub fn parms_id(&self) -> Result<ParmsId> {
        let this: *const ffi::parms_t = self.as_const()?;
        ParmsId::read(|out| unsafe { ffi::parameters::seal_parms_parms_id(this, out) })
    }
}

serializable!(
    EncryptionParameters,
    ffi::parms_t,
    ffi::parameters::seal_parms_save,
    ffi::parameters::seal_parms_load
);
