//! Validated parameters and the modulus switching chain.
//!
//! A [`Context`] holds one [`ContextData`] per level: the key level on top,
//! then the data levels, each dropping the last coefficient modulus of the
//! one above. Both kinds are reference counted.

use backend::ffi::{self, EncryptionParameterQualifiers, FaultKind};

pub use backend::ffi::ErrorType;

use crate::error::{Error, Result};
use crate::exception::{RawFault, translate};
use crate::handle::Handle;
use crate::kinds::{ContextDataKind, ContextKind};
use crate::modulus::SecurityLevel;
use crate::native;
use crate::parameters::{EncryptionParameters, ParmsId};

pub type Context = Handle<ContextKind>;

impl Context {
    /// Validates `parms`. Invalid parameters still give a context, with
    /// [`Context::parameters_set`] false.
    pub fn new(parms: &EncryptionParameters, expand_mod_chain: bool, sec_level: SecurityLevel) -> Result<Context> {
        let parms: *const ffi::parms_t = parms.as_const()?;
        native::construct(|out| unsafe { ffi::context::seal_context_create(parms, expand_mod_chain, sec_level as i32, out) })
    }

    pub fn parameters_set(&self) -> Result<bool> {
        let this: *const ffi::context_t = self.as_const()?;
        native::read(|out| unsafe { ffi::context::seal_context_parameters_set(this, out) })
    }

    pub fn parameter_error(&self) -> Result<ErrorType> {
        let this: *const ffi::context_t = self.as_const()?;
        let code: i32 = native::read(|out| unsafe { ffi::context::seal_context_parameter_error(this, out) })?;
        error_type(code)
    }

    pub fn parameter_error_name(&self) -> Result<String> {
        let this: *const ffi::context_t = self.as_const()?;
        native::read_string(|buf, len| unsafe { ffi::context::seal_context_parameter_error_name(this, buf, len) })
    }

    pub fn parameter_error_message(&self) -> Result<String> {
        let this: *const ffi::context_t = self.as_const()?;
        native::read_string(|buf, len| unsafe { ffi::context::seal_context_parameter_error_message(this, buf, len) })
    }

    pub fn using_keyswitching(&self) -> Result<bool> {
        let this: *const ffi::context_t = self.as_const()?;
        native::read(|out| unsafe { ffi::context::seal_context_using_keyswitching(this, out) })
    }

    pub fn key_parms_id(&self) -> Result<ParmsId> {
        let this: *const ffi::context_t = self.as_const()?;
        ParmsId::read(|out| unsafe { ffi::context::seal_context_key_parms_id(this, out) })
    }

    pub fn first_parms_id(&self) -> Result<ParmsId> {
        let this: *const ffi::context_t = self.as_const()?;
        ParmsId::read(|out| unsafe { ffi::context::seal_context_first_parms_id(this, out) })
    }

    pub fn last_parms_id(&self) -> Result<ParmsId> {
        let this: *const ffi::context_t = self.as_const()?;
        ParmsId::read(|out| unsafe { ffi::context::seal_context_last_parms_id(this, out) })
    }

    /// Level with fingerprint `parms_id`, `None` if it is not in the chain.
    pub fn get_context_data(&self, parms_id: &ParmsId) -> Result<Option<ContextData>> {
        let this: *const ffi::context_t = self.as_const()?;
        native::produce_optional(|out| unsafe { ffi::context::seal_context_get_context_data(this, parms_id.as_ptr(), out) })
    }

    pub fn key_context_data(&self) -> Result<ContextData> {
        let this: *const ffi::context_t = self.as_const()?;
        native::produce(|out| unsafe { ffi::context::seal_context_key_context_data(this, out) })
    }

    pub fn first_context_data(&self) -> Result<ContextData> {
        let this: *const ffi::context_t = self.as_const()?;
        native::produce(|out| unsafe { ffi::context::seal_context_first_context_data(this, out) })
    }

    pub fn last_context_data(&self) -> Result<ContextData> {
        let this: *const ffi::context_t = self.as_const()?;
        native::produce(|out| unsafe { ffi::context::seal_context_last_context_data(this, out) })
    }
}

/// One level of the modulus switching chain.
pub type ContextData = Handle<ContextDataKind>;

impl ContextData {
    /// Copy of the parameters of this level.
    pub fn parms(&self) -> Result<EncryptionParameters> {
        let this: *const ffi::context_data_t = self.as_const()?;
        native::produce(|out| unsafe { ffi::context::seal_context_data_parms(this, out) })
    }

    pub fn parms_id(&self) -> Result<ParmsId> {
        let this: *const ffi::context_data_t = self.as_const()?;
        ParmsId::read(|out| unsafe { ffi::context::seal_context_data_parms_id(this, out) })
    }

    /// 0 for the last level, increasing towards the key level.
    pub fn chain_index(&self) -> Result<usize> {
        let this: *const ffi::context_data_t = self.as_const()?;
        native::read(|out| unsafe { ffi::context::seal_context_data_chain_index(this, out) }).map(|i: u64| i as usize)
    }

    pub fn total_coeff_modulus_bit_count(&self) -> Result<i32> {
        let this: *const ffi::context_data_t = self.as_const()?;
        native::read(|out| unsafe { ffi::context::seal_context_data_total_coeff_modulus_bit_count(this, out) })
    }

    pub fn qualifiers(&self) -> Result<EncryptionParameterQualifiers> {
        let this: *const ffi::context_data_t = self.as_const()?;
        let mut qualifiers: EncryptionParameterQualifiers = EncryptionParameterQualifiers {
            parameter_error: ErrorType::None,
            using_fft: false,
            using_ntt: false,
            using_batching: false,
            using_fast_plain_lift: false,
            using_descending_modulus_chain: false,
            sec_level: SecurityLevel::None,
        };
        native::check(unsafe { ffi::context::seal_context_data_qualifiers(this, &mut qualifiers) })?;
        Ok(qualifiers)
    }

    /// Level above, `None` at the key level.
    pub fn prev(&self) -> Result<Option<ContextData>> {
        let this: *const ffi::context_data_t = self.as_const()?;
        native::produce_optional(|out| unsafe { ffi::context::seal_context_data_prev(this, out) })
    }

    /// Level below, `None` at the last level.
    pub fn next(&self) -> Result<Option<ContextData>> {
        let this: *const ffi::context_data_t = self.as_const()?;
        native::produce_optional(|out| unsafe { ffi::context::seal_context_data_next(this, out) })
    }
}

/// An unrecognized code means the engine and this crate disagree.
fn error_type(code: i32) -> Result<ErrorType> {
    ErrorType::from_i32(code).ok_or_else(|| {
        Error::from_record(translate(&RawFault::Structured {
            kind: FaultKind::LogicError.as_str(),
            message: &format!("unknown parameter error code {code}"),
        }))
    })
}
