use std::sync::Arc;

use crate::engine::context::{Context, ContextData, EncryptionParameterQualifiers};
use crate::engine::parameters::{EncryptionParameters, ParmsId};
use crate::ffi::modulus::security_level;
use crate::ffi::parameters::{read_parms_id, write_parms_id};
use crate::ffi::{
    Failure, HRESULT, S_FALSE, S_OK, context_data_t, context_t, ensure_ready, guard, into_raw, obj, parms_t,
    shared_into_raw, shared_kind, write_buffer, write_out,
};

unsafe fn write_level(out: *mut *mut context_data_t, level: Option<Arc<ContextData>>) -> Result<HRESULT, Failure> {
    match level {
        Some(level) => {
            unsafe { write_out(out, shared_into_raw::<ContextData, context_data_t>(level))? };
            Ok(S_OK)
        }
        None => Ok(S_FALSE),
    }
}

/// Validates `parms` and builds the modulus switching chain. Invalid
/// parameters still produce a context; see `seal_context_parameters_set`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_create(
    parms: *const parms_t,
    expand_mod_chain: bool,
    sec_level: i32,
    out: *mut *mut context_t,
) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let parms: &EncryptionParameters = obj(parms)?;
        let context: Context = Context::new(parms, expand_mod_chain, security_level(sec_level)?);
        write_out(out, shared_into_raw::<Context, context_t>(Arc::new(context)))?;
        Ok(S_OK)
    })
}

shared_kind!(Context, context_t, seal_context_retain, seal_context_destroy);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_parameters_set(this: *const context_t, out: *mut bool) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Context, _>(this)?.parameters_set())?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_parameter_error(this: *const context_t, out: *mut i32) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Context, _>(this)?.parameter_error() as i32)?;
        Ok(S_OK)
    })
}

/// Two-call name of the validation outcome.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_parameter_error_name(this: *const context_t, buf: *mut u8, len: *mut u64) -> HRESULT {
    guard(|| unsafe { write_buffer(obj::<Context, _>(this)?.parameter_error().name().as_bytes(), buf, len) })
}

/// Two-call description of the validation outcome.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_parameter_error_message(this: *const context_t, buf: *mut u8, len: *mut u64) -> HRESULT {
    guard(|| unsafe { write_buffer(obj::<Context, _>(this)?.parameter_error().message().as_bytes(), buf, len) })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_using_keyswitching(this: *const context_t, out: *mut bool) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Context, _>(this)?.using_keyswitching())?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_key_parms_id(this: *const context_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_parms_id(out, obj::<Context, _>(this)?.key_parms_id())?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_first_parms_id(this: *const context_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_parms_id(out, obj::<Context, _>(this)?.first_parms_id())?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_last_parms_id(this: *const context_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_parms_id(out, obj::<Context, _>(this)?.last_parms_id())?;
        Ok(S_OK)
    })
}

/// Level with the given fingerprint; `S_FALSE` if it is not in the chain.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_get_context_data(
    this: *const context_t,
    parms_id: *const u64,
    out: *mut *mut context_data_t,
) -> HRESULT {
    guard(|| unsafe {
        let id: ParmsId = read_parms_id(parms_id).ok_or(Failure::Null("parms_id"))?;
        write_level(out, obj::<Context, _>(this)?.get_context_data(&id).cloned())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_key_context_data(this: *const context_t, out: *mut *mut context_data_t) -> HRESULT {
    guard(|| unsafe { write_level(out, Some(obj::<Context, _>(this)?.key_context_data().clone())) })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_first_context_data(this: *const context_t, out: *mut *mut context_data_t) -> HRESULT {
    guard(|| unsafe { write_level(out, Some(obj::<Context, _>(this)?.first_context_data().clone())) })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_last_context_data(this: *const context_t, out: *mut *mut context_data_t) -> HRESULT {
    guard(|| unsafe { write_level(out, Some(obj::<Context, _>(this)?.last_context_data().clone())) })
}

shared_kind!(ContextData, context_data_t, seal_context_data_retain, seal_context_data_destroy);

/// Copy of the level's parameters as a new `parms_t`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_data_parms(this: *const context_data_t, out: *mut *mut parms_t) -> HRESULT {
    guard(|| unsafe {
        let parms: EncryptionParameters = obj::<ContextData, _>(this)?.parms().clone();
        write_out(out, into_raw::<EncryptionParameters, parms_t>(parms))?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_data_parms_id(this: *const context_data_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_parms_id(out, obj::<ContextData, _>(this)?.parms_id())?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_data_chain_index(this: *const context_data_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<ContextData, _>(this)?.chain_index() as u64)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_data_total_coeff_modulus_bit_count(this: *const context_data_t, out: *mut i32) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<ContextData, _>(this)?.total_coeff_modulus_bit_count() as i32)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_data_qualifiers(this: *const context_data_t, out: *mut EncryptionParameterQualifiers) -> HRESULT {
    guard(|| unsafe {
        write_out(out, *obj::<ContextData, _>(this)?.qualifiers())?;
        Ok(S_OK)
    })
}

/// Level above this one; `S_FALSE` at the key level.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_data_prev(this: *const context_data_t, out: *mut *mut context_data_t) -> HRESULT {
    guard(|| unsafe { write_level(out, obj::<ContextData, _>(this)?.prev_context_data()) })
}

/// Level below this one; `S_FALSE` at the end of the chain.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_context_data_next(this: *const context_data_t, out: *mut *mut context_data_t) -> HRESULT {
    guard(|| unsafe { write_level(out, obj::<ContextData, _>(this)?.next_context_data()) })
}
