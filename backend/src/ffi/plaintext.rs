use std::sync::Arc;

use crate::engine::memory::MemoryPool;
use crate::engine::plaintext::Plaintext;
use crate::fault::NativeFault;
use crate::ffi::memory::pool_arg;
use crate::ffi::parameters::write_parms_id;
use crate::ffi::{
    HRESULT, S_OK, boxed_kind, context_serializable_kind, ensure_ready, guard, into_raw, memory_pool_t, obj, obj_mut,
    plaintext_t, slice, write_buffer, write_out,
};

/// Zero plaintext of `coeff_count` coefficients with room for `capacity`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_create(
    capacity: u64,
    coeff_count: u64,
    pool: *const memory_pool_t,
    out: *mut *mut plaintext_t,
) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let pool: Option<Arc<MemoryPool>> = pool_arg(pool)?;
        let plain: Plaintext = Plaintext::with_capacity(capacity as usize, coeff_count as usize, pool.as_ref())?;
        write_out(out, into_raw::<Plaintext, plaintext_t>(plain))?;
        Ok(S_OK)
    })
}

/// Parses `len` bytes of UTF-8 such as `1x^2 + 3` into a plaintext.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_from_hex(
    poly: *const u8,
    len: u64,
    pool: *const memory_pool_t,
    out: *mut *mut plaintext_t,
) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let poly: &str = std::str::from_utf8(slice(poly, len)?)
            .map_err(|_| NativeFault::invalid_argument("polynomial is not valid UTF-8"))?;
        let pool: Option<Arc<MemoryPool>> = pool_arg(pool)?;
        write_out(out, into_raw::<Plaintext, plaintext_t>(Plaintext::from_hex_poly(poly, pool.as_ref())?))?;
        Ok(S_OK)
    })
}

boxed_kind!(Plaintext, plaintext_t, seal_plaintext_destroy, seal_plaintext_copy, seal_plaintext_assign);
context_serializable_kind!(Plaintext, plaintext_t, seal_plaintext_save, seal_plaintext_load);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_coeff_count(this: *const plaintext_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Plaintext, _>(this)?.coeff_count() as u64)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_capacity(this: *const plaintext_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Plaintext, _>(this)?.capacity() as u64)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_reserve(this: *mut plaintext_t, capacity: u64) -> HRESULT {
    guard(|| unsafe {
        obj_mut::<Plaintext, _>(this)?.reserve(capacity as usize)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_shrink_to_fit(this: *mut plaintext_t) -> HRESULT {
    guard(|| unsafe {
        obj_mut::<Plaintext, _>(this)?.shrink_to_fit();
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_resize(this: *mut plaintext_t, coeff_count: u64) -> HRESULT {
    guard(|| unsafe {
        obj_mut::<Plaintext, _>(this)?.resize(coeff_count as usize)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_set_zero(this: *mut plaintext_t) -> HRESULT {
    guard(|| unsafe {
        obj_mut::<Plaintext, _>(this)?.set_zero();
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_is_zero(this: *const plaintext_t, out: *mut bool) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Plaintext, _>(this)?.is_zero())?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_significant_coeff_count(this: *const plaintext_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Plaintext, _>(this)?.significant_coeff_count() as u64)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_nonzero_coeff_count(this: *const plaintext_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Plaintext, _>(this)?.nonzero_coeff_count() as u64)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_get_coeff(this: *const plaintext_t, index: u64, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Plaintext, _>(this)?.coeff(index as usize)?)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_set_coeff(this: *mut plaintext_t, index: u64, value: u64) -> HRESULT {
    guard(|| unsafe {
        obj_mut::<Plaintext, _>(this)?.set_coeff(index as usize, value)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_parms_id(this: *const plaintext_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_parms_id(out, obj::<Plaintext, _>(this)?.parms_id())?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_scale(this: *const plaintext_t, out: *mut f64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Plaintext, _>(this)?.scale())?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_set_scale(this: *mut plaintext_t, scale: f64) -> HRESULT {
    guard(|| unsafe {
        obj_mut::<Plaintext, _>(this)?.set_scale(scale);
        Ok(S_OK)
    })
}

/// Two-call copy of the polynomial string, UTF-8 without terminator.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plaintext_to_string(this: *const plaintext_t, buf: *mut u8, len: *mut u64) -> HRESULT {
    guard(|| unsafe { write_buffer(obj::<Plaintext, _>(this)?.to_hex_poly().as_bytes(), buf, len) })
}
