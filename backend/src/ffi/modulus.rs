use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::modulus::{CoeffModulus, Modulus, PlainModulus, SecurityLevel};
use crate::fault::NativeFault;
use crate::ffi::{
    Failure, HRESULT, S_FALSE, S_OK, boxed_kind, ensure_ready, guard, into_raw, modulus_t, modulus_vector_t, obj,
    serializable_kind, shared_into_raw, shared_kind, slice, write_buffer, write_out,
};

pub(crate) fn security_level(value: i32) -> Result<SecurityLevel, Failure> {
    SecurityLevel::from_i32(value)
        .ok_or_else(|| NativeFault::invalid_argument(format!("unsupported security level {value}")).into())
}

pub(crate) fn new_modulus_vector(moduli: Vec<Modulus>) -> *mut modulus_vector_t {
    shared_into_raw::<Mutex<Vec<Modulus>>, modulus_vector_t>(Arc::new(Mutex::new(moduli)))
}

pub(crate) unsafe fn moduli(this: *const modulus_vector_t) -> Result<Vec<Modulus>, Failure> {
    Ok(unsafe { obj::<Mutex<Vec<Modulus>>, _>(this) }?.lock().clone())
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_modulus_create(value: u64, out: *mut *mut modulus_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        write_out(out, into_raw::<Modulus, modulus_t>(Modulus::new(value)?))?;
        Ok(S_OK)
    })
}

boxed_kind!(Modulus, modulus_t, seal_modulus_destroy, seal_modulus_copy, seal_modulus_assign);
serializable_kind!(Modulus, modulus_t, seal_modulus_save, seal_modulus_load);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_modulus_value(this: *const modulus_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Modulus, _>(this)?.value())?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_modulus_bit_count(this: *const modulus_t, out: *mut i32) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Modulus, _>(this)?.bit_count() as i32)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_modulus_is_prime(this: *const modulus_t, out: *mut bool) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Modulus, _>(this)?.is_prime())?;
        Ok(S_OK)
    })
}

/// Creates a shared vector from `len` modulus values.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_modulus_vector_create(values: *const u64, len: u64, out: *mut *mut modulus_vector_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let moduli: Vec<Modulus> = slice(values, len)?
            .iter()
            .map(|v| Modulus::new(*v))
            .collect::<crate::fault::Result<Vec<Modulus>>>()?;
        write_out(out, new_modulus_vector(moduli))?;
        Ok(S_OK)
    })
}

shared_kind!(
    Mutex<Vec<Modulus>>,
    modulus_vector_t,
    seal_modulus_vector_retain,
    seal_modulus_vector_destroy
);

/// Deep copy into a new, unshared vector.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_modulus_vector_copy(src: *const modulus_vector_t, out: *mut *mut modulus_vector_t) -> HRESULT {
    guard(|| unsafe {
        let copy: Vec<Modulus> = moduli(src)?;
        write_out(out, new_modulus_vector(copy))?;
        Ok(S_OK)
    })
}

/// Replaces the contents of `dst` with those of `src`, visible to every
/// holder of `dst`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_modulus_vector_assign(dst: *mut modulus_vector_t, src: *const modulus_vector_t) -> HRESULT {
    guard(|| unsafe {
        if std::ptr::eq(dst.cast_const(), src) {
            return Ok(S_OK);
        }
        let values: Vec<Modulus> = moduli(src)?;
        *obj::<Mutex<Vec<Modulus>>, _>(dst)?.lock() = values;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_modulus_vector_size(this: *const modulus_vector_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Mutex<Vec<Modulus>>, _>(this)?.lock().len() as u64)?;
        Ok(S_OK)
    })
}

/// Copy of element `index` as a new `modulus_t`; `S_FALSE` when out of
/// bounds.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_modulus_vector_get(this: *const modulus_vector_t, index: u64, out: *mut *mut modulus_t) -> HRESULT {
    guard(|| unsafe {
        let element: Option<Modulus> = obj::<Mutex<Vec<Modulus>>, _>(this)?.lock().get(index as usize).copied();
        match element {
            Some(modulus) => {
                write_out(out, into_raw::<Modulus, modulus_t>(modulus))?;
                Ok(S_OK)
            }
            None => Ok(S_FALSE),
        }
    })
}

/// Overwrites element `index`; `S_FALSE` and no write when out of bounds.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_modulus_vector_set(this: *const modulus_vector_t, index: u64, value: *const modulus_t) -> HRESULT {
    guard(|| unsafe {
        let modulus: Modulus = *obj::<Modulus, _>(value)?;
        match obj::<Mutex<Vec<Modulus>>, _>(this)?.lock().get_mut(index as usize) {
            Some(slot) => {
                *slot = modulus;
                Ok(S_OK)
            }
            None => Ok(S_FALSE),
        }
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_modulus_vector_push(this: *const modulus_vector_t, value: *const modulus_t) -> HRESULT {
    guard(|| unsafe {
        let modulus: Modulus = *obj::<Modulus, _>(value)?;
        obj::<Mutex<Vec<Modulus>>, _>(this)?.lock().push(modulus);
        Ok(S_OK)
    })
}

/// Two-call copy of the modulus values.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_modulus_vector_values(this: *const modulus_vector_t, buf: *mut u64, len: *mut u64) -> HRESULT {
    guard(|| unsafe {
        let values: Vec<u64> = moduli(this)?.iter().map(|q| q.value()).collect();
        write_buffer(&values, buf, len)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_coeff_modulus_create(
    poly_modulus_degree: u64,
    bit_sizes: *const i32,
    len: u64,
    out: *mut *mut modulus_vector_t,
) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let moduli: Vec<Modulus> = CoeffModulus::create(poly_modulus_degree, slice(bit_sizes, len)?)?;
        write_out(out, new_modulus_vector(moduli))?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_coeff_modulus_bfv_default(poly_modulus_degree: u64, sec_level: i32, out: *mut *mut modulus_vector_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let moduli: Vec<Modulus> = CoeffModulus::bfv_default(poly_modulus_degree, security_level(sec_level)?)?;
        write_out(out, new_modulus_vector(moduli))?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_coeff_modulus_max_bit_count(poly_modulus_degree: u64, sec_level: i32, out: *mut i32) -> HRESULT {
    guard(|| unsafe {
        let bits: u32 = CoeffModulus::max_bit_count(poly_modulus_degree, security_level(sec_level)?);
        write_out(out, bits.min(i32::MAX as u32) as i32)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_plain_modulus_batching(poly_modulus_degree: u64, bit_size: i32, out: *mut *mut modulus_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let modulus: Modulus = PlainModulus::batching(poly_modulus_degree, bit_size)?;
        write_out(out, into_raw::<Modulus, modulus_t>(modulus))?;
        Ok(S_OK)
    })
}
