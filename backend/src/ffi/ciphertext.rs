use std::sync::Arc;

use crate::engine::ciphertext::Ciphertext;
use crate::engine::context::Context;
use crate::engine::memory::MemoryPool;
use crate::engine::parameters::ParmsId;
use crate::ffi::memory::pool_arg;
use crate::ffi::parameters::{read_parms_id, write_parms_id};
use crate::ffi::{
    HRESULT, S_OK, ciphertext_t, context_serializable_kind, context_t, ensure_ready, guard, into_raw, memory_pool_t,
    obj, obj_mut, owned_kind, write_out,
};

/// Empty ciphertext, bound to no level.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_ciphertext_create(pool: *const memory_pool_t, out: *mut *mut ciphertext_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        // an empty ciphertext allocates nothing from the pool
        pool_arg(pool)?;
        write_out(out, into_raw::<Ciphertext, ciphertext_t>(Ciphertext::default()))?;
        Ok(S_OK)
    })
}

/// Zero ciphertext of `size` polynomials at the level `parms_id`; a null
/// `parms_id` selects the first data level.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_ciphertext_create_with_context(
    context: *const context_t,
    parms_id: *const u64,
    size: u64,
    pool: *const memory_pool_t,
    out: *mut *mut ciphertext_t,
) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let context: &Context = obj::<Context, _>(context)?;
        let parms_id: ParmsId = read_parms_id(parms_id).unwrap_or_else(|| context.first_parms_id());
        let pool: Option<Arc<MemoryPool>> = pool_arg(pool)?;
        let encrypted: Ciphertext = Ciphertext::with_context(context, &parms_id, size as usize, pool.as_ref())?;
        write_out(out, into_raw::<Ciphertext, ciphertext_t>(encrypted))?;
        Ok(S_OK)
    })
}

owned_kind!(Ciphertext, ciphertext_t, seal_ciphertext_destroy);
context_serializable_kind!(Ciphertext, ciphertext_t, seal_ciphertext_save, seal_ciphertext_load);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_ciphertext_copy(src: *const ciphertext_t, out: *mut *mut ciphertext_t) -> HRESULT {
    guard(|| unsafe {
        let copy: Ciphertext = obj::<Ciphertext, _>(src)?.clone();
        write_out(out, into_raw::<Ciphertext, ciphertext_t>(copy))?;
        Ok(S_OK)
    })
}

/// Deep-copies `src` into `dst`; rejected across the chains of different
/// contexts.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_ciphertext_assign(dst: *mut ciphertext_t, src: *const ciphertext_t) -> HRESULT {
    guard(|| unsafe {
        if std::ptr::eq(dst.cast_const(), src) {
            return Ok(S_OK);
        }
        let value: Ciphertext = obj::<Ciphertext, _>(src)?.clone();
        obj_mut::<Ciphertext, _>(dst)?.assign_from(&value)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_ciphertext_resize(this: *mut ciphertext_t, context: *const context_t, size: u64) -> HRESULT {
    guard(|| unsafe {
        let context: &Context = obj::<Context, _>(context)?;
        obj_mut::<Ciphertext, _>(this)?.resize(context, size as usize)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_ciphertext_size(this: *const ciphertext_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Ciphertext, _>(this)?.size() as u64)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_ciphertext_poly_modulus_degree(this: *const ciphertext_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Ciphertext, _>(this)?.poly_modulus_degree() as u64)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_ciphertext_coeff_modulus_size(this: *const ciphertext_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Ciphertext, _>(this)?.coeff_modulus_size() as u64)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_ciphertext_parms_id(this: *const ciphertext_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_parms_id(out, obj::<Ciphertext, _>(this)?.parms_id())?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_ciphertext_scale(this: *const ciphertext_t, out: *mut f64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Ciphertext, _>(this)?.scale())?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_ciphertext_set_scale(this: *mut ciphertext_t, scale: f64) -> HRESULT {
    guard(|| unsafe {
        obj_mut::<Ciphertext, _>(this)?.set_scale(scale);
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_ciphertext_is_transparent(this: *const ciphertext_t, out: *mut bool) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Ciphertext, _>(this)?.is_transparent())?;
        Ok(S_OK)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::context::tests::bfv_context;
    use crate::ffi::context::{seal_context_destroy, seal_context_last_parms_id};
    use crate::ffi::tests::init;
    use crate::ffi::{ComprMode, E_INVALIDARG, S_FALSE};

    #[test]
    fn sized_at_a_level() {
        init();
        let context: *mut context_t = bfv_context();
        unsafe {
            let mut last: [u64; 4] = [0; 4];
            assert_eq!(seal_context_last_parms_id(context, last.as_mut_ptr()), S_OK);
            let mut encrypted: *mut ciphertext_t = std::ptr::null_mut();
            assert_eq!(
                seal_ciphertext_create_with_context(context, last.as_ptr(), 2, std::ptr::null(), &mut encrypted),
                S_OK
            );
            let mut value: u64 = 0;
            assert_eq!(seal_ciphertext_size(encrypted, &mut value), S_OK);
            assert_eq!(value, 2);
            assert_eq!(seal_ciphertext_coeff_modulus_size(encrypted, &mut value), S_OK);
            assert_eq!(value, 1);
            assert_eq!(seal_ciphertext_poly_modulus_degree(encrypted, &mut value), S_OK);
            assert_eq!(value, 64);
            let mut transparent: bool = false;
            assert_eq!(seal_ciphertext_is_transparent(encrypted, &mut transparent), S_OK);
            assert!(transparent);

            assert_eq!(seal_ciphertext_resize(encrypted, context, 3), S_OK);
            assert_eq!(seal_ciphertext_size(encrypted, &mut value), S_OK);
            assert_eq!(value, 3);
            assert_eq!(seal_ciphertext_resize(encrypted, context, 1), E_INVALIDARG);

            assert_eq!(seal_ciphertext_destroy(encrypted), S_OK);
            assert_eq!(seal_context_destroy(context), S_OK);
        }
    }

    #[test]
    fn save_load_and_assign() {
        init();
        let context: *mut context_t = bfv_context();
        unsafe {
            let mut encrypted: *mut ciphertext_t = std::ptr::null_mut();
            assert_eq!(
                seal_ciphertext_create_with_context(context, std::ptr::null(), 2, std::ptr::null(), &mut encrypted),
                S_OK
            );
            let mut len: u64 = 0;
            assert_eq!(seal_ciphertext_save(encrypted, ComprMode::Lz4 as u8, std::ptr::null_mut(), &mut len), S_OK);
            let mut bytes: Vec<u8> = vec![0; len as usize];
            assert_eq!(seal_ciphertext_save(encrypted, ComprMode::Lz4 as u8, bytes.as_mut_ptr(), &mut len), S_OK);

            let mut loaded: *mut ciphertext_t = std::ptr::null_mut();
            assert_eq!(seal_ciphertext_load(context, bytes.as_ptr(), len, &mut loaded), S_OK);
            let mut a: [u64; 4] = [0; 4];
            let mut b: [u64; 4] = [0; 4];
            assert_eq!(seal_ciphertext_parms_id(encrypted, a.as_mut_ptr()), S_OK);
            assert_eq!(seal_ciphertext_parms_id(loaded, b.as_mut_ptr()), S_OK);
            assert_eq!(a, b);

            let mut empty: *mut ciphertext_t = std::ptr::null_mut();
            assert_eq!(seal_ciphertext_create(std::ptr::null(), &mut empty), S_OK);
            assert_eq!(seal_ciphertext_assign(empty, loaded), S_OK);
            assert_eq!(seal_ciphertext_parms_id(empty, b.as_mut_ptr()), S_OK);
            assert_eq!(a, b);
            assert_eq!(seal_ciphertext_assign(empty, empty), S_OK);

            bytes.truncate(bytes.len() - 1);
            let mut truncated: *mut ciphertext_t = std::ptr::null_mut();
            let hr: HRESULT = seal_ciphertext_load(context, bytes.as_ptr(), bytes.len() as u64, &mut truncated);
            assert!(hr != S_OK && hr != S_FALSE);
            assert!(truncated.is_null());

            for ct in [empty, loaded, encrypted] {
                assert_eq!(seal_ciphertext_destroy(ct), S_OK);
            }
            assert_eq!(seal_context_destroy(context), S_OK);
        }
    }
}
