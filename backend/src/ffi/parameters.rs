use crate::engine::modulus::Modulus;
use crate::engine::parameters::{EncryptionParameters, ParmsId, SchemeType};
use crate::fault::NativeFault;
use crate::ffi::modulus::{moduli, new_modulus_vector};
use crate::ffi::{
    Failure, HRESULT, S_OK, boxed_kind, ensure_ready, guard, into_raw, modulus_t, modulus_vector_t, obj, obj_mut,
    parms_t, serializable_kind, write_out,
};

/// Writes the four words of `parms_id` to `out`.
pub(crate) unsafe fn write_parms_id(out: *mut u64, parms_id: ParmsId) -> Result<(), Failure> {
    if out.is_null() {
        return Err(Failure::Null("parms_id"));
    }
    unsafe { std::ptr::copy_nonoverlapping(parms_id.0.as_ptr(), out, 4) };
    Ok(())
}

/// Reads four words from `ptr`; a null pointer yields `None`.
pub(crate) unsafe fn read_parms_id(ptr: *const u64) -> Option<ParmsId> {
    if ptr.is_null() {
        return None;
    }
    let mut words: [u64; 4] = [0; 4];
    unsafe { std::ptr::copy_nonoverlapping(ptr, words.as_mut_ptr(), 4) };
    Some(ParmsId(words))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_parms_create(scheme: u8, out: *mut *mut parms_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let scheme: SchemeType = SchemeType::from_u8(scheme)
            .ok_or_else(|| NativeFault::invalid_argument(format!("unsupported scheme {scheme}")))?;
        write_out(out, into_raw::<EncryptionParameters, parms_t>(EncryptionParameters::new(scheme)))?;
        Ok(S_OK)
    })
}

boxed_kind!(EncryptionParameters, parms_t, seal_parms_destroy, seal_parms_copy, seal_parms_assign);
serializable_kind!(EncryptionParameters, parms_t, seal_parms_save, seal_parms_load);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_parms_scheme(this: *const parms_t, out: *mut u8) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<EncryptionParameters, _>(this)?.scheme() as u8)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_parms_set_poly_modulus_degree(this: *mut parms_t, degree: u64) -> HRESULT {
    guard(|| unsafe {
        obj_mut::<EncryptionParameters, _>(this)?.set_poly_modulus_degree(degree)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_parms_poly_modulus_degree(this: *const parms_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<EncryptionParameters, _>(this)?.poly_modulus_degree())?;
        Ok(S_OK)
    })
}

/// Copies the current contents of `coeff_modulus` into the parameters.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_parms_set_coeff_modulus(this: *mut parms_t, coeff_modulus: *const modulus_vector_t) -> HRESULT {
    guard(|| unsafe {
        let values: Vec<Modulus> = moduli(coeff_modulus)?;
        obj_mut::<EncryptionParameters, _>(this)?.set_coeff_modulus(&values)?;
        Ok(S_OK)
    })
}

/// New, unshared vector holding the coefficient moduli.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_parms_coeff_modulus(this: *const parms_t, out: *mut *mut modulus_vector_t) -> HRESULT {
    guard(|| unsafe {
        let values: Vec<Modulus> = obj::<EncryptionParameters, _>(this)?.coeff_modulus().to_vec();
        write_out(out, new_modulus_vector(values))?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_parms_set_plain_modulus(this: *mut parms_t, plain_modulus: *const modulus_t) -> HRESULT {
    guard(|| unsafe {
        let modulus: Modulus = *obj::<Modulus, _>(plain_modulus)?;
        obj_mut::<EncryptionParameters, _>(this)?.set_plain_modulus(modulus)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_parms_set_plain_modulus_value(this: *mut parms_t, value: u64) -> HRESULT {
    guard(|| unsafe {
        let modulus: Modulus = Modulus::new(value)?;
        obj_mut::<EncryptionParameters, _>(this)?.set_plain_modulus(modulus)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_parms_plain_modulus(this: *const parms_t, out: *mut *mut modulus_t) -> HRESULT {
    guard(|| unsafe {
        let modulus: Modulus = *obj::<EncryptionParameters, _>(this)?.plain_modulus();
        write_out(out, into_raw::<Modulus, modulus_t>(modulus))?;
        Ok(S_OK)
    })
}

/// Writes the four-word fingerprint to `out`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_parms_parms_id(this: *const parms_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_parms_id(out, obj::<EncryptionParameters, _>(this)?.parms_id())?;
        Ok(S_OK)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::modulus::{seal_coeff_modulus_create, seal_modulus_vector_destroy};
    use crate::ffi::tests::{init, last_fault};
    use crate::ffi::{COR_E_INVALIDOPERATION, FaultKind};

    #[test]
    fn fingerprint_follows_setters() {
        init();
        let sizes: [i32; 2] = [40, 40];
        unsafe {
            let mut parms: *mut parms_t = std::ptr::null_mut();
            assert_eq!(seal_parms_create(SchemeType::Bfv as u8, &mut parms), S_OK);
            assert_eq!(seal_parms_set_poly_modulus_degree(parms, 1024), S_OK);
            let mut coeff: *mut modulus_vector_t = std::ptr::null_mut();
            assert_eq!(seal_coeff_modulus_create(1024, sizes.as_ptr(), 2, &mut coeff), S_OK);
            assert_eq!(seal_parms_set_coeff_modulus(parms, coeff), S_OK);
            assert_eq!(seal_parms_set_plain_modulus_value(parms, 1 << 20), S_OK);

            let mut id: [u64; 4] = [0; 4];
            assert_eq!(seal_parms_parms_id(parms, id.as_mut_ptr()), S_OK);
            let mut copy: *mut parms_t = std::ptr::null_mut();
            assert_eq!(seal_parms_copy(parms, &mut copy), S_OK);
            let mut copy_id: [u64; 4] = [0; 4];
            assert_eq!(seal_parms_parms_id(copy, copy_id.as_mut_ptr()), S_OK);
            assert_eq!(id, copy_id);

            assert_eq!(seal_parms_set_poly_modulus_degree(copy, 2048), S_OK);
            assert_eq!(seal_parms_parms_id(copy, copy_id.as_mut_ptr()), S_OK);
            assert_ne!(id, copy_id);

            assert_eq!(seal_parms_assign(copy, parms), S_OK);
            assert_eq!(seal_parms_parms_id(copy, copy_id.as_mut_ptr()), S_OK);
            assert_eq!(id, copy_id);

            assert_eq!(seal_modulus_vector_destroy(coeff), S_OK);
            assert_eq!(seal_parms_destroy(copy), S_OK);
            assert_eq!(seal_parms_destroy(parms), S_OK);
        }
    }

    #[test]
    fn ckks_rejects_plain_modulus() {
        init();
        unsafe {
            let mut parms: *mut parms_t = std::ptr::null_mut();
            assert_eq!(seal_parms_create(SchemeType::Ckks as u8, &mut parms), S_OK);
            assert_eq!(seal_parms_set_plain_modulus_value(parms, 257), COR_E_INVALIDOPERATION);
            assert_eq!(last_fault().kind, FaultKind::LogicError);
            assert_eq!(seal_parms_destroy(parms), S_OK);
        }
    }
}
