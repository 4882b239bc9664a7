use crate::engine::vector::{ElementType, Vector};
use crate::fault::NativeFault;
use crate::ffi::{
    Failure, HRESULT, S_FALSE, S_OK, boxed_kind, ensure_ready, guard, into_raw, obj, obj_mut, slice, vector_t,
    write_buffer, write_out,
};

fn element_type(value: u8) -> Result<ElementType, Failure> {
    ElementType::from_u8(value)
        .ok_or_else(|| NativeFault::invalid_argument(format!("unsupported element type {value}")).into())
}

/// Creates a vector of `element_type` from `len` bytes of little-endian
/// packed elements.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_vector_create(element_type_code: u8, data: *const u8, len: u64, out: *mut *mut vector_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let vector: Vector = Vector::from_bytes(element_type(element_type_code)?, slice(data, len)?)?;
        write_out(out, into_raw::<Vector, vector_t>(vector))?;
        Ok(S_OK)
    })
}

boxed_kind!(Vector, vector_t, seal_vector_destroy, seal_vector_copy, seal_vector_assign);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_vector_element_type(this: *const vector_t, out: *mut u8) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Vector, _>(this)?.element_type() as u8)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_vector_size(this: *const vector_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<Vector, _>(this)?.len() as u64)?;
        Ok(S_OK)
    })
}

/// Raw bits of element `index`; `S_FALSE` when out of bounds.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_vector_get(this: *const vector_t, index: u64, out_bits: *mut u64) -> HRESULT {
    guard(|| unsafe {
        match obj::<Vector, _>(this)?.get_bits(index as usize) {
            Some(bits) => {
                write_out(out_bits, bits)?;
                Ok(S_OK)
            }
            None => Ok(S_FALSE),
        }
    })
}

/// Writes element `index`; `S_FALSE` and no write when out of bounds.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_vector_set(this: *mut vector_t, index: u64, bits: u64) -> HRESULT {
    guard(|| unsafe {
        if obj_mut::<Vector, _>(this)?.set_bits(index as usize, bits) {
            Ok(S_OK)
        } else {
            Ok(S_FALSE)
        }
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_vector_resize(this: *mut vector_t, len: u64, fill_bits: u64) -> HRESULT {
    guard(|| unsafe {
        obj_mut::<Vector, _>(this)?.resize(len, fill_bits)?;
        Ok(S_OK)
    })
}

/// Two-call copy of the packed little-endian elements.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_vector_copy_to(this: *const vector_t, buf: *mut u8, len: *mut u64) -> HRESULT {
    guard(|| unsafe { write_buffer(&obj::<Vector, _>(this)?.to_bytes(), buf, len) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::tests::init;

    #[test]
    fn create_access_and_destroy() {
        init();
        let bytes: Vec<u8> = [-1i32, 7].iter().flat_map(|x| x.to_le_bytes()).collect();
        let mut vector: *mut vector_t = std::ptr::null_mut();
        unsafe {
            assert_eq!(seal_vector_create(ElementType::Int32 as u8, bytes.as_ptr(), bytes.len() as u64, &mut vector), S_OK);
            let mut bits: u64 = 0;
            assert_eq!(seal_vector_get(vector, 0, &mut bits), S_OK);
            assert_eq!(bits as i64, -1);
            assert_eq!(seal_vector_get(vector, 2, &mut bits), S_FALSE);
            assert_eq!(seal_vector_set(vector, 5, 3), S_FALSE);
            assert_eq!(seal_vector_resize(vector, 4, 9), S_OK);

            let mut copy: *mut vector_t = std::ptr::null_mut();
            assert_eq!(seal_vector_copy(vector, &mut copy), S_OK);
            assert_eq!(seal_vector_set(copy, 0, 0), S_OK);

            let mut len: u64 = 0;
            assert_eq!(seal_vector_copy_to(vector, std::ptr::null_mut(), &mut len), S_OK);
            let mut out: Vec<u8> = vec![0; len as usize];
            assert_eq!(seal_vector_copy_to(vector, out.as_mut_ptr(), &mut len), S_OK);
            let expected: Vec<u8> = [-1i32, 7, 9, 9].iter().flat_map(|x| x.to_le_bytes()).collect();
            assert_eq!(out, expected);

            assert_eq!(seal_vector_destroy(copy), S_OK);
            assert_eq!(seal_vector_destroy(vector), S_OK);
        }
    }

    #[test]
    fn unknown_element_type_is_rejected() {
        init();
        let mut vector: *mut vector_t = std::ptr::null_mut();
        let hr: HRESULT = unsafe { seal_vector_create(0, std::ptr::null(), 0, &mut vector) };
        assert_eq!(hr, crate::ffi::E_INVALIDARG);
        assert!(vector.is_null());
    }
}
