use crate::engine::keys::{PublicKey, SecretKey};
use crate::ffi::parameters::write_parms_id;
use crate::ffi::{
    HRESULT, S_OK, boxed_kind, context_serializable_kind, ensure_ready, guard, into_raw, obj, public_key_t,
    secret_key_t, write_out,
};

/// Empty secret key; filled by assignment or by loading.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_secret_key_create(out: *mut *mut secret_key_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        write_out(out, into_raw::<SecretKey, secret_key_t>(SecretKey::default()))?;
        Ok(S_OK)
    })
}

boxed_kind!(SecretKey, secret_key_t, seal_secret_key_destroy, seal_secret_key_copy, seal_secret_key_assign);
context_serializable_kind!(SecretKey, secret_key_t, seal_secret_key_save, seal_secret_key_load);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_secret_key_parms_id(this: *const secret_key_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_parms_id(out, obj::<SecretKey, _>(this)?.parms_id())?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_public_key_create(out: *mut *mut public_key_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        write_out(out, into_raw::<PublicKey, public_key_t>(PublicKey::default()))?;
        Ok(S_OK)
    })
}

boxed_kind!(PublicKey, public_key_t, seal_public_key_destroy, seal_public_key_copy, seal_public_key_assign);
context_serializable_kind!(PublicKey, public_key_t, seal_public_key_save, seal_public_key_load);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_public_key_parms_id(this: *const public_key_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_parms_id(out, obj::<PublicKey, _>(this)?.parms_id())?;
        Ok(S_OK)
    })
}
