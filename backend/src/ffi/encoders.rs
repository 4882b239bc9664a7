use std::sync::Arc;

use crate::engine::context::Context;
use crate::engine::encoders::{BatchEncoder, CkksEncoder, IntegerEncoder};
use crate::engine::parameters::ParmsId;
use crate::engine::plaintext::Plaintext;
use crate::ffi::parameters::read_parms_id;
use crate::ffi::{
    HRESULT, S_OK, batch_encoder_t, ckks_encoder_t, context_t, ensure_ready, guard, integer_encoder_t, into_raw, obj,
    obj_mut, owned_kind, plaintext_t, shared, slice, write_buffer, write_out,
};

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_batch_encoder_create(context: *const context_t, out: *mut *mut batch_encoder_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let encoder: BatchEncoder = BatchEncoder::new(obj::<Context, _>(context)?)?;
        write_out(out, into_raw::<BatchEncoder, batch_encoder_t>(encoder))?;
        Ok(S_OK)
    })
}

owned_kind!(BatchEncoder, batch_encoder_t, seal_batch_encoder_destroy);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_batch_encoder_slot_count(this: *const batch_encoder_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<BatchEncoder, _>(this)?.slot_count() as u64)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_batch_encoder_encode_u64(
    this: *const batch_encoder_t,
    values: *const u64,
    len: u64,
    destination: *mut plaintext_t,
) -> HRESULT {
    guard(|| unsafe {
        let values: &[u64] = slice(values, len)?;
        obj::<BatchEncoder, _>(this)?.encode_u64(values, obj_mut::<Plaintext, _>(destination)?)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_batch_encoder_encode_i64(
    this: *const batch_encoder_t,
    values: *const i64,
    len: u64,
    destination: *mut plaintext_t,
) -> HRESULT {
    guard(|| unsafe {
        let values: &[i64] = slice(values, len)?;
        obj::<BatchEncoder, _>(this)?.encode_i64(values, obj_mut::<Plaintext, _>(destination)?)?;
        Ok(S_OK)
    })
}

/// Two-call decode into `slot_count` unsigned slots.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_batch_encoder_decode_u64(
    this: *const batch_encoder_t,
    plain: *const plaintext_t,
    buf: *mut u64,
    len: *mut u64,
) -> HRESULT {
    guard(|| unsafe {
        let values: Vec<u64> = obj::<BatchEncoder, _>(this)?.decode_u64(obj::<Plaintext, _>(plain)?)?;
        write_buffer(&values, buf, len)
    })
}

/// Two-call decode into `slot_count` signed slots.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_batch_encoder_decode_i64(
    this: *const batch_encoder_t,
    plain: *const plaintext_t,
    buf: *mut i64,
    len: *mut u64,
) -> HRESULT {
    guard(|| unsafe {
        let values: Vec<i64> = obj::<BatchEncoder, _>(this)?.decode_i64(obj::<Plaintext, _>(plain)?)?;
        write_buffer(&values, buf, len)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_ckks_encoder_create(context: *const context_t, out: *mut *mut ckks_encoder_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let context: Arc<Context> = shared::<Context, _>(context)?;
        write_out(out, into_raw::<CkksEncoder, ckks_encoder_t>(CkksEncoder::new(context)?))?;
        Ok(S_OK)
    })
}

owned_kind!(CkksEncoder, ckks_encoder_t, seal_ckks_encoder_destroy);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_ckks_encoder_slot_count(this: *const ckks_encoder_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<CkksEncoder, _>(this)?.slot_count() as u64)?;
        Ok(S_OK)
    })
}

/// Encodes at the level `parms_id`, or at the first data level when null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_ckks_encoder_encode_f64(
    this: *const ckks_encoder_t,
    values: *const f64,
    len: u64,
    parms_id: *const u64,
    scale: f64,
    destination: *mut plaintext_t,
) -> HRESULT {
    guard(|| unsafe {
        let values: &[f64] = slice(values, len)?;
        let parms_id: Option<ParmsId> = read_parms_id(parms_id);
        obj::<CkksEncoder, _>(this)?.encode_f64(values, parms_id.as_ref(), scale, obj_mut::<Plaintext, _>(destination)?)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_ckks_encoder_decode_f64(
    this: *const ckks_encoder_t,
    plain: *const plaintext_t,
    buf: *mut f64,
    len: *mut u64,
) -> HRESULT {
    guard(|| unsafe {
        let values: Vec<f64> = obj::<CkksEncoder, _>(this)?.decode_f64(obj::<Plaintext, _>(plain)?)?;
        write_buffer(&values, buf, len)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_integer_encoder_create(context: *const context_t, out: *mut *mut integer_encoder_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let encoder: IntegerEncoder = IntegerEncoder::new(obj::<Context, _>(context)?)?;
        write_out(out, into_raw::<IntegerEncoder, integer_encoder_t>(encoder))?;
        Ok(S_OK)
    })
}

owned_kind!(IntegerEncoder, integer_encoder_t, seal_integer_encoder_destroy);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_integer_encoder_plain_modulus(this: *const integer_encoder_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<IntegerEncoder, _>(this)?.plain_modulus())?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_integer_encoder_encode_u64(
    this: *const integer_encoder_t,
    value: u64,
    destination: *mut plaintext_t,
) -> HRESULT {
    guard(|| unsafe {
        obj::<IntegerEncoder, _>(this)?.encode_u64(value, obj_mut::<Plaintext, _>(destination)?);
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_integer_encoder_encode_i64(
    this: *const integer_encoder_t,
    value: i64,
    destination: *mut plaintext_t,
) -> HRESULT {
    guard(|| unsafe {
        obj::<IntegerEncoder, _>(this)?.encode_i64(value, obj_mut::<Plaintext, _>(destination)?);
        Ok(S_OK)
    })
}

/// Exports `fn(encoder, plaintext, out)` decoding into one integer type.
macro_rules! integer_decode {
    ($name:ident, $method:ident, $int:ty) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(this: *const integer_encoder_t, plain: *const plaintext_t, out: *mut $int) -> HRESULT {
            guard(|| unsafe {
                let value: $int = obj::<IntegerEncoder, _>(this)?.$method(obj::<Plaintext, _>(plain)?)?;
                write_out(out, value)?;
                Ok(S_OK)
            })
        }
    };
}

integer_decode!(seal_integer_encoder_decode_u64, decode_u64, u64);
integer_decode!(seal_integer_encoder_decode_i64, decode_i64, i64);
integer_decode!(seal_integer_encoder_decode_u32, decode_u32, u32);
integer_decode!(seal_integer_encoder_decode_i32, decode_i32, i32);
