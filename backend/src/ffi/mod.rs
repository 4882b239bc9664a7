//! C ABI of the engine.
//!
//! Every object crosses the boundary as a pointer to an opaque `*_t` type.
//! Functions return an [`HRESULT`]; on failure the fault is parked in a
//! per-thread registry and can be inspected through [`fault`]. Objects are
//! either boxed (one owner, released by `*_destroy`) or reference counted
//! (`*_retain` / `*_destroy`).

#![allow(non_camel_case_types)]

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::engine::serialization::{self, WriterTo};
use crate::fault::NativeFault;

pub mod ciphertext;
pub mod context;
pub mod encoders;
pub mod engine;
pub mod fault;
pub mod keys;
pub mod memory;
pub mod modulus;
pub mod parameters;
pub mod plaintext;
pub mod tools;
pub mod vector;

pub use crate::engine::context::{EncryptionParameterQualifiers, ErrorType};
pub use crate::engine::modulus::SecurityLevel;
pub use crate::engine::parameters::SchemeType;
pub use crate::engine::serialization::ComprMode;
pub use crate::engine::vector::ElementType;
pub use crate::fault::FaultKind;

pub type HRESULT = i32;

pub const S_OK: HRESULT = 0;
/// Success, but nothing was produced (absent element, end of chain).
pub const S_FALSE: HRESULT = 1;
pub const E_POINTER: HRESULT = 0x8000_4003_u32 as i32;
pub const E_INVALIDARG: HRESULT = 0x8007_0057_u32 as i32;
pub const E_OUTOFMEMORY: HRESULT = 0x8007_000E_u32 as i32;
pub const E_UNEXPECTED: HRESULT = 0x8000_FFFF_u32 as i32;
pub const COR_E_INVALIDOPERATION: HRESULT = 0x8013_1509_u32 as i32;
pub const COR_E_ARGUMENTOUTOFRANGE: HRESULT = 0x8013_1502_u32 as i32;
pub const COR_E_IO: HRESULT = 0x8013_1620_u32 as i32;

pub fn hresult_for(kind: FaultKind) -> HRESULT {
    match kind {
        FaultKind::InvalidArgument => E_INVALIDARG,
        FaultKind::LogicError => COR_E_INVALIDOPERATION,
        FaultKind::OutOfRange => COR_E_ARGUMENTOUTOFRANGE,
        FaultKind::RuntimeError => COR_E_IO,
        FaultKind::Unknown => E_UNEXPECTED,
    }
}

/// Best-effort category for a bare failure code.
pub fn kind_for(hr: HRESULT) -> FaultKind {
    match hr {
        E_INVALIDARG | E_POINTER => FaultKind::InvalidArgument,
        COR_E_INVALIDOPERATION => FaultKind::LogicError,
        COR_E_ARGUMENTOUTOFRANGE => FaultKind::OutOfRange,
        COR_E_IO | E_OUTOFMEMORY => FaultKind::RuntimeError,
        _ => FaultKind::Unknown,
    }
}

macro_rules! opaque {
    ($($name:ident),* $(,)?) => {
        $(
            #[repr(C)]
            pub struct $name {
                _unused: [u8; 0],
            }
        )*
    };
}

opaque!(
    vector_t,
    modulus_t,
    modulus_vector_t,
    parms_t,
    context_t,
    context_data_t,
    memory_pool_t,
    plaintext_t,
    ciphertext_t,
    secret_key_t,
    public_key_t,
    keygen_t,
    encryptor_t,
    decryptor_t,
    evaluator_t,
    batch_encoder_t,
    ckks_encoder_t,
    integer_encoder_t,
);

/// Why an exported call failed before or inside the engine.
#[derive(Debug)]
pub(crate) enum Failure {
    Fault(NativeFault),
    Null(&'static str),
}

impl From<NativeFault> for Failure {
    fn from(fault: NativeFault) -> Self {
        Failure::Fault(fault)
    }
}

pub(crate) type FfiResult = std::result::Result<HRESULT, Failure>;

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown exception".to_string()
    }
}

/// Runs `f`, turning faults and panics into a failure code and a registry
/// entry.
pub(crate) fn guard<F>(f: F) -> HRESULT
where
    F: FnOnce() -> FfiResult,
{
    let (hr, fault): (HRESULT, NativeFault) = match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(hr)) => return hr,
        Ok(Err(Failure::Fault(fault))) => (hresult_for(fault.kind), fault),
        Ok(Err(Failure::Null(what))) => (E_POINTER, NativeFault::invalid_argument(format!("{what} cannot be null"))),
        Err(payload) => (E_UNEXPECTED, NativeFault::new(FaultKind::Unknown, panic_message(payload.as_ref()))),
    };
    fault::record(fault);
    hr
}

/// Fails every constructor until the engine has been bootstrapped.
pub(crate) fn ensure_ready() -> Result<(), Failure> {
    if engine::is_ready() {
        Ok(())
    } else {
        Err(NativeFault::logic_error("engine is not initialized").into())
    }
}

pub(crate) fn into_raw<T, R>(value: T) -> *mut R {
    Box::into_raw(Box::new(value)).cast::<R>()
}

pub(crate) unsafe fn obj<'a, T, R>(ptr: *const R) -> Result<&'a T, Failure> {
    if ptr.is_null() {
        return Err(Failure::Null(std::any::type_name::<T>()));
    }
    Ok(unsafe { &*ptr.cast::<T>() })
}

pub(crate) unsafe fn obj_mut<'a, T, R>(ptr: *mut R) -> Result<&'a mut T, Failure> {
    if ptr.is_null() {
        return Err(Failure::Null(std::any::type_name::<T>()));
    }
    Ok(unsafe { &mut *ptr.cast::<T>() })
}

pub(crate) unsafe fn opt_obj<'a, T, R>(ptr: *const R) -> Option<&'a T> {
    if ptr.is_null() { None } else { Some(unsafe { &*ptr.cast::<T>() }) }
}

pub(crate) unsafe fn drop_raw<T, R>(ptr: *mut R) -> Result<(), Failure> {
    if ptr.is_null() {
        return Err(Failure::Null(std::any::type_name::<T>()));
    }
    drop(unsafe { Box::from_raw(ptr.cast::<T>()) });
    Ok(())
}

pub(crate) fn shared_into_raw<T, R>(value: Arc<T>) -> *mut R {
    Arc::into_raw(value).cast_mut().cast::<R>()
}

/// New strong reference to a shared object.
pub(crate) unsafe fn shared<T, R>(ptr: *const R) -> Result<Arc<T>, Failure> {
    if ptr.is_null() {
        return Err(Failure::Null(std::any::type_name::<T>()));
    }
    unsafe {
        Arc::increment_strong_count(ptr.cast::<T>());
        Ok(Arc::from_raw(ptr.cast::<T>()))
    }
}

pub(crate) unsafe fn opt_shared<T, R>(ptr: *const R) -> Result<Option<Arc<T>>, Failure> {
    if ptr.is_null() { Ok(None) } else { unsafe { shared(ptr).map(Some) } }
}

pub(crate) unsafe fn shared_retain<T, R>(ptr: *const R) -> Result<(), Failure> {
    if ptr.is_null() {
        return Err(Failure::Null(std::any::type_name::<T>()));
    }
    unsafe { Arc::increment_strong_count(ptr.cast::<T>()) };
    Ok(())
}

pub(crate) unsafe fn shared_release<T, R>(ptr: *mut R) -> Result<(), Failure> {
    if ptr.is_null() {
        return Err(Failure::Null(std::any::type_name::<T>()));
    }
    drop(unsafe { Arc::from_raw(ptr.cast_const().cast::<T>()) });
    Ok(())
}

pub(crate) unsafe fn write_out<V>(out: *mut V, value: V) -> Result<(), Failure> {
    if out.is_null() {
        return Err(Failure::Null("output"));
    }
    unsafe { out.write(value) };
    Ok(())
}

pub(crate) unsafe fn slice<'a, V>(ptr: *const V, len: u64) -> Result<&'a [V], Failure> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(Failure::Null("input buffer"));
    }
    Ok(unsafe { std::slice::from_raw_parts(ptr, len as usize) })
}

/// Two-call output: with a null `buf` only the required length is written
/// to `len`; otherwise `*len` is the capacity of `buf` on entry and the
/// written length on return.
pub(crate) unsafe fn write_buffer<V: Copy>(values: &[V], buf: *mut V, len: *mut u64) -> FfiResult {
    if len.is_null() {
        return Err(Failure::Null("length"));
    }
    unsafe {
        if !buf.is_null() {
            if (*len as usize) < values.len() {
                return Err(NativeFault::invalid_argument(format!(
                    "buffer holds {} elements, {} required",
                    *len,
                    values.len()
                ))
                .into());
            }
            std::ptr::copy_nonoverlapping(values.as_ptr(), buf, values.len());
        }
        *len = values.len() as u64;
    }
    Ok(S_OK)
}

pub(crate) fn compr_mode(value: u8) -> Result<ComprMode, Failure> {
    ComprMode::from_u8(value)
        .ok_or_else(|| NativeFault::invalid_argument(format!("unsupported compression mode {value}")).into())
}

/// Exports `*_destroy`, `*_copy` and `*_assign` for a boxed kind.
macro_rules! boxed_kind {
    ($ty:ty, $raw:ty, $destroy:ident, $copy:ident, $assign:ident) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $destroy(this: *mut $raw) -> $crate::ffi::HRESULT {
            $crate::ffi::guard(|| unsafe {
                $crate::ffi::drop_raw::<$ty, $raw>(this)?;
                Ok($crate::ffi::S_OK)
            })
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $copy(src: *const $raw, out: *mut *mut $raw) -> $crate::ffi::HRESULT {
            $crate::ffi::guard(|| unsafe {
                let copy: $ty = $crate::ffi::obj::<$ty, $raw>(src)?.clone();
                $crate::ffi::write_out(out, $crate::ffi::into_raw::<$ty, $raw>(copy))?;
                Ok($crate::ffi::S_OK)
            })
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $assign(dst: *mut $raw, src: *const $raw) -> $crate::ffi::HRESULT {
            $crate::ffi::guard(|| unsafe {
                if std::ptr::eq(dst.cast_const(), src) {
                    return Ok($crate::ffi::S_OK);
                }
                let value: $ty = $crate::ffi::obj::<$ty, $raw>(src)?.clone();
                *$crate::ffi::obj_mut::<$ty, $raw>(dst)? = value;
                Ok($crate::ffi::S_OK)
            })
        }
    };
}

/// Two-call serialization of `value`.
pub(crate) unsafe fn save_value<T: WriterTo>(value: &T, compr_mode: u8, buf: *mut u8, len: *mut u64) -> FfiResult {
    let bytes: Vec<u8> = serialization::save(value, self::compr_mode(compr_mode)?)?;
    unsafe { write_buffer(&bytes, buf, len) }
}

/// Exports `*_save` (two-call) and a context-free `*_load`.
macro_rules! serializable_kind {
    ($ty:ty, $raw:ty, $save:ident, $load:ident) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $save(this: *const $raw, compr_mode: u8, buf: *mut u8, len: *mut u64) -> $crate::ffi::HRESULT {
            $crate::ffi::guard(|| unsafe {
                $crate::ffi::save_value($crate::ffi::obj::<$ty, $raw>(this)?, compr_mode, buf, len)
            })
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $load(bytes: *const u8, len: u64, out: *mut *mut $raw) -> $crate::ffi::HRESULT {
            $crate::ffi::guard(|| unsafe {
                $crate::ffi::ensure_ready()?;
                let value: $ty = $crate::engine::serialization::load::<$ty>($crate::ffi::slice(bytes, len)?)?;
                $crate::ffi::write_out(out, $crate::ffi::into_raw::<$ty, $raw>(value))?;
                Ok($crate::ffi::S_OK)
            })
        }
    };
}

/// Exports `*_save` (two-call) and a `*_load` that checks the loaded value
/// against a context before handing it out.
macro_rules! context_serializable_kind {
    ($ty:ty, $raw:ty, $save:ident, $load:ident) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $save(this: *const $raw, compr_mode: u8, buf: *mut u8, len: *mut u64) -> $crate::ffi::HRESULT {
            $crate::ffi::guard(|| unsafe {
                $crate::ffi::save_value($crate::ffi::obj::<$ty, $raw>(this)?, compr_mode, buf, len)
            })
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $load(
            context: *const $crate::ffi::context_t,
            bytes: *const u8,
            len: u64,
            out: *mut *mut $raw,
        ) -> $crate::ffi::HRESULT {
            $crate::ffi::guard(|| unsafe {
                $crate::ffi::ensure_ready()?;
                let context: &$crate::engine::context::Context =
                    $crate::ffi::obj::<$crate::engine::context::Context, $crate::ffi::context_t>(context)?;
                #[allow(unused_mut)]
                let mut value: $ty = $crate::engine::serialization::load::<$ty>($crate::ffi::slice(bytes, len)?)?;
                value.validate(context)?;
                $crate::ffi::write_out(out, $crate::ffi::into_raw::<$ty, $raw>(value))?;
                Ok($crate::ffi::S_OK)
            })
        }
    };
}

/// Exports `*_retain` and `*_destroy` for a reference counted kind.
macro_rules! shared_kind {
    ($ty:ty, $raw:ty, $retain:ident, $destroy:ident) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $retain(this: *const $raw) -> $crate::ffi::HRESULT {
            $crate::ffi::guard(|| unsafe {
                $crate::ffi::shared_retain::<$ty, $raw>(this)?;
                Ok($crate::ffi::S_OK)
            })
        }

        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $destroy(this: *mut $raw) -> $crate::ffi::HRESULT {
            $crate::ffi::guard(|| unsafe {
                $crate::ffi::shared_release::<$ty, $raw>(this)?;
                Ok($crate::ffi::S_OK)
            })
        }
    };
}

/// Exports a `*_destroy` for a boxed kind that cannot be copied.
macro_rules! owned_kind {
    ($ty:ty, $raw:ty, $destroy:ident) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $destroy(this: *mut $raw) -> $crate::ffi::HRESULT {
            $crate::ffi::guard(|| unsafe {
                $crate::ffi::drop_raw::<$ty, $raw>(this)?;
                Ok($crate::ffi::S_OK)
            })
        }
    };
}

pub(crate) use {boxed_kind, context_serializable_kind, owned_kind, serializable_kind, shared_kind};
