//! Call-site plumbing for the engine's C ABI.
//!
//! Every `seal_*` call goes through [`check`]: a failing code is resolved
//! against the fault registry, translated, released and raised as an
//! [`Error`].

use std::ptr::null_mut;

use backend::ffi::{self, HRESULT, S_FALSE, S_OK};

use crate::error::{Error, Result};
use crate::exception::{ExceptionRecord, RawFault, translate};
use crate::handle::{Handle, NativeKind};

fn failed(hr: HRESULT) -> bool {
    hr != S_OK && hr != S_FALSE
}

/// Claims, translates and releases the fault behind `hr`.
fn take_fault(hr: HRESULT) -> ExceptionRecord {
    let mut id: u64 = 0;
    if unsafe { ffi::fault::seal_last_fault(&mut id) } != S_OK {
        return translate(&RawFault::Code(hr));
    }
    let record: ExceptionRecord = translate(&RawFault::Handle(id));
    unsafe { ffi::fault::seal_fault_release(id) };
    record
}

/// Passes `S_OK` and `S_FALSE` through, raises anything else.
pub(crate) fn check(hr: HRESULT) -> Result<HRESULT> {
    if failed(hr) {
        let record: ExceptionRecord = take_fault(hr);
        log::trace!("native call failed: {record}");
        return Err(Error::from_record(record));
    }
    Ok(hr)
}

/// `Ok(true)` for `S_OK`, `Ok(false)` for `S_FALSE`.
pub(crate) fn check_found(hr: HRESULT) -> Result<bool> {
    Ok(check(hr)? == S_OK)
}

/// Runs a native constructor writing through its out-pointer.
pub(crate) fn construct<K: NativeKind>(f: impl FnOnce(*mut *mut K::Raw) -> HRESULT) -> Result<Handle<K>> {
    produce(f).map_err(|err| err.into_construction(K::NAME))
}

/// Runs a call handing back a fresh allocation.
pub(crate) fn produce<K: NativeKind>(f: impl FnOnce(*mut *mut K::Raw) -> HRESULT) -> Result<Handle<K>> {
    produce_optional(f)?.ok_or_else(|| {
        Error::from_record(translate(&RawFault::Structured {
            kind: "logic_error",
            message: &format!("engine returned no {}", K::NAME),
        }))
    })
}

/// Like [`produce`], with `S_FALSE` meaning nothing was allocated.
pub(crate) fn produce_optional<K: NativeKind>(f: impl FnOnce(*mut *mut K::Raw) -> HRESULT) -> Result<Option<Handle<K>>> {
    let mut raw: *mut K::Raw = null_mut();
    if !check_found(f(&mut raw))? || raw.is_null() {
        return Ok(None);
    }
    Ok(Some(unsafe { Handle::from_raw(raw) }))
}

/// Reads a scalar written through an out-pointer.
pub(crate) fn read<V: Default>(f: impl FnOnce(*mut V) -> HRESULT) -> Result<V> {
    let mut value: V = V::default();
    check(f(&mut value))?;
    Ok(value)
}

/// Two-call read of a variable length buffer.
pub(crate) fn read_buffer<V: Copy + Default>(mut f: impl FnMut(*mut V, *mut u64) -> HRESULT) -> Result<Vec<V>> {
    let mut len: u64 = 0;
    check(f(null_mut(), &mut len))?;
    let mut buf: Vec<V> = vec![V::default(); len as usize];
    check(f(buf.as_mut_ptr(), &mut len))?;
    buf.truncate(len as usize);
    Ok(buf)
}

pub(crate) fn read_string(f: impl FnMut(*mut u8, *mut u64) -> HRESULT) -> Result<String> {
    Ok(String::from_utf8_lossy(&read_buffer(f)?).into_owned())
}
