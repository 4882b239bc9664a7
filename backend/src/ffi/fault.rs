//! Per-thread registry of faults raised by exported calls.
//!
//! A failing call records its fault and returns an error code. The caller
//! then claims the fault id with [`seal_last_fault`], inspects it with
//! [`seal_fault_kind`] and [`seal_fault_message`], and frees it with
//! [`seal_fault_release`].

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::fault::NativeFault;
use crate::ffi::{E_POINTER, HRESULT, S_FALSE, S_OK, write_buffer};

/// Oldest faults are dropped past this many unreleased entries.
const MAX_PENDING_FAULTS: usize = 1024;

#[derive(Default)]
struct Registry {
    next_id: u64,
    faults: BTreeMap<u64, NativeFault>,
    last: Option<u64>,
}

thread_local! {
    static REGISTRY: RefCell<Registry> = RefCell::new(Registry {
        next_id: 1,
        ..Default::default()
    });
}

pub(crate) fn record(fault: NativeFault) -> u64 {
    log::trace!("engine fault: {fault}");
    REGISTRY.with_borrow_mut(|registry| {
        let id: u64 = registry.next_id;
        registry.next_id += 1;
        registry.faults.insert(id, fault);
        while registry.faults.len() > MAX_PENDING_FAULTS {
            registry.faults.pop_first();
        }
        registry.last = Some(id);
        id
    })
}

fn with_fault<T>(id: u64, f: impl FnOnce(&NativeFault) -> T) -> Option<T> {
    REGISTRY.with_borrow(|registry| registry.faults.get(&id).map(f))
}

#[cfg(test)]
pub(crate) fn take(id: u64) -> Option<NativeFault> {
    REGISTRY.with_borrow_mut(|registry| registry.faults.remove(&id))
}

/// Claims the id of the most recent fault on this thread. Returns `S_FALSE`
/// when no fault is pending.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_last_fault(out_id: *mut u64) -> HRESULT {
    if out_id.is_null() {
        return E_POINTER;
    }
    match REGISTRY.with_borrow_mut(|registry| registry.last.take()) {
        Some(id) => {
            unsafe { out_id.write(id) };
            S_OK
        }
        None => S_FALSE,
    }
}

/// Writes the [`crate::fault::FaultKind`] code of fault `id`; `S_FALSE` if
/// the id is unknown.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_fault_kind(id: u64, out_kind: *mut u32) -> HRESULT {
    if out_kind.is_null() {
        return E_POINTER;
    }
    match with_fault(id, |fault| fault.kind.code()) {
        Some(code) => {
            unsafe { out_kind.write(code) };
            S_OK
        }
        None => S_FALSE,
    }
}

/// Two-call UTF-8 message of fault `id`; `S_FALSE` if the id is unknown.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_fault_message(id: u64, buf: *mut u8, len: *mut u64) -> HRESULT {
    let Some(message) = with_fault(id, |fault| fault.message.clone()) else {
        return S_FALSE;
    };
    match unsafe { write_buffer(message.as_bytes(), buf, len) } {
        Ok(hr) => hr,
        Err(_) => E_POINTER,
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_fault_release(id: u64) -> HRESULT {
    match REGISTRY.with_borrow_mut(|registry| registry.faults.remove(&id)) {
        Some(_) => S_OK,
        None => S_FALSE,
    }
}
