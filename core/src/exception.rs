//! Normalizes every failure shape seen at the engine boundary into an
//! [`ExceptionRecord`].

use std::any::Any;
use std::fmt;

use backend::ffi::{self, FaultKind, HRESULT, S_OK};

/// Category and message of a failure. Only [`translate`] produces these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExceptionRecord {
    pub kind: FaultKind,
    pub message: String,
}

impl fmt::Display for ExceptionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

pub(crate) const UNKNOWN_EXCEPTION: &str = "unknown exception";

/// A failure as it arrives at the boundary.
#[derive(Clone, Copy, Debug)]
pub enum RawFault<'a> {
    /// Category name (bare or `std::` qualified) and message.
    Structured { kind: &'a str, message: &'a str },
    /// Id of an entry in the engine's fault registry.
    Handle(u64),
    /// Failure code with no registry entry behind it.
    Code(HRESULT),
    /// Error raised on this side of the boundary.
    Host(&'a (dyn std::error::Error + 'static)),
    /// Payload of a caught panic.
    Panic(&'a (dyn Any + Send)),
    Absent,
}

fn record(kind: FaultKind, message: impl Into<String>) -> ExceptionRecord {
    ExceptionRecord {
        kind,
        message: message.into(),
    }
}

/// Looks up a registry entry without consuming it.
fn resolve(id: u64) -> Option<ExceptionRecord> {
    let mut code: u32 = 0;
    if unsafe { ffi::fault::seal_fault_kind(id, &mut code) } != S_OK {
        return None;
    }
    let mut len: u64 = 0;
    if unsafe { ffi::fault::seal_fault_message(id, std::ptr::null_mut(), &mut len) } != S_OK {
        return None;
    }
    let mut buf: Vec<u8> = vec![0; len as usize];
    if unsafe { ffi::fault::seal_fault_message(id, buf.as_mut_ptr(), &mut len) } != S_OK {
        return None;
    }
    buf.truncate(len as usize);
    Some(record(FaultKind::from_code(code), String::from_utf8_lossy(&buf)))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        UNKNOWN_EXCEPTION.to_string()
    }
}

/// Maps `raw` to a record. Never panics and has no side effect: a registry
/// entry is read, not released.
pub fn translate(raw: &RawFault<'_>) -> ExceptionRecord {
    match raw {
        RawFault::Structured { kind, message } => record(FaultKind::parse(kind), *message),
        RawFault::Handle(id) => resolve(*id).unwrap_or_else(|| {
            log::warn!("fault {id} is not registered");
            record(FaultKind::Unknown, UNKNOWN_EXCEPTION)
        }),
        RawFault::Code(hr) => record(ffi::kind_for(*hr), format!("native call failed with {:#010x}", *hr as u32)),
        RawFault::Host(err) => record(FaultKind::Unknown, err.to_string()),
        RawFault::Panic(payload) => record(FaultKind::Unknown, panic_message(*payload)),
        RawFault::Absent => record(FaultKind::Unknown, UNKNOWN_EXCEPTION),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_names_are_parsed() {
        let r: ExceptionRecord = translate(&RawFault::Structured {
            kind: "std::invalid_argument",
            message: "bad degree",
        });
        assert_eq!(r.kind, FaultKind::InvalidArgument);
        assert_eq!(r.message, "bad degree");
        let r: ExceptionRecord = translate(&RawFault::Structured {
            kind: "SomethingElse",
            message: "x",
        });
        assert_eq!(r.kind, FaultKind::Unknown);
    }

    #[test]
    fn codes_map_to_kinds() {
        assert_eq!(translate(&RawFault::Code(ffi::E_INVALIDARG)).kind, FaultKind::InvalidArgument);
        assert_eq!(translate(&RawFault::Code(ffi::COR_E_ARGUMENTOUTOFRANGE)).kind, FaultKind::OutOfRange);
        assert_eq!(translate(&RawFault::Code(-1)).kind, FaultKind::Unknown);
    }

    #[test]
    fn host_values_degrade_to_unknown() {
        let err: std::io::Error = std::io::Error::other("disk gone");
        assert_eq!(translate(&RawFault::Host(&err)), record(FaultKind::Unknown, "disk gone"));

        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(translate(&RawFault::Panic(payload.as_ref())).message, UNKNOWN_EXCEPTION);
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(translate(&RawFault::Panic(payload.as_ref())).message, "boom");

        assert_eq!(translate(&RawFault::Absent), record(FaultKind::Unknown, UNKNOWN_EXCEPTION));
    }

    #[test]
    fn unknown_handle_is_not_an_error() {
        let r: ExceptionRecord = translate(&RawFault::Handle(u64::MAX));
        assert_eq!(r, record(FaultKind::Unknown, UNKNOWN_EXCEPTION));
        assert_eq!(translate(&RawFault::Handle(u64::MAX)), r);
    }
}
