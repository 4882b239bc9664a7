use std::fmt;
use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NativeFault>;

/// Category of a fault raised inside the engine. The discriminants are the
/// codes reported through [`crate::ffi::fault::seal_fault_kind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FaultKind {
    Unknown = 0,
    InvalidArgument = 1,
    LogicError = 2,
    OutOfRange = 3,
    RuntimeError = 4,
}

impl FaultKind {
    pub const ALL: [FaultKind; 5] = [
        FaultKind::Unknown,
        FaultKind::InvalidArgument,
        FaultKind::LogicError,
        FaultKind::OutOfRange,
        FaultKind::RuntimeError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::Unknown => "unknown",
            FaultKind::InvalidArgument => "invalid_argument",
            FaultKind::LogicError => "logic_error",
            FaultKind::OutOfRange => "out_of_range",
            FaultKind::RuntimeError => "runtime_error",
        }
    }

    pub fn code(&self) -> u32 {
        *self as u32
    }

    pub fn from_code(code: u32) -> FaultKind {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .unwrap_or(FaultKind::Unknown)
    }

    /// Parses a symbolic category name. Accepts both the bare name and the
    /// `std::` qualified class name; anything else is [`FaultKind::Unknown`].
    pub fn parse(name: &str) -> FaultKind {
        let bare: &str = name.trim().strip_prefix("std::").unwrap_or(name.trim());
        match bare {
            "invalid_argument" => FaultKind::InvalidArgument,
            "logic_error" => FaultKind::LogicError,
            "out_of_range" => FaultKind::OutOfRange,
            "runtime_error" => FaultKind::RuntimeError,
            _ => FaultKind::Unknown,
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured engine fault: category plus human readable message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct NativeFault {
    pub kind: FaultKind,
    pub message: String,
}

impl NativeFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(FaultKind::InvalidArgument, message)
    }

    pub fn logic_error(message: impl Into<String>) -> Self {
        Self::new(FaultKind::LogicError, message)
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::new(FaultKind::OutOfRange, message)
    }

    pub fn runtime_error(message: impl Into<String>) -> Self {
        Self::new(FaultKind::RuntimeError, message)
    }
}

impl From<io::Error> for NativeFault {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => NativeFault::logic_error("unexpected end of serialized data"),
            io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => NativeFault::logic_error(err.to_string()),
            _ => NativeFault::runtime_error(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_qualified_names() {
        assert_eq!(FaultKind::parse("std::invalid_argument"), FaultKind::InvalidArgument);
        assert_eq!(FaultKind::parse("logic_error"), FaultKind::LogicError);
        assert_eq!(FaultKind::parse(" out_of_range "), FaultKind::OutOfRange);
        assert_eq!(FaultKind::parse("bad_alloc"), FaultKind::Unknown);
    }

    #[test]
    fn codes_round_trip() {
        FaultKind::ALL
            .iter()
            .for_each(|kind| assert_eq!(FaultKind::from_code(kind.code()), *kind));
        assert_eq!(FaultKind::from_code(99), FaultKind::Unknown);
    }

    #[test]
    fn io_errors_map_to_faults() {
        let eof: NativeFault = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert_eq!(eof.kind, FaultKind::LogicError);
        let other: NativeFault = io::Error::other("disk").into();
        assert_eq!(other.kind, FaultKind::RuntimeError);
    }
}
