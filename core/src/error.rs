use thiserror::Error;

use backend::ffi::FaultKind;

use crate::exception::{ExceptionRecord, RawFault, translate};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Construction,
    DisposedHandle,
    TypeMismatch,
    Range,
    NativeFault,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    /// The engine rejected the arguments of a constructor.
    #[error("cannot construct {object}: {record}")]
    Construction { object: &'static str, record: ExceptionRecord },
    /// Operation on a wrapper whose handle was deleted or moved out.
    #[error("use of disposed {0}")]
    DisposedHandle(&'static str),
    /// Unsupported host container or scalar kind.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },
    /// Numeric or capacity bound exceeded.
    #[error("range error: {0}")]
    Range(ExceptionRecord),
    #[error("native fault: {0}")]
    NativeFault(ExceptionRecord),
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Construction { .. } => ErrorCategory::Construction,
            Error::DisposedHandle(_) => ErrorCategory::DisposedHandle,
            Error::TypeMismatch { .. } => ErrorCategory::TypeMismatch,
            Error::Range(_) => ErrorCategory::Range,
            Error::NativeFault(_) => ErrorCategory::NativeFault,
        }
    }

    /// `(kind, message)` of the failure.
    pub fn record(&self) -> ExceptionRecord {
        match self {
            Error::Construction { record, .. } | Error::Range(record) | Error::NativeFault(record) => record.clone(),
            Error::DisposedHandle(object) => translate(&RawFault::Structured {
                kind: FaultKind::LogicError.as_str(),
                message: &format!("use of disposed {object}"),
            }),
            Error::TypeMismatch { expected, found } => translate(&RawFault::Structured {
                kind: FaultKind::InvalidArgument.as_str(),
                message: &format!("expected {expected}, found {found}"),
            }),
        }
    }

    pub fn kind(&self) -> FaultKind {
        self.record().kind
    }

    /// Engine faults surface as [`Error::Range`] when out of range and as
    /// [`Error::NativeFault`] otherwise.
    pub(crate) fn from_record(record: ExceptionRecord) -> Error {
        match record.kind {
            FaultKind::OutOfRange => Error::Range(record),
            _ => Error::NativeFault(record),
        }
    }

    /// Reclassifies an engine fault raised by the constructor of `object`.
    pub(crate) fn into_construction(self, object: &'static str) -> Error {
        match self {
            Error::Range(record) | Error::NativeFault(record) => Error::Construction { object, record },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_record() {
        let disposed: Error = Error::DisposedHandle("Plaintext");
        assert_eq!(disposed.category(), ErrorCategory::DisposedHandle);
        assert_eq!(disposed.kind(), FaultKind::LogicError);
        assert_eq!(disposed.record().message, "use of disposed Plaintext");

        let mismatch: Error = Error::TypeMismatch {
            expected: "Int32Array",
            found: "Array",
        };
        assert_eq!(mismatch.kind(), FaultKind::InvalidArgument);

        let record: ExceptionRecord = translate(&RawFault::Structured {
            kind: "out_of_range",
            message: "value too large",
        });
        let range: Error = Error::from_record(record.clone());
        assert_eq!(range, Error::Range(record.clone()));
        assert_eq!(
            range.into_construction("Plaintext"),
            Error::Construction {
                object: "Plaintext",
                record
            }
        );
    }
}
