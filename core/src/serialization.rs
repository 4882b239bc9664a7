//! Byte and base64 forms of serializable wrappers.
//!
//! Saved bytes carry the engine's 16-byte header followed by the body,
//! compressed according to [`ComprMode`]. Loading never hands out a partly
//! initialized object: corrupted or truncated input is an error.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub use backend::ffi::ComprMode;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::exception::{RawFault, translate};

pub trait Save {
    fn save_to_vec(&self, compr_mode: ComprMode) -> Result<Vec<u8>>;

    fn save_to_base64(&self, compr_mode: ComprMode) -> Result<String> {
        Ok(STANDARD.encode(self.save_to_vec(compr_mode)?))
    }
}

/// Kinds whose saved form stands on its own.
pub trait Load: Sized {
    fn load_from_vec(bytes: &[u8]) -> Result<Self>;

    fn load_from_base64(text: &str) -> Result<Self> {
        Self::load_from_vec(&decode_base64(text)?)
    }
}

/// Kinds checked against a context when loaded.
pub trait LoadWithContext: Sized {
    fn load_from_vec(context: &Context, bytes: &[u8]) -> Result<Self>;

    fn load_from_base64(context: &Context, text: &str) -> Result<Self> {
        Self::load_from_vec(context, &decode_base64(text)?)
    }
}

fn decode_base64(text: &str) -> Result<Vec<u8>> {
    STANDARD.decode(text.trim()).map_err(|err| {
        Error::from_record(translate(&RawFault::Structured {
            kind: "invalid_argument",
            message: &format!("invalid base64: {err}"),
        }))
    })
}

/// Implements [`Save`] and [`Load`] or [`LoadWithContext`] over the
/// engine's `*_save` / `*_load` pair.
macro_rules! serializable {
    (@save $wrapper:ty, $raw:ty, $save:path) => {
        impl $crate::serialization::Save for $wrapper {
            fn save_to_vec(&self, compr_mode: $crate::serialization::ComprMode) -> $crate::error::Result<Vec<u8>> {
                let this: *const $raw = self.as_const()?;
                $crate::native::read_buffer(|buf, len| unsafe { $save(this, compr_mode as u8, buf, len) })
            }
        }
    };
    ($wrapper:ty, $raw:ty, $save:path, context: $load:path) => {
        $crate::serialization::serializable!(@save $wrapper, $raw, $save);

        impl $crate::serialization::LoadWithContext for $wrapper {
            fn load_from_vec(context: &$crate::context::Context, bytes: &[u8]) -> $crate::error::Result<Self> {
                let context: *const ::backend::ffi::context_t = context.as_const()?;
                $crate::native::produce(|out| unsafe { $load(context, bytes.as_ptr(), bytes.len() as u64, out) })
            }
        }
    };
    ($wrapper:ty, $raw:ty, $save:path, $load:path) => {
        $crate::serialization::serializable!(@save $wrapper, $raw, $save);

        impl $crate::serialization::Load for $wrapper {
            fn load_from_vec(bytes: &[u8]) -> $crate::error::Result<Self> {
                $crate::native::produce(|out| unsafe { $load(bytes.as_ptr(), bytes.len() as u64, out) })
            }
        }
    };
}

pub(crate) use serializable;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::modulus::Modulus;
    use crate::tests::init;

    #[test]
    fn base64_wraps_the_byte_form() {
        init();
        let modulus: Modulus = Modulus::new(65537).unwrap();
        for mode in [ComprMode::None, ComprMode::Lz4, ComprMode::Zstd] {
            let text: String = modulus.save_to_base64(mode).unwrap();
            assert_eq!(STANDARD.decode(&text).unwrap(), modulus.save_to_vec(mode).unwrap());
            let loaded: Modulus = Modulus::load_from_base64(&text).unwrap();
            assert_eq!(loaded.value().unwrap(), 65537);
        }
    }

    #[test]
    fn bad_text_is_rejected() {
        let err: Error = decode_base64("not base64!").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NativeFault);
        init();
        assert!(Modulus::load_from_base64("AAAA").is_err());
    }
}
