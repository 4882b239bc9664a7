use backend::ffi;

use crate::context::Context;
use crate::error::Result;
use crate::handle::Handle;
use crate::kinds::IntegerEncoderKind;
use crate::native;
use crate::plaintext::Plaintext;

/// Writes one integer as its base-2 expansion: bit `i` becomes the
/// coefficient of `x^i`, with negative integers using `t - 1` as digit.
pub type IntegerEncoder = Handle<IntegerEncoderKind>;

macro_rules! decode {
    ($method:ident, $int:ty, $native:path) => {
        /// Evaluates the plaintext at 2. A result outside the target type
        /// is a range error.
        pub fn $method(&self, plain: &Plaintext) -> Result<$int> {
            let this: *const ffi::integer_encoder_t = self.as_const()?;
            let plain: *const ffi::plaintext_t = plain.as_const()?;
            native::read(|out| unsafe { $native(this, plain, out) })
        }
    };
}

impl IntegerEncoder {
    pub fn new(context: &Context) -> Result<IntegerEncoder> {
        let context: *const ffi::context_t = context.as_const()?;
        native::construct(|out| unsafe { ffi::encoders::seal_integer_encoder_create(context, out) })
    }

    pub fn plain_modulus(&self) -> Result<u64> {
        let this: *const ffi::integer_encoder_t = self.as_const()?;
        native::read(|out| unsafe { ffi::encoders::seal_integer_encoder_plain_modulus(this, out) })
    }

    pub fn encode_u64(&self, value: u64) -> Result<Plaintext> {
        let mut destination: Plaintext = Plaintext::new()?;
        self.encode_u64_into(value, &mut destination)?;
        Ok(destination)
    }

    pub fn encode_u64_into(&self, value: u64, destination: &mut Plaintext) -> Result<()> {
        let this: *const ffi::integer_encoder_t = self.as_const()?;
        native::check(unsafe { ffi::encoders::seal_integer_encoder_encode_u64(this, value, destination.as_ptr()?) })?;
        Ok(())
    }

    pub fn encode_i64(&self, value: i64) -> Result<Plaintext> {
        let mut destination: Plaintext = Plaintext::new()?;
        self.encode_i64_into(value, &mut destination)?;
        Ok(destination)
    }

    pub fn encode_i64_into(&self, value: i64, destination: &mut Plaintext) -> Result<()> {
        let this: *const ffi::integer_encoder_t = self.as_const()?;
        native::check(unsafe { ffi::encoders::seal_integer_encoder_encode_i64(this, value, destination.as_ptr()?) })?;
        Ok(())
    }

    pub fn encode_u32(&self, value: u32) -> Result<Plaintext> {
        self.encode_u64(u64::from(value))
    }

    pub fn encode_i32(&self, value: i32) -> Result<Plaintext> {
        self.encode_i64(i64::from(value))
    }

    decode!(decode_u64, u64, ffi::encoders::seal_integer_encoder_decode_u64);
    decode!(decode_i64, i64, ffi::encoders::seal_integer_encoder_decode_i64);
    decode!(decode_u32, u32, ffi::encoders::seal_integer_encoder_decode_u32);
    decode!(decode_i32, i32, ffi::encoders::seal_integer_encoder_decode_i32);
}
