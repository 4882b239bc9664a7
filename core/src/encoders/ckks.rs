use backend::ffi;

use crate::context::Context;
use crate::encoders::mismatch;
use crate::error::Result;
use crate::handle::Handle;
use crate::kinds::CkksEncoderKind;
use crate::native;
use crate::parameters::ParmsId;
use crate::plaintext::Plaintext;
use crate::vector::HostArray;

/// Approximate encoder for up to `n/2` reals. Decoding returns the input up
/// to the rounding introduced by `scale`.
pub type CkksEncoder = Handle<CkksEncoderKind>;

impl CkksEncoder {
    pub fn new(context: &Context) -> Result<CkksEncoder> {
        let context: *const ffi::context_t = context.as_const()?;
        native::construct(|out| unsafe { ffi::encoders::seal_ckks_encoder_create(context, out) })
    }

    pub fn slot_count(&self) -> Result<usize> {
        let this: *const ffi::ckks_encoder_t = self.as_const()?;
        native::read(|out| unsafe { ffi::encoders::seal_ckks_encoder_slot_count(this, out) }).map(|n: u64| n as usize)
    }

    /// Encodes a `Float64Array` at `parms_id`, or at the first data level.
    pub fn encode(&self, values: &HostArray, scale: f64, parms_id: Option<&ParmsId>) -> Result<Plaintext> {
        let mut destination: Plaintext = Plaintext::new()?;
        self.encode_into(values, scale, parms_id, &mut destination)?;
        Ok(destination)
    }

    /// A non-positive scale, or one too large for the level's modulus, is a
    /// range error.
    pub fn encode_into(
        &self,
        values: &HostArray,
        scale: f64,
        parms_id: Option<&ParmsId>,
        destination: &mut Plaintext,
    ) -> Result<()> {
        let HostArray::Float64(values) = values else {
            return Err(mismatch("Float64Array", values));
        };
        let this: *const ffi::ckks_encoder_t = self.as_const()?;
        let parms_id: *const u64 = parms_id.map_or(std::ptr::null(), ParmsId::as_ptr);
        native::check(unsafe {
            ffi::encoders::seal_ckks_encoder_encode_f64(
                this,
                values.as_ptr(),
                values.len() as u64,
                parms_id,
                scale,
                destination.as_ptr()?,
            )
        })?;
        Ok(())
    }

    /// All [`CkksEncoder::slot_count`] slots as a `Float64Array`.
    pub fn decode(&self, plain: &Plaintext) -> Result<HostArray> {
        let this: *const ffi::ckks_encoder_t = self.as_const()?;
        let plain: *const ffi::plaintext_t = plain.as_const()?;
        native::read_buffer(|buf, len| unsafe { ffi::encoders::seal_ckks_encoder_decode_f64(this, plain, buf, len) })
            .map(HostArray::Float64)
    }
}
