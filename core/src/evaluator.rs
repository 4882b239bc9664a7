//! Homomorphic operations that need no evaluation keys.
//!
//! Each operation comes in three forms: one returning a new object, an
//! `_into` form overwriting a destination and an `_inplace` form
//! overwriting the first operand.

use backend::ffi::{self, HRESULT};

use crate::ciphertext::Ciphertext;
use crate::context::Context;
use crate::error::Result;
use crate::handle::Handle;
use crate::kinds::EvaluatorKind;
use crate::native;
use crate::parameters::ParmsId;
use crate::plaintext::Plaintext;

type UnaryFn = unsafe extern "C" fn(*const ffi::evaluator_t, *const ffi::ciphertext_t, *mut ffi::ciphertext_t) -> HRESULT;
type BinaryFn<R> =
    unsafe extern "C" fn(*const ffi::evaluator_t, *const ffi::ciphertext_t, *const R, *mut ffi::ciphertext_t) -> HRESULT;

pub type Evaluator = Handle<EvaluatorKind>;

macro_rules! unary {
    ($method:ident, $into:ident, $inplace:ident, $native:path) => {
        pub fn $method(&self, encrypted: &Ciphertext) -> Result<Ciphertext> {
            let mut destination: Ciphertext = Ciphertext::new(None)?;
            self.$into(encrypted, &mut destination)?;
            Ok(destination)
        }

        pub fn $into(&self, encrypted: &Ciphertext, destination: &mut Ciphertext) -> Result<()> {
            self.unary($native, encrypted.as_const()?, destination.as_ptr()?)
        }

        pub fn $inplace(&self, encrypted: &mut Ciphertext) -> Result<()> {
            let ptr: *mut ffi::ciphertext_t = encrypted.as_ptr()?;
            self.unary($native, ptr, ptr)
        }
    };
}

macro_rules! binary {
    ($method:ident, $into:ident, $inplace:ident, $operand:ty, $raw:ty, $native:path) => {
        pub fn $method(&self, encrypted: &Ciphertext, operand: &$operand) -> Result<Ciphertext> {
            let mut destination: Ciphertext = Ciphertext::new(None)?;
            self.$into(encrypted, operand, &mut destination)?;
            Ok(destination)
        }

        pub fn $into(&self, encrypted: &Ciphertext, operand: &$operand, destination: &mut Ciphertext) -> Result<()> {
            self.binary::<$raw>($native, encrypted.as_const()?, operand.as_const()?, destination.as_ptr()?)
        }

        pub fn $inplace(&self, encrypted: &mut Ciphertext, operand: &$operand) -> Result<()> {
            let ptr: *mut ffi::ciphertext_t = encrypted.as_ptr()?;
            self.binary::<$raw>($native, ptr, operand.as_const()?, ptr)
        }
    };
}

impl Evaluator {
    pub fn new(context: &Context) -> Result<Evaluator> {
        let context: *const ffi::context_t = context.as_const()?;
        native::construct(|out| unsafe { ffi::tools::seal_evaluator_create(context, out) })
    }

    fn unary(&self, f: UnaryFn, encrypted: *const ffi::ciphertext_t, destination: *mut ffi::ciphertext_t) -> Result<()> {
        let this: *const ffi::evaluator_t = self.as_const()?;
        native::check(unsafe { f(this, encrypted, destination) })?;
        Ok(())
    }

    fn binary<R>(
        &self,
        f: BinaryFn<R>,
        encrypted: *const ffi::ciphertext_t,
        operand: *const R,
        destination: *mut ffi::ciphertext_t,
    ) -> Result<()> {
        let this: *const ffi::evaluator_t = self.as_const()?;
        native::check(unsafe { f(this, encrypted, operand, destination) })?;
        Ok(())
    }

    unary!(negate, negate_into, negate_inplace, ffi::tools::seal_evaluator_negate);
    binary!(add, add_into, add_inplace, Ciphertext, ffi::ciphertext_t, ffi::tools::seal_evaluator_add);
    binary!(sub, sub_into, sub_inplace, Ciphertext, ffi::ciphertext_t, ffi::tools::seal_evaluator_sub);
    binary!(
        add_plain,
        add_plain_into,
        add_plain_inplace,
        Plaintext,
        ffi::plaintext_t,
        ffi::tools::seal_evaluator_add_plain
    );
    binary!(
        sub_plain,
        sub_plain_into,
        sub_plain_inplace,
        Plaintext,
        ffi::plaintext_t,
        ffi::tools::seal_evaluator_sub_plain
    );
    binary!(
        multiply_plain,
        multiply_plain_into,
        multiply_plain_inplace,
        Plaintext,
        ffi::plaintext_t,
        ffi::tools::seal_evaluator_multiply_plain
    );
    unary!(
        mod_switch_to_next,
        mod_switch_to_next_into,
        mod_switch_to_next_inplace,
        ffi::tools::seal_evaluator_mod_switch_to_next
    );
    // CKKS only.
    unary!(
        rescale_to_next,
        rescale_to_next_into,
        rescale_to_next_inplace,
        ffi::tools::seal_evaluator_rescale_to_next
    );

    /// Switches down the chain until the level is `parms_id`.
    pub fn mod_switch_to(&self, encrypted: &Ciphertext, parms_id: &ParmsId) -> Result<Ciphertext> {
        let mut destination: Ciphertext = Ciphertext::new(None)?;
        self.mod_switch_to_into(encrypted, parms_id, &mut destination)?;
        Ok(destination)
    }

    pub fn mod_switch_to_into(&self, encrypted: &Ciphertext, parms_id: &ParmsId, destination: &mut Ciphertext) -> Result<()> {
        self.switch_to(encrypted.as_const()?, parms_id, destination.as_ptr()?)
    }

    pub fn mod_switch_to_inplace(&self, encrypted: &mut Ciphertext, parms_id: &ParmsId) -> Result<()> {
        let ptr: *mut ffi::ciphertext_t = encrypted.as_ptr()?;
        self.switch_to(ptr, parms_id, ptr)
    }

    fn switch_to(
        &self,
        encrypted: *const ffi::ciphertext_t,
        parms_id: &ParmsId,
        destination: *mut ffi::ciphertext_t,
    ) -> Result<()> {
        let this: *const ffi::evaluator_t = self.as_const()?;
        native::check(unsafe { ffi::tools::seal_evaluator_mod_switch_to(this, encrypted, parms_id.as_ptr(), destination) })?;
        Ok(())
    }

    /// Drops the last residue of a plaintext that carries a level.
    pub fn plain_mod_switch_to_next(&self, plain: &Plaintext) -> Result<Plaintext> {
        let destination: Plaintext = Plaintext::new()?;
        let this: *const ffi::evaluator_t = self.as_const()?;
        native::check(unsafe {
            ffi::tools::seal_evaluator_plain_mod_switch_to_next(this, plain.as_const()?, destination.as_ptr()?)
        })?;
        Ok(destination)
    }

    pub fn plain_mod_switch_to_next_inplace(&self, plain: &mut Plaintext) -> Result<()> {
        let this: *const ffi::evaluator_t = self.as_const()?;
        let ptr: *mut ffi::plaintext_t = plain.as_ptr()?;
        native::check(unsafe { ffi::tools::seal_evaluator_plain_mod_switch_to_next(this, ptr, ptr) })?;
        Ok(())
    }
}
