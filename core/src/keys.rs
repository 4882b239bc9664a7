use backend::ffi;

use crate::context::Context;
use crate::error::Result;
use crate::handle::Handle;
use crate::kinds::{KeyGeneratorKind, PublicKeyKind, SecretKeyKind};
use crate::native;
use crate::parameters::ParmsId;
use crate::serialization::serializable;

/// Secret key at the key level of a context. A fresh one is empty and only
/// becomes usable through [`Handle::copy_from`] or loading.
pub type SecretKey = Handle<SecretKeyKind>;

impl SecretKey {
    pub fn new() -> Result<SecretKey> {
        native::construct(|out| unsafe { ffi::keys::seal_secret_key_create(out) })
    }

    pub fn parms_id(&self) -> Result<ParmsId> {
        let this: *const ffi::secret_key_t = self.as_const()?;
        ParmsId::read(|out| unsafe { ffi::keys::seal_secret_key_parms_id(this, out) })
    }
}

serializable!(
    SecretKey,
    ffi::secret_key_t,
    ffi::keys::seal_secret_key_save,
    context: ffi::keys::seal_secret_key_load
);

pub type PublicKey = Handle<PublicKeyKind>;

impl PublicKey {
    pub fn new() -> Result<PublicKey> {
        native::construct(|out| unsafe { ffi::keys::seal_public_key_create(out) })
    }

    pub fn parms_id(&self) -> Result<ParmsId> {
        let this: *const ffi::public_key_t = self.as_const()?;
        ParmsId::read(|out| unsafe { ffi::keys::seal_public_key_parms_id(this, out) })
    }
}

serializable!(
    PublicKey,
    ffi::public_key_t,
    ffi::keys::seal_public_key_save,
    context: ffi::keys::seal_public_key_load
);

pub type KeyGenerator = Handle<KeyGeneratorKind>;

impl KeyGenerator {
    /// Samples a new secret key.
    pub fn new(context: &Context) -> Result<KeyGenerator> {
        let context: *const ffi::context_t = context.as_const()?;
        native::construct(|out| unsafe { ffi::tools::seal_keygen_create(context, out) })
    }

    /// Continues from `secret_key`, which must belong to `context`.
    pub fn with_secret_key(context: &Context, secret_key: &SecretKey) -> Result<KeyGenerator> {
        let context: *const ffi::context_t = context.as_const()?;
        let secret_key: *const ffi::secret_key_t = secret_key.as_const()?;
        native::construct(|out| unsafe { ffi::tools::seal_keygen_create_with_secret(context, secret_key, out) })
    }

    /// Independent copy of the generator's secret key.
    pub fn secret_key(&self) -> Result<SecretKey> {
        let this: *const ffi::keygen_t = self.as_const()?;
        native::produce(|out| unsafe { ffi::tools::seal_keygen_secret_key(this, out) })
    }

    /// Every call samples a new public key for the same secret.
    pub fn create_public_key(&mut self) -> Result<PublicKey> {
        let this: *mut ffi::keygen_t = self.as_ptr()?;
        native::produce(|out| unsafe { ffi::tools::seal_keygen_create_public_key(this, out) })
    }
}
