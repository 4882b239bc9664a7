use backend::ffi;

use crate::ciphertext::Ciphertext;
use crate::context::Context;
use crate::error::Result;
use crate::handle::Handle;
use crate::keys::{PublicKey, SecretKey};
use crate::kinds::EncryptorKind;
use crate::native;
use crate::plaintext::Plaintext;

/// Public key and symmetric encryption. Either key may be left out; the
/// matching mode then fails until the key is set.
pub type Encryptor = Handle<EncryptorKind>;

impl Encryptor {
    pub fn new(context: &Context, public_key: Option<&PublicKey>, secret_key: Option<&SecretKey>) -> Result<Encryptor> {
        let context: *const ffi::context_t = context.as_const()?;
        let public_key: *const ffi::public_key_t = match public_key {
            Some(key) => key.as_const()?,
            None => std::ptr::null(),
        };
        let secret_key: *const ffi::secret_key_t = match secret_key {
            Some(key) => key.as_const()?,
            None => std::ptr::null(),
        };
        native::construct(|out| unsafe { ffi::tools::seal_encryptor_create(context, public_key, secret_key, out) })
    }

    pub fn set_public_key(&mut self, public_key: &PublicKey) -> Result<()> {
        let this: *mut ffi::encryptor_t = self.as_ptr()?;
        native::check(unsafe { ffi::tools::seal_encryptor_set_public_key(this, public_key.as_const()?) })?;
        Ok(())
    }

    pub fn set_secret_key(&mut self, secret_key: &SecretKey) -> Result<()> {
        let this: *mut ffi::encryptor_t = self.as_ptr()?;
        native::check(unsafe { ffi::tools::seal_encryptor_set_secret_key(this, secret_key.as_const()?) })?;
        Ok(())
    }

    pub fn encrypt(&mut self, plain: &Plaintext) -> Result<Ciphertext> {
        let mut destination: Ciphertext = Ciphertext::new(None)?;
        self.encrypt_into(plain, &mut destination)?;
        Ok(destination)
    }

    /// Overwrites `destination`, which keeps its handle.
    pub fn encrypt_into(&mut self, plain: &Plaintext, destination: &mut Ciphertext) -> Result<()> {
        let this: *mut ffi::encryptor_t = self.as_ptr()?;
        native::check(unsafe { ffi::tools::seal_encryptor_encrypt(this, plain.as_const()?, destination.as_ptr()?) })?;
        Ok(())
    }

    pub fn encrypt_symmetric(&mut self, plain: &Plaintext) -> Result<Ciphertext> {
        let mut destination: Ciphertext = Ciphertext::new(None)?;
        self.encrypt_symmetric_into(plain, &mut destination)?;
        Ok(destination)
    }

    pub fn encrypt_symmetric_into(&mut self, plain: &Plaintext, destination: &mut Ciphertext) -> Result<()> {
        let this: *mut ffi::encryptor_t = self.as_ptr()?;
        native::check(unsafe {
            ffi::tools::seal_encryptor_encrypt_symmetric(this, plain.as_const()?, destination.as_ptr()?)
        })?;
        Ok(())
    }
}
