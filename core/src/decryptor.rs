use backend::ffi;

use crate::ciphertext::Ciphertext;
use crate::context::Context;
use crate::error::Result;
use crate::handle::Handle;
use crate::keys::SecretKey;
use crate::kinds::DecryptorKind;
use crate::native;
use crate::plaintext::Plaintext;

pub type Decryptor = Handle<DecryptorKind>;

impl Decryptor {
    pub fn new(context: &Context, secret_key: &SecretKey) -> Result<Decryptor> {
        let context: *const ffi::context_t = context.as_const()?;
        let secret_key: *const ffi::secret_key_t = secret_key.as_const()?;
        native::construct(|out| unsafe { ffi::tools::seal_decryptor_create(context, secret_key, out) })
    }

    /// Only ciphertexts of size 2 are supported.
    pub fn decrypt(&self, encrypted: &Ciphertext) -> Result<Plaintext> {
        let mut destination: Plaintext = Plaintext::new()?;
        self.decrypt_into(encrypted, &mut destination)?;
        Ok(destination)
    }

    pub fn decrypt_into(&self, encrypted: &Ciphertext, destination: &mut Plaintext) -> Result<()> {
        let this: *const ffi::decryptor_t = self.as_const()?;
        native::check(unsafe { ffi::tools::seal_decryptor_decrypt(this, encrypted.as_const()?, destination.as_ptr()?) })?;
        Ok(())
    }

    /// Bits of noise headroom left in a BFV ciphertext; 0 means decryption
    /// is no longer reliable.
    pub fn invariant_noise_budget(&self, encrypted: &Ciphertext) -> Result<i32> {
        let this: *const ffi::decryptor_t = self.as_const()?;
        let encrypted: *const ffi::ciphertext_t = encrypted.as_const()?;
        native::read(|out| unsafe { ffi::tools::seal_decryptor_invariant_noise_budget(this, encrypted, out) })
    }
}

#[cfg(test)]
mod tests {
    use backend::ffi::FaultKind;

    use super::*;
    use crate::encryptor::tests::Toolkit;
    use crate::error::ErrorCategory;

    #[test]
    fn noise_budget_shrinks_with_multiplication() {
        let mut toolkit: Toolkit = Toolkit::new();
        let encrypted: Ciphertext = toolkit.encrypt("3");
        let fresh: i32 = toolkit.decryptor.invariant_noise_budget(&encrypted).unwrap();
        assert!(fresh > 0);

        let factor: Plaintext = Plaintext::from_hex("1x^1 + 5", None).unwrap();
        let product: Ciphertext = toolkit.evaluator.multiply_plain(&encrypted, &factor).unwrap();
        assert!(toolkit.decryptor.invariant_noise_budget(&product).unwrap() < fresh);
        assert_eq!(toolkit.decryptor.decrypt(&product).unwrap().to_poly_string().unwrap(), "3x^1 + F");
    }

    #[test]
    fn decrypt_into_reuses_the_destination() {
        let mut toolkit: Toolkit = Toolkit::new();
        let encrypted: Ciphertext = toolkit.encrypt("2A");
        let mut plain: Plaintext = Plaintext::from_hex("1", None).unwrap();
        toolkit.decryptor.decrypt_into(&encrypted, &mut plain).unwrap();
        assert_eq!(plain.coeff(0).unwrap(), 0x2A);
    }

    #[test]
    fn wrong_size_is_rejected() {
        let mut toolkit: Toolkit = Toolkit::new();
        let mut encrypted: Ciphertext = toolkit.encrypt("1");
        encrypted.resize(&toolkit.context, 3).unwrap();
        let err = toolkit.decryptor.decrypt(&encrypted).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NativeFault);
        assert_eq!(err.kind(), FaultKind::InvalidArgument);
    }
}
