//! Key generation, encryption, decryption and evaluation.
//!
//! Every operation producing a ciphertext or plaintext overwrites the object
//! behind `destination`, which may alias an input.

use std::sync::Arc;

use crate::engine::ciphertext::Ciphertext;
use crate::engine::context::Context;
use crate::engine::decryptor::Decryptor;
use crate::engine::encryptor::Encryptor;
use crate::engine::evaluator::Evaluator;
use crate::engine::keys::{KeyGenerator, PublicKey, SecretKey};
use crate::engine::parameters::ParmsId;
use crate::engine::plaintext::Plaintext;
use crate::ffi::parameters::read_parms_id;
use crate::ffi::{
    Failure, HRESULT, S_OK, ciphertext_t, context_t, decryptor_t, encryptor_t, ensure_ready, evaluator_t, guard,
    into_raw, keygen_t, obj, obj_mut, opt_obj, owned_kind, plaintext_t, public_key_t, secret_key_t, shared, write_out,
};

/// Replaces the object behind `destination` once every input borrow ended.
unsafe fn store<T, R>(destination: *mut R, value: T) -> Result<(), Failure> {
    *unsafe { obj_mut::<T, R>(destination) }? = value;
    Ok(())
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_keygen_create(context: *const context_t, out: *mut *mut keygen_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let context: Arc<Context> = shared::<Context, _>(context)?;
        write_out(out, into_raw::<KeyGenerator, keygen_t>(KeyGenerator::new(context)?))?;
        Ok(S_OK)
    })
}

/// Key generator continuing from an existing secret key.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_keygen_create_with_secret(
    context: *const context_t,
    secret_key: *const secret_key_t,
    out: *mut *mut keygen_t,
) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let context: Arc<Context> = shared::<Context, _>(context)?;
        let keygen: KeyGenerator = KeyGenerator::with_secret_key(context, obj::<SecretKey, _>(secret_key)?)?;
        write_out(out, into_raw::<KeyGenerator, keygen_t>(keygen))?;
        Ok(S_OK)
    })
}

owned_kind!(KeyGenerator, keygen_t, seal_keygen_destroy);

/// Fresh copy of the generator's secret key.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_keygen_secret_key(this: *const keygen_t, out: *mut *mut secret_key_t) -> HRESULT {
    guard(|| unsafe {
        let secret_key: SecretKey = obj::<KeyGenerator, _>(this)?.secret_key().clone();
        write_out(out, into_raw::<SecretKey, secret_key_t>(secret_key))?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_keygen_create_public_key(this: *mut keygen_t, out: *mut *mut public_key_t) -> HRESULT {
    guard(|| unsafe {
        let public_key: PublicKey = obj_mut::<KeyGenerator, _>(this)?.create_public_key();
        write_out(out, into_raw::<PublicKey, public_key_t>(public_key))?;
        Ok(S_OK)
    })
}

/// Either key may be null; the matching encryption mode is then unavailable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_encryptor_create(
    context: *const context_t,
    public_key: *const public_key_t,
    secret_key: *const secret_key_t,
    out: *mut *mut encryptor_t,
) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let context: Arc<Context> = shared::<Context, _>(context)?;
        let encryptor: Encryptor = Encryptor::new(
            context,
            opt_obj::<PublicKey, _>(public_key),
            opt_obj::<SecretKey, _>(secret_key),
        )?;
        write_out(out, into_raw::<Encryptor, encryptor_t>(encryptor))?;
        Ok(S_OK)
    })
}

owned_kind!(Encryptor, encryptor_t, seal_encryptor_destroy);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_encryptor_set_public_key(this: *mut encryptor_t, public_key: *const public_key_t) -> HRESULT {
    guard(|| unsafe {
        let public_key: &PublicKey = obj::<PublicKey, _>(public_key)?;
        obj_mut::<Encryptor, _>(this)?.set_public_key(public_key)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_encryptor_set_secret_key(this: *mut encryptor_t, secret_key: *const secret_key_t) -> HRESULT {
    guard(|| unsafe {
        let secret_key: &SecretKey = obj::<SecretKey, _>(secret_key)?;
        obj_mut::<Encryptor, _>(this)?.set_secret_key(secret_key)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_encryptor_encrypt(
    this: *mut encryptor_t,
    plain: *const plaintext_t,
    destination: *mut ciphertext_t,
) -> HRESULT {
    guard(|| unsafe {
        let plain: &Plaintext = obj::<Plaintext, _>(plain)?;
        let encrypted: Ciphertext = obj_mut::<Encryptor, _>(this)?.encrypt(plain)?;
        store(destination, encrypted)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_encryptor_encrypt_symmetric(
    this: *mut encryptor_t,
    plain: *const plaintext_t,
    destination: *mut ciphertext_t,
) -> HRESULT {
    guard(|| unsafe {
        let plain: &Plaintext = obj::<Plaintext, _>(plain)?;
        let encrypted: Ciphertext = obj_mut::<Encryptor, _>(this)?.encrypt_symmetric(plain)?;
        store(destination, encrypted)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_decryptor_create(
    context: *const context_t,
    secret_key: *const secret_key_t,
    out: *mut *mut decryptor_t,
) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let context: Arc<Context> = shared::<Context, _>(context)?;
        let decryptor: Decryptor = Decryptor::new(context, obj::<SecretKey, _>(secret_key)?)?;
        write_out(out, into_raw::<Decryptor, decryptor_t>(decryptor))?;
        Ok(S_OK)
    })
}

owned_kind!(Decryptor, decryptor_t, seal_decryptor_destroy);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_decryptor_decrypt(
    this: *const decryptor_t,
    encrypted: *const ciphertext_t,
    destination: *mut plaintext_t,
) -> HRESULT {
    guard(|| unsafe {
        let plain: Plaintext = obj::<Decryptor, _>(this)?.decrypt(obj::<Ciphertext, _>(encrypted)?)?;
        store(destination, plain)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_decryptor_invariant_noise_budget(
    this: *const decryptor_t,
    encrypted: *const ciphertext_t,
    out: *mut i32,
) -> HRESULT {
    guard(|| unsafe {
        let budget: i32 = obj::<Decryptor, _>(this)?.invariant_noise_budget(obj::<Ciphertext, _>(encrypted)?)?;
        write_out(out, budget)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_evaluator_create(context: *const context_t, out: *mut *mut evaluator_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        let context: Arc<Context> = shared::<Context, _>(context)?;
        write_out(out, into_raw::<Evaluator, evaluator_t>(Evaluator::new(context)?))?;
        Ok(S_OK)
    })
}

owned_kind!(Evaluator, evaluator_t, seal_evaluator_destroy);

/// Exports `fn(evaluator, ciphertext, destination)`.
macro_rules! unary_op {
    ($name:ident, $method:ident) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(
            this: *const evaluator_t,
            encrypted: *const ciphertext_t,
            destination: *mut ciphertext_t,
        ) -> HRESULT {
            guard(|| unsafe {
                let result: Ciphertext = obj::<Evaluator, _>(this)?.$method(obj::<Ciphertext, _>(encrypted)?)?;
                store(destination, result)?;
                Ok(S_OK)
            })
        }
    };
}

/// Exports `fn(evaluator, ciphertext, operand, destination)`.
macro_rules! binary_op {
    ($name:ident, $method:ident, $operand:ty, $operand_raw:ty) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(
            this: *const evaluator_t,
            encrypted: *const ciphertext_t,
            operand: *const $operand_raw,
            destination: *mut ciphertext_t,
        ) -> HRESULT {
            guard(|| unsafe {
                let result: Ciphertext = obj::<Evaluator, _>(this)?
                    .$method(obj::<Ciphertext, _>(encrypted)?, obj::<$operand, _>(operand)?)?;
                store(destination, result)?;
                Ok(S_OK)
            })
        }
    };
}

unary_op!(seal_evaluator_negate, negate);
unary_op!(seal_evaluator_mod_switch_to_next, mod_switch_to_next);
unary_op!(seal_evaluator_rescale_to_next, rescale_to_next);
binary_op!(seal_evaluator_add, add, Ciphertext, ciphertext_t);
binary_op!(seal_evaluator_sub, sub, Ciphertext, ciphertext_t);
binary_op!(seal_evaluator_add_plain, add_plain, Plaintext, plaintext_t);
binary_op!(seal_evaluator_sub_plain, sub_plain, Plaintext, plaintext_t);
binary_op!(seal_evaluator_multiply_plain, multiply_plain, Plaintext, plaintext_t);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_evaluator_mod_switch_to(
    this: *const evaluator_t,
    encrypted: *const ciphertext_t,
    parms_id: *const u64,
    destination: *mut ciphertext_t,
) -> HRESULT {
    guard(|| unsafe {
        let parms_id: ParmsId = read_parms_id(parms_id).ok_or(Failure::Null("parms_id"))?;
        let result: Ciphertext = obj::<Evaluator, _>(this)?.mod_switch_to(obj::<Ciphertext, _>(encrypted)?, &parms_id)?;
        store(destination, result)?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_evaluator_plain_mod_switch_to_next(
    this: *const evaluator_t,
    plain: *const plaintext_t,
    destination: *mut plaintext_t,
) -> HRESULT {
    guard(|| unsafe {
        let result: Plaintext = obj::<Evaluator, _>(this)?.plain_mod_switch_to_next(obj::<Plaintext, _>(plain)?)?;
        store(destination, result)?;
        Ok(S_OK)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::ciphertext::{seal_ciphertext_create, seal_ciphertext_destroy, seal_ciphertext_size};
    use crate::ffi::context::tests::bfv_context;
    use crate::ffi::context::{seal_context_destroy, seal_context_last_parms_id};
    use crate::ffi::keys::{seal_public_key_destroy, seal_secret_key_destroy};
    use crate::ffi::plaintext::{seal_plaintext_create, seal_plaintext_destroy, seal_plaintext_from_hex, seal_plaintext_get_coeff};
    use crate::ffi::tests::{init, last_fault};
    use crate::ffi::{COR_E_INVALIDOPERATION, E_INVALIDARG, FaultKind};

    struct Tools {
        context: *mut context_t,
        keygen: *mut keygen_t,
        secret_key: *mut secret_key_t,
        public_key: *mut public_key_t,
        encryptor: *mut encryptor_t,
        decryptor: *mut decryptor_t,
        evaluator: *mut evaluator_t,
    }

    impl Tools {
        fn new() -> Tools {
            init();
            let context: *mut context_t = bfv_context();
            let mut tools: Tools = Tools {
                context,
                keygen: std::ptr::null_mut(),
                secret_key: std::ptr::null_mut(),
                public_key: std::ptr::null_mut(),
                encryptor: std::ptr::null_mut(),
                decryptor: std::ptr::null_mut(),
                evaluator: std::ptr::null_mut(),
            };
            unsafe {
                assert_eq!(seal_keygen_create(context, &mut tools.keygen), S_OK);
                assert_eq!(seal_keygen_secret_key(tools.keygen, &mut tools.secret_key), S_OK);
                assert_eq!(seal_keygen_create_public_key(tools.keygen, &mut tools.public_key), S_OK);
                assert_eq!(
                    seal_encryptor_create(context, tools.public_key, tools.secret_key, &mut tools.encryptor),
                    S_OK
                );
                assert_eq!(seal_decryptor_create(context, tools.secret_key, &mut tools.decryptor), S_OK);
                assert_eq!(seal_evaluator_create(context, &mut tools.evaluator), S_OK);
            }
            tools
        }

        unsafe fn plain(&self, poly: &str) -> *mut plaintext_t {
            let mut plain: *mut plaintext_t = std::ptr::null_mut();
            let hr: HRESULT = unsafe { seal_plaintext_from_hex(poly.as_ptr(), poly.len() as u64, std::ptr::null(), &mut plain) };
            assert_eq!(hr, S_OK);
            plain
        }

        unsafe fn ciphertext(&self) -> *mut ciphertext_t {
            let mut encrypted: *mut ciphertext_t = std::ptr::null_mut();
            assert_eq!(unsafe { seal_ciphertext_create(std::ptr::null(), &mut encrypted) }, S_OK);
            encrypted
        }

        unsafe fn constant(&self, encrypted: *const ciphertext_t) -> u64 {
            let mut plain: *mut plaintext_t = std::ptr::null_mut();
            unsafe {
                assert_eq!(seal_plaintext_create(0, 0, std::ptr::null(), &mut plain), S_OK);
                assert_eq!(seal_decryptor_decrypt(self.decryptor, encrypted, plain), S_OK);
                let mut value: u64 = 0;
                assert_eq!(seal_plaintext_get_coeff(plain, 0, &mut value), S_OK);
                assert_eq!(seal_plaintext_destroy(plain), S_OK);
                value
            }
        }
    }

    impl Drop for Tools {
        fn drop(&mut self) {
            unsafe {
                seal_evaluator_destroy(self.evaluator);
                seal_decryptor_destroy(self.decryptor);
                seal_encryptor_destroy(self.encryptor);
                seal_public_key_destroy(self.public_key);
                seal_secret_key_destroy(self.secret_key);
                seal_keygen_destroy(self.keygen);
                seal_context_destroy(self.context);
            }
        }
    }

    #[test]
    fn encrypt_evaluate_decrypt() {
        let tools: Tools = Tools::new();
        unsafe {
            let five: *mut plaintext_t = tools.plain("5");
            let nine: *mut plaintext_t = tools.plain("9");
            let a: *mut ciphertext_t = tools.ciphertext();
            let b: *mut ciphertext_t = tools.ciphertext();
            assert_eq!(seal_encryptor_encrypt(tools.encryptor, five, a), S_OK);
            assert_eq!(seal_encryptor_encrypt_symmetric(tools.encryptor, nine, b), S_OK);
            assert_eq!(tools.constant(a), 5);
            assert_eq!(tools.constant(b), 9);

            let mut before: i32 = 0;
            assert_eq!(seal_decryptor_invariant_noise_budget(tools.decryptor, a, &mut before), S_OK);
            assert!(before > 0);

            // the destination aliases the first operand
            assert_eq!(seal_evaluator_add(tools.evaluator, a, b, a), S_OK);
            assert_eq!(tools.constant(a), 14);
            assert_eq!(seal_evaluator_sub_plain(tools.evaluator, a, nine, a), S_OK);
            assert_eq!(tools.constant(a), 5);
            assert_eq!(seal_evaluator_multiply_plain(tools.evaluator, a, nine, a), S_OK);
            assert_eq!(tools.constant(a), 45);
            assert_eq!(seal_evaluator_mod_switch_to_next(tools.evaluator, a, a), S_OK);
            assert_eq!(tools.constant(a), 45);

            let mut size: u64 = 0;
            assert_eq!(seal_ciphertext_size(a, &mut size), S_OK);
            assert_eq!(size, 2);

            // already at the last level
            assert_eq!(seal_evaluator_mod_switch_to_next(tools.evaluator, a, a), E_INVALIDARG);
            assert_eq!(last_fault().kind, FaultKind::InvalidArgument);

            let mut last: [u64; 4] = [0; 4];
            assert_eq!(seal_context_last_parms_id(tools.context, last.as_mut_ptr()), S_OK);
            assert_eq!(seal_evaluator_mod_switch_to(tools.evaluator, b, last.as_ptr(), b), S_OK);
            assert_eq!(seal_evaluator_sub(tools.evaluator, a, b, b), S_OK);
            assert_eq!(tools.constant(b), 36);

            for ct in [a, b] {
                assert_eq!(seal_ciphertext_destroy(ct), S_OK);
            }
            for pt in [five, nine] {
                assert_eq!(seal_plaintext_destroy(pt), S_OK);
            }
        }
    }

    #[test]
    fn encryptor_without_public_key() {
        let tools: Tools = Tools::new();
        unsafe {
            let mut encryptor: *mut encryptor_t = std::ptr::null_mut();
            assert_eq!(
                seal_encryptor_create(tools.context, std::ptr::null(), tools.secret_key, &mut encryptor),
                S_OK
            );
            let one: *mut plaintext_t = tools.plain("1");
            let encrypted: *mut ciphertext_t = tools.ciphertext();
            assert_eq!(seal_encryptor_encrypt(encryptor, one, encrypted), COR_E_INVALIDOPERATION);
            assert_eq!(last_fault().kind, FaultKind::LogicError);
            assert_eq!(seal_encryptor_set_public_key(encryptor, tools.public_key), S_OK);
            assert_eq!(seal_encryptor_encrypt(encryptor, one, encrypted), S_OK);
            assert_eq!(tools.constant(encrypted), 1);

            assert_eq!(seal_ciphertext_destroy(encrypted), S_OK);
            assert_eq!(seal_plaintext_destroy(one), S_OK);
            assert_eq!(seal_encryptor_destroy(encryptor), S_OK);
        }
    }
}
