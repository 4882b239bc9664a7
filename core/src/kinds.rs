//! Kind tags binding each wrapper to its engine destructor and, where the
//! engine offers them, its retain and copy entry points.

use backend::ffi::{self, HRESULT};

use crate::handle::{CopyKind, NativeKind, SharedKind};

macro_rules! native_kind {
    ($kind:ident, $raw:ty, $name:literal, $destroy:path) => {
        native_kind!(@base $kind, $raw, $name, $destroy, false);
    };
    (@base $kind:ident, $raw:ty, $name:literal, $destroy:path, $counted:literal) => {
        pub enum $kind {}

        impl NativeKind for $kind {
            type Raw = $raw;
            const NAME: &'static str = $name;
            const COUNTED: bool = $counted;

            unsafe fn destroy(raw: *mut $raw) -> HRESULT {
                unsafe { $destroy(raw) }
            }
        }
    };
    ($kind:ident, $raw:ty, $name:literal, $destroy:path, copy: $copy:path, $assign:path) => {
        native_kind!($kind, $raw, $name, $destroy);

        impl CopyKind for $kind {
            unsafe fn copy(src: *const $raw, out: *mut *mut $raw) -> HRESULT {
                unsafe { $copy(src, out) }
            }

            unsafe fn assign(dst: *mut $raw, src: *const $raw) -> HRESULT {
                unsafe { $assign(dst, src) }
            }
        }
    };
    ($kind:ident, $raw:ty, $name:literal, $destroy:path, retain: $retain:path) => {
        native_kind!(@base $kind, $raw, $name, $destroy, true);

        impl SharedKind for $kind {
            unsafe fn retain(raw: *const $raw) -> HRESULT {
                unsafe { $retain(raw) }
            }
        }
    };
}

native_kind!(
    VectorKind,
    ffi::vector_t,
    "Vector",
    ffi::vector::seal_vector_destroy,
    copy: ffi::vector::seal_vector_copy,
    ffi::vector::seal_vector_assign
);
native_kind!(
    ModulusKind,
    ffi::modulus_t,
    "Modulus",
    ffi::modulus::seal_modulus_destroy,
    copy: ffi::modulus::seal_modulus_copy,
    ffi::modulus::seal_modulus_assign
);
native_kind!(
    ModulusVectorKind,
    ffi::modulus_vector_t,
    "ModulusVector",
    ffi::modulus::seal_modulus_vector_destroy,
    retain: ffi::modulus::seal_modulus_vector_retain
);
native_kind!(
    ParmsKind,
    ffi::parms_t,
    "EncryptionParameters",
    ffi::parameters::seal_parms_destroy,
    copy: ffi::parameters::seal_parms_copy,
    ffi::parameters::seal_parms_assign
);
native_kind!(
    ContextKind,
    ffi::context_t,
    "Context",
    ffi::context::seal_context_destroy,
    retain: ffi::context::seal_context_retain
);
native_kind!(
    ContextDataKind,
    ffi::context_data_t,
    "ContextData",
    ffi::context::seal_context_data_destroy,
    retain: ffi::context::seal_context_data_retain
);
native_kind!(
    MemoryPoolKind,
    ffi::memory_pool_t,
    "MemoryPoolHandle",
    ffi::memory::seal_memory_pool_destroy,
    retain: ffi::memory::seal_memory_pool_retain
);
native_kind!(
    PlaintextKind,
    ffi::plaintext_t,
    "Plaintext",
    ffi::plaintext::seal_plaintext_destroy,
    copy: ffi::plaintext::seal_plaintext_copy,
    ffi::plaintext::seal_plaintext_assign
);
native_kind!(
    CiphertextKind,
    ffi::ciphertext_t,
    "Ciphertext",
    ffi::ciphertext::seal_ciphertext_destroy,
    copy: ffi::ciphertext::seal_ciphertext_copy,
    ffi::ciphertext::seal_ciphertext_assign
);
native_kind!(
    SecretKeyKind,
    ffi::secret_key_t,
    "SecretKey",
    ffi::keys::seal_secret_key_destroy,
    copy: ffi::keys::seal_secret_key_copy,
    ffi::keys::seal_secret_key_assign
);
native_kind!(
    PublicKeyKind,
    ffi::public_key_t,
    "PublicKey",
    ffi::keys::seal_public_key_destroy,
    copy: ffi::keys::seal_public_key_copy,
    ffi::keys::seal_public_key_assign
);
native_kind!(KeyGeneratorKind, ffi::keygen_t, "KeyGenerator", ffi::tools::seal_keygen_destroy);
native_kind!(EncryptorKind, ffi::encryptor_t, "Encryptor", ffi::tools::seal_encryptor_destroy);
native_kind!(DecryptorKind, ffi::decryptor_t, "Decryptor", ffi::tools::seal_decryptor_destroy);
native_kind!(EvaluatorKind, ffi::evaluator_t, "Evaluator", ffi::tools::seal_evaluator_destroy);
native_kind!(
    BatchEncoderKind,
    ffi::batch_encoder_t,
    "BatchEncoder",
    ffi::encoders::seal_batch_encoder_destroy
);
native_kind!(
    CkksEncoderKind,
    ffi::ckks_encoder_t,
    "CkksEncoder",
    ffi::encoders::seal_ckks_encoder_destroy
);
native_kind!(
    IntegerEncoderKind,
    ffi::integer_encoder_t,
    "IntegerEncoder",
    ffi::encoders::seal_integer_encoder_destroy
);

// The modulus vector is both reference counted and copyable.
impl CopyKind for ModulusVectorKind {
    unsafe fn copy(src: *const ffi::modulus_vector_t, out: *mut *mut ffi::modulus_vector_t) -> HRESULT {
        unsafe { ffi::modulus::seal_modulus_vector_copy(src, out) }
    }

    unsafe fn assign(dst: *mut ffi::modulus_vector_t, src: *const ffi::modulus_vector_t) -> HRESULT {
        unsafe { ffi::modulus::seal_modulus_vector_assign(dst, src) }
    }
}
