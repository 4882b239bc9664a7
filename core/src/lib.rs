//! # sealwrap
//!
//! Safe handles over the `sealwrap-backend` homomorphic encryption engine.
//!
//! Every engine object is owned through a [`Handle`]: it is released exactly
//! once, on [`Handle::delete`] or on drop, and any use afterwards fails with
//! [`Error::DisposedHandle`] instead of touching freed memory. Reference
//! counted kinds ([`Context`], [`ContextData`], [`ModulusVector`],
//! [`MemoryPoolHandle`]) can be aliased with [`Handle::shallow_clone`];
//! copyable kinds offer [`Handle::deep_copy`].
//!
//! Engine failures are translated once, at the call site, into an
//! [`ExceptionRecord`] carrying a fixed [`FaultKind`] and a message.
//!
//! The engine must be bootstrapped before any object is created:
//!
//! ```ignore
//! let module: sealwrap::SealModule = sealwrap::load()?;
//! let mut parms = sealwrap::EncryptionParameters::new(sealwrap::SchemeType::Bfv)?;
//! parms.set_poly_modulus_degree(4096)?;
//! ```

pub mod ciphertext;
pub mod context;
pub mod decryptor;
pub mod encoders;
pub mod encryptor;
pub mod error;
pub mod evaluator;
pub mod exception;
pub mod handle;
pub mod keys;
pub mod kinds;
pub mod loader;
pub mod memory;
pub mod modulus;
mod native;
pub mod parameters;
pub mod plaintext;
pub mod serialization;
pub mod vector;

pub use backend::ffi::FaultKind;
pub use ciphertext::Ciphertext;
pub use context::{Context, ContextData, ErrorType};
pub use decryptor::Decryptor;
pub use encoders::{BatchEncoder, CkksEncoder, IntegerEncoder};
pub use encryptor::Encryptor;
pub use error::{Error, ErrorCategory, Result};
pub use evaluator::Evaluator;
pub use exception::{ExceptionRecord, RawFault, translate};
pub use handle::{CopyKind, Handle, NativeKind, SharedKind};
pub use keys::{KeyGenerator, PublicKey, SecretKey};
pub use loader::{Loader, LoaderConfig, SealModule, load};
pub use memory::MemoryPoolHandle;
pub use modulus::{CoeffModulus, Modulus, ModulusVector, PlainModulus, SecurityLevel};
pub use parameters::{EncryptionParameters, ParmsId, SchemeType};
pub use plaintext::Plaintext;
pub use serialization::{ComprMode, Load, LoadWithContext, Save};
pub use vector::{Element, ElementKind, HostArray, HostScalar, Vector};
