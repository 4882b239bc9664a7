//! One-time engine bootstrap.
//!
//! Every constructor of the engine fails until it has been initialized. The
//! [`Loader`] runs that initialization once per process on a worker thread,
//! optionally feeding it an auxiliary payload found through
//! [`LoaderConfig::locate_file`], and waits for it at most
//! [`LoaderConfig::timeout`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use backend::ffi;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::exception::{RawFault, translate};
use crate::native;

/// Directory searched by the default resolver.
pub const PAYLOAD_DIR_ENV: &str = "SEALWRAP_PAYLOAD_DIR";
pub const DEFAULT_PAYLOAD_NAME: &str = "sealwrap.bin";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Maps `(payload_name, prefix)` to the payload path, or `None` to boot
/// without a payload. `prefix` is the value of [`PAYLOAD_DIR_ENV`], empty
/// when unset.
pub type LocateFile = Arc<dyn Fn(&str, &str) -> Option<PathBuf> + Send + Sync>;

static MODULE: OnceLock<SealModule> = OnceLock::new();
static BOOTSTRAP: Mutex<()> = parking_lot::const_mutex(());

fn locate_in_prefix(name: &str, prefix: &str) -> Option<PathBuf> {
    if prefix.is_empty() {
        None
    } else {
        Some(Path::new(prefix).join(name))
    }
}

#[derive(Clone)]
pub struct LoaderConfig {
    pub locate_file: LocateFile,
    pub payload_name: String,
    pub timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            locate_file: Arc::new(locate_in_prefix),
            payload_name: DEFAULT_PAYLOAD_NAME.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl LoaderConfig {
    pub fn with_locate_file(mut self, locate_file: impl Fn(&str, &str) -> Option<PathBuf> + Send + Sync + 'static) -> Self {
        self.locate_file = Arc::new(locate_file);
        self
    }

    pub fn with_payload_name(mut self, payload_name: impl Into<String>) -> Self {
        self.payload_name = payload_name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for LoaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderConfig")
            .field("payload_name", &self.payload_name)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Proof that the engine is initialized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealModule {
    version: (u16, u16),
    payload: Option<PathBuf>,
}

impl SealModule {
    /// `(major, minor)` version reported by the engine.
    pub fn version(&self) -> (u16, u16) {
        self.version
    }

    /// Payload the engine was bootstrapped with.
    pub fn payload(&self) -> Option<&Path> {
        self.payload.as_deref()
    }

    pub fn is_ready(&self) -> bool {
        native::read(|out| unsafe { ffi::engine::seal_engine_ready(out) }).unwrap_or(false)
    }
}

#[derive(Debug, Default)]
pub struct Loader {
    config: LoaderConfig,
}

fn runtime_error(message: &str) -> Error {
    Error::from_record(translate(&RawFault::Structured {
        kind: "runtime_error",
        message,
    }))
}

/// Reads the payload, if any, and initializes the engine. Runs on the
/// worker thread so the fault registry it reads is the one written to.
fn bootstrap(config: LoaderConfig, prefix: String) -> Result<Option<PathBuf>> {
    let payload: Option<PathBuf> = (config.locate_file)(&config.payload_name, &prefix);
    let bytes: Vec<u8> = match &payload {
        Some(path) => {
            log::debug!("reading engine payload {}", path.display());
            std::fs::read(path).map_err(|err| runtime_error(&format!("cannot read payload {}: {err}", path.display())))?
        }
        None => Vec::new(),
    };
    native::check(unsafe { ffi::engine::seal_engine_init(bytes.as_ptr(), bytes.len() as u64) })?;
    Ok(payload)
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Initializes the engine unless an earlier call already did and
    /// returns the ready module. Failed attempts are not cached.
    pub fn load(&self) -> Result<SealModule> {
        if let Some(module) = MODULE.get() {
            return Ok(module.clone());
        }
        let _guard = BOOTSTRAP.lock();
        if let Some(module) = MODULE.get() {
            return Ok(module.clone());
        }

        let prefix: String = std::env::var(PAYLOAD_DIR_ENV).unwrap_or_default();
        let config: LoaderConfig = self.config.clone();
        let (tx, rx) = mpsc::channel::<Result<Option<PathBuf>>>();
        thread::Builder::new()
            .name("sealwrap-loader".to_string())
            .spawn(move || {
                // the receiver is gone after a timeout
                let _ = tx.send(bootstrap(config, prefix));
            })
            .map_err(|err| runtime_error(&format!("cannot spawn loader thread: {err}")))?;

        let payload: Option<PathBuf> = match rx.recv_timeout(self.config.timeout) {
            Ok(result) => result?,
            Err(RecvTimeoutError::Timeout) => {
                return Err(runtime_error(&format!(
                    "engine bootstrap did not finish within {:?}",
                    self.config.timeout
                )));
            }
            Err(RecvTimeoutError::Disconnected) => return Err(runtime_error("loader thread exited early")),
        };

        let (mut major, mut minor): (u16, u16) = (0, 0);
        native::check(unsafe { ffi::engine::seal_engine_version(&mut major, &mut minor) })?;
        log::info!("sealwrap engine {major}.{minor} ready");
        let module: SealModule = SealModule {
            version: (major, minor),
            payload,
        };
        Ok(MODULE.get_or_init(|| module).clone())
    }
}

/// Loads the engine with the default configuration.
pub fn load() -> Result<SealModule> {
    Loader::default().load()
}
