//! Engine bootstrap. Constructors fail until [`seal_engine_init`] succeeds.

use std::sync::atomic::{AtomicBool, Ordering};

use byteorder::{ByteOrder, LittleEndian};

use crate::fault::NativeFault;
use crate::ffi::{HRESULT, S_FALSE, S_OK, guard, slice, write_out};

/// Leading bytes of an auxiliary payload.
pub const PAYLOAD_MAGIC: &[u8; 8] = b"SEALWRAP";
pub const ENGINE_VERSION_MAJOR: u16 = 1;
pub const ENGINE_VERSION_MINOR: u16 = 0;
/// Magic, major and minor version.
pub const PAYLOAD_HEADER_SIZE: usize = 12;

static READY: AtomicBool = AtomicBool::new(false);

pub(crate) fn is_ready() -> bool {
    READY.load(Ordering::Acquire)
}

/// Checks an auxiliary payload and returns its `(major, minor)` version.
pub fn validate_payload(payload: &[u8]) -> crate::fault::Result<(u16, u16)> {
    if payload.len() < PAYLOAD_HEADER_SIZE {
        return Err(NativeFault::invalid_argument(format!(
            "payload is {} bytes, shorter than its header",
            payload.len()
        )));
    }
    if &payload[..8] != PAYLOAD_MAGIC {
        return Err(NativeFault::invalid_argument("payload magic mismatch"));
    }
    let major: u16 = LittleEndian::read_u16(&payload[8..10]);
    let minor: u16 = LittleEndian::read_u16(&payload[10..12]);
    if major != ENGINE_VERSION_MAJOR {
        return Err(NativeFault::invalid_argument(format!(
            "payload version {major}.{minor} is not supported by engine {ENGINE_VERSION_MAJOR}.{ENGINE_VERSION_MINOR}"
        )));
    }
    Ok((major, minor))
}

/// Initializes the engine, validating the payload when one is given
/// (`payload` may be null with `len == 0`). Returns `S_FALSE` if the engine
/// was already initialized.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_engine_init(payload: *const u8, len: u64) -> HRESULT {
    guard(|| unsafe {
        let payload: &[u8] = slice(payload, len)?;
        if !payload.is_empty() {
            let (major, minor) = validate_payload(payload)?;
            log::debug!("engine payload version {major}.{minor}, {} bytes", payload.len());
        }
        if READY.swap(true, Ordering::AcqRel) {
            return Ok(S_FALSE);
        }
        log::info!("engine {ENGINE_VERSION_MAJOR}.{ENGINE_VERSION_MINOR} initialized");
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_engine_ready(out: *mut bool) -> HRESULT {
    guard(|| unsafe {
        write_out(out, is_ready())?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_engine_version(major: *mut u16, minor: *mut u16) -> HRESULT {
    guard(|| unsafe {
        write_out(major, ENGINE_VERSION_MAJOR)?;
        write_out(minor, ENGINE_VERSION_MINOR)?;
        Ok(S_OK)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::FaultKind;
    use crate::ffi::E_INVALIDARG;
    use crate::ffi::tests::last_fault;

    fn payload(major: u16) -> Vec<u8> {
        let mut bytes: Vec<u8> = PAYLOAD_MAGIC.to_vec();
        bytes.extend_from_slice(&major.to_le_bytes());
        bytes.extend_from_slice(&3u16.to_le_bytes());
        bytes.extend_from_slice(b"tables");
        bytes
    }

    #[test]
    fn payload_checks() {
        assert_eq!(validate_payload(&payload(1)).unwrap(), (1, 3));
        assert!(validate_payload(&payload(2)).is_err());
        assert!(validate_payload(b"SEALWRA").is_err());
        assert!(validate_payload(b"NOTSEAL!\x01\x00\x00\x00").is_err());
    }

    #[test]
    fn init_rejects_bad_payload_then_accepts_good() {
        let bad: Vec<u8> = payload(9);
        assert_eq!(unsafe { seal_engine_init(bad.as_ptr(), bad.len() as u64) }, E_INVALIDARG);
        assert_eq!(last_fault().kind, FaultKind::InvalidArgument);

        let good: Vec<u8> = payload(1);
        let hr: HRESULT = unsafe { seal_engine_init(good.as_ptr(), good.len() as u64) };
        assert!(hr == S_OK || hr == S_FALSE);
        let mut ready: bool = false;
        assert_eq!(unsafe { seal_engine_ready(&mut ready) }, S_OK);
        assert!(ready);
    }
}
