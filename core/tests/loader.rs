//! Runs in its own process: the engine is initialized at most once.

use std::path::PathBuf;
use std::time::Duration;

use sealwrap::{ErrorCategory, FaultKind, Loader, LoaderConfig, Plaintext, SealModule};

fn payload_file(tag: &str, bytes: &[u8]) -> PathBuf {
    let path: PathBuf = std::env::temp_dir().join(format!("sealwrap-{tag}-{}.bin", std::process::id()));
    std::fs::write(&path, bytes).unwrap();
    path
}

fn loader_for(path: PathBuf) -> Loader {
    Loader::new(LoaderConfig::default().with_locate_file(move |_, _| Some(path.clone())))
}

#[test]
fn bootstrap_sequence() {
    let _ = env_logger::builder().is_test(true).try_init();

    // nothing can be built before the engine is up
    let err = Plaintext::new().unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Construction);

    let slow: Loader = Loader::new(
        LoaderConfig::default()
            .with_timeout(Duration::from_millis(50))
            .with_locate_file(|_, _| {
                std::thread::sleep(Duration::from_millis(500));
                None
            }),
    );
    let err = slow.load().unwrap_err();
    assert_eq!(err.kind(), FaultKind::RuntimeError);

    let missing: PathBuf = std::env::temp_dir().join(format!("sealwrap-missing-{}.bin", std::process::id()));
    let err = loader_for(missing).load().unwrap_err();
    assert_eq!(err.kind(), FaultKind::RuntimeError);

    let bad: PathBuf = payload_file("bad", b"NOTSEALW\x01\x00\x00\x00");
    let err = loader_for(bad.clone()).load().unwrap_err();
    assert_eq!(err.kind(), FaultKind::InvalidArgument);

    let mut payload: Vec<u8> = b"SEALWRAP".to_vec();
    payload.extend_from_slice(&1u16.to_le_bytes());
    payload.extend_from_slice(&0u16.to_le_bytes());
    let good: PathBuf = payload_file("good", &payload);
    let module: SealModule = loader_for(good.clone()).load().unwrap();
    assert!(module.is_ready());
    assert_eq!(module.version(), (1, 0));
    assert_eq!(module.payload(), Some(good.as_path()));

    // later loads, whatever their configuration, return the first module
    assert_eq!(sealwrap::load().unwrap(), module);
    assert_eq!(loader_for(bad.clone()).load().unwrap(), module);
    assert!(Plaintext::new().is_ok());

    let _ = std::fs::remove_file(bad);
    let _ = std::fs::remove_file(good);
}
