mod common;

use common::Tools;
use sealwrap::{
    BatchEncoder, Ciphertext, ComprMode, Context, EncryptionParameters, Error, HostArray, Load, LoadWithContext, Modulus,
    Plaintext, PublicKey, Save, SecretKey,
};

const MODES: [ComprMode; 3] = [ComprMode::None, ComprMode::Lz4, ComprMode::Zstd];

/// Saves `value` in every mode and checks that loading reproduces it.
fn round_trip<T: Save>(value: &T, load: impl Fn(&[u8]) -> Result<T, Error>) {
    let reference: Vec<u8> = value.save_to_vec(ComprMode::None).unwrap();
    for mode in MODES {
        let bytes: Vec<u8> = value.save_to_vec(mode).unwrap();
        let loaded: T = load(&bytes).unwrap();
        assert_eq!(loaded.save_to_vec(ComprMode::None).unwrap(), reference, "{mode:?}");
    }
}

/// Damaged frames never produce an object.
fn rejects_damage<T>(bytes: &[u8], load: impl Fn(&[u8]) -> Result<T, Error>) {
    let mut bad_magic: Vec<u8> = bytes.to_vec();
    bad_magic[0] ^= 0xFF;
    assert!(load(&bad_magic).is_err());

    let mut bad_mode: Vec<u8> = bytes.to_vec();
    bad_mode[5] = 9;
    assert!(load(&bad_mode).is_err());

    assert!(load(&bytes[..bytes.len() - 1]).is_err());
    assert!(load(&bytes[..8]).is_err());
    assert!(load(&[]).is_err());

    let mut trailing: Vec<u8> = bytes.to_vec();
    trailing.push(0);
    assert!(load(&trailing).is_err());
}

#[test]
fn standalone_kinds() {
    let parms: EncryptionParameters = common::bfv_parms(256, &[40, 40, 40], 20);
    round_trip(&parms, EncryptionParameters::load_from_vec);
    let loaded: EncryptionParameters =
        EncryptionParameters::load_from_vec(&parms.save_to_vec(ComprMode::Zstd).unwrap()).unwrap();
    assert_eq!(loaded.parms_id().unwrap(), parms.parms_id().unwrap());
    rejects_damage(&parms.save_to_vec(ComprMode::None).unwrap(), EncryptionParameters::load_from_vec);

    let q: Modulus = Modulus::new(65537).unwrap();
    round_trip(&q, Modulus::load_from_vec);
    rejects_damage(&q.save_to_vec(ComprMode::Lz4).unwrap(), Modulus::load_from_vec);
}

#[test]
fn context_bound_kinds() {
    let mut tools: Tools = Tools::new(common::bfv_context());
    let context: &Context = &tools.context;

    let encoder: BatchEncoder = BatchEncoder::new(context).unwrap();
    let plain: Plaintext = encoder.encode(&HostArray::Uint32((0..256).collect())).unwrap();
    round_trip(&plain, |bytes| Plaintext::load_from_vec(context, bytes));
    rejects_damage(&plain.save_to_vec(ComprMode::None).unwrap(), |bytes| Plaintext::load_from_vec(context, bytes));

    round_trip(&tools.secret_key, |bytes| SecretKey::load_from_vec(context, bytes));
    round_trip(&tools.public_key, |bytes| PublicKey::load_from_vec(context, bytes));
    rejects_damage(&tools.public_key.save_to_vec(ComprMode::Zstd).unwrap(), |bytes| {
        PublicKey::load_from_vec(context, bytes)
    });

    let cipher: Ciphertext = tools.encryptor.encrypt(&plain).unwrap();
    round_trip(&cipher, |bytes| Ciphertext::load_from_vec(context, bytes));
    rejects_damage(&cipher.save_to_vec(ComprMode::Lz4).unwrap(), |bytes| Ciphertext::load_from_vec(context, bytes));

    // a loaded ciphertext still decrypts
    let loaded: Ciphertext = Ciphertext::load_from_vec(context, &cipher.save_to_vec(ComprMode::Zstd).unwrap()).unwrap();
    let decrypted: Plaintext = tools.decryptor.decrypt(&loaded).unwrap();
    assert_eq!(encoder.decode(&decrypted, false).unwrap(), HostArray::Uint32((0..256).collect()));
}

#[test]
fn base64_in_every_mode() {
    let tools: Tools = Tools::new(common::bfv_context());
    for mode in MODES {
        let text: String = tools.secret_key.save_to_base64(mode).unwrap();
        let loaded: SecretKey = SecretKey::load_from_base64(&tools.context, &text).unwrap();
        assert_eq!(
            loaded.save_to_vec(ComprMode::None).unwrap(),
            tools.secret_key.save_to_vec(ComprMode::None).unwrap()
        );
    }

    let text: String = Modulus::new(97).unwrap().save_to_base64(ComprMode::None).unwrap();
    assert_eq!(Modulus::load_from_base64(&text).unwrap().value().unwrap(), 97);
    assert!(Modulus::load_from_base64("%%%").is_err());
    assert!(Modulus::load_from_base64(&text[..text.len() - 4]).is_err());
}
