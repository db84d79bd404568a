use std::collections::HashSet;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use pairchat_crypto::aead::{NONCE_LEN, TAG_LEN};
use pairchat_crypto::{derive_shared_key, CipherEngine, CryptoError, Decrypted, Key};

fn engine() -> CipherEngine {
    CipherEngine::new(derive_shared_key(Some(b"test provisioning secret")).unwrap())
}

#[test]
fn roundtrip_preserves_plaintext() {
    let engine = engine();
    let long = "x".repeat(64 * 1024);
    let samples: [&str; 6] = [
        "",
        "hello",
        "  leading and trailing  ",
        "line one\nline two\ttabbed",
        "ünïcødé — 你好 — 🦀🔐",
        &long,
    ];
    for m in samples {
        let env = engine.encrypt(m).unwrap();
        assert_eq!(engine.decrypt(&env).unwrap(), m);
    }
}

#[test]
fn nonces_never_repeat() {
    let engine = engine();
    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        let env = engine.encrypt("same plaintext").unwrap();
        let raw = STANDARD.decode(env).unwrap();
        let nonce: [u8; NONCE_LEN] = raw[..NONCE_LEN].try_into().unwrap();
        assert!(seen.insert(nonce), "nonce reused");
    }
}

#[test]
fn every_bit_flip_is_rejected() {
    let engine = engine();
    let raw = STANDARD.decode(engine.encrypt("tamper me").unwrap()).unwrap();
    for byte in 0..raw.len() {
        for bit in 0..8 {
            let mut tampered = raw.clone();
            tampered[byte] ^= 1 << bit;
            let out = engine.open(&STANDARD.encode(&tampered));
            assert!(
                matches!(out, Decrypted::Undecryptable(_)),
                "flip at byte {byte} bit {bit} was accepted"
            );
        }
    }
}

#[test]
fn every_envelope_text_bit_flip_is_rejected() {
    let engine = engine();
    for m in ["", "a", "tamper me", "ünïcødé 🔐"] {
        let env = engine.encrypt(m).unwrap();
        for pos in 0..env.len() {
            for bit in 0..8 {
                let mut bytes = env.clone().into_bytes();
                bytes[pos] ^= 1 << bit;
                let Ok(tampered) = String::from_utf8(bytes) else {
                    continue;
                };
                assert!(
                    matches!(engine.open(&tampered), Decrypted::Undecryptable(_)),
                    "flip at char {pos} bit {bit} of {m:?} was accepted"
                );
            }
        }
    }
}

#[test]
fn wrong_key_is_rejected() {
    let sender = engine();
    let env = sender.encrypt("for the right key only").unwrap();
    for _ in 0..32 {
        let other = CipherEngine::new(Key::generate());
        assert!(matches!(other.decrypt(&env), Err(CryptoError::Authentication)));
    }
    let other_secret = CipherEngine::new(derive_shared_key(Some(b"another secret")).unwrap());
    assert!(matches!(other_secret.open(&env), Decrypted::Undecryptable(_)));
}

#[test]
fn envelope_hides_plaintext_and_carries_overhead() {
    let engine = engine();
    let env = engine.encrypt("hello").unwrap();
    assert_ne!(env, "hello");
    assert!(!env.contains("hello"));
    let raw = STANDARD.decode(&env).unwrap();
    assert_eq!(raw.len(), "hello".len() + NONCE_LEN + TAG_LEN);
}

#[test]
fn malformed_envelopes_are_rejected() {
    let engine = engine();
    let short = STANDARD.encode([0u8; 8]);
    let bad_envelopes: [&str; 4] = ["", "====", "not-base64!", &short];
    for bad in bad_envelopes {
        assert!(matches!(
            engine.decrypt(bad),
            Err(CryptoError::MalformedEnvelope(_))
        ));
    }
    // Well-formed length but random bytes: authentication must fail.
    let junk = STANDARD.encode([0x5au8; NONCE_LEN + TAG_LEN + 4]);
    assert!(matches!(engine.decrypt(&junk), Err(CryptoError::Authentication)));
}

#[test]
fn non_utf8_plaintext_is_a_failure() {
    let key = Key::generate();
    let aad = b"pairchat-envelope-v1";
    let sealed = pairchat_crypto::aead::seal(key.as_bytes(), &[0xff, 0xfe], aad).unwrap();
    let engine = CipherEngine::new(key);
    assert!(matches!(
        engine.decrypt(&STANDARD.encode(sealed)),
        Err(CryptoError::InvalidUtf8)
    ));
}
