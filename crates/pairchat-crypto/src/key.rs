//! Shared key material
//!
//! Both participants hold the same 32-byte key. It is provisioned out of band
//! either as raw exported bytes (`Key::import`) or as a shared secret that
//! `derive_shared_key` stretches identically on both ends.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

use crate::error::CryptoError;

pub const KEY_LEN: usize = 32;

const PROVISION_SALT: &[u8] = b"pairchat-shared-key-v1";
const PROVISION_INFO: &[u8] = b"pairchat-message-aead";

/// 32-byte AES-256-GCM key. Zeroized on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct Key([u8; KEY_LEN]);

impl Key {
    /// Fresh key from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Raw key bytes, base64 encoded, for out-of-band provisioning.
    pub fn export(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Inverse of [`Key::export`].
    pub fn import(encoded: &str) -> Result<Self, CryptoError> {
        let raw = zeroize::Zeroizing::new(STANDARD.decode(encoded.trim())?);
        let bytes: [u8; KEY_LEN] = raw.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidKey(format!("expected {KEY_LEN} bytes, got {}", raw.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(..)")
    }
}

/// Derive the conversation key from provisioned secret material.
///
/// Deterministic: both participants calling this with the same material get
/// the same key. Absent or empty material is `CryptoError::MissingKeyMaterial`.
pub fn derive_shared_key(material: Option<&[u8]>) -> Result<Key, CryptoError> {
    let ikm = match material {
        Some(m) if !m.is_empty() => m,
        _ => return Err(CryptoError::MissingKeyMaterial),
    };
    let hk = Hkdf::<Sha256>::new(Some(PROVISION_SALT), ikm);
    let mut okm = [0u8; KEY_LEN];
    hk.expand(PROVISION_INFO, &mut okm)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    Ok(Key(okm))
}
