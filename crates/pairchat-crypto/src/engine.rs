//! CipherEngine: text in, transportable envelope out.
//!
//! Envelope text format: standard base64 of `nonce(12) || ciphertext || tag(16)`.
//! The engine is constructed from an explicit [`Key`]; it has no other state.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::aead;
use crate::error::CryptoError;
use crate::key::Key;

/// Associated data binding envelopes to this application and format version.
const ENVELOPE_AAD: &[u8] = b"pairchat-envelope-v1";

/// Result of opening an envelope for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decrypted {
    Plaintext(String),
    /// Reason is for logs only; the UI shows a placeholder.
    Undecryptable(String),
}

impl Decrypted {
    pub fn plaintext(&self) -> Option<&str> {
        match self {
            Decrypted::Plaintext(text) => Some(text),
            Decrypted::Undecryptable(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct CipherEngine {
    key: Key,
}

impl CipherEngine {
    pub fn new(key: Key) -> Self {
        Self { key }
    }

    pub fn export_key(&self) -> String {
        self.key.export()
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let sealed = aead::seal(self.key.as_bytes(), plaintext.as_bytes(), ENVELOPE_AAD)?;
        Ok(STANDARD.encode(sealed))
    }

    /// Decrypt an envelope produced by [`CipherEngine::encrypt`] under the same key.
    pub fn decrypt(&self, envelope: &str) -> Result<String, CryptoError> {
        let data = STANDARD
            .decode(envelope.trim())
            .map_err(|e| CryptoError::MalformedEnvelope(e.to_string()))?;
        let plaintext = aead::open(self.key.as_bytes(), &data, ENVELOPE_AAD)?;
        String::from_utf8(plaintext.to_vec()).map_err(|_| CryptoError::InvalidUtf8)
    }

    /// Like [`CipherEngine::decrypt`], but never fails: errors become
    /// [`Decrypted::Undecryptable`].
    pub fn open(&self, envelope: &str) -> Decrypted {
        match self.decrypt(envelope) {
            Ok(text) => Decrypted::Plaintext(text),
            Err(err) => Decrypted::Undecryptable(err.to_string()),
        }
    }
}
