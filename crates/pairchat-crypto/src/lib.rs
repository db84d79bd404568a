//! pairchat-crypto — message payload encryption for Pairchat
//!
//! # Design principles
//! - NO custom crypto; AES-256-GCM and HKDF come from audited RustCrypto crates.
//! - Key material is zeroized on drop and never printed.
//! - Decryption failures are values: a bad record degrades to a placeholder,
//!   it never aborts a sync cycle.
//!
//! # Module layout
//! - `key`    — 32-byte shared key, import/export, shared-secret provisioning
//! - `aead`   — AES-256-GCM seal/open over raw bytes
//! - `engine` — `CipherEngine`: text in, base64 envelope out (and back)
//! - `error`  — unified error type

pub mod aead;
pub mod engine;
pub mod error;
pub mod key;

pub use engine::{CipherEngine, Decrypted};
pub use error::CryptoError;
pub use key::{derive_shared_key, Key};
