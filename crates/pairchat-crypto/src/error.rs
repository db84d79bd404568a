use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("AEAD encryption failed")]
    Encrypt,

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Authentication tag mismatch (tampered envelope or wrong key)")]
    Authentication,

    #[error("Decrypted payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("No shared key material has been provisioned")]
    MissingKeyMaterial,

    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}
