use pairchat_crypto::CryptoError;
use thiserror::Error;

/// Failures talking to the store or the notification socket.
///
/// Both kinds are recoverable: the next scheduled poll or reconnect retries.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The collaborator answered, but not in the shape we expect.
    #[error("Protocol failure: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Protocol(err.to_string())
        } else {
            SyncError::Transport(err.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SyncError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        SyncError::Transport(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Refusing to send an empty message")]
    EmptyMessage,

    #[error("Login rejected: {0}")]
    LoginRejected(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Shared key provisioning failed: {0}")]
    Key(#[from] CryptoError),
}
