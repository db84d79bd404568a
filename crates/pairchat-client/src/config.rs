//! Client configuration.
//!
//! Read from a JSON file (defaults when the file is absent), then overridden
//! from the environment:
//! `PAIRCHAT_API_URL`, `PAIRCHAT_WS_URL`, `PAIRCHAT_SHARED_KEY`,
//! `PAIRCHAT_SHARED_SECRET`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use pairchat_crypto::{derive_shared_key, CryptoError, Key};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::notify::ws_url_from_http;
use crate::sync::SyncConfig;

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Defaults to `api_base_url` with a websocket scheme.
    pub ws_base_url: Option<String>,
    pub poll_interval_ms: u64,
    pub notify_delay_ms: u64,
    pub reconnect_delay_ms: u64,
    pub keepalive_interval_ms: u64,
    /// Raw exported key (base64). Takes precedence over `shared_secret`.
    pub shared_key: Option<String>,
    /// Provisioning material for `derive_shared_key`.
    pub shared_secret: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let sync = SyncConfig::default();
        Self {
            api_base_url: "http://localhost:8001".into(),
            ws_base_url: None,
            poll_interval_ms: sync.poll_interval.as_millis() as u64,
            notify_delay_ms: sync.notify_delay.as_millis() as u64,
            reconnect_delay_ms: sync.reconnect_delay.as_millis() as u64,
            keepalive_interval_ms: sync.keepalive_interval.as_millis() as u64,
            shared_key: None,
            shared_secret: None,
        }
    }
}

impl ClientConfig {
    /// `<config dir>/pairchat/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "pairchat").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load `path` (or the default location), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        let config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        Ok(config.with_overrides(|name| std::env::var(name).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup("PAIRCHAT_API_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("PAIRCHAT_WS_URL") {
            self.ws_base_url = Some(v);
        }
        if let Some(v) = lookup("PAIRCHAT_SHARED_KEY") {
            self.shared_key = Some(v);
        }
        if let Some(v) = lookup("PAIRCHAT_SHARED_SECRET") {
            self.shared_secret = Some(v);
        }
        self
    }

    pub fn ws_base_url(&self) -> String {
        self.ws_base_url
            .clone()
            .unwrap_or_else(|| ws_url_from_http(&self.api_base_url))
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            notify_delay: Duration::from_millis(self.notify_delay_ms),
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            keepalive_interval: Duration::from_millis(self.keepalive_interval_ms.max(1)),
        }
    }

    /// The conversation key, from `shared_key` or else `shared_secret`.
    pub fn provision_key(&self) -> Result<Key, ConfigError> {
        if let Some(encoded) = self.shared_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(Key::import(encoded)?);
        }
        let material = self.shared_secret.as_deref().map(str::as_bytes);
        derive_shared_key(material).map_err(ConfigError::from)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("ws_base_url", &self.ws_base_url)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("notify_delay_ms", &self.notify_delay_ms)
            .field("reconnect_delay_ms", &self.reconnect_delay_ms)
            .field("keepalive_interval_ms", &self.keepalive_interval_ms)
            .field("shared_key", &self.shared_key.as_ref().map(|_| "<redacted>"))
            .field("shared_secret", &self.shared_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// True when provisioning failed only because nothing was configured.
pub fn is_missing_key(err: &ConfigError) -> bool {
    matches!(err, ConfigError::Key(CryptoError::MissingKeyMaterial))
}
