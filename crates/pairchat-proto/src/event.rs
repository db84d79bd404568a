//! Notification socket frames.
//!
//! The server pushes `new_message` whenever a message for the connected user
//! is stored. The payload is deliberately ignored by the client: a
//! notification is only a hint to re-fetch.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    NewMessage {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<serde_json::Value>,
    },
    Pong {
        #[serde(default)]
        data: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

impl NotificationEvent {
    pub fn is_new_message(&self) -> bool {
        matches!(self, NotificationEvent::NewMessage { .. })
    }
}

/// Frames sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Ping { data: String },
}
