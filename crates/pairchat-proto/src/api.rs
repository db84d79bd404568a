//! Message store request/response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::participant::Participant;

/// A stored message as returned by `GET /messages/{user}`.
///
/// Immutable once fetched; the content is an opaque ciphertext envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned unique ID.
    pub id: String,
    pub sender: Participant,
    pub receiver: Participant,
    /// Base64 AEAD envelope (nonce || ciphertext+tag).
    pub encrypted_content: String,
    #[serde(with = "crate::timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /messages?sender={user}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub receiver: Participant,
    pub encrypted_content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub user: Option<Participant>,
    /// Opaque session token; absent on failed logins.
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_store_record_with_naive_timestamp() {
        let raw = json!({
            "id": "6f1c",
            "sender": "Alpha",
            "receiver": "Bravo",
            "encrypted_content": "AAAA",
            "timestamp": "2024-05-04T10:00:00.5"
        });
        let msg: Message = serde_json::from_value(raw).unwrap();
        assert_eq!(msg.sender, Participant::Alpha);
        assert_eq!(msg.timestamp.timestamp_millis() % 1000, 500);
    }

    #[test]
    fn unknown_sender_is_a_decode_error() {
        let raw = json!({
            "id": "1",
            "sender": "Mallory",
            "receiver": "Bravo",
            "encrypted_content": "AAAA",
            "timestamp": "2024-05-04T10:00:00Z"
        });
        assert!(serde_json::from_value::<Message>(raw).is_err());
    }

    #[test]
    fn failed_login_omits_user_and_token() {
        let resp: LoginResponse =
            serde_json::from_value(json!({"success": false, "message": "Invalid password"}))
                .unwrap();
        assert!(!resp.success);
        assert!(resp.user.is_none());
        assert!(resp.token.is_empty());
    }

    #[test]
    fn send_request_shape() {
        let body = serde_json::to_value(SendMessageRequest {
            receiver: Participant::Bravo,
            encrypted_content: "ct".into(),
        })
        .unwrap();
        assert_eq!(body, json!({"receiver": "Bravo", "encrypted_content": "ct"}));
    }
}
