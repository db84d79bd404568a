//! Snapshots published to the UI.

use std::collections::HashSet;
use std::fmt;

use pairchat_crypto::{CipherEngine, Decrypted};
use pairchat_proto::{Message, Participant};

/// Shown in place of a message that failed to decrypt.
pub const UNDECRYPTABLE_PLACEHOLDER: &str = "[unable to decrypt message]";

/// A fetched message plus its derived display content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub message: Message,
    pub content: Decrypted,
}

impl ConversationEntry {
    pub fn text(&self) -> &str {
        self.content.plaintext().unwrap_or(UNDECRYPTABLE_PLACEHOLDER)
    }

    pub fn is_undecryptable(&self) -> bool {
        matches!(self.content, Decrypted::Undecryptable(_))
    }
}

/// Ordered conversation for one user, rebuilt from scratch on every poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationView {
    /// `None` while no session is active.
    pub user: Option<Participant>,
    pub entries: Vec<ConversationEntry>,
}

impl ConversationView {
    /// Decrypt and order a full store listing.
    ///
    /// Ordering is by timestamp, ties broken by id. Repeated ids keep their
    /// first occurrence. A record that fails to decrypt becomes a placeholder
    /// entry; it never affects its neighbours.
    pub fn build(user: Participant, records: Vec<Message>, cipher: &CipherEngine) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let mut entries: Vec<ConversationEntry> = records
            .into_iter()
            .filter(|m| seen.insert(m.id.clone()))
            .map(|message| {
                let content = cipher.open(&message.encrypted_content);
                if let Decrypted::Undecryptable(reason) = &content {
                    tracing::debug!(id = %message.id, %reason, "message failed to decrypt");
                }
                ConversationEntry { message, content }
            })
            .collect();
        entries.sort_by(|a, b| {
            a.message
                .timestamp
                .cmp(&b.message.timestamp)
                .then_with(|| a.message.id.cmp(&b.message.id))
        });
        Self {
            user: Some(user),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// State of the notification socket. Drives an indicator only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        })
    }
}
