//! Incremental terminal rendering of the conversation view.

use chrono::Local;
use pairchat_client::{ConversationEntry, ConversationView};
use pairchat_proto::Participant;

/// Remembers which message ids are already on screen.
#[derive(Default)]
pub struct Transcript {
    shown: Vec<String>,
}

impl Transcript {
    /// Lines to print for `view`. Appends when the view extends what is on
    /// screen; otherwise (history cleared, late arrival sorted earlier)
    /// redraws the whole conversation.
    pub fn update(&mut self, view: &ConversationView, me: Participant) -> Vec<String> {
        let extends = view.entries.len() >= self.shown.len()
            && self
                .shown
                .iter()
                .zip(&view.entries)
                .all(|(id, entry)| *id == entry.message.id);

        let mut out = Vec::new();
        let start = if extends {
            self.shown.len()
        } else {
            out.push(if view.is_empty() {
                "--- conversation is empty ---".to_string()
            } else {
                "--- conversation ---".to_string()
            });
            self.shown.clear();
            0
        };
        for entry in &view.entries[start..] {
            out.push(format_entry(entry, me));
            self.shown.push(entry.message.id.clone());
        }
        out
    }
}

pub fn format_entry(entry: &ConversationEntry, me: Participant) -> String {
    let ts = entry.message.timestamp.with_timezone(&Local).format("%H:%M:%S");
    let who = if entry.message.sender == me {
        format!("{} (you)", entry.message.sender)
    } else {
        entry.message.sender.to_string()
    };
    format!("[{ts}] {who}: {}", entry.text())
}
