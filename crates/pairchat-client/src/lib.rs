//! pairchat-client — keeps the on-screen conversation in step with the
//! message store.
//!
//! The store is polled on a fixed interval; the notification socket only
//! shortens the wait. Every poll rebuilds the whole `ConversationView` from
//! the store's current list, decrypting each record independently.
//!
//! # Modules
//! - `sync`   — `SyncEngine`: poll timer, notification listener, reconciliation
//! - `view`   — `ConversationView` and `ConnectionState` snapshots
//! - `store`  — `MessageStore` seam and its HTTP implementation
//! - `notify` — `NotificationSource` seam and its WebSocket implementation
//! - `client` — `ChatClient`: send / clear / logout on top of the engine
//! - `config` — client configuration file and environment overrides
//! - `error`  — error types

pub mod client;
pub mod config;
pub mod error;
pub mod notify;
pub mod store;
pub mod sync;
pub mod view;

pub use client::ChatClient;
pub use config::ClientConfig;
pub use error::{ClientError, ConfigError, SyncError};
pub use notify::{NotificationChannel, NotificationSource, WsNotificationSource};
pub use store::{HttpMessageStore, MessageStore};
pub use sync::{PollOutcome, SyncConfig, SyncEngine};
pub use view::{ConnectionState, ConversationEntry, ConversationView};
