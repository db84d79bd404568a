//! pairchat-proto — wire types for Pairchat
//!
//! Everything here maps directly onto JSON bodies exchanged with the message
//! store API and the notification socket. The store and the socket only ever
//! see ciphertext; `encrypted_content` is an opaque envelope string.
//!
//! # Modules
//! - `participant` — the two fixed chat participants
//! - `api`         — message store request/response bodies
//! - `event`       — notification socket frames
//! - `timestamp`   — lenient timestamp decoding for store records

pub mod api;
pub mod event;
pub mod participant;
pub mod timestamp;

pub use api::{LoginRequest, LoginResponse, Message, SendMessageRequest};
pub use event::{ClientFrame, NotificationEvent};
pub use participant::{Participant, ProtoError};
