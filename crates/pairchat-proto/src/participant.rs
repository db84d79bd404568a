use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtoError {
    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),
}

/// One of the two fixed chat participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Participant {
    Alpha,
    Bravo,
}

impl Participant {
    pub const ALL: [Participant; 2] = [Participant::Alpha, Participant::Bravo];

    /// The other side of the conversation.
    pub fn peer(self) -> Participant {
        match self {
            Participant::Alpha => Participant::Bravo,
            Participant::Bravo => Participant::Alpha,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Participant::Alpha => "Alpha",
            Participant::Bravo => "Bravo",
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Participant {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alpha" => Ok(Participant::Alpha),
            "bravo" => Ok(Participant::Bravo),
            _ => Err(ProtoError::UnknownParticipant(s.to_string())),
        }
    }
}

// Accepts the same spellings as `FromStr`.
impl<'de> Deserialize<'de> for Participant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
