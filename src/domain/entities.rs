use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// Opaque visitor token issued by the backend; scopes every session and reservation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    // Blank tokens are rejected so an absent identity can never reach later calls.
    pub fn parse(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return None;
        }
        Some(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Backend-assigned chat handle for the active conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(String);

impl SessionId {
    pub fn parse(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return None;
        }
        Some(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity and chat handle produced by a successful bootstrap.
///
/// Created once, held for the rest of the process and never torn down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub identity: Identity,
    pub session: SessionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(text: impl Into<String>, direction: Direction) -> Self {
        Self {
            text: text.into(),
            direction,
            timestamp: Utc::now(),
        }
    }

    pub fn sent(text: impl Into<String>) -> Self {
        Self::new(text, Direction::Sent)
    }

    pub fn received(text: impl Into<String>) -> Self {
        Self::new(text, Direction::Received)
    }
}

// Read-only snapshot of one backend reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub day: NaiveDate,
    pub time: String,
}

// What the reservation panel should show. Empty is a valid result, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationList {
    Entries(Vec<Reservation>),
    Empty,
    Unavailable,
}

impl ReservationList {
    pub fn from_entries(entries: Vec<Reservation>) -> Self {
        if entries.is_empty() {
            Self::Empty
        } else {
            Self::Entries(entries)
        }
    }
}
