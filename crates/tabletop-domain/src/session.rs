//! Server-side session lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ParseEnumError;

/// Persisted session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Revoked,
    Expired,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Revoked => "REVOKED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "REVOKED" => Ok(Self::Revoked),
            "EXPIRED" => Ok(Self::Expired),
            _ => Err(ParseEnumError::new("session status", s)),
        }
    }
}

/// Effective state of a session at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Valid,
    Revoked,
    Expired,
}

/// A session is usable only while it is `ACTIVE` and `expires_at` lies strictly in the future.
pub fn session_state(
    status: SessionStatus,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> SessionState {
    match status {
        SessionStatus::Revoked => SessionState::Revoked,
        SessionStatus::Expired => SessionState::Expired,
        SessionStatus::Active if expires_at <= now => SessionState::Expired,
        SessionStatus::Active => SessionState::Valid,
    }
}
