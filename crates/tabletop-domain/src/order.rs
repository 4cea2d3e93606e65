//! Order lifecycle: status transition table and order types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ParseEnumError;

/// Order status.
///
/// ```text
/// PENDING      -> ACCEPTED, CANCELLED
/// ACCEPTED     -> IN_PROGRESS, CANCELLED
/// IN_PROGRESS  -> READY, CANCELLED
/// READY        -> COMPLETED
/// COMPLETED    (terminal)
/// CANCELLED    (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Accepted,
    InProgress,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        Self::Pending,
        Self::Accepted,
        Self::InProgress,
        Self::Ready,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Statuses reachable from `self` in one step.
    pub fn allowed_transitions(self) -> &'static [OrderStatus] {
        match self {
            Self::Pending => &[Self::Accepted, Self::Cancelled],
            Self::Accepted => &[Self::InProgress, Self::Cancelled],
            Self::InProgress => &[Self::Ready, Self::Cancelled],
            Self::Ready => &[Self::Completed],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Ready => "READY",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Human-readable label shown on dashboards and receipts.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::InProgress => "In Progress",
            Self::Ready => "Ready",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("order status", s))
    }
}

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    DineIn,
    Takeaway,
}

impl OrderType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DineIn => "DINE_IN",
            Self::Takeaway => "TAKEAWAY",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::DineIn => "Dine In",
            Self::Takeaway => "Takeaway",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DINE_IN" => Ok(Self::DineIn),
            "TAKEAWAY" => Ok(Self::Takeaway),
            _ => Err(ParseEnumError::new("order type", s)),
        }
    }
}
