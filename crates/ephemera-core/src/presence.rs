//! Peer presence derived from last activity.

use std::time::Duration;

use crate::types::Timestamp;

/// How recently a peer must have been active to count as online.
pub const ACTIVE_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Peer presence as shown next to a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Active within [`ACTIVE_WINDOW`].
    Active,
    /// Not seen recently, or never.
    Offline,
}

impl Presence {
    /// Presence at `now` for a peer last active at `last_active`.
    pub fn at(now: Timestamp, last_active: Option<Timestamp>) -> Self {
        match last_active {
            Some(seen) if now.duration_since(seen) < ACTIVE_WINDOW => Self::Active,
            _ => Self::Offline,
        }
    }

    /// Status line label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active now",
            Self::Offline => "Offline",
        }
    }
}
