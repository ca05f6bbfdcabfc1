//! Demo roster and seeded history.

use std::time::Duration;

use ephemera_core::{ConversationId, MessageOrigin, Timestamp, UserId};
use tracing::debug;

use crate::runtime::{ChatHandle, RuntimeError};

/// Sample images sent by `/image`, in rotation.
pub const SAMPLE_IMAGES: [&str; 3] = [
    "https://images.unsplash.com/photo-1606041008023-472dfb5e530f",
    "https://images.unsplash.com/photo-1533738363-b7f9aef128ce",
    "https://images.unsplash.com/photo-1471479917193-f00955256257",
];

/// Placeholder reference sent by `/voice`.
pub const VOICE_NOTE: &str = "Voice message (0:12)";

/// A contact the local user can chat with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Friend {
    /// Peer identity.
    pub id: UserId,
    /// Handle used with `/open`.
    pub username: String,
    /// Full name.
    pub display_name: String,
    /// Consecutive days chatted.
    pub streak: u32,
    /// How long before startup the friend was last seen.
    pub last_seen_ago: Duration,
}

impl Friend {
    /// Conversation with this friend.
    pub fn conversation(&self) -> ConversationId {
        ConversationId::with_peer(self.id)
    }
}

/// Friends of `local_user`. Peer ids follow the local user's.
pub fn roster(local_user: UserId) -> Vec<Friend> {
    const MINUTE: u64 = 60;
    [
        ("alex_j", "Alex Johnson", 15, 30 * MINUTE),
        ("taylor89", "Taylor Swift", 7, 60 * MINUTE),
        ("sam_wilson", "Sam Wilson", 3, 24 * 60 * MINUTE),
    ]
    .into_iter()
    .zip(1..)
    .map(|((username, display_name, streak, seen), offset)| Friend {
        id: UserId(local_user.0 + offset),
        username: username.to_string(),
        display_name: display_name.to_string(),
        streak,
        last_seen_ago: Duration::from_secs(seen),
    })
    .collect()
}

/// Index of the friend with `username`.
pub fn position(roster: &[Friend], username: &str) -> Option<usize> {
    roster.iter().position(|friend| friend.username == username)
}

/// Earlier conversation lines: friend index, who spoke, text, age in seconds.
const HISTORY: [(usize, MessageOrigin, &str, u64); 6] = [
    (0, MessageOrigin::Peer, "Hey, how are you doing today?", 86_400),
    (
        0,
        MessageOrigin::Local,
        "I'm doing great! Just finished that project we talked about.",
        86_300,
    ),
    (0, MessageOrigin::Peer, "That's awesome! Would love to see it sometime.", 85_000),
    (1, MessageOrigin::Peer, "Are we still meeting tomorrow?", 50_000),
    (1, MessageOrigin::Local, "Yes, 2pm at the coffee shop!", 49_000),
    (2, MessageOrigin::Peer, "Check out this new app I found", 25_000),
];

/// Load the roster's history and last-seen times into the runtime.
///
/// History and last-seen times are stamped relative to `now`.
pub async fn seed(
    handle: &ChatHandle,
    roster: &[Friend],
    now: Timestamp,
) -> Result<(), RuntimeError> {
    let ago = |secs: u64| Timestamp::from_millis(now.as_millis().saturating_sub(secs * 1000));

    for (index, origin, text, age) in HISTORY {
        let Some(friend) = roster.get(index) else {
            continue;
        };
        handle.import(friend.conversation(), origin, text, ago(age)).await?;
    }

    for friend in roster {
        handle.record_activity(friend.id, ago(friend.last_seen_ago.as_secs())).await?;
    }

    debug!(friends = roster.len(), lines = HISTORY.len(), "demo history seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_ids_follow_the_local_user() {
        let roster = roster(UserId(10));
        let ids: Vec<_> = roster.iter().map(|friend| friend.id).collect();
        assert_eq!(ids, [UserId(11), UserId(12), UserId(13)]);
    }

    #[test]
    fn position_by_username() {
        let roster = roster(UserId(1));
        assert_eq!(position(&roster, "taylor89"), Some(1));
        assert!(position(&roster, "nobody").is_none());
    }
}
