//! Plain-text rendering of conversations and the friend list.

use ephemera_core::{Message, MessageKind, MessageOrigin, MessageStatus, Presence, Timestamp};

use crate::demo::Friend;

const MINUTES_PER_DAY: u64 = 24 * 60;

/// Wall-clock time of day as `HH:MM` (UTC).
pub fn clock(at: Timestamp) -> String {
    let minutes = at.as_millis() / 60_000 % MINUTES_PER_DAY;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Delivery ticks: one when sent, two when delivered, two plus "seen" when
/// read.
pub fn ticks(status: MessageStatus) -> &'static str {
    match status {
        MessageStatus::Sent => "✓",
        MessageStatus::Delivered => "✓✓",
        MessageStatus::Read => "✓✓ seen",
    }
}

fn body(message: &Message) -> String {
    match message.kind {
        MessageKind::Text => message.content.clone(),
        MessageKind::Image => format!("[image] {}", message.content),
        MessageKind::Voice => format!("[voice] {}", message.content),
    }
}

/// One transcript line.
///
/// Local messages show their delivery ticks; peer messages are attributed to
/// `peer_name`.
pub fn message_line(message: &Message, peer_name: &str) -> String {
    let at = clock(message.timestamp);
    match message.origin() {
        MessageOrigin::Local => format!("[{at}] you: {} {}", body(message), ticks(message.status)),
        MessageOrigin::Peer => format!("[{at}] {peer_name}: {}", body(message)),
    }
}

/// Transcript of a conversation, one message per line.
pub fn transcript(messages: &[Message], peer_name: &str) -> String {
    if messages.is_empty() {
        return format!("No messages with {peer_name} yet.");
    }
    let mut out = String::new();
    for (index, message) in messages.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&message_line(message, peer_name));
    }
    out
}

/// Friend list entry.
pub fn friend_line(friend: &Friend, presence: Presence) -> String {
    format!(
        "{:<12} {:<14} streak {:>2}  {}",
        friend.username,
        friend.display_name,
        friend.streak,
        presence.label()
    )
}

/// Chat header shown on `/open`.
pub fn header(friend: &Friend, presence: Presence) -> String {
    format!("── {} ({}) · {} ──", friend.display_name, friend.username, presence.label())
}

/// Typing indicator line.
pub fn typing_line(peer_name: &str) -> String {
    format!("{peer_name} is typing...")
}

/// Status update for an outgoing message.
pub fn status_line(message: &Message, status: MessageStatus) -> String {
    format!("  \"{}\" {status}", body(message))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ephemera_core::{ConversationId, MessageId, UserId};

    use super::*;

    const ME: UserId = UserId(1);
    const ALEX: UserId = UserId(2);

    fn message(
        seq: u64,
        from_peer: bool,
        content: &str,
        kind: MessageKind,
        status: MessageStatus,
        at: u64,
    ) -> Message {
        let (sender, receiver) = if from_peer { (ALEX, ME) } else { (ME, ALEX) };
        Message {
            id: MessageId { conversation: ConversationId::with_peer(ALEX), seq },
            sender,
            receiver,
            content: content.to_string(),
            kind,
            status,
            timestamp: Timestamp::from_millis(at),
        }
    }

    #[test]
    fn clock_wraps_at_midnight() {
        assert_eq!(clock(Timestamp::from_millis(0)), "00:00");
        assert_eq!(clock(Timestamp::from_millis((13 * 60 + 7) * 60_000)), "13:07");
        assert_eq!(clock(Timestamp::from_millis((25 * 60 + 1) * 60_000)), "01:01");
    }

    #[test]
    fn transcript_shows_ticks_and_media() {
        use MessageKind::{Image, Text, Voice};
        use MessageStatus::{Delivered, Read, Sent};

        let at = |minute: u64| 9 * 3_600_000 + minute * 60_000;
        let messages = [
            message(0, true, "Hey, how are you doing today?", Text, Read, at(0)),
            message(1, false, "hello", Text, Read, at(1)),
            message(2, false, "https://images.example/cat.jpg", Image, Delivered, at(2)),
            message(3, false, "Voice message (0:12)", Voice, Sent, at(3)),
            message(4, true, "Nice pic!", Text, Read, at(4)),
        ];

        insta::assert_snapshot!(transcript(&messages, "alex_j"), @r"
        [09:00] alex_j: Hey, how are you doing today?
        [09:01] you: hello ✓✓ seen
        [09:02] you: [image] https://images.example/cat.jpg ✓✓
        [09:03] you: [voice] Voice message (0:12) ✓
        [09:04] alex_j: Nice pic!
        ");
    }

    #[test]
    fn empty_transcript() {
        assert_eq!(transcript(&[], "sam_wilson"), "No messages with sam_wilson yet.");
    }

    #[test]
    fn friend_list_lines() {
        let friend = Friend {
            id: ALEX,
            username: "alex_j".into(),
            display_name: "Alex Johnson".into(),
            streak: 15,
            last_seen_ago: Duration::from_secs(1800),
        };

        let line = friend_line(&friend, Presence::Offline);
        insta::assert_snapshot!(line, @"alex_j       Alex Johnson   streak 15  Offline");
        let title = header(&friend, Presence::Active);
        insta::assert_snapshot!(title, @"── Alex Johnson (alex_j) · Active now ──");
    }

    #[test]
    fn status_and_typing_lines() {
        let sent = message(1, false, "hello", MessageKind::Text, MessageStatus::Read, 0);
        assert_eq!(status_line(&sent, MessageStatus::Delivered), "  \"hello\" delivered");
        assert_eq!(typing_line("alex_j"), "alex_j is typing...");
    }
}
