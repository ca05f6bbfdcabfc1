//! Auto-reply content policy.

use crate::types::MessageKind;

/// What prompted a simulated peer reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyTrigger {
    /// The peer read a text message.
    Text,
    /// The peer read an image or voice message.
    Media,
    /// Peer activity not prompted by any local message.
    Unsolicited,
}

impl From<MessageKind> for ReplyTrigger {
    fn from(kind: MessageKind) -> Self {
        if kind.is_media() { Self::Media } else { Self::Text }
    }
}

/// Source of canned reply content.
///
/// The simulator picks uniformly from the returned corpus using the
/// environment's RNG. An empty corpus suppresses the reply.
pub trait ReplyPolicy {
    /// Replies suitable for `trigger`.
    fn corpus(&self, trigger: ReplyTrigger) -> &[String];
}

/// Fixed reply corpora.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CannedReplies {
    text: Vec<String>,
    media: Vec<String>,
    unsolicited: Vec<String>,
}

impl CannedReplies {
    /// Build from explicit corpora.
    pub fn new(text: Vec<String>, media: Vec<String>, unsolicited: Vec<String>) -> Self {
        Self { text, media, unsolicited }
    }

    /// Same single reply for every trigger.
    pub fn constant(reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self::new(vec![reply.clone()], vec![reply.clone()], vec![reply])
    }
}

impl Default for CannedReplies {
    fn default() -> Self {
        fn owned(lines: &[&str]) -> Vec<String> {
            lines.iter().map(|line| (*line).to_string()).collect()
        }

        Self::new(
            owned(&[
                "That sounds good!",
                "👍",
                "I'll let you know later",
                "Can't wait to hear more about it",
                "Thanks for sharing",
            ]),
            owned(&[
                "Nice!",
                "That's awesome!",
                "Looks great!",
                "Thanks for sharing!",
                "👍",
                "❤️",
            ]),
            owned(&[
                "Are you free to discuss it this evening?",
                "Hey, how are you doing today?",
                "Check out this new app I found",
            ]),
        )
    }
}

impl ReplyPolicy for CannedReplies {
    fn corpus(&self, trigger: ReplyTrigger) -> &[String] {
        match trigger {
            ReplyTrigger::Text => &self.text,
            ReplyTrigger::Media => &self.media,
            ReplyTrigger::Unsolicited => &self.unsolicited,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kinds_draw_reactions() {
        let replies = CannedReplies::default();
        assert_eq!(ReplyTrigger::from(MessageKind::Image), ReplyTrigger::Media);
        assert_eq!(ReplyTrigger::from(MessageKind::Voice), ReplyTrigger::Media);
        assert!(replies.corpus(ReplyTrigger::Media).iter().any(|r| r == "Looks great!"));
        assert!(replies.corpus(ReplyTrigger::Text).iter().any(|r| r == "That sounds good!"));
    }

    #[test]
    fn default_corpora_are_non_empty() {
        let replies = CannedReplies::default();
        for trigger in [ReplyTrigger::Text, ReplyTrigger::Media, ReplyTrigger::Unsolicited] {
            assert!(!replies.corpus(trigger).is_empty(), "{trigger:?}");
        }
    }
}
