//! Observable changes produced by the simulator.

use crate::types::{ConversationId, MessageId, MessageStatus};

/// Events produced by [`crate::ChatSimulator`] operations.
///
/// Events describe state that has already changed. The log remains the source
/// of truth; subscribers use events to know when to re-read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A message was appended to a conversation.
    MessageAppended {
        /// New message.
        id: MessageId,
    },

    /// A local message advanced one status step.
    StatusAdvanced {
        /// Message that changed.
        id: MessageId,
        /// Status it now has.
        status: MessageStatus,
    },

    /// The peer typing indicator flipped.
    TypingChanged {
        /// Conversation whose indicator changed.
        conversation: ConversationId,
        /// Whether the peer is now typing.
        typing: bool,
    },

    /// The user started viewing a conversation.
    ConversationOpened {
        /// Conversation now open.
        conversation: ConversationId,
    },

    /// The user left a conversation. Pending peer activity was cancelled.
    ConversationClosed {
        /// Conversation now closed.
        conversation: ConversationId,
        /// Number of pending peer timers that were cancelled.
        cancelled: usize,
    },
}

impl ChatEvent {
    /// Conversation this event concerns.
    pub fn conversation(&self) -> ConversationId {
        match self {
            Self::MessageAppended { id } | Self::StatusAdvanced { id, .. } => id.conversation,
            Self::TypingChanged { conversation, .. }
            | Self::ConversationOpened { conversation }
            | Self::ConversationClosed { conversation, .. } => *conversation,
        }
    }
}
