//! Error types for the chat simulator.

use thiserror::Error;

use crate::types::{MessageId, MessageKind, MessageStatus};

/// Rejected submission. No state changes when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Text content was empty after trimming.
    #[error("message text is empty")]
    EmptyText,

    /// Media message without a resolved reference.
    #[error("{kind} message has no content reference")]
    MissingReference {
        /// Kind of the rejected message.
        kind: MessageKind,
    },

    /// Conversation peer is the local user.
    #[error("cannot open a conversation with yourself")]
    SelfConversation,
}

/// Refused status transition.
///
/// Only an internal scheduling bug can produce one of these; callers outside
/// the simulator never see them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// No message with this id exists.
    #[error("unknown message {0}")]
    UnknownMessage(MessageId),

    /// Peer messages never progress through delivery states.
    #[error("message {0} was not sent locally")]
    NotLocal(MessageId),

    /// Requested status is not the immediate successor.
    #[error("message {id}: illegal transition {from} -> {to}")]
    OutOfOrder {
        /// Message being advanced.
        id: MessageId,
        /// Current status.
        from: MessageStatus,
        /// Requested status.
        to: MessageStatus,
    },
}
