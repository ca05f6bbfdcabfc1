//! Data model: identifiers, timestamps and messages.

use std::{fmt, ops::Add, time::Duration};

/// Participant identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user{}", self.0)
    }
}

/// Two-party conversation between the local user and one peer.
///
/// The peer fully determines the conversation, so the identifier is the
/// peer's [`UserId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConversationId(pub UserId);

impl ConversationId {
    /// Conversation with the given peer.
    pub fn with_peer(peer: UserId) -> Self {
        Self(peer)
    }

    /// The remote participant.
    pub fn peer(self) -> UserId {
        self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chat:{}", self.0)
    }
}

/// Message identifier, unique within the simulator.
///
/// `seq` is assigned monotonically per conversation, starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId {
    /// Conversation the message belongs to.
    pub conversation: ConversationId,
    /// Per-conversation sequence number.
    pub seq: u64,
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.conversation, self.seq)
    }
}

/// Millisecond timestamp.
///
/// Production environments count from the Unix epoch; simulations may pick
/// any starting point. Arithmetic saturates instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Timestamp from milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the epoch.
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later.
    pub fn duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        let millis = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        Timestamp(self.0.saturating_add(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// What a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Plain text.
    Text,
    /// Image reference (URI).
    Image,
    /// Voice note placeholder label.
    Voice,
}

impl MessageKind {
    /// Image and voice messages.
    pub fn is_media(self) -> bool {
        matches!(self, Self::Image | Self::Voice)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Voice => "voice",
        };
        f.write_str(name)
    }
}

/// Delivery status of a message.
///
/// Ordered: `Sent < Delivered < Read`. Status only ever moves one step
/// forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageStatus {
    /// Accepted locally, not yet delivered.
    Sent,
    /// Delivered to the peer.
    Delivered,
    /// Read by the peer. Terminal.
    Read,
}

impl MessageStatus {
    /// The only status this one may advance to, `None` when terminal.
    pub fn next(self) -> Option<MessageStatus> {
        match self {
            Self::Sent => Some(Self::Delivered),
            Self::Delivered => Some(Self::Read),
            Self::Read => None,
        }
    }

    /// Whether no further transition exists.
    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
        };
        f.write_str(name)
    }
}

/// Which side of the conversation authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageOrigin {
    /// Composed by the local user.
    Local,
    /// Received from the peer.
    Peer,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Unique identifier.
    pub id: MessageId,
    /// Author.
    pub sender: UserId,
    /// Recipient.
    pub receiver: UserId,
    /// Text, image URI or voice placeholder.
    pub content: String,
    /// Content discriminator.
    pub kind: MessageKind,
    /// Delivery status.
    pub status: MessageStatus,
    /// Creation time. Never changes after insertion.
    pub timestamp: Timestamp,
}

impl Message {
    /// Conversation the message belongs to.
    pub fn conversation(&self) -> ConversationId {
        self.id.conversation
    }

    /// Authoring side, relative to the conversation's peer.
    pub fn origin(&self) -> MessageOrigin {
        if self.sender == self.id.conversation.peer() {
            MessageOrigin::Peer
        } else {
            MessageOrigin::Local
        }
    }
}
