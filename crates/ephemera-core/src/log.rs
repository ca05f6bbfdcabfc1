//! Append-only message log, one vector per conversation.
//!
//! A message's `seq` is its index in the conversation vector. Messages are
//! never removed or reordered in storage, so lookups by id are direct.
//! Imported history may carry timestamps older than messages already stored,
//! which is why reads sort.

use std::collections::HashMap;

use crate::types::{
    ConversationId, Message, MessageId, MessageKind, MessageStatus, Timestamp, UserId,
};

/// Message log keyed by conversation.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    conversations: HashMap<ConversationId, Vec<Message>>,
}

/// Fields of a message about to be appended.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// Author.
    pub sender: UserId,
    /// Recipient.
    pub receiver: UserId,
    /// Message content.
    pub content: String,
    /// Content kind.
    pub kind: MessageKind,
    /// Initial status.
    pub status: MessageStatus,
    /// Creation time.
    pub timestamp: Timestamp,
}

impl MessageLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its id.
    pub fn append(&mut self, conversation: ConversationId, message: NewMessage) -> MessageId {
        let entries = self.conversations.entry(conversation).or_default();
        let id = MessageId { conversation, seq: entries.len() as u64 };
        entries.push(Message {
            id,
            sender: message.sender,
            receiver: message.receiver,
            content: message.content,
            kind: message.kind,
            status: message.status,
            timestamp: message.timestamp,
        });
        id
    }

    /// Look up a message.
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        let index = usize::try_from(id.seq).ok()?;
        self.conversations.get(&id.conversation)?.get(index)
    }

    pub(crate) fn get_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        let index = usize::try_from(id.seq).ok()?;
        self.conversations.get_mut(&id.conversation)?.get_mut(index)
    }

    /// Snapshot of a conversation ordered by timestamp.
    ///
    /// Ties keep insertion order. Unknown conversations yield an empty vector.
    pub fn messages(&self, conversation: ConversationId) -> Vec<Message> {
        let mut messages = self.conversations.get(&conversation).cloned().unwrap_or_default();
        messages.sort_by_key(|message| message.timestamp);
        messages
    }

    /// Number of messages in a conversation.
    pub fn len(&self, conversation: ConversationId) -> usize {
        self.conversations.get(&conversation).map_or(0, Vec::len)
    }

    /// Total number of messages across all conversations.
    pub fn total_len(&self) -> usize {
        self.conversations.values().map(Vec::len).sum()
    }

    /// Whether the log holds no messages at all.
    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    /// Conversations with at least one message, in id order.
    pub fn conversations(&self) -> Vec<ConversationId> {
        let mut ids: Vec<_> = self.conversations.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Most recent message of a conversation by timestamp.
    pub fn last_message(&self, conversation: ConversationId) -> Option<&Message> {
        // max_by_key returns the last maximum, matching the sort's tie order
        self.conversations.get(&conversation)?.iter().max_by_key(|message| message.timestamp)
    }
}
