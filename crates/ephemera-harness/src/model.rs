//! Reference model for model-based testing.
//!
//! The model predicts what the simulator must show without simulating any
//! timers: a local message's status is a pure function of when it was sent,
//! and a closed conversation must not receive peer messages until it is
//! reopened. Randomized reply behavior is deliberately not modeled; tests
//! compare only what is deterministic.

use std::{collections::HashMap, time::Duration};

use ephemera_core::{MessageStatus, SimulatorConfig, SubmitError, Timestamp, UserId};

/// Operation applied to both the model and the real simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Submit text to a peer.
    Submit {
        /// Peer index.
        peer: u8,
        /// Message text, possibly blank.
        text: String,
    },
    /// Open the conversation with a peer.
    Open {
        /// Peer index.
        peer: u8,
    },
    /// Close the conversation with a peer.
    Close {
        /// Peer index.
        peer: u8,
    },
    /// Let virtual time pass.
    AdvanceTime {
        /// Milliseconds to advance.
        millis: u16,
    },
}

/// A local message as the model sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelMessage {
    /// Peer the message was sent to.
    pub peer: UserId,
    /// Sequence number within the conversation.
    pub seq: u64,
    /// Submission time.
    pub sent_at: Timestamp,
}

/// Reference model of the simulator's deterministic behavior.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    local_user: UserId,
    delivery_delay: Duration,
    read_delay: Duration,
    now: Timestamp,
    local_messages: Vec<ModelMessage>,
    /// Conversations currently closed, with the time they were closed.
    closed_since: HashMap<UserId, Timestamp>,
    open: HashMap<UserId, bool>,
}

impl ModelWorld {
    /// Model for `local_user` with the timing of `config`.
    pub fn new(local_user: UserId, config: &SimulatorConfig) -> Self {
        Self {
            local_user,
            delivery_delay: config.delivery_delay,
            read_delay: config.read_delay,
            now: Timestamp::default(),
            local_messages: Vec::new(),
            closed_since: HashMap::new(),
            open: HashMap::new(),
        }
    }

    /// Map a peer index to a user id. Index 0 is the local user itself.
    pub fn peer_id(&self, peer: u8) -> UserId {
        if peer == 0 { self.local_user } else { UserId(self.local_user.0 + u64::from(peer)) }
    }

    /// Apply an operation; returns the expected submission outcome.
    ///
    /// `seq` must be the sequence number the real simulator assigned, since
    /// peer replies interleave with local messages in a conversation.
    pub fn apply(&mut self, op: &Operation, seq: Option<u64>) -> Result<(), SubmitError> {
        match op {
            Operation::Submit { peer, text } => {
                let peer = self.peer_id(*peer);
                if peer == self.local_user {
                    return Err(SubmitError::SelfConversation);
                }
                if text.trim().is_empty() {
                    return Err(SubmitError::EmptyText);
                }
                self.local_messages.push(ModelMessage {
                    peer,
                    seq: seq.unwrap_or_default(),
                    sent_at: self.now,
                });
                self.mark_open(peer);
                Ok(())
            },
            Operation::Open { peer } => {
                let peer = self.peer_id(*peer);
                if peer == self.local_user {
                    return Err(SubmitError::SelfConversation);
                }
                self.mark_open(peer);
                Ok(())
            },
            Operation::Close { peer } => {
                let peer = self.peer_id(*peer);
                if self.open.get(&peer).copied().unwrap_or(false) {
                    self.open.insert(peer, false);
                    self.closed_since.insert(peer, self.now);
                }
                Ok(())
            },
            Operation::AdvanceTime { millis } => {
                self.now = self.now + Duration::from_millis(u64::from(*millis));
                Ok(())
            },
        }
    }

    /// Status a local message must have at the model's current time.
    pub fn expected_status(&self, message: &ModelMessage) -> MessageStatus {
        let delivered_at = message.sent_at + self.delivery_delay;
        let read_at = delivered_at + self.read_delay;
        if self.now >= read_at {
            MessageStatus::Read
        } else if self.now >= delivered_at {
            MessageStatus::Delivered
        } else {
            MessageStatus::Sent
        }
    }

    /// Every accepted local message.
    pub fn local_messages(&self) -> &[ModelMessage] {
        &self.local_messages
    }

    /// Number of accepted local messages sent to `peer`.
    pub fn local_count(&self, peer: UserId) -> usize {
        self.local_messages.iter().filter(|m| m.peer == peer).count()
    }

    /// Time `peer`'s conversation was closed, if it is currently closed.
    pub fn closed_since(&self, peer: UserId) -> Option<Timestamp> {
        self.closed_since.get(&peer).copied()
    }

    /// Model clock.
    pub fn now(&self) -> Timestamp {
        self.now
    }

    fn mark_open(&mut self, peer: UserId) {
        self.open.insert(peer, true);
        self.closed_since.remove(&peer);
    }
}
