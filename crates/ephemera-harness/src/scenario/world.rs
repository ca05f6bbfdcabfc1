//! World state for scenario execution.
//!
//! The World holds the driven simulator, maps peer names to user ids, and
//! remembers what the script did so oracles can check outcomes against it.

use std::collections::HashMap;

use ephemera_core::{Message, MessageId, MessageOrigin, MessageStatus, Timestamp, UserId};

use crate::driver::SimDriver;

/// World state after a scenario ran.
pub struct World {
    driver: SimDriver,
    peers: HashMap<String, UserId>,
    submitted: Vec<MessageId>,
    closed_at: HashMap<UserId, Timestamp>,
}

impl World {
    pub(crate) fn new(driver: SimDriver) -> Self {
        Self { driver, peers: HashMap::new(), submitted: Vec::new(), closed_at: HashMap::new() }
    }

    pub(crate) fn add_peer(&mut self, name: String, id: UserId) {
        self.peers.insert(name, id);
    }

    pub(crate) fn driver_mut(&mut self) -> &mut SimDriver {
        &mut self.driver
    }

    pub(crate) fn record_submitted(&mut self, id: MessageId) {
        self.submitted.push(id);
    }

    pub(crate) fn record_open(&mut self, peer: UserId) {
        self.closed_at.remove(&peer);
    }

    pub(crate) fn record_close(&mut self, peer: UserId) {
        let now = self.driver.now();
        self.closed_at.insert(peer, now);
    }

    /// Driver holding the simulator.
    pub fn driver(&self) -> &SimDriver {
        &self.driver
    }

    /// User id of a named peer.
    pub fn peer(&self, name: &str) -> Option<UserId> {
        self.peers.get(name).copied()
    }

    /// Names of all peers.
    pub fn peer_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.peers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Messages the script submitted successfully, in submission order.
    pub fn submitted(&self) -> &[MessageId] {
        &self.submitted
    }

    /// Conversation with a named peer; empty for unknown names.
    pub fn messages(&self, name: &str) -> Vec<Message> {
        self.peer(name).map(|peer| self.driver.messages(peer)).unwrap_or_default()
    }

    /// Whether a named peer is shown typing.
    pub fn is_typing(&self, name: &str) -> bool {
        self.peer(name).is_some_and(|peer| self.driver.is_typing(peer))
    }

    /// When a named peer's conversation was last closed, if it still is.
    pub fn closed_at(&self, name: &str) -> Option<Timestamp> {
        self.peer(name).and_then(|peer| self.closed_at.get(&peer).copied())
    }

    /// Peer messages in a named conversation stamped after it was closed.
    pub fn replies_after_close(&self, name: &str) -> usize {
        let (Some(peer), Some(closed)) = (self.peer(name), self.closed_at(name)) else {
            return 0;
        };
        self.driver
            .messages(peer)
            .iter()
            .filter(|m| m.origin() == MessageOrigin::Peer && m.timestamp >= closed)
            .count()
    }

    /// Whether every submitted message reached `Read`.
    pub fn all_submitted_read(&self) -> bool {
        self.submitted.iter().all(|id| {
            self.driver.sim().message(*id).is_some_and(|m| m.status == MessageStatus::Read)
        })
    }

    /// Whether every submitted message went through exactly
    /// `Sent, Delivered, Read` or a prefix of it.
    pub fn statuses_monotonic(&self) -> bool {
        const FULL: [MessageStatus; 3] =
            [MessageStatus::Sent, MessageStatus::Delivered, MessageStatus::Read];
        self.submitted.iter().all(|id| {
            let history = self.driver.status_history(*id);
            !history.is_empty() && FULL.starts_with(&history)
        })
    }

    /// Whether every conversation is ordered by timestamp.
    pub fn conversations_sorted(&self) -> bool {
        self.peers.values().all(|peer| {
            let messages = self.driver.messages(*peer);
            messages.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp)
        })
    }
}
