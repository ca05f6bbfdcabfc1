//! Virtual-time driver for [`ChatSimulator`].
//!
//! The driver owns a simulator over a [`SimEnv`] and advances the virtual
//! clock one timer deadline at a time, ticking the simulator at each stop.
//! Every event is recorded with the time it was produced, which is what lets
//! tests assert on the exact sequence of statuses a message went through.

use std::time::Duration;

use ephemera_core::{
    CannedReplies, ChatEvent, ChatSimulator, ConversationId, Environment, Message, MessageId,
    MessageKind, MessageOrigin, MessageStatus, ReplyPolicy, SimulatorConfig, SubmitError,
    Timestamp, UserId,
};
use tracing::trace;

use crate::sim_env::SimEnv;

/// Upper bound on timer firings in [`SimDriver::run_until_idle`].
pub const MAX_IDLE_STEPS: usize = 10_000;

/// Event recorded by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// Virtual time the event was produced.
    pub at: Timestamp,
    /// The event.
    pub event: ChatEvent,
}

/// Deterministic driver around a simulator.
pub struct SimDriver<P = CannedReplies> {
    env: SimEnv,
    sim: ChatSimulator<SimEnv, P>,
    trace: Vec<TraceEntry>,
}

impl SimDriver<CannedReplies> {
    /// Driver with the default reply corpus.
    pub fn new(seed: u64, local_user: UserId, config: SimulatorConfig) -> Self {
        Self::with_policy(seed, local_user, config, CannedReplies::default())
    }
}

impl<P: ReplyPolicy> SimDriver<P> {
    /// Driver with a custom reply policy.
    pub fn with_policy(seed: u64, local_user: UserId, config: SimulatorConfig, policy: P) -> Self {
        let env = SimEnv::with_seed(seed);
        let sim = ChatSimulator::new(env.clone(), local_user, config, policy);
        Self { env, sim, trace: Vec::new() }
    }

    /// Submit a text message to `peer`.
    pub fn submit(&mut self, peer: UserId, content: &str) -> Result<MessageId, SubmitError> {
        self.submit_kind(peer, content, MessageKind::Text)
    }

    /// Submit a message of any kind to `peer`.
    pub fn submit_kind(
        &mut self,
        peer: UserId,
        content: &str,
        kind: MessageKind,
    ) -> Result<MessageId, SubmitError> {
        let (id, events) =
            self.sim.submit_message(ConversationId::with_peer(peer), content, kind)?;
        self.record(events);
        Ok(id)
    }

    /// Open the conversation with `peer`.
    pub fn open(&mut self, peer: UserId) -> Result<(), SubmitError> {
        let events = self.sim.open_conversation(ConversationId::with_peer(peer))?;
        self.record(events);
        Ok(())
    }

    /// Close the conversation with `peer`.
    pub fn close(&mut self, peer: UserId) {
        let events = self.sim.close_conversation(ConversationId::with_peer(peer));
        self.record(events);
    }

    /// Seed a historical message.
    pub fn import(
        &mut self,
        peer: UserId,
        origin: MessageOrigin,
        content: &str,
        at: Timestamp,
    ) -> Result<MessageId, SubmitError> {
        let (id, events) = self.sim.import_message(
            ConversationId::with_peer(peer),
            origin,
            content,
            MessageKind::Text,
            at,
        )?;
        self.record(events);
        Ok(id)
    }

    /// Advance virtual time by `by`, firing every timer due on the way in
    /// deadline order.
    pub fn advance(&mut self, by: Duration) {
        let target = self.env.now() + by;
        while let Some(deadline) = self.sim.next_deadline() {
            if deadline > target {
                break;
            }
            self.step_to(deadline);
        }
        self.step_to(target);
    }

    /// Fire timers until none remain or [`MAX_IDLE_STEPS`] deadlines have
    /// been visited. Returns the number of deadlines visited.
    pub fn run_until_idle(&mut self) -> usize {
        let mut steps = 0;
        while let Some(deadline) = self.sim.next_deadline() {
            if steps == MAX_IDLE_STEPS {
                break;
            }
            self.step_to(deadline);
            steps += 1;
        }
        steps
    }

    /// Current virtual time.
    pub fn now(&self) -> Timestamp {
        self.env.now()
    }

    /// Environment handle.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Simulator under test.
    pub fn sim(&self) -> &ChatSimulator<SimEnv, P> {
        &self.sim
    }

    /// Messages in the conversation with `peer`.
    pub fn messages(&self, peer: UserId) -> Vec<Message> {
        self.sim.messages(ConversationId::with_peer(peer))
    }

    /// Whether `peer` is shown as typing.
    pub fn is_typing(&self, peer: UserId) -> bool {
        self.sim.is_typing(ConversationId::with_peer(peer))
    }

    /// Every event recorded so far.
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// Statuses a message has been observed in, starting with its initial
    /// status.
    pub fn status_history(&self, id: MessageId) -> Vec<MessageStatus> {
        let Some(message) = self.sim.message(id) else {
            return Vec::new();
        };
        let local = message.origin() == MessageOrigin::Local;

        self.trace
            .iter()
            .filter_map(|entry| match entry.event {
                ChatEvent::MessageAppended { id: appended } if appended == id => {
                    Some(if local { MessageStatus::Sent } else { MessageStatus::Read })
                },
                ChatEvent::StatusAdvanced { id: advanced, status } if advanced == id => {
                    Some(status)
                },
                _ => None,
            })
            .collect()
    }

    /// Typing indicator transitions for the conversation with `peer`.
    pub fn typing_history(&self, peer: UserId) -> Vec<(Timestamp, bool)> {
        let conversation = ConversationId::with_peer(peer);
        self.trace
            .iter()
            .filter_map(|entry| match entry.event {
                ChatEvent::TypingChanged { conversation: changed, typing }
                    if changed == conversation =>
                {
                    Some((entry.at, typing))
                },
                _ => None,
            })
            .collect()
    }

    /// Peer messages appended at or after `since`.
    pub fn peer_messages_since(&self, peer: UserId, since: Timestamp) -> Vec<Message> {
        self.messages(peer)
            .into_iter()
            .filter(|m| m.origin() == MessageOrigin::Peer && m.timestamp >= since)
            .collect()
    }

    fn step_to(&mut self, at: Timestamp) {
        self.env.set_now(at);
        let events = self.sim.tick();
        if !events.is_empty() {
            trace!(%at, count = events.len(), "timers fired");
        }
        self.record(events);
    }

    fn record(&mut self, events: Vec<ChatEvent>) {
        let at = self.env.now();
        self.trace.extend(events.into_iter().map(|event| TraceEntry { at, event }));
    }
}
