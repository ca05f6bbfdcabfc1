//! Message lifecycle simulator.
//!
//! Owns the message log and drives locally sent messages through
//! `Sent -> Delivered -> Read`, then optionally simulates the peer typing and
//! replying. Deferred work sits in a [`TimerQueue`] and only runs when the
//! caller invokes [`ChatSimulator::tick`], so a test can step virtual time
//! and observe every intermediate state.
//!
//! # Timers
//!
//! ```text
//! submit ──► Deliver ──► Read ──(open && roll < p)──► TypingStart ──► Reply
//!            (status timers,                         (peer timers,
//!             survive close)                          cancelled by close)
//! ```
//!
//! Chained timers are scheduled relative to the deadline of the timer that
//! scheduled them, not the time `tick` happened to run.

use std::collections::HashMap;

use tracing::{debug, error, info, trace};

use crate::{
    config::SimulatorConfig,
    env::Environment,
    error::{SubmitError, TransitionError},
    event::ChatEvent,
    log::{MessageLog, NewMessage},
    presence::Presence,
    replies::{CannedReplies, ReplyPolicy, ReplyTrigger},
    timer::{TimerId, TimerQueue},
    types::{
        ConversationId, Message, MessageId, MessageKind, MessageOrigin, MessageStatus, Timestamp,
        UserId,
    },
};

/// Deferred work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    /// Advance a local message to `Delivered`.
    Deliver(MessageId),
    /// Advance a local message to `Read`.
    Read(MessageId),
    /// Peer starts typing a reply.
    TypingStart { conversation: ConversationId, trigger: ReplyTrigger },
    /// Peer finishes typing and the reply lands.
    Reply { conversation: ConversationId, trigger: ReplyTrigger },
}

/// Per-conversation view state.
#[derive(Debug, Default)]
struct ConversationState {
    open: bool,
    /// Replies currently in their typing phase.
    typing: u32,
    /// Pending `TypingStart`/`Reply` timers, cancelled on close.
    peer_timers: Vec<TimerId>,
    unsolicited_pending: bool,
}

/// Simulated chat engine for one local user.
#[derive(Debug)]
pub struct ChatSimulator<E, P = CannedReplies> {
    env: E,
    local_user: UserId,
    config: SimulatorConfig,
    policy: P,
    log: MessageLog,
    timers: TimerQueue<Timer>,
    conversations: HashMap<ConversationId, ConversationState>,
    last_active: HashMap<UserId, Timestamp>,
}

impl<E: Environment> ChatSimulator<E, CannedReplies> {
    /// Simulator with the default reply corpus.
    pub fn with_config(env: E, local_user: UserId, config: SimulatorConfig) -> Self {
        Self::new(env, local_user, config, CannedReplies::default())
    }
}

impl<E: Environment, P: ReplyPolicy> ChatSimulator<E, P> {
    /// Create a simulator.
    pub fn new(env: E, local_user: UserId, config: SimulatorConfig, policy: P) -> Self {
        Self {
            env,
            local_user,
            config,
            policy,
            log: MessageLog::new(),
            timers: TimerQueue::new(),
            conversations: HashMap::new(),
            last_active: HashMap::new(),
        }
    }

    /// Submit a locally composed message.
    ///
    /// The message is appended as `Sent` before this returns. Delivery, read
    /// and any reply happen on later [`tick`](Self::tick)s. Submitting marks
    /// the conversation open.
    pub fn submit_message(
        &mut self,
        conversation: ConversationId,
        content: &str,
        kind: MessageKind,
    ) -> Result<(MessageId, Vec<ChatEvent>), SubmitError> {
        let content = self.validate(conversation, content, kind)?;

        let mut events = Vec::new();
        self.mark_open(conversation, &mut events);

        let now = self.env.now();
        let id = self.log.append(
            conversation,
            NewMessage {
                sender: self.local_user,
                receiver: conversation.peer(),
                content,
                kind,
                status: MessageStatus::Sent,
                timestamp: now,
            },
        );
        events.push(ChatEvent::MessageAppended { id });

        let deadline = now + self.config.delivery_delay;
        self.timers.schedule(deadline, Timer::Deliver(id));
        debug!(%id, %kind, %deadline, "message submitted");

        Ok((id, events))
    }

    /// Start viewing a conversation.
    ///
    /// On a closed-to-open transition, schedules unprompted peer activity if
    /// configured. Opening an already open conversation does nothing.
    pub fn open_conversation(
        &mut self,
        conversation: ConversationId,
    ) -> Result<Vec<ChatEvent>, SubmitError> {
        if conversation.peer() == self.local_user {
            return Err(SubmitError::SelfConversation);
        }

        let mut events = Vec::new();
        if !self.mark_open(conversation, &mut events) {
            return Ok(events);
        }

        let Some(range) = self.config.unsolicited_delay else {
            return Ok(events);
        };
        let already_pending =
            self.conversations.get(&conversation).is_some_and(|state| state.unsolicited_pending);
        if !already_pending {
            let deadline = self.env.now() + self.env.random_delay(range);
            self.schedule_peer_timer(
                conversation,
                deadline,
                Timer::TypingStart { conversation, trigger: ReplyTrigger::Unsolicited },
            );
            if let Some(state) = self.conversations.get_mut(&conversation) {
                state.unsolicited_pending = true;
            }
            debug!(%conversation, %deadline, "unsolicited activity scheduled");
        }

        Ok(events)
    }

    /// Stop viewing a conversation.
    ///
    /// Cancels all pending typing and reply timers for it and clears the
    /// typing indicator. Status timers of outstanding local messages keep
    /// running, but their read receipts no longer trigger replies. Closing a
    /// conversation that is not open does nothing.
    pub fn close_conversation(&mut self, conversation: ConversationId) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        let Some(state) = self.conversations.get_mut(&conversation) else {
            return events;
        };
        if !state.open {
            return events;
        }

        let cancelled = state
            .peer_timers
            .drain(..)
            .filter(|timer| self.timers.cancel(*timer).is_some())
            .count();

        if state.typing > 0 {
            events.push(ChatEvent::TypingChanged { conversation, typing: false });
        }
        state.typing = 0;
        state.unsolicited_pending = false;
        state.open = false;

        info!(%conversation, cancelled, "conversation closed");
        events.push(ChatEvent::ConversationClosed { conversation, cancelled });
        events
    }

    /// Insert a historical message.
    ///
    /// Imported messages are already `Read`, may carry any timestamp, and
    /// schedule nothing.
    pub fn import_message(
        &mut self,
        conversation: ConversationId,
        origin: MessageOrigin,
        content: &str,
        kind: MessageKind,
        timestamp: Timestamp,
    ) -> Result<(MessageId, Vec<ChatEvent>), SubmitError> {
        let content = self.validate(conversation, content, kind)?;
        let peer = conversation.peer();
        let (sender, receiver) = match origin {
            MessageOrigin::Local => (self.local_user, peer),
            MessageOrigin::Peer => (peer, self.local_user),
        };

        let id = self.log.append(
            conversation,
            NewMessage { sender, receiver, content, kind, status: MessageStatus::Read, timestamp },
        );
        if origin == MessageOrigin::Peer {
            self.record_activity(peer, timestamp);
        }

        trace!(%id, %timestamp, "history imported");
        Ok((id, vec![ChatEvent::MessageAppended { id }]))
    }

    /// Note that `peer` was active at `at`. Earlier timestamps are ignored.
    pub fn record_activity(&mut self, peer: UserId, at: Timestamp) {
        let seen = self.last_active.entry(peer).or_insert(at);
        if at > *seen {
            *seen = at;
        }
    }

    /// Fire every timer whose deadline has passed.
    ///
    /// Timers scheduled while firing are also fired if already due.
    pub fn tick(&mut self) -> Vec<ChatEvent> {
        let now = self.env.now();
        let mut events = Vec::new();
        while let Some((id, deadline, timer)) = self.timers.pop_due(now) {
            self.fire(id, deadline, timer, &mut events);
        }
        events
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timers.next_deadline()
    }

    /// Number of pending timers of any kind.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Conversation snapshot ordered by timestamp.
    pub fn messages(&self, conversation: ConversationId) -> Vec<Message> {
        self.log.messages(conversation)
    }

    /// Look up a single message.
    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.log.get(id)
    }

    /// Conversations holding at least one message.
    pub fn conversations(&self) -> Vec<ConversationId> {
        self.log.conversations()
    }

    /// Underlying message log.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Whether the peer is currently typing.
    pub fn is_typing(&self, conversation: ConversationId) -> bool {
        self.conversations.get(&conversation).is_some_and(|state| state.typing > 0)
    }

    /// Whether the conversation is being viewed.
    pub fn is_open(&self, conversation: ConversationId) -> bool {
        self.conversations.get(&conversation).is_some_and(|state| state.open)
    }

    /// Last time the peer was seen.
    pub fn last_active(&self, peer: UserId) -> Option<Timestamp> {
        self.last_active.get(&peer).copied()
    }

    /// Peer presence right now.
    pub fn presence(&self, peer: UserId) -> Presence {
        Presence::at(self.env.now(), self.last_active(peer))
    }

    /// Local user id.
    pub fn local_user(&self) -> UserId {
        self.local_user
    }

    /// Active configuration.
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Environment handle.
    pub fn env(&self) -> &E {
        &self.env
    }

    fn validate(
        &self,
        conversation: ConversationId,
        content: &str,
        kind: MessageKind,
    ) -> Result<String, SubmitError> {
        if conversation.peer() == self.local_user {
            return Err(SubmitError::SelfConversation);
        }
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(match kind {
                MessageKind::Text => SubmitError::EmptyText,
                MessageKind::Image | MessageKind::Voice => SubmitError::MissingReference { kind },
            });
        }
        Ok(trimmed.to_string())
    }

    /// Returns whether the conversation was previously closed.
    fn mark_open(&mut self, conversation: ConversationId, events: &mut Vec<ChatEvent>) -> bool {
        let state = self.conversations.entry(conversation).or_default();
        if state.open {
            return false;
        }
        state.open = true;
        info!(%conversation, "conversation opened");
        events.push(ChatEvent::ConversationOpened { conversation });
        true
    }

    fn fire(
        &mut self,
        id: TimerId,
        deadline: Timestamp,
        timer: Timer,
        events: &mut Vec<ChatEvent>,
    ) {
        match timer {
            Timer::Deliver(message) => {
                if self.apply_transition(message, MessageStatus::Delivered, events) {
                    let read_at = deadline + self.config.read_delay;
                    self.timers.schedule(read_at, Timer::Read(message));
                }
            },
            Timer::Read(message) => {
                if self.apply_transition(message, MessageStatus::Read, events) {
                    self.maybe_schedule_reply(message, deadline);
                }
            },
            Timer::TypingStart { conversation, trigger } => {
                if !self.take_peer_timer(conversation, id) {
                    return;
                }
                let typing_for = self.env.random_delay(self.config.typing_duration);
                if let Some(state) = self.conversations.get_mut(&conversation) {
                    state.typing += 1;
                    if state.typing == 1 {
                        events.push(ChatEvent::TypingChanged { conversation, typing: true });
                    }
                }
                self.schedule_peer_timer(
                    conversation,
                    deadline + typing_for,
                    Timer::Reply { conversation, trigger },
                );
                debug!(%conversation, ?trigger, ?typing_for, "peer typing");
            },
            Timer::Reply { conversation, trigger } => {
                if !self.take_peer_timer(conversation, id) {
                    return;
                }
                if let Some(state) = self.conversations.get_mut(&conversation) {
                    state.typing = state.typing.saturating_sub(1);
                    if state.typing == 0 {
                        events.push(ChatEvent::TypingChanged { conversation, typing: false });
                    }
                    if trigger == ReplyTrigger::Unsolicited {
                        state.unsolicited_pending = false;
                    }
                }
                self.append_peer_reply(conversation, trigger, events);
            },
        }
    }

    /// Forget a fired peer timer. Returns false if the conversation is no
    /// longer open, in which case the timer is stale and must do nothing.
    fn take_peer_timer(&mut self, conversation: ConversationId, id: TimerId) -> bool {
        let Some(state) = self.conversations.get_mut(&conversation) else {
            trace!(%conversation, timer = id.get(), "stale peer timer");
            return false;
        };
        state.peer_timers.retain(|pending| *pending != id);
        if !state.open {
            trace!(%conversation, timer = id.get(), "stale peer timer");
            return false;
        }
        true
    }

    fn schedule_peer_timer(&mut self, conversation: ConversationId, at: Timestamp, timer: Timer) {
        let id = self.timers.schedule(at, timer);
        self.conversations.entry(conversation).or_default().peer_timers.push(id);
    }

    fn maybe_schedule_reply(&mut self, message: MessageId, read_at: Timestamp) {
        let conversation = message.conversation;
        if !self.is_open(conversation) {
            debug!(%message, "read in closed conversation, no reply");
            return;
        }
        let Some(kind) = self.log.get(message).map(|m| m.kind) else {
            return;
        };

        let probability = self.config.reply_probability_for(kind);
        if self.env.random_unit() >= probability {
            debug!(%message, probability, "peer chose not to reply");
            return;
        }

        let lead = self.env.random_delay(self.config.reply_lead);
        let trigger = ReplyTrigger::from(kind);
        self.schedule_peer_timer(
            conversation,
            read_at + lead,
            Timer::TypingStart { conversation, trigger },
        );
        debug!(%message, ?trigger, ?lead, "reply scheduled");
    }

    fn append_peer_reply(
        &mut self,
        conversation: ConversationId,
        trigger: ReplyTrigger,
        events: &mut Vec<ChatEvent>,
    ) {
        let corpus = self.policy.corpus(trigger);
        let Some(content) = corpus.get(self.env.random_index(corpus.len())).cloned() else {
            debug!(%conversation, ?trigger, "empty reply corpus, reply skipped");
            return;
        };

        let now = self.env.now();
        let peer = conversation.peer();
        let id = self.log.append(
            conversation,
            NewMessage {
                sender: peer,
                receiver: self.local_user,
                content,
                kind: MessageKind::Text,
                status: MessageStatus::Read,
                timestamp: now,
            },
        );
        self.record_activity(peer, now);
        info!(%id, ?trigger, "peer replied");
        events.push(ChatEvent::MessageAppended { id });
    }

    fn apply_transition(
        &mut self,
        message: MessageId,
        status: MessageStatus,
        events: &mut Vec<ChatEvent>,
    ) -> bool {
        let result = self.advance_status(message, status);
        debug_assert!(result.is_ok(), "status transition refused: {result:?}");
        match result {
            Ok(()) => {
                debug!(%message, %status, "status advanced");
                events.push(ChatEvent::StatusAdvanced { id: message, status });
                true
            },
            Err(err) => {
                error!(%err, "refusing status transition");
                false
            },
        }
    }

    /// Move a local message exactly one status step forward.
    fn advance_status(
        &mut self,
        id: MessageId,
        status: MessageStatus,
    ) -> Result<(), TransitionError> {
        let local_user = self.local_user;
        let message = self.log.get_mut(id).ok_or(TransitionError::UnknownMessage(id))?;
        if message.sender != local_user {
            return Err(TransitionError::NotLocal(id));
        }
        if message.status.next() != Some(status) {
            return Err(TransitionError::OutOfOrder { id, from: message.status, to: status });
        }
        message.status = status;
        Ok(())
    }
}
