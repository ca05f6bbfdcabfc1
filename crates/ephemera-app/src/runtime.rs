//! Actor runtime for the chat simulator.
//!
//! One tokio task owns the [`ChatSimulator`]. Callers talk to it through a
//! [`ChatHandle`]: requests arrive over an `mpsc` channel and are answered on
//! a `oneshot`. Between requests the actor sleeps until the simulator's next
//! timer deadline and then ticks it, so a request and a timer callback never
//! interleave.
//!
//! Every [`ChatEvent`] is published on a `broadcast` channel. Typing
//! indicators are additionally mirrored into one `watch` channel per
//! conversation, which is what a UI subscribes to.

use std::{collections::HashMap, future};

use ephemera_core::{
    CannedReplies, ChatEvent, ChatSimulator, ConversationId, Message, MessageId, MessageKind,
    MessageOrigin, Presence, ReplyPolicy, SubmitError, Timestamp, UserId,
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, oneshot, watch},
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tracing::{debug, info, trace};

use crate::env::TokioEnv;

/// Depth of the request queue.
const REQUEST_CAPACITY: usize = 64;

/// Events buffered per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 256;

/// Runtime errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The actor task has stopped.
    #[error("chat runtime has shut down")]
    Closed,

    /// The simulator rejected a submission.
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

enum Request {
    Submit {
        conversation: ConversationId,
        content: String,
        kind: MessageKind,
        reply: oneshot::Sender<Result<MessageId, SubmitError>>,
    },
    Open {
        conversation: ConversationId,
        reply: oneshot::Sender<Result<(), SubmitError>>,
    },
    Close {
        conversation: ConversationId,
        reply: oneshot::Sender<()>,
    },
    Import {
        conversation: ConversationId,
        origin: MessageOrigin,
        content: String,
        timestamp: Timestamp,
        reply: oneshot::Sender<Result<MessageId, SubmitError>>,
    },
    RecordActivity {
        peer: UserId,
        at: Timestamp,
    },
    Messages {
        conversation: ConversationId,
        reply: oneshot::Sender<Vec<Message>>,
    },
    Message {
        id: MessageId,
        reply: oneshot::Sender<Option<Message>>,
    },
    Presence {
        peer: UserId,
        reply: oneshot::Sender<Presence>,
    },
    SubscribeTyping {
        conversation: ConversationId,
        reply: oneshot::Sender<watch::Receiver<bool>>,
    },
    Shutdown,
}

/// Cloneable handle to a running [`ChatRuntime`].
#[derive(Clone)]
pub struct ChatHandle {
    requests: mpsc::Sender<Request>,
    events: broadcast::Sender<ChatEvent>,
}

impl ChatHandle {
    /// Send a message. Resolves once it is in the log as `Sent`.
    pub async fn submit(
        &self,
        conversation: ConversationId,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> Result<MessageId, RuntimeError> {
        let content = content.into();
        Ok(self.call(|reply| Request::Submit { conversation, content, kind, reply }).await??)
    }

    /// Start viewing a conversation.
    pub async fn open(&self, conversation: ConversationId) -> Result<(), RuntimeError> {
        Ok(self.call(|reply| Request::Open { conversation, reply }).await??)
    }

    /// Stop viewing a conversation, cancelling pending peer activity.
    pub async fn close(&self, conversation: ConversationId) -> Result<(), RuntimeError> {
        self.call(|reply| Request::Close { conversation, reply }).await
    }

    /// Seed a historical text message.
    pub async fn import(
        &self,
        conversation: ConversationId,
        origin: MessageOrigin,
        content: impl Into<String>,
        timestamp: Timestamp,
    ) -> Result<MessageId, RuntimeError> {
        let content = content.into();
        Ok(self
            .call(|reply| Request::Import { conversation, origin, content, timestamp, reply })
            .await??)
    }

    /// Record that `peer` was seen at `at`.
    pub async fn record_activity(&self, peer: UserId, at: Timestamp) -> Result<(), RuntimeError> {
        self.send(Request::RecordActivity { peer, at }).await
    }

    /// Snapshot of a conversation, ordered by timestamp.
    pub async fn messages(
        &self,
        conversation: ConversationId,
    ) -> Result<Vec<Message>, RuntimeError> {
        self.call(|reply| Request::Messages { conversation, reply }).await
    }

    /// Snapshot of a single message.
    pub async fn message(&self, id: MessageId) -> Result<Option<Message>, RuntimeError> {
        self.call(|reply| Request::Message { id, reply }).await
    }

    /// Presence of `peer` right now.
    pub async fn presence(&self, peer: UserId) -> Result<Presence, RuntimeError> {
        self.call(|reply| Request::Presence { peer, reply }).await
    }

    /// Typing indicator for a conversation.
    ///
    /// The receiver starts with the current value and sees every later
    /// change.
    pub async fn subscribe_typing(
        &self,
        conversation: ConversationId,
    ) -> Result<watch::Receiver<bool>, RuntimeError> {
        self.call(|reply| Request::SubscribeTyping { conversation, reply }).await
    }

    /// Subscribe to every event the simulator emits from now on.
    pub fn events(&self) -> broadcast::Receiver<ChatEvent> {
        self.events.subscribe()
    }

    /// Ask the actor to stop. Pending timers are dropped.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.send(Request::Shutdown).await
    }

    async fn send(&self, request: Request) -> Result<(), RuntimeError> {
        self.requests.send(request).await.map_err(|_| RuntimeError::Closed)
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }
}

/// Actor owning a [`ChatSimulator`].
pub struct ChatRuntime<P = CannedReplies> {
    sim: ChatSimulator<TokioEnv, P>,
    requests: mpsc::Receiver<Request>,
    events: broadcast::Sender<ChatEvent>,
    typing: HashMap<ConversationId, watch::Sender<bool>>,
}

impl<P> ChatRuntime<P>
where
    P: ReplyPolicy + Send + 'static,
{
    /// Create the actor and its first handle without starting it.
    pub fn new(sim: ChatSimulator<TokioEnv, P>) -> (Self, ChatHandle) {
        let (requests_tx, requests) = mpsc::channel(REQUEST_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let handle = ChatHandle { requests: requests_tx, events: events.clone() };
        let runtime = Self { sim, requests, events, typing: HashMap::new() };
        (runtime, handle)
    }

    /// Create the actor and spawn it on the current tokio runtime.
    pub fn spawn(sim: ChatSimulator<TokioEnv, P>) -> (ChatHandle, JoinHandle<()>) {
        let (runtime, handle) = Self::new(sim);
        (handle, tokio::spawn(runtime.run()))
    }

    /// Serve requests and fire timers until shut down or every handle is
    /// dropped.
    pub async fn run(mut self) {
        info!(user = %self.sim.local_user(), "chat runtime started");

        loop {
            let deadline = self.sim.next_deadline().map(|at| self.sim.env().instant_at(at));

            tokio::select! {
                request = self.requests.recv() => {
                    let Some(request) = request else {
                        break;
                    };
                    if !self.handle(request) {
                        break;
                    }
                },
                () = wait_until(deadline) => {
                    let events = self.sim.tick();
                    trace!(count = events.len(), "timers fired");
                    self.publish(events);
                },
            }
        }

        info!(pending = self.sim.pending_timers(), "chat runtime stopped");
    }

    /// Returns false when the actor should stop.
    fn handle(&mut self, request: Request) -> bool {
        match request {
            Request::Submit { conversation, content, kind, reply } => {
                let result = self.sim.submit_message(conversation, &content, kind).map(
                    |(id, events)| {
                        self.publish(events);
                        id
                    },
                );
                if let Err(err) = &result {
                    debug!(%conversation, %err, "submission rejected");
                }
                let _ = reply.send(result);
            },
            Request::Open { conversation, reply } => {
                let result = self.sim.open_conversation(conversation).map(|events| {
                    self.publish(events);
                });
                let _ = reply.send(result);
            },
            Request::Close { conversation, reply } => {
                let events = self.sim.close_conversation(conversation);
                self.publish(events);
                let _ = reply.send(());
            },
            Request::Import { conversation, origin, content, timestamp, reply } => {
                let result = self
                    .sim
                    .import_message(conversation, origin, &content, MessageKind::Text, timestamp)
                    .map(|(id, events)| {
                        self.publish(events);
                        id
                    });
                let _ = reply.send(result);
            },
            Request::RecordActivity { peer, at } => self.sim.record_activity(peer, at),
            Request::Messages { conversation, reply } => {
                let _ = reply.send(self.sim.messages(conversation));
            },
            Request::Message { id, reply } => {
                let _ = reply.send(self.sim.message(id).cloned());
            },
            Request::Presence { peer, reply } => {
                let _ = reply.send(self.sim.presence(peer));
            },
            Request::SubscribeTyping { conversation, reply } => {
                let typing = self.sim.is_typing(conversation);
                let receiver = self
                    .typing
                    .entry(conversation)
                    .or_insert_with(|| watch::channel(typing).0)
                    .subscribe();
                let _ = reply.send(receiver);
            },
            Request::Shutdown => return false,
        }
        true
    }

    fn publish(&mut self, events: Vec<ChatEvent>) {
        for event in events {
            if let ChatEvent::TypingChanged { conversation, typing } = event
                && let Some(sender) = self.typing.get(&conversation)
            {
                sender.send_replace(typing);
            }
            // no subscribers is fine
            let _ = self.events.send(event);
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use ephemera_core::SimulatorConfig;

    use super::*;

    const ME: UserId = UserId(1);

    #[tokio::test(start_paused = true)]
    async fn rejected_submission_surfaces_the_reason() {
        let env = TokioEnv::new(Timestamp::default(), Some(1));
        let (handle, _task) = ChatRuntime::spawn(ChatSimulator::with_config(
            env,
            ME,
            SimulatorConfig::default(),
        ));

        let conversation = ConversationId::with_peer(UserId(2));
        let result = handle.submit(conversation, "   ", MessageKind::Text).await;
        assert_eq!(result, Err(RuntimeError::Submit(SubmitError::EmptyText)));
        assert!(handle.messages(conversation).await.expect("runtime alive").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn handle_reports_closed_after_shutdown() {
        let env = TokioEnv::new(Timestamp::default(), Some(1));
        let (handle, task) = ChatRuntime::spawn(ChatSimulator::with_config(
            env,
            ME,
            SimulatorConfig::default(),
        ));

        handle.shutdown().await.expect("runtime alive");
        task.await.expect("actor exits cleanly");

        let result = handle.open(ConversationId::with_peer(UserId(2))).await;
        assert_eq!(result, Err(RuntimeError::Closed));
    }
}
