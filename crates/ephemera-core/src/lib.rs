//! Ephemera chat simulation core
//!
//! Pure state machine logic for the simulated chat engine, completely
//! decoupled from I/O. This enables deterministic testing of every timer
//! interleaving.
//!
//! # Architecture
//!
//! The simulator owns the message log and a queue of pending timers. It never
//! reads a clock or an entropy source directly: time and randomness are
//! supplied through the [`Environment`] trait, and deferred work only happens
//! when the caller invokes [`ChatSimulator::tick`].
//!
//! Every operation returns [`ChatEvent`]s describing what changed rather than
//! pushing updates anywhere. A runtime or test harness is responsible for
//! turning those events into UI updates.
//!
//! # Components
//!
//! - [`simulator`]: Message lifecycle simulator (status progression, replies)
//! - [`timer`]: Cancellable deadline-ordered timer queue
//! - [`log`]: Per-conversation append-only message log
//! - [`replies`]: Auto-reply corpus policy
//! - [`presence`]: Peer activity presence
//! - [`mod@env`]: Environment abstraction (time, RNG)
//! - [`error`]: Validation and transition errors

pub mod config;
pub mod env;
pub mod error;
pub mod event;
pub mod log;
pub mod presence;
pub mod replies;
pub mod simulator;
pub mod timer;
pub mod types;

pub use config::{DelayRange, SimulatorConfig};
pub use env::Environment;
pub use error::{SubmitError, TransitionError};
pub use event::ChatEvent;
pub use log::MessageLog;
pub use presence::Presence;
pub use replies::{CannedReplies, ReplyPolicy, ReplyTrigger};
pub use simulator::ChatSimulator;
pub use timer::{TimerId, TimerQueue};
pub use types::{
    ConversationId, Message, MessageId, MessageKind, MessageOrigin, MessageStatus, Timestamp,
    UserId,
};
