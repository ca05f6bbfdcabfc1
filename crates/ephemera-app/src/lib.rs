//! Application layer for Ephemera
//!
//! Runs the pure [`ephemera_core::ChatSimulator`] against tokio time and puts
//! a line-oriented terminal front end on top of it.
//!
//! # Components
//!
//! - [`ChatRuntime`]: actor task that owns the simulator and fires its timers
//! - [`ChatHandle`]: cloneable handle for commands, queries and subscriptions
//! - [`TokioEnv`]: environment backed by the tokio clock (pausable in tests)
//! - [`Session`]: terminal session translating [`Command`]s into runtime calls

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod commands;
pub mod demo;
pub mod env;
pub mod render;
pub mod runtime;
pub mod session;

pub use commands::Command;
pub use env::TokioEnv;
pub use runtime::{ChatHandle, ChatRuntime, RuntimeError};
pub use session::{CliError, Flow, Session};
