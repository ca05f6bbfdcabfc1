//! Deterministic simulation harness for Ephemera.
//!
//! Virtual-clock implementation of the [`ephemera_core::Environment`] trait
//! plus a driver that steps simulated time timer by timer, recording every
//! event, so tests can observe each intermediate state reproducibly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod driver;
pub mod model;
pub mod scenario;
pub mod sim_env;

pub use driver::SimDriver;
pub use model::{ModelWorld, Operation};
pub use sim_env::SimEnv;
