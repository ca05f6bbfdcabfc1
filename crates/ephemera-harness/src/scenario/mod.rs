//! Scenario testing with mandatory oracles.
//!
//! A scenario names its peers, scripts a sequence of user actions and
//! virtual-time steps, and must end with an oracle that verifies the final
//! [`World`]. A scenario without an oracle cannot be run.

mod builder;
pub mod oracle;
mod world;

pub use builder::{RunnableScenario, Scenario, Step};
pub use oracle::OracleFn;
pub use world::World;
