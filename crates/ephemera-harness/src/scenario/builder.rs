//! Scenario builder API.
//!
//! Provides a declarative API for constructing scenario tests that enforce
//! the Oracle Pattern.

use std::time::Duration;

use ephemera_core::{MessageKind, SimulatorConfig, UserId};

use crate::{
    driver::SimDriver,
    scenario::{OracleFn, World},
};

/// Local user in every scenario.
pub const LOCAL_USER: UserId = UserId(1);

/// One scripted action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Open a named conversation.
    Open(String),
    /// Submit a message; must be accepted.
    Submit {
        /// Peer name.
        peer: String,
        /// Content or media reference.
        content: String,
        /// Message kind.
        kind: MessageKind,
    },
    /// Submit a message that must be rejected.
    Reject {
        /// Peer name.
        peer: String,
        /// Invalid content.
        content: String,
    },
    /// Close a named conversation.
    Close(String),
    /// Advance virtual time.
    Advance(Duration),
    /// Fire timers until none remain.
    RunUntilIdle,
}

/// Scenario builder.
///
/// Declare peers, script steps, then call `.oracle()` to get a
/// [`RunnableScenario`].
pub struct Scenario {
    name: String,
    seed: u64,
    config: SimulatorConfig,
    peers: Vec<String>,
    steps: Vec<Step>,
}

impl Scenario {
    /// Create a new scenario with the given name.
    ///
    /// Unprompted peer activity is disabled unless a config enabling it is
    /// supplied.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seed: 0,
            config: SimulatorConfig::default().with_unsolicited_delay(None),
            peers: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// RNG seed for the simulated environment.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Simulator configuration.
    pub fn config(mut self, config: SimulatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a named peer.
    pub fn peer(mut self, name: impl Into<String>) -> Self {
        self.peers.push(name.into());
        self
    }

    /// Open the conversation with `peer`.
    pub fn open(mut self, peer: impl Into<String>) -> Self {
        self.steps.push(Step::Open(peer.into()));
        self
    }

    /// Send text to `peer`.
    pub fn submit(mut self, peer: impl Into<String>, text: impl Into<String>) -> Self {
        self.steps.push(Step::Submit {
            peer: peer.into(),
            content: text.into(),
            kind: MessageKind::Text,
        });
        self
    }

    /// Send an image or voice note to `peer`.
    pub fn submit_media(
        mut self,
        peer: impl Into<String>,
        kind: MessageKind,
        reference: impl Into<String>,
    ) -> Self {
        self.steps.push(Step::Submit { peer: peer.into(), content: reference.into(), kind });
        self
    }

    /// Send text to `peer` that must be rejected.
    pub fn reject(mut self, peer: impl Into<String>, text: impl Into<String>) -> Self {
        self.steps.push(Step::Reject { peer: peer.into(), content: text.into() });
        self
    }

    /// Close the conversation with `peer`.
    pub fn close(mut self, peer: impl Into<String>) -> Self {
        self.steps.push(Step::Close(peer.into()));
        self
    }

    /// Let virtual time pass.
    pub fn advance(mut self, by: Duration) -> Self {
        self.steps.push(Step::Advance(by));
        self
    }

    /// Drain all pending timers.
    pub fn run_until_idle(mut self) -> Self {
        self.steps.push(Step::RunUntilIdle);
        self
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory - you cannot run a scenario without
    /// verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Execute the scenario.
    ///
    /// Peers get user ids `2, 3, ...` in declaration order. Steps run in
    /// order against a deterministic driver; the oracle then verifies the
    /// final world.
    pub fn run(self) -> Result<(), String> {
        let name = self.scenario.name;
        let driver = SimDriver::new(self.scenario.seed, LOCAL_USER, self.scenario.config);
        let mut world = World::new(driver);

        for (index, peer) in self.scenario.peers.into_iter().enumerate() {
            world.add_peer(peer, UserId(LOCAL_USER.0 + 1 + index as u64));
        }

        let resolve = |world: &World, peer: &str| {
            world.peer(peer).ok_or_else(|| format!("Scenario '{name}': unknown peer {peer}"))
        };

        for step in self.scenario.steps {
            match step {
                Step::Open(peer) => {
                    let id = resolve(&world, &peer)?;
                    world
                        .driver_mut()
                        .open(id)
                        .map_err(|e| format!("Scenario '{name}': open {peer} failed: {e}"))?;
                    world.record_open(id);
                },
                Step::Submit { peer, content, kind } => {
                    let id = resolve(&world, &peer)?;
                    let message = world
                        .driver_mut()
                        .submit_kind(id, &content, kind)
                        .map_err(|e| format!("Scenario '{name}': submit to {peer} failed: {e}"))?;
                    world.record_submitted(message);
                    world.record_open(id);
                },
                Step::Reject { peer, content } => {
                    let id = resolve(&world, &peer)?;
                    if world.driver_mut().submit(id, &content).is_ok() {
                        return Err(format!(
                            "Scenario '{name}': submit {content:?} to {peer} should be rejected"
                        ));
                    }
                },
                Step::Close(peer) => {
                    let id = resolve(&world, &peer)?;
                    world.driver_mut().close(id);
                    world.record_close(id);
                },
                Step::Advance(by) => world.driver_mut().advance(by),
                Step::RunUntilIdle => {
                    world.driver_mut().run_until_idle();
                },
            }
        }

        (self.oracle)(&world)
    }
}
