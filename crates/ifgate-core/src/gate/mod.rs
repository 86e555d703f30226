//! Requirement gates
//!
//! A requirement is a cacheable, pollable precondition that blocks an
//! interface transition until it is satisfied. The owning worker polls it;
//! nothing pushes into it.
//!
//! ## Caching
//!
//! Every requirement remembers the global event sequence at which it last
//! fully evaluated. Variants compare that against the per-class counters in
//! [`GateEnv::events`] and short-circuit to [`Readiness::NotReady`] without
//! any I/O when nothing relevant happened since.
//!
//! ## Variants
//!
//! The set of gate variants is closed ([`Gate`]); each variant owns its
//! typed state, which is released when the requirement is dropped.

pub mod reachability;

pub use reachability::ReachabilityCheck;

use crate::config::RequirementConfig;
use crate::events::EventSnapshot;
use crate::traits::{HostResolver, ReachabilityProbe};

/// Outcome of a requirement evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    NotReady,
}

impl Readiness {
    pub fn is_ready(self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

/// Everything a gate may consult during one evaluation
pub struct GateEnv<'a> {
    /// Event counters at the start of this evaluation round
    pub events: EventSnapshot,
    /// Hostname resolver
    pub resolver: &'a dyn HostResolver,
    /// Reachability probe
    pub probe: &'a dyn ReachabilityProbe,
}

/// Closed set of gate variants
#[derive(Debug)]
pub enum Gate {
    /// Host must resolve and be reachable
    Reachable(ReachabilityCheck),
}

/// A gate plus its cache bookkeeping
#[derive(Debug)]
pub struct Requirement {
    gate: Gate,
    event_seq: u64,
}

impl Requirement {
    /// Wrap a gate; it has never evaluated (sequence 0)
    pub fn new(gate: Gate) -> Self {
        Self { gate, event_seq: 0 }
    }

    /// Build a requirement from configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is malformed; no
    /// requirement is produced in that case.
    pub fn from_config(config: &RequirementConfig) -> Result<Self, crate::Error> {
        let gate = match config {
            RequirementConfig::Reachable(check) => {
                Gate::Reachable(ReachabilityCheck::from_config(check)?)
            }
        };
        Ok(Self::new(gate))
    }

    /// Evaluate the requirement
    ///
    /// Takes `&mut self`: a requirement is never evaluated concurrently
    /// with itself.
    pub async fn evaluate(&mut self, env: &GateEnv<'_>) -> Readiness {
        match &mut self.gate {
            Gate::Reachable(check) => check.evaluate(&mut self.event_seq, env).await,
        }
    }

    /// Event sequence recorded at the last full evaluation
    pub fn event_seq(&self) -> u64 {
        self.event_seq
    }

    /// The underlying gate
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Short human-readable description for logs
    pub fn describe(&self) -> String {
        match &self.gate {
            Gate::Reachable(check) => format!("reachable {}", check.hostname()),
        }
    }
}
