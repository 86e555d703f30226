//! Interface worker
//!
//! Owns the requirements attached to one interface and polls them.

use tracing::{debug, trace};

use crate::config::InterfaceConfig;
use crate::gate::{GateEnv, Readiness, Requirement};

/// Per-interface owner of requirement gates
#[derive(Debug)]
pub struct InterfaceWorker {
    name: String,
    requirements: Vec<Requirement>,
}

impl InterfaceWorker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirements: Vec::new(),
        }
    }

    /// Build a worker with the requirements listed in `config`
    ///
    /// # Errors
    ///
    /// Returns the first requirement configuration error.
    pub fn from_config(config: &InterfaceConfig) -> Result<Self, crate::Error> {
        let mut worker = Self::new(&config.name);
        for requirement in &config.requires {
            worker.attach(Requirement::from_config(requirement)?);
        }
        Ok(worker)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach a requirement; evaluation follows attachment order
    pub fn attach(&mut self, requirement: Requirement) {
        debug!("{}: attaching requirement {}", self.name, requirement.describe());
        self.requirements.push(requirement);
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Poll every requirement, stopping at the first one not ready
    ///
    /// A worker without requirements is always ready.
    pub async fn requirements_met(&mut self, env: &GateEnv<'_>) -> bool {
        for requirement in &mut self.requirements {
            if requirement.evaluate(env).await == Readiness::NotReady {
                trace!("{}: waiting for {}", self.name, requirement.describe());
                return false;
            }
        }
        true
    }
}
