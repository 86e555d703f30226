//! Extension descriptors
//!
//! A descriptor describes an externally managed helper service: how to
//! start and stop it, which environment to hand it, and how to tell
//! whether it is running. All of these are expressions evaluated at
//! invocation time.

use crate::config::{ExtensionConfig, ServiceType};
use crate::family::FamilyMask;
use crate::traits::Expression;

/// Immutable description of an extension service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionDescriptor {
    name: String,
    service_type: ServiceType,
    families: FamilyMask,
    pid_file: Option<Expression>,
    start: Option<Expression>,
    stop: Option<Expression>,
    environment: Vec<Expression>,
}

impl ExtensionDescriptor {
    /// Create a descriptor supporting every family, with no commands
    pub fn new(name: impl Into<String>, service_type: ServiceType) -> Self {
        Self {
            name: name.into(),
            service_type,
            families: FamilyMask::ALL,
            pid_file: None,
            start: None,
            stop: None,
            environment: Vec::new(),
        }
    }

    /// Build a descriptor from configuration
    pub fn from_config(config: &ExtensionConfig) -> Result<Self, crate::Error> {
        config.validate()?;
        Ok(Self {
            name: config.name.clone(),
            service_type: config.service_type,
            families: config.family_mask()?,
            pid_file: config.pid_file.clone(),
            start: config.start.clone(),
            stop: config.stop.clone(),
            environment: config.environment.clone(),
        })
    }

    /// Restrict the supported families
    pub fn with_families(mut self, families: FamilyMask) -> Self {
        self.families = families;
        self
    }

    /// Set the pid file expression used for liveness checks
    pub fn with_pid_file(mut self, expression: impl Into<Expression>) -> Self {
        self.pid_file = Some(expression.into());
        self
    }

    /// Set the start command expression
    pub fn with_start(mut self, expression: impl Into<Expression>) -> Self {
        self.start = Some(expression.into());
        self
    }

    /// Set the stop command expression
    pub fn with_stop(mut self, expression: impl Into<Expression>) -> Self {
        self.stop = Some(expression.into());
        self
    }

    /// Append an environment expression
    pub fn with_env(mut self, expression: impl Into<Expression>) -> Self {
        self.environment.push(expression.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    pub fn families(&self) -> FamilyMask {
        self.families
    }

    pub fn pid_file(&self) -> Option<&Expression> {
        self.pid_file.as_ref()
    }

    pub fn start(&self) -> Option<&Expression> {
        self.start.as_ref()
    }

    pub fn stop(&self) -> Option<&Expression> {
        self.stop.as_ref()
    }

    pub fn environment(&self) -> &[Expression] {
        &self.environment
    }
}
