//! Extension runner
//!
//! Runs a descriptor's start or stop command for one interface and
//! decides whether it worked.
//!
//! ## Flow
//!
//! 1. No command configured: nothing to do
//! 2. Evaluate environment expressions (0 or 1 result each)
//! 3. Evaluate the command expression (exactly 1 result)
//! 4. Spawn `<shell> -c <command>` and block until it terminates
//! 5. Classify the exit, then cross-check with the liveness test
//!
//! Any evaluation problem aborts before a process is spawned.
//!
//! ## Blocking
//!
//! `run` blocks the calling thread for the whole lifetime of the child,
//! with no timeout. Async callers should hand it to
//! `tokio::task::spawn_blocking`. One call runs one command; parallelism
//! across interfaces is the caller's business.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use super::process::{ExitOutcome, ProcessLauncher, ShellCommand};
use super::registry;
use super::ExtensionDescriptor;
use crate::error::{Error, ProcessFailure, Result};
use crate::traits::{Expression, ExpressionEvaluator, LiveState};

/// Which command of a descriptor to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Start,
    Stop,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Start => f.write_str("start"),
            CommandKind::Stop => f.write_str("stop"),
        }
    }
}

/// Successful outcome of [`ExtensionRunner::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No command configured; nothing was spawned
    Skipped,
    /// The command ran and all post-conditions hold
    Completed,
}

/// Runs extension start/stop commands
#[derive(Clone)]
pub struct ExtensionRunner {
    evaluator: Arc<dyn ExpressionEvaluator>,
    launcher: Arc<dyn ProcessLauncher>,
}

impl ExtensionRunner {
    pub fn new(evaluator: Arc<dyn ExpressionEvaluator>, launcher: Arc<dyn ProcessLauncher>) -> Self {
        Self {
            evaluator,
            launcher,
        }
    }

    /// Start the extension for `interface`
    pub fn start(
        &self,
        descriptor: &ExtensionDescriptor,
        interface: &str,
        state: &LiveState,
    ) -> Result<RunOutcome> {
        self.run(descriptor, interface, state, CommandKind::Start)
    }

    /// Stop the extension for `interface`
    pub fn stop(
        &self,
        descriptor: &ExtensionDescriptor,
        interface: &str,
        state: &LiveState,
    ) -> Result<RunOutcome> {
        self.run(descriptor, interface, state, CommandKind::Stop)
    }

    /// Liveness check, see [`registry::is_active`]
    pub fn is_active(
        &self,
        descriptor: &ExtensionDescriptor,
        interface: &str,
        state: &LiveState,
    ) -> bool {
        registry::is_active(self.evaluator.as_ref(), descriptor, interface, state)
    }

    /// Run the `which` command of `descriptor` for `interface`
    ///
    /// # Returns
    ///
    /// - `Ok(RunOutcome::Skipped)`: No such command configured
    /// - `Ok(RunOutcome::Completed)`: Exit status 0 and liveness agrees
    /// - `Err(Error::Evaluation)`: An expression had the wrong result count;
    ///   nothing was spawned
    /// - `Err(Error::Process)`: Spawn failure, abnormal termination, nonzero
    ///   exit, or liveness mismatch
    pub fn run(
        &self,
        descriptor: &ExtensionDescriptor,
        interface: &str,
        state: &LiveState,
        which: CommandKind,
    ) -> Result<RunOutcome> {
        let command = match which {
            CommandKind::Start => descriptor.start(),
            CommandKind::Stop => descriptor.stop(),
        };
        let Some(command) = command else {
            return Ok(RunOutcome::Skipped);
        };

        debug!("{} extension {} for interface {}", which, descriptor.name(), interface);

        let mut environment = Vec::with_capacity(descriptor.environment().len());
        for expression in descriptor.environment() {
            let mut results = self.evaluate(descriptor, interface, state, which, expression)?;
            if results.len() > 1 {
                return Err(self.cardinality_error(descriptor, interface, which, expression, results.len()));
            }
            if let Some(entry) = results.pop() {
                debug!("  putenv {}", entry);
                environment.push(entry);
            }
        }

        let mut results = self.evaluate(descriptor, interface, state, which, command)?;
        if results.len() != 1 {
            return Err(self.cardinality_error(descriptor, interface, which, command, results.len()));
        }
        let command = ShellCommand {
            command: results.remove(0),
            environment,
        };

        debug!("  run {}", command.command);

        let mut child = self.launcher.spawn(&command).map_err(|e| {
            error!("extension {}: unable to spawn {} command: {}", descriptor.name(), which, e);
            Error::process(descriptor.name(), which.to_string(), ProcessFailure::SpawnFailed(e.to_string()))
        })?;

        let outcome = child.wait().map_err(|e| {
            error!("error waiting for extension process to finish: {}", e);
            Error::process(descriptor.name(), which.to_string(), ProcessFailure::WaitFailed(e.to_string()))
        })?;

        self.classify(descriptor, interface, state, which, outcome)
    }

    fn classify(
        &self,
        descriptor: &ExtensionDescriptor,
        interface: &str,
        state: &LiveState,
        which: CommandKind,
        outcome: ExitOutcome,
    ) -> Result<RunOutcome> {
        let failure = match outcome {
            ExitOutcome::Signaled(signal) => Some(ProcessFailure::Abnormal {
                signal: Some(signal),
            }),
            ExitOutcome::Unknown => Some(ProcessFailure::Abnormal { signal: None }),
            ExitOutcome::Exited(code) if code != 0 => Some(ProcessFailure::ExitStatus(code)),
            ExitOutcome::Exited(_) if descriptor.pid_file().is_some() => {
                let active = self.is_active(descriptor, interface, state);
                match (which, active) {
                    (CommandKind::Start, false) => Some(ProcessFailure::NotRunning),
                    (CommandKind::Stop, true) => Some(ProcessFailure::StillRunning),
                    _ => None,
                }
            }
            ExitOutcome::Exited(_) => None,
        };

        match failure {
            None => {
                debug!("extension {}: {} command succeeded for {}", descriptor.name(), which, interface);
                Ok(RunOutcome::Completed)
            }
            Some(failure) => {
                error!("extension {}: {} command {}", descriptor.name(), which, failure);
                Err(Error::process(descriptor.name(), which.to_string(), failure))
            }
        }
    }

    fn evaluate(
        &self,
        descriptor: &ExtensionDescriptor,
        interface: &str,
        state: &LiveState,
        which: CommandKind,
        expression: &Expression,
    ) -> Result<Vec<String>> {
        self.evaluator
            .evaluate(expression, interface, state)
            .map_err(|e| {
                error!(
                    "unable to {} extension {} for {}: error evaluating expression: {}",
                    which,
                    descriptor.name(),
                    interface,
                    e
                );
                Error::evaluation(
                    format!("{} {}", descriptor.name(), interface),
                    format!("{} expression \"{}\": {}", which, expression, e),
                )
            })
    }

    fn cardinality_error(
        &self,
        descriptor: &ExtensionDescriptor,
        interface: &str,
        which: CommandKind,
        expression: &Expression,
        count: usize,
    ) -> Error {
        error!(
            "unable to {} extension {} for {}: expression \"{}\" yielded {} results",
            which,
            descriptor.name(),
            interface,
            expression,
            count
        );
        Error::evaluation(
            format!("{} {}", descriptor.name(), interface),
            format!("{} expression \"{}\" yielded {} results", which, expression, count),
        )
    }
}

impl fmt::Debug for ExtensionRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRunner").finish_non_exhaustive()
    }
}
