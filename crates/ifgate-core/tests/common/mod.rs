//! Test doubles and common utilities for contract tests
//!
//! The doubles count every call so tests can assert that something did
//! NOT happen (no lookup, no spawn, no write).

#![allow(dead_code)]

use async_trait::async_trait;
use ifgate_core::error::{Error, Result};
use ifgate_core::extension::{ChildProcess, ExitOutcome, ProcessLauncher, ShellCommand};
use ifgate_core::traits::{Expression, ExpressionEvaluator, HostResolver, LiveState, ReachabilityProbe};
use ifgate_core::{AddressFamily, EventClass, EventCounters};
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Resolver returning a fixed answer
pub struct CountingResolver {
    answer: Mutex<Option<IpAddr>>,
    calls: Arc<AtomicUsize>,
    families: Mutex<Vec<AddressFamily>>,
}

impl CountingResolver {
    pub fn new(answer: Option<IpAddr>) -> Self {
        Self {
            answer: Mutex::new(answer),
            calls: Arc::new(AtomicUsize::new(0)),
            families: Mutex::new(Vec::new()),
        }
    }

    /// Change the answer for subsequent lookups
    pub fn set_answer(&self, answer: Option<IpAddr>) {
        *self.answer.lock().unwrap() = answer;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Families requested, in call order
    pub fn families(&self) -> Vec<AddressFamily> {
        self.families.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostResolver for CountingResolver {
    async fn resolve(
        &self,
        _hostname: &str,
        family: AddressFamily,
        _timeout: Duration,
    ) -> Result<Option<IpAddr>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.families.lock().unwrap().push(family);
        Ok(*self.answer.lock().unwrap())
    }
}

/// Probe reporting a fixed reachability
pub struct CountingProbe {
    reachable: Mutex<bool>,
    calls: Arc<AtomicUsize>,
    addresses: Mutex<Vec<IpAddr>>,
}

impl CountingProbe {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable: Mutex::new(reachable),
            calls: Arc::new(AtomicUsize::new(0)),
            addresses: Mutex::new(Vec::new()),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        *self.reachable.lock().unwrap() = reachable;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Addresses probed, in call order
    pub fn addresses(&self) -> Vec<IpAddr> {
        self.addresses.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReachabilityProbe for CountingProbe {
    async fn probe(&self, _hostname: &str, address: IpAddr) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.addresses.lock().unwrap().push(address);
        Ok(*self.reachable.lock().unwrap())
    }
}

/// Evaluator answering from a fixed table
///
/// Expressions not in the table evaluate to their own text.
#[derive(Default)]
pub struct MapEvaluator {
    table: HashMap<String, Vec<String>>,
}

impl MapEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, expression: &str, results: &[&str]) -> Self {
        self.table.insert(
            expression.to_string(),
            results.iter().map(|s| s.to_string()).collect(),
        );
        self
    }
}

impl ExpressionEvaluator for MapEvaluator {
    fn evaluate(&self, expression: &Expression, _interface: &str, _state: &LiveState) -> Result<Vec<String>> {
        Ok(self
            .table
            .get(expression.as_str())
            .cloned()
            .unwrap_or_else(|| vec![expression.as_str().to_string()]))
    }
}

/// Side effect a scripted child performs before it "exits"
#[derive(Debug, Clone)]
pub enum PidFileAction {
    None,
    Create(PathBuf),
    Remove(PathBuf),
}

/// Launcher whose children exit with a scripted outcome
pub struct CountingLauncher {
    outcome: ExitOutcome,
    action: PidFileAction,
    fail_spawn: bool,
    spawns: Arc<AtomicUsize>,
    commands: Arc<Mutex<Vec<ShellCommand>>>,
}

impl CountingLauncher {
    pub fn new(outcome: ExitOutcome) -> Self {
        Self {
            outcome,
            action: PidFileAction::None,
            fail_spawn: false,
            spawns: Arc::new(AtomicUsize::new(0)),
            commands: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_action(mut self, action: PidFileAction) -> Self {
        self.action = action;
        self
    }

    pub fn failing_spawn(mut self) -> Self {
        self.fail_spawn = true;
        self
    }

    pub fn spawn_count(&self) -> usize {
        self.spawns.load(Ordering::SeqCst)
    }

    /// Commands spawned so far
    pub fn commands(&self) -> Vec<ShellCommand> {
        self.commands.lock().unwrap().clone()
    }
}

impl ProcessLauncher for CountingLauncher {
    fn spawn(&self, command: &ShellCommand) -> std::io::Result<Box<dyn ChildProcess>> {
        if self.fail_spawn {
            return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no shell"));
        }
        self.spawns.fetch_add(1, Ordering::SeqCst);
        self.commands.lock().unwrap().push(command.clone());
        Ok(Box::new(ScriptedChild {
            outcome: self.outcome,
            action: self.action.clone(),
        }))
    }
}

struct ScriptedChild {
    outcome: ExitOutcome,
    action: PidFileAction,
}

impl ChildProcess for ScriptedChild {
    fn id(&self) -> u32 {
        4242
    }

    fn wait(&mut self) -> std::io::Result<ExitOutcome> {
        match &self.action {
            PidFileAction::None => {}
            PidFileAction::Create(path) => std::fs::write(path, "4242\n")?,
            PidFileAction::Remove(path) => {
                let _ = std::fs::remove_file(path);
            }
        }
        Ok(self.outcome)
    }
}

/// Counters after `count` AddressAcquired events
pub fn counters_with_addresses(count: usize) -> EventCounters {
    let counters = EventCounters::new();
    for _ in 0..count {
        counters.record(EventClass::AddressAcquired);
    }
    counters
}

/// Shorthand for an evaluation-error check
pub fn is_evaluation_error(result: &Result<ifgate_core::RunOutcome>) -> bool {
    matches!(result, Err(Error::Evaluation { .. }))
}
