// # ifgated - Interface Gate Daemon
//
// Thin integration layer around ifgate-core. All gate, extension and
// attribute logic lives in the library; this binary only wires the
// production collaborators together and reacts to signals.
//
// The ifgated daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime
// 3. Building the extension registry and one worker per interface
// 4. Bringing interfaces up once their requirements are met
// 5. Stopping started extensions on shutdown
//
// ## Configuration
//
// All daemon settings come from environment variables:
//
// - `IFGATE_CONFIG`: Path to the JSON configuration document (required)
// - `IFGATE_STATE`: Path to the live state JSON document (optional)
// - `IFGATE_SYSFS_ROOT`: Network class directory (default `/sys/class/net`)
// - `IFGATE_LOG_LEVEL`: trace, debug, info, warn or error (default `info`)
// - `IFGATE_POLL_INTERVAL_MS`: Requirement poll interval (default 1000)
//
// ## Signals
//
// - `SIGTERM`, `SIGINT`: stop started extensions and exit
// - `SIGHUP`: record a resolver update and a new address, so every gate
//   that is still waiting looks again
//
// ## Example
//
// ```bash
// export IFGATE_CONFIG=/etc/ifgate/config.json
// export IFGATE_STATE=/run/ifgate/state.json
// export IFGATE_LOG_LEVEL=debug
//
// ifgated
// ```

use anyhow::{Context, Result};
use ifgate_core::config::{BondingConfig, InterfaceConfig};
use ifgate_core::extension::{ExtensionDescriptor, ShellLauncher};
use ifgate_core::sysfs::SYS_CLASS_NET;
use ifgate_core::{
    Bonding, EventClass, EventCounters, ExtensionRegistry, ExtensionRunner, GateEnv, IfgateConfig,
    InterfaceWorker, RunOutcome, SysfsAttributes, TemplateEvaluator,
};
use ifgate_net::{SystemResolver, UdpProbe};
use serde_json::Value;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum IfgateExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<IfgateExitCode> for ExitCode {
    fn from(code: IfgateExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Application configuration
struct Config {
    config_path: PathBuf,
    state_path: Option<PathBuf>,
    sysfs_root: PathBuf,
    poll_interval_ms: u64,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let poll_interval_ms = match env::var("IFGATE_POLL_INTERVAL_MS") {
            Ok(value) => value
                .trim()
                .parse()
                .with_context(|| format!("IFGATE_POLL_INTERVAL_MS is not a number: {}", value))?,
            Err(_) => DEFAULT_POLL_INTERVAL_MS,
        };

        Ok(Self {
            config_path: env::var("IFGATE_CONFIG")
                .context("IFGATE_CONFIG is required. Set it via: export IFGATE_CONFIG=/etc/ifgate/config.json")?
                .into(),
            state_path: env::var("IFGATE_STATE").ok().map(PathBuf::from),
            sysfs_root: env::var("IFGATE_SYSFS_ROOT")
                .unwrap_or_else(|_| SYS_CLASS_NET.to_string())
                .into(),
            poll_interval_ms,
            log_level: env::var("IFGATE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.config_path.as_os_str().is_empty() {
            anyhow::bail!("IFGATE_CONFIG cannot be empty");
        }
        if !self.config_path.is_file() {
            anyhow::bail!(
                "IFGATE_CONFIG does not point to a file: {}",
                self.config_path.display()
            );
        }

        if let Some(ref path) = self.state_path
            && !path.is_file()
        {
            anyhow::bail!("IFGATE_STATE does not point to a file: {}", path.display());
        }

        if !(100..=60_000).contains(&self.poll_interval_ms) {
            anyhow::bail!(
                "IFGATE_POLL_INTERVAL_MS must be between 100 and 60000. Got: {}",
                self.poll_interval_ms
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "IFGATE_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return IfgateExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return IfgateExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return IfgateExitCode::ConfigError.into();
    }

    info!("Starting ifgated daemon");

    // A bad document is a configuration error, not a runtime one
    let setup = match Setup::load(&config) {
        Ok(setup) => setup,
        Err(e) => {
            error!("{:#}", e);
            return IfgateExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IfgateExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config, setup).await {
            error!("Daemon error: {:#}", e);
            IfgateExitCode::RuntimeError
        } else {
            IfgateExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Validated configuration document plus live state
struct Setup {
    document: IfgateConfig,
    registry: ExtensionRegistry,
    state: Value,
}

impl Setup {
    fn load(config: &Config) -> Result<Self> {
        let document = IfgateConfig::load(&config.config_path)
            .with_context(|| format!("loading {}", config.config_path.display()))?;
        document.validate().context("invalid configuration")?;

        let registry = ExtensionRegistry::from_config(&document.extensions)?;

        let state = match config.state_path {
            Some(ref path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str::<Value>(&text).with_context(|| format!("parsing {}", path.display()))?
            }
            None => Value::Object(Default::default()),
        };

        info!(
            "Configuration loaded: {} extension(s), {} interface(s)",
            registry.len(),
            document.interfaces.len()
        );

        Ok(Self {
            document,
            registry,
            state,
        })
    }
}

/// Shared collaborators handed to every interface task
#[derive(Clone)]
struct Shared {
    counters: Arc<EventCounters>,
    resolver: Arc<SystemResolver>,
    probe: Arc<UdpProbe>,
    store: Arc<SysfsAttributes>,
    registry: Arc<ExtensionRegistry>,
    runner: ExtensionRunner,
    state: Arc<Value>,
    started: Arc<Mutex<Vec<(ExtensionDescriptor, String)>>>,
    poll_interval: Duration,
}

/// Run the daemon
async fn run_daemon(config: Config, setup: Setup) -> Result<()> {
    let Setup {
        document,
        registry,
        state,
    } = setup;

    let runner = ExtensionRunner::new(
        Arc::new(TemplateEvaluator::new()),
        Arc::new(ShellLauncher::new(document.runner.shell.clone())),
    );

    let counters = Arc::new(EventCounters::new());
    counters.record(EventClass::AddressAcquired);

    let ctx = Shared {
        counters: counters.clone(),
        resolver: Arc::new(SystemResolver::new()),
        probe: Arc::new(UdpProbe::new()),
        store: Arc::new(SysfsAttributes::with_root(config.sysfs_root.clone())),
        registry: Arc::new(registry),
        runner,
        state: Arc::new(state),
        started: Arc::new(Mutex::new(Vec::new())),
        poll_interval: config.poll_interval(),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();
    for interface in document.interfaces {
        let worker = InterfaceWorker::from_config(&interface)?;
        tasks.push(tokio::spawn(bring_up(ctx.clone(), worker, interface, shutdown_rx.clone())));
    }

    info!("Daemon initialized successfully");

    let mut signals = Signals::new()?;
    loop {
        match signals.recv().await {
            DaemonSignal::Shutdown(name) => {
                info!("Received shutdown signal: {}", name);
                break;
            }
            DaemonSignal::Recheck => {
                info!("Received SIGHUP, re-checking pending requirements");
                counters.record(EventClass::ResolverUpdated);
                counters.record(EventClass::AddressAcquired);
            }
        }
    }

    // In-flight starts run to completion so they are recorded before the stop pass
    let _ = shutdown_tx.send(true);
    for task in tasks {
        if let Err(e) = task.await {
            error!("interface task failed: {}", e);
        }
    }

    stop_extensions(&ctx).await;
    info!("Shutting down daemon");
    Ok(())
}

/// Wait for the requirements of one interface, then configure it
///
/// Shutdown ends the wait and prevents further starts. A start that is
/// already running completes and is recorded.
async fn bring_up(
    ctx: Shared,
    mut worker: InterfaceWorker,
    interface: InterfaceConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(ctx.poll_interval);
    loop {
        if *shutdown.borrow() {
            debug!("{}: shutdown before requirements were met", worker.name());
            return;
        }
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    return;
                }
                continue;
            }
        }
        let env = GateEnv {
            events: ctx.counters.snapshot(),
            resolver: ctx.resolver.as_ref(),
            probe: ctx.probe.as_ref(),
        };
        if worker.requirements_met(&env).await {
            break;
        }
    }
    info!("{}: requirements met, bringing up", worker.name());

    if let Some(ref bonding) = interface.bonding {
        configure_bonding(&ctx, &interface.name, bonding).await;
    }

    for extension in &interface.extensions {
        if *shutdown.borrow() {
            debug!("{}: shutdown, not starting further extensions", interface.name);
            break;
        }
        let family = match extension.family() {
            Ok(family) => family,
            Err(e) => {
                error!("{}: {}", interface.name, e);
                continue;
            }
        };
        let Some(descriptor) = ctx.registry.find(extension.service_type, family) else {
            warn!(
                "{}: no {} extension for family {}",
                interface.name, extension.service_type, family
            );
            continue;
        };

        let descriptor = descriptor.clone();
        let runner = ctx.runner.clone();
        let state = ctx.state.clone();
        let ifname = interface.name.clone();
        let job = {
            let descriptor = descriptor.clone();
            tokio::task::spawn_blocking(move || runner.start(&descriptor, &ifname, &state))
        };

        match job.await {
            Ok(Ok(RunOutcome::Completed)) => {
                info!("{}: started extension {}", interface.name, descriptor.name());
                ctx.started.lock().await.push((descriptor, interface.name.clone()));
            }
            Ok(Ok(RunOutcome::Skipped)) => {
                debug!("{}: extension {} has no start command", interface.name, descriptor.name());
            }
            Ok(Err(e)) => error!("{}: {}", interface.name, e),
            Err(e) => error!("{}: extension task failed: {}", interface.name, e),
        }
    }
}

async fn configure_bonding(ctx: &Shared, ifname: &str, config: &BondingConfig) {
    let bonding = Bonding::new(ctx.store.as_ref());
    if !bonding.is_master(ifname).await {
        warn!("{}: bonding configured, but interface is not a bonding master", ifname);
        return;
    }

    for attribute in &config.attributes {
        if let Err(e) = bonding.set_attr(ifname, &attribute.name, &attribute.value).await {
            error!("{}: {}", ifname, e);
        }
    }

    if !config.arp_ip_target.is_empty() {
        match bonding
            .set_list_attr(ifname, "arp_ip_target", &config.arp_ip_target)
            .await
        {
            Ok(report) => debug!("{}: arp_ip_target updated with {} write(s)", ifname, report.writes()),
            Err(e) => error!("{}: {}", ifname, e),
        }
    }
}

/// Stop started extensions, most recently started first
async fn stop_extensions(ctx: &Shared) {
    let started = std::mem::take(&mut *ctx.started.lock().await);
    for (descriptor, ifname) in started.into_iter().rev() {
        let runner = ctx.runner.clone();
        let state = ctx.state.clone();
        let name = descriptor.name().to_string();
        let label = ifname.clone();
        let job = tokio::task::spawn_blocking(move || runner.stop(&descriptor, &ifname, &state));
        match job.await {
            Ok(Ok(_)) => info!("{}: stopped extension {}", label, name),
            Ok(Err(e)) => error!("{}: {}", label, e),
            Err(e) => error!("{}: extension task failed: {}", label, e),
        }
    }
}

enum DaemonSignal {
    Shutdown(&'static str),
    Recheck,
}

#[cfg(unix)]
struct Signals {
    sigterm: Signal,
    sigint: Signal,
    sighup: Signal,
}

#[cfg(unix)]
impl Signals {
    fn new() -> Result<Self> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?,
            sigint: signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?,
            sighup: signal(SignalKind::hangup()).context("Failed to setup SIGHUP handler")?,
        })
    }

    async fn recv(&mut self) -> DaemonSignal {
        tokio::select! {
            _ = self.sigterm.recv() => DaemonSignal::Shutdown("SIGTERM"),
            _ = self.sigint.recv() => DaemonSignal::Shutdown("SIGINT"),
            _ = self.sighup.recv() => DaemonSignal::Recheck,
        }
    }
}

/// Fallback for non-Unix platforms: CTRL-C only
#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn new() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> DaemonSignal {
        let _ = tokio::signal::ctrl_c().await;
        DaemonSignal::Shutdown("SIGINT")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use ifgate_core::config::{ExtensionRef, ReachabilityConfig, RequirementConfig, ServiceType};
    use std::path::Path;

    fn shared(registry: ExtensionRegistry, sysfs: &Path) -> Shared {
        Shared {
            counters: Arc::new(EventCounters::new()),
            resolver: Arc::new(SystemResolver::new()),
            probe: Arc::new(UdpProbe::new()),
            store: Arc::new(SysfsAttributes::with_root(sysfs)),
            registry: Arc::new(registry),
            runner: ExtensionRunner::new(
                Arc::new(TemplateEvaluator::new()),
                Arc::new(ShellLauncher::default()),
            ),
            state: Arc::new(Value::Object(Default::default())),
            started: Arc::new(Mutex::new(Vec::new())),
            poll_interval: Duration::from_millis(20),
        }
    }

    fn script_ref() -> ExtensionRef {
        ExtensionRef {
            service_type: ServiceType::Script,
            family: None,
        }
    }

    #[tokio::test]
    async fn test_shutdown_ends_requirement_wait() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = shared(ExtensionRegistry::new(), dir.path());

        let mut interface = InterfaceConfig::new("eth0");
        interface.requires.push(RequirementConfig::Reachable(ReachabilityConfig::new(
            "gw.example.net",
        )));
        interface.extensions.push(script_ref());
        let worker = InterfaceWorker::from_config(&interface).unwrap();

        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(bring_up(ctx.clone(), worker, interface, rx));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!task.is_finished(), "no address acquired, still waiting");

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("bring-up did not stop")
            .unwrap();
        assert!(ctx.started.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_in_flight_start_is_recorded_and_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let marker = |name: &str| dir.path().join(name);

        let mut registry = ExtensionRegistry::new();
        registry.register(
            ExtensionDescriptor::new("slow", ServiceType::Script)
                .with_start(
                    format!(
                        "touch {begun}; sleep 0.3; echo x >> {done}",
                        begun = marker("begun").display(),
                        done = marker("done").display()
                    )
                    .as_str(),
                )
                .with_stop(format!("touch {}", marker("stopped").display()).as_str()),
        );
        let ctx = shared(registry, dir.path());

        let mut interface = InterfaceConfig::new("eth0");
        interface.extensions.push(script_ref());
        interface.extensions.push(script_ref());
        let worker = InterfaceWorker::from_config(&interface).unwrap();

        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(bring_up(ctx.clone(), worker, interface, rx));
        for _ in 0..500 {
            if marker("begun").exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(marker("begun").exists(), "start command never ran");

        tx.send(true).unwrap();
        task.await.unwrap();

        // The running start finished and was recorded, the second one never began
        let done = std::fs::read_to_string(marker("done")).unwrap();
        assert_eq!(done.lines().count(), 1);
        assert_eq!(ctx.started.lock().await.len(), 1);

        stop_extensions(&ctx).await;
        assert!(marker("stopped").exists());
        assert!(ctx.started.lock().await.is_empty());
    }
}
