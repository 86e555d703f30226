//! Minimal embedding example for ifgate-core
//!
//! Drives one interface by hand: a reachability requirement answered by
//! an in-process host table, a bonding list attribute kept in memory, and
//! an extension started through the system shell.

use async_trait::async_trait;
use ifgate_core::config::ServiceType;
use ifgate_core::extension::ShellLauncher;
use ifgate_core::gate::{Gate, ReachabilityCheck};
use ifgate_core::traits::{HostResolver, ReachabilityProbe};
use ifgate_core::{
    AddressFamily, AttributeListReconciler, EventClass, EventCounters, ExtensionDescriptor,
    ExtensionRegistry, ExtensionRunner, GateEnv, InterfaceWorker, MemoryAttributes, Requirement,
    Result, TemplateEvaluator,
};
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Resolver answering from a fixed table
struct StaticHosts {
    hosts: HashMap<String, IpAddr>,
}

#[async_trait]
impl HostResolver for StaticHosts {
    async fn resolve(&self, hostname: &str, family: AddressFamily, _timeout: Duration) -> Result<Option<IpAddr>> {
        Ok(self
            .hosts
            .get(hostname)
            .copied()
            .filter(|addr| family.admits(addr)))
    }
}

/// Probe that considers every private address reachable
struct PrivateOnly;

#[async_trait]
impl ReachabilityProbe for PrivateOnly {
    async fn probe(&self, _hostname: &str, address: IpAddr) -> Result<bool> {
        Ok(match address {
            IpAddr::V4(v4) => v4.is_private(),
            IpAddr::V6(_) => false,
        })
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let resolver = StaticHosts {
        hosts: HashMap::from([("gateway".to_string(), IpAddr::from([10, 0, 0, 1]))]),
    };
    let probe = PrivateOnly;
    let counters = EventCounters::new();

    let mut worker = InterfaceWorker::new("bond0");
    worker.attach(Requirement::new(Gate::Reachable(ReachabilityCheck::new(
        "gateway",
        AddressFamily::Ipv4,
    )?)));

    // Before any address was acquired the gate does not even look
    let env = GateEnv {
        events: counters.snapshot(),
        resolver: &resolver,
        probe: &probe,
    };
    tracing::info!("requirements met before DHCP: {}", worker.requirements_met(&env).await);

    counters.record(EventClass::AddressAcquired);
    let env = GateEnv {
        events: counters.snapshot(),
        resolver: &resolver,
        probe: &probe,
    };
    let ready = worker.requirements_met(&env).await;
    tracing::info!("requirements met after DHCP: {}", ready);
    if !ready {
        return Ok(());
    }

    // Converge the ARP monitoring targets
    let store = MemoryAttributes::new();
    store
        .insert_list("bond0/bonding/arp_ip_target", &["10.0.0.254"])
        .await;
    let report = AttributeListReconciler::new(&store)
        .sync(Path::new("bond0/bonding/arp_ip_target"), &["10.0.0.1", "10.0.0.2"])
        .await?;
    tracing::info!(
        "arp_ip_target: removed {:?}, added {:?}",
        report.removed,
        report.added
    );

    // Start a script extension for the interface
    let mut registry = ExtensionRegistry::new();
    registry.register(
        ExtensionDescriptor::new("announce", ServiceType::Script)
            .with_env("IFGATE_GATEWAY=%{/gateway}")
            .with_start("echo \"%{ifname} is up, gateway $IFGATE_GATEWAY\""),
    );

    let state = serde_json::json!({ "gateway": "10.0.0.1" });
    let runner = ExtensionRunner::new(Arc::new(TemplateEvaluator::new()), Arc::new(ShellLauncher::default()));
    if let Some(descriptor) = registry.find(ServiceType::Script, AddressFamily::Ipv4).cloned() {
        let name = descriptor.name().to_string();
        let outcome = tokio::task::spawn_blocking(move || runner.start(&descriptor, "bond0", &state)).await??;
        tracing::info!("extension {}: {:?}", name, outcome);
    }

    Ok(())
}
