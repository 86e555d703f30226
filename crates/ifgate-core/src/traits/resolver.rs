// # Resolver and Reachability Traits
//
// Network collaborators used by the reachability gate.
//
// ## Implementations
//
// - System resolver and UDP-connect probe: `ifgate-net` crate
// - Counting doubles: `ifgate-core` contract tests
//
// ## Usage
//
// ```rust,ignore
// use ifgate_core::traits::{HostResolver, ReachabilityProbe};
// use ifgate_core::AddressFamily;
// use std::time::Duration;
//
// let addr = resolver
//     .resolve("gw.example.net", AddressFamily::Ipv4, Duration::from_secs(1))
//     .await?;
// if let Some(addr) = addr {
//     let reachable = probe.probe("gw.example.net", addr).await?;
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

use crate::family::AddressFamily;

/// Trait for hostname resolution with a bounded timeout
///
/// # Contract
///
/// - MUST return within roughly `timeout`; a lookup that does not finish
///   in time is reported as `Ok(None)`, not as a hang
/// - MUST only return addresses admitted by `family`
/// - Literal addresses resolve to themselves
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Resolve `hostname` to a single address
    ///
    /// # Returns
    ///
    /// - `Ok(Some(addr))`: First usable address
    /// - `Ok(None)`: Name has no address of the requested family, or timed out
    /// - `Err(Error)`: The resolver itself failed
    async fn resolve(
        &self,
        hostname: &str,
        family: AddressFamily,
        timeout: Duration,
    ) -> Result<Option<IpAddr>, crate::Error>;
}

/// Trait for reachability probes
///
/// A probe answers "is there a route to this address" without sending
/// payload traffic. It must not block for longer than a connect attempt.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Probe `address` (resolved from `hostname`, which is used for logging)
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: Reachable
    /// - `Ok(false)`: Not reachable
    /// - `Err(Error)`: The probe could not be performed
    async fn probe(&self, hostname: &str, address: IpAddr) -> Result<bool, crate::Error>;
}
