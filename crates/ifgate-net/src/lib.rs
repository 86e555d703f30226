// # ifgate-net
//
// Network-facing collaborators for requirement gates.
//
// - **SystemResolver**: hostname lookup through the system resolver,
//   bounded by the timeout the gate passes in
// - **UdpProbe**: routing check that connects a datagram socket without
//   sending anything
//
// Both are stateless and cheap to share behind an `Arc`.

use async_trait::async_trait;
use ifgate_core::traits::{HostResolver, ReachabilityProbe};
use ifgate_core::{AddressFamily, Error, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, trace};

/// Port used for the probe's connect; no datagram is ever sent to it
pub const PROBE_PORT: u16 = 9;

/// Resolver backed by the operating system (`getaddrinfo`)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(
        &self,
        hostname: &str,
        family: AddressFamily,
        timeout: Duration,
    ) -> Result<Option<IpAddr>> {
        if let Ok(address) = hostname.parse::<IpAddr>() {
            return Ok(family.admits(&address).then_some(address));
        }

        let lookup = tokio::net::lookup_host((hostname, 0));
        let addresses = match tokio::time::timeout(timeout, lookup).await {
            Ok(Ok(addresses)) => addresses,
            Ok(Err(e)) => {
                debug!("{}: lookup failed: {}", hostname, e);
                return Err(Error::resolve(format!("{}: {}", hostname, e)));
            }
            Err(_) => {
                debug!("{}: lookup timed out after {:?}", hostname, timeout);
                return Ok(None);
            }
        };

        let found = addresses
            .map(|addr| addr.ip())
            .find(|ip| family.admits(ip));
        trace!("{} ({}) resolved to {:?}", hostname, family, found);
        Ok(found)
    }
}

/// Reachability probe using a connected UDP socket
///
/// Connecting a datagram socket only consults the routing table, so the
/// answer is "is there a route", not "is the host up".
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpProbe;

impl UdpProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReachabilityProbe for UdpProbe {
    async fn probe(&self, hostname: &str, address: IpAddr) -> Result<bool> {
        let local: SocketAddr = match address {
            IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        let socket = UdpSocket::bind(local).await.map_err(|e| {
            debug!("{}: unable to open socket for {}: {}", hostname, address, e);
            Error::probe(format!("{}: {}", hostname, e))
        })?;

        match socket.connect((address, PROBE_PORT)).await {
            Ok(()) => Ok(true),
            Err(e) => {
                debug!("cannot connect to {}: {}", hostname, e);
                Ok(false)
            }
        }
    }
}
