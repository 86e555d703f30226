// # Reachability Check
//
// Gate variant that holds back a transition until a given host resolves
// and is reachable.
//
// ## Caching
//
// - Nothing is checked again until a new address has been acquired
//   somewhere; without new addressing, neither name resolution nor
//   routing can have changed.
// - A resolved address is kept across evaluations and only thrown away
//   when the resolver configuration was updated since the last look.
//
// ## Bounded I/O
//
// Resolution is limited to RESOLVE_TIMEOUT. The probe is a connect
// attempt and returns immediately.

use std::net::IpAddr;
use std::time::Duration;

use tracing::{debug, trace};

use super::{GateEnv, Readiness};
use crate::config::ReachabilityConfig;
use crate::events::EventClass;
use crate::family::AddressFamily;

/// Upper bound for a single hostname lookup
pub const RESOLVE_TIMEOUT: Duration = Duration::from_secs(1);

/// State of a reachability requirement
#[derive(Debug)]
pub struct ReachabilityCheck {
    hostname: String,
    family: AddressFamily,
    address: Option<IpAddr>,
}

impl ReachabilityCheck {
    /// Create a check for `hostname`
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `hostname` is empty.
    pub fn new(hostname: impl Into<String>, family: AddressFamily) -> Result<Self, crate::Error> {
        let hostname = hostname.into();
        let hostname = hostname.trim();
        if hostname.is_empty() {
            return Err(crate::Error::config("reachable: empty hostname"));
        }
        Ok(Self {
            hostname: hostname.to_string(),
            family,
            address: None,
        })
    }

    /// Create a check from its configuration node
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an empty hostname or an unknown
    /// `address_family` value.
    pub fn from_config(config: &ReachabilityConfig) -> Result<Self, crate::Error> {
        let family = config.family().inspect_err(|e| {
            tracing::error!("{}", e);
        })?;
        Self::new(config.hostname.as_str(), family)
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Cached resolved address, if valid
    pub fn cached_address(&self) -> Option<IpAddr> {
        self.address
    }

    /// Evaluate the check
    ///
    /// `last_seen` is the owning requirement's event sequence and is
    /// updated whenever a full evaluation is started.
    pub(crate) async fn evaluate(&mut self, last_seen: &mut u64, env: &GateEnv<'_>) -> Readiness {
        let addr_seq = env.events.last(EventClass::AddressAcquired);
        let resolver_seq = env.events.last(EventClass::ResolverUpdated);

        // Last full evaluation happened right at the latest address acquisition.
        if *last_seen == addr_seq {
            debug!("check reachability: {} SKIP", self.hostname);
            return Readiness::NotReady;
        }

        if *last_seen < resolver_seq && self.address.take().is_some() {
            trace!("check reachability: {} resolver updated, dropping cached address", self.hostname);
        }
        *last_seen = env.events.seq();

        let address = match self.address {
            Some(address) => address,
            None => {
                let resolved = env
                    .resolver
                    .resolve(&self.hostname, self.family, RESOLVE_TIMEOUT)
                    .await;
                match resolved {
                    Ok(Some(address)) => address,
                    Ok(None) => {
                        debug!("check reachability: {} not resolvable", self.hostname);
                        return Readiness::NotReady;
                    }
                    Err(e) => {
                        debug!("check reachability: {} not resolvable: {}", self.hostname, e);
                        return Readiness::NotReady;
                    }
                }
            }
        };
        self.address = Some(address);

        match env.probe.probe(&self.hostname, address).await {
            Ok(true) => {
                debug!("check reachability: {} OK ({})", self.hostname, address);
                Readiness::Ready
            }
            Ok(false) => {
                debug!("check reachability: {} not reachable at {}", self.hostname, address);
                Readiness::NotReady
            }
            Err(e) => {
                debug!("check reachability: {} not reachable at {}: {}", self.hostname, address, e);
                Readiness::NotReady
            }
        }
    }
}

impl Drop for ReachabilityCheck {
    fn drop(&mut self) {
        trace!("releasing reachability check for {}", self.hostname);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_parses_family() {
        let config = ReachabilityConfig::new("gw.example.net").with_address_family("ipv6");
        let check = ReachabilityCheck::from_config(&config).unwrap();
        assert_eq!(check.hostname(), "gw.example.net");
        assert_eq!(check.family(), AddressFamily::Ipv6);
        assert!(check.cached_address().is_none());
    }

    #[test]
    fn test_from_config_defaults_to_any_family() {
        let check = ReachabilityCheck::from_config(&ReachabilityConfig::new("10.0.0.1")).unwrap();
        assert_eq!(check.family(), AddressFamily::Unspecified);
    }

    #[test]
    fn test_unknown_family_yields_no_gate() {
        let config = ReachabilityConfig::new("gw").with_address_family("inet7");
        assert!(matches!(
            ReachabilityCheck::from_config(&config),
            Err(crate::Error::Config(_))
        ));
    }

    #[test]
    fn test_empty_hostname_yields_no_gate() {
        assert!(ReachabilityCheck::new("  ", AddressFamily::Unspecified).is_err());
    }
}
