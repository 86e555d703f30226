//! Configuration types for the ifgate system
//!
//! This module defines all configuration structures used throughout the crate.
//! Expression-valued fields are stored verbatim; they are evaluated against
//! live state when an extension is invoked, not here.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::family::{AddressFamily, FamilyMask};
use crate::traits::Expression;

/// Main ifgate configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IfgateConfig {
    /// Extension services, in registration order
    #[serde(default)]
    pub extensions: Vec<ExtensionConfig>,

    /// Managed interfaces
    #[serde(default)]
    pub interfaces: Vec<InterfaceConfig>,

    /// Extension runner settings
    #[serde(default)]
    pub runner: RunnerConfig,
}

impl IfgateConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration document
    pub fn from_json(text: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load and parse a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        for extension in &self.extensions {
            extension.validate()?;
        }

        let mut seen = HashSet::new();
        for interface in &self.interfaces {
            interface.validate()?;
            if !seen.insert(interface.name.as_str()) {
                return Err(crate::Error::config(format!(
                    "interface {} configured more than once",
                    interface.name
                )));
            }
        }

        self.runner.validate()
    }
}

/// Service type tag of an extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    /// DHCPv4 / DHCPv6 client
    Dhcp,
    /// IPv4 link-local autoconfiguration
    Autoip,
    /// iBFT firmware-provided configuration
    Ibft,
    /// Generic firmware configuration source
    Firmware,
    /// Site-specific script
    Script,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceType::Dhcp => "dhcp",
            ServiceType::Autoip => "autoip",
            ServiceType::Ibft => "ibft",
            ServiceType::Firmware => "firmware",
            ServiceType::Script => "script",
        };
        f.write_str(name)
    }
}

/// Extension service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Extension name (used in logs and errors)
    pub name: String,

    /// Service type tag
    #[serde(rename = "type")]
    pub service_type: ServiceType,

    /// Supported address families (`ipv4`, `ipv6`)
    #[serde(default = "default_families")]
    pub families: Vec<String>,

    /// Expression yielding the pid file path used for liveness checks
    #[serde(default)]
    pub pid_file: Option<Expression>,

    /// Expression yielding the start command
    #[serde(default)]
    pub start: Option<Expression>,

    /// Expression yielding the stop command
    #[serde(default)]
    pub stop: Option<Expression>,

    /// Expressions yielding `NAME=value` environment entries
    #[serde(default)]
    pub environment: Vec<Expression>,
}

impl ExtensionConfig {
    /// Validate the extension configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.is_empty() {
            return Err(crate::Error::config("extension name cannot be empty"));
        }
        if self.families.is_empty() {
            return Err(crate::Error::config(format!(
                "extension {}: families cannot be empty",
                self.name
            )));
        }
        self.family_mask().map(|_| ())
    }

    /// Supported families as a mask
    pub fn family_mask(&self) -> Result<FamilyMask, crate::Error> {
        FamilyMask::from_names(&self.families)
            .map_err(|e| crate::Error::config(format!("extension {}: {}", self.name, e)))
    }
}

fn default_families() -> Vec<String> {
    vec!["ipv4".to_string(), "ipv6".to_string()]
}

/// A precondition attached to an interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementConfig {
    /// Host must resolve and be reachable
    Reachable(ReachabilityConfig),
}

/// Reachability requirement configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachabilityConfig {
    /// Hostname or literal address
    pub hostname: String,

    /// Address family hint (`ipv4`, `ipv6`, or absent for any)
    #[serde(default)]
    pub address_family: Option<String>,
}

impl ReachabilityConfig {
    /// Create a reachability requirement for `hostname`
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            address_family: None,
        }
    }

    /// Set the address family hint
    pub fn with_address_family(mut self, family: impl Into<String>) -> Self {
        self.address_family = Some(family.into());
        self
    }

    /// Parsed family hint
    pub fn family(&self) -> Result<AddressFamily, crate::Error> {
        parse_family_hint(self.address_family.as_deref())
            .map_err(|e| crate::Error::config(format!("reachable {}: {}", self.hostname, e)))
    }
}

/// Interface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// Interface name (e.g. "bond0")
    pub name: String,

    /// Preconditions for bring-up
    #[serde(default)]
    pub requires: Vec<RequirementConfig>,

    /// Bonding attributes to push on bring-up
    #[serde(default)]
    pub bonding: Option<BondingConfig>,

    /// Extension services to start on bring-up
    #[serde(default)]
    pub extensions: Vec<ExtensionRef>,
}

impl InterfaceConfig {
    /// Create an interface configuration with nothing attached
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires: Vec::new(),
            bonding: None,
            extensions: Vec::new(),
        }
    }

    /// Validate the interface configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.is_empty() {
            return Err(crate::Error::config("interface name cannot be empty"));
        }
        if self.name.contains('/') || self.name == "." || self.name == ".." {
            return Err(crate::Error::config(format!(
                "invalid interface name \"{}\"",
                self.name
            )));
        }

        for requirement in &self.requires {
            match requirement {
                RequirementConfig::Reachable(check) => {
                    if check.hostname.trim().is_empty() {
                        return Err(crate::Error::config(format!(
                            "{}: reachable requirement without hostname",
                            self.name
                        )));
                    }
                    check.family()?;
                }
            }
        }

        for extension in &self.extensions {
            extension.family()?;
        }

        Ok(())
    }
}

/// Bonding attributes of an interface
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BondingConfig {
    /// Scalar attributes, written in order (e.g. mode before miimon)
    #[serde(default)]
    pub attributes: Vec<BondingAttribute>,

    /// Desired ARP monitoring targets
    #[serde(default)]
    pub arp_ip_target: Vec<String>,
}

/// A scalar bonding attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondingAttribute {
    /// Attribute file name below `bonding/`
    pub name: String,
    /// Value to write
    pub value: String,
}

/// Reference from an interface to an extension service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRef {
    /// Service type to look up
    #[serde(rename = "type")]
    pub service_type: ServiceType,

    /// Address family to look up (absent for any)
    #[serde(default)]
    pub family: Option<String>,
}

impl ExtensionRef {
    /// Parsed family
    pub fn family(&self) -> Result<AddressFamily, crate::Error> {
        parse_family_hint(self.family.as_deref())
            .map_err(|e| crate::Error::config(format!("extension {}: {}", self.service_type, e)))
    }
}

/// Extension runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Shell used to run extension commands (`<shell> -c <command>`)
    #[serde(default = "default_shell")]
    pub shell: PathBuf,
}

impl RunnerConfig {
    /// Validate the runner configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.shell.as_os_str().is_empty() {
            return Err(crate::Error::config("runner shell cannot be empty"));
        }
        Ok(())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
        }
    }
}

fn default_shell() -> PathBuf {
    PathBuf::from("/bin/sh")
}

fn parse_family_hint(name: Option<&str>) -> Result<AddressFamily, String> {
    match name {
        None => Ok(AddressFamily::Unspecified),
        Some(name) => AddressFamily::from_name(name)
            .ok_or_else(|| format!("bad address-family attribute \"{}\"", name)),
    }
}
