//! Extension registry
//!
//! The registry is the ordered catalog of extension descriptors loaded
//! from configuration. Registration order is significant: lookups return
//! the first registered descriptor that matches.
//!
//! ## Usage
//!
//! ```rust
//! use ifgate_core::config::ServiceType;
//! use ifgate_core::extension::{ExtensionDescriptor, ExtensionRegistry};
//! use ifgate_core::{AddressFamily, FamilyMask};
//!
//! let mut registry = ExtensionRegistry::new();
//! registry.register(
//!     ExtensionDescriptor::new("dhcp4", ServiceType::Dhcp).with_families(FamilyMask::IPV4),
//! );
//! registry.register(
//!     ExtensionDescriptor::new("dhcp6", ServiceType::Dhcp).with_families(FamilyMask::IPV6),
//! );
//!
//! let found = registry.find(ServiceType::Dhcp, AddressFamily::Ipv6).unwrap();
//! assert_eq!(found.name(), "dhcp6");
//! ```

use std::path::Path;

use tracing::{debug, error};

use super::ExtensionDescriptor;
use crate::config::{ExtensionConfig, ServiceType};
use crate::family::AddressFamily;
use crate::traits::{ExpressionEvaluator, LiveState};

/// Insertion-ordered collection of extension descriptors
///
/// Read-only once configuration has been loaded; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    descriptors: Vec<ExtensionDescriptor>,
}

impl ExtensionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configuration, preserving order
    pub fn from_config(configs: &[ExtensionConfig]) -> Result<Self, crate::Error> {
        let mut registry = Self::new();
        for config in configs {
            registry.register(ExtensionDescriptor::from_config(config)?);
        }
        Ok(registry)
    }

    /// Append a descriptor
    ///
    /// Duplicates are accepted; a later descriptor is shadowed by an
    /// earlier one with the same type and overlapping families.
    pub fn register(&mut self, descriptor: ExtensionDescriptor) {
        debug!(
            "registering extension {} (type {}, families {:#x})",
            descriptor.name(),
            descriptor.service_type(),
            descriptor.families().bits()
        );
        self.descriptors.push(descriptor);
    }

    /// Find the first descriptor of `service_type` supporting `family`
    ///
    /// `Unspecified` matches any supported family; a family without a mask
    /// bit matches nothing.
    pub fn find(
        &self,
        service_type: ServiceType,
        family: AddressFamily,
    ) -> Option<&ExtensionDescriptor> {
        let mask = family.mask();
        self.descriptors
            .iter()
            .find(|d| d.service_type() == service_type && d.families().intersects(mask))
    }

    /// Find a descriptor by name
    pub fn get(&self, name: &str) -> Option<&ExtensionDescriptor> {
        self.descriptors.iter().find(|d| d.name() == name)
    }

    /// Descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ExtensionDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Check whether an extension is running for `interface`
///
/// Without a pid file expression the answer is always "not active".
/// The expression must yield exactly one path; any other result count is
/// logged and treated as inactive. A service counts as running when that
/// path exists; the pid inside is not checked against a live process.
pub fn is_active(
    evaluator: &dyn ExpressionEvaluator,
    descriptor: &ExtensionDescriptor,
    interface: &str,
    state: &LiveState,
) -> bool {
    let Some(pid_file) = descriptor.pid_file() else {
        return false;
    };

    match evaluator.evaluate(pid_file, interface, state) {
        Ok(paths) if paths.len() == 1 => Path::new(&paths[0]).exists(),
        Ok(paths) => {
            error!(
                "unable to check extension {} for {}: pid file expression yielded {} results",
                descriptor.name(),
                interface,
                paths.len()
            );
            false
        }
        Err(e) => {
            error!(
                "unable to check extension {} for {}: {}",
                descriptor.name(),
                interface,
                e
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::TemplateEvaluator;
    use crate::family::FamilyMask;
    use serde_json::json;

    fn dhcp(name: &str, families: FamilyMask) -> ExtensionDescriptor {
        ExtensionDescriptor::new(name, ServiceType::Dhcp).with_families(families)
    }

    #[test]
    fn test_find_respects_registration_order() {
        let mut registry = ExtensionRegistry::new();
        registry.register(dhcp("dhcp4", FamilyMask::IPV4));
        registry.register(dhcp("dhcp6", FamilyMask::IPV6));
        registry.register(dhcp("dhcp-any", FamilyMask::ALL));

        assert_eq!(registry.find(ServiceType::Dhcp, AddressFamily::Ipv4).unwrap().name(), "dhcp4");
        assert_eq!(registry.find(ServiceType::Dhcp, AddressFamily::Ipv6).unwrap().name(), "dhcp6");
        assert_eq!(
            registry.find(ServiceType::Dhcp, AddressFamily::Unspecified).unwrap().name(),
            "dhcp4"
        );
    }

    #[test]
    fn test_find_not_found() {
        let mut registry = ExtensionRegistry::new();
        registry.register(dhcp("dhcp4", FamilyMask::IPV4));

        assert!(registry.find(ServiceType::Dhcp, AddressFamily::Ipv6).is_none());
        assert!(registry.find(ServiceType::Ibft, AddressFamily::Ipv4).is_none());
        assert!(registry.find(ServiceType::Dhcp, AddressFamily::Other(99)).is_none());
    }

    #[test]
    fn test_type_must_match_exactly() {
        let mut registry = ExtensionRegistry::new();
        registry.register(ExtensionDescriptor::new("fw", ServiceType::Firmware));
        registry.register(ExtensionDescriptor::new("ibft", ServiceType::Ibft));

        assert_eq!(
            registry.find(ServiceType::Ibft, AddressFamily::Unspecified).unwrap().name(),
            "ibft"
        );
    }

    #[test]
    fn test_from_config_keeps_order() {
        let configs: Vec<ExtensionConfig> = serde_json::from_value(json!([
            { "name": "first", "type": "script" },
            { "name": "second", "type": "script" }
        ]))
        .unwrap();

        let registry = ExtensionRegistry::from_config(&configs).unwrap();
        assert_eq!(registry.len(), 2);
        let names: Vec<_> = registry.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(registry.find(ServiceType::Script, AddressFamily::Ipv4).unwrap().name(), "first");
        assert!(registry.get("second").is_some());
    }

    #[test]
    fn test_is_active_without_pid_file() {
        let descriptor = ExtensionDescriptor::new("x", ServiceType::Script);
        assert!(!is_active(&TemplateEvaluator::new(), &descriptor, "eth0", &json!({})));
    }

    #[test]
    fn test_is_active_checks_path_existence() {
        let dir = tempfile::tempdir().unwrap();
        let pid_path = dir.path().join("eth0.pid");
        let state = json!({ "run_dir": dir.path().to_str().unwrap() });
        let descriptor = ExtensionDescriptor::new("x", ServiceType::Script)
            .with_pid_file("%{/run_dir}/%{ifname}.pid");
        let evaluator = TemplateEvaluator::new();

        assert!(!is_active(&evaluator, &descriptor, "eth0", &state));
        std::fs::write(&pid_path, "1234\n").unwrap();
        assert!(is_active(&evaluator, &descriptor, "eth0", &state));
    }

    #[test]
    fn test_is_active_wrong_cardinality_is_inactive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), "").unwrap();
        let base = dir.path().to_str().unwrap();
        let state = json!({ "pids": [format!("{}/a", base), format!("{}/a", base)] });
        let descriptor = ExtensionDescriptor::new("x", ServiceType::Script).with_pid_file("%{/pids}");

        assert!(!is_active(&TemplateEvaluator::new(), &descriptor, "eth0", &state));

        let empty = json!({});
        assert!(!is_active(&TemplateEvaluator::new(), &descriptor, "eth0", &empty));
    }
}
