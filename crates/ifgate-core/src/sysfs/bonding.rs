//! Bonding driver attributes
//!
//! Path and payload conventions for the bonding sysfs interface. Master
//! and ARP target updates end in a newline; slave updates do not. Both
//! forms are accepted by the kernel and are kept as the driver's own
//! tools write them.

use std::path::{Path, PathBuf};

use tracing::{debug, error};

use super::reconcile::{AttributeListReconciler, SyncReport};
use crate::Error;
use crate::traits::AttributeStore;

const BONDING_MASTERS: &str = "bonding_masters";

/// Bonding helpers over an [`AttributeStore`]
#[derive(Clone, Copy)]
pub struct Bonding<'a> {
    store: &'a dyn AttributeStore,
}

impl<'a> Bonding<'a> {
    pub fn new(store: &'a dyn AttributeStore) -> Self {
        Self { store }
    }

    fn bonding_path(ifname: &str, attr: &str) -> PathBuf {
        PathBuf::from(ifname).join("bonding").join(attr)
    }

    /// Whether the bonding driver is loaded
    pub async fn bonding_available(&self) -> bool {
        self.store.exists(Path::new(BONDING_MASTERS)).await
    }

    /// Names of all bonding masters
    pub async fn masters(&self) -> Result<Vec<String>, Error> {
        self.store.read_list(Path::new(BONDING_MASTERS)).await
    }

    pub async fn add_master(&self, master: &str) -> Result<(), Error> {
        debug!("creating bonding master {}", master);
        self.store
            .write(Path::new(BONDING_MASTERS), &format!("+{}\n", master))
            .await
    }

    pub async fn delete_master(&self, master: &str) -> Result<(), Error> {
        debug!("deleting bonding master {}", master);
        self.store
            .write(Path::new(BONDING_MASTERS), &format!("-{}\n", master))
            .await
    }

    /// Whether `ifname` is a bonding master
    pub async fn is_master(&self, ifname: &str) -> bool {
        self.store.exists(&PathBuf::from(ifname).join("bonding")).await
    }

    pub async fn slaves(&self, master: &str) -> Result<Vec<String>, Error> {
        self.store.read_list(&Self::bonding_path(master, "slaves")).await
    }

    pub async fn add_slave(&self, master: &str, slave: &str) -> Result<(), Error> {
        self.store
            .write(&Self::bonding_path(master, "slaves"), &format!("+{}", slave))
            .await
    }

    pub async fn delete_slave(&self, master: &str, slave: &str) -> Result<(), Error> {
        self.store
            .write(&Self::bonding_path(master, "slaves"), &format!("-{}", slave))
            .await
    }

    pub async fn arp_targets(&self, master: &str) -> Result<Vec<String>, Error> {
        self.store.read_list(&Self::bonding_path(master, "arp_ip_target")).await
    }

    pub async fn add_arp_target(&self, master: &str, address: &str) -> Result<(), Error> {
        self.store
            .write(&Self::bonding_path(master, "arp_ip_target"), &format!("+{}\n", address))
            .await
    }

    pub async fn delete_arp_target(&self, master: &str, address: &str) -> Result<(), Error> {
        self.store
            .write(&Self::bonding_path(master, "arp_ip_target"), &format!("-{}\n", address))
            .await
    }

    /// First line of a bonding attribute
    pub async fn get_attr(&self, ifname: &str, attr: &str) -> Result<Option<String>, Error> {
        self.store.read_line(&Self::bonding_path(ifname, attr)).await
    }

    /// Overwrite a scalar bonding attribute
    pub async fn set_attr(&self, ifname: &str, attr: &str, value: &str) -> Result<(), Error> {
        debug!("{}: bonding {} = {}", ifname, attr, value);
        self.store.write(&Self::bonding_path(ifname, attr), value).await
    }

    /// Converge a list-valued bonding attribute to `values`
    pub async fn set_list_attr<S: AsRef<str> + Sync>(
        &self,
        ifname: &str,
        attr: &str,
        values: &[S],
    ) -> Result<SyncReport, Error> {
        AttributeListReconciler::new(self.store)
            .sync(&Self::bonding_path(ifname, attr), values)
            .await
    }

    /// First line of `<ifname>/<attr>`
    pub async fn netif_string(&self, ifname: &str, attr: &str) -> Result<Option<String>, Error> {
        self.store.read_line(&PathBuf::from(ifname).join(attr)).await
    }

    /// Integer value of `<ifname>/<attr>`
    ///
    /// Accepts decimal, `0x` hexadecimal and `0` octal notation.
    pub async fn netif_int(&self, ifname: &str, attr: &str) -> Result<i64, Error> {
        let path = PathBuf::from(ifname).join(attr);
        let line = self.store.read_line(&path).await?.unwrap_or_default();
        parse_int(&line).ok_or_else(|| {
            error!("{}: cannot parse integer value \"{}\"", path.display(), line);
            Error::attribute(path.display().to_string(), format!("not an integer: \"{}\"", line))
        })
    }
}

fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let (radix, digits) = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };
    // from_str_radix takes its own sign, only one is allowed in front
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = i64::from_str_radix(digits, radix).ok()?;

    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysfs::MemoryAttributes;

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("1500\n"), Some(1500));
        assert_eq!(parse_int("0x1c"), Some(28));
        assert_eq!(parse_int("010"), Some(8));
        assert_eq!(parse_int("0"), Some(0));
        assert_eq!(parse_int("-3"), Some(-3));
        assert_eq!(parse_int("up"), None);
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("-+3"), None);
        assert_eq!(parse_int("+-3"), None);
        assert_eq!(parse_int("0x-1"), None);
        assert_eq!(parse_int("0-7"), None);
        assert_eq!(parse_int("0x"), None);
        assert_eq!(parse_int("09"), None);
        assert_eq!(parse_int("+0x10"), Some(16));
    }

    #[tokio::test]
    async fn test_master_payloads_end_in_newline() {
        let store = MemoryAttributes::new();
        store.insert_list(BONDING_MASTERS, &["bond0"]).await;
        let bonding = Bonding::new(&store);

        assert!(bonding.bonding_available().await);
        bonding.add_master("bond1").await.unwrap();
        bonding.delete_master("bond0").await.unwrap();

        assert_eq!(bonding.masters().await.unwrap(), vec!["bond1"]);
        let payloads: Vec<String> = store.writes().await.into_iter().map(|(_, p)| p).collect();
        assert_eq!(payloads, vec!["+bond1\n", "-bond0\n"]);
    }

    #[tokio::test]
    async fn test_slave_payloads_have_no_newline() {
        let store = MemoryAttributes::new();
        store.insert_list("bond0/bonding/slaves", &["eth0"]).await;
        let bonding = Bonding::new(&store);

        assert!(bonding.is_master("bond0").await);
        assert!(!bonding.is_master("eth0").await);

        bonding.add_slave("bond0", "eth1").await.unwrap();
        bonding.delete_slave("bond0", "eth0").await.unwrap();
        assert_eq!(bonding.slaves("bond0").await.unwrap(), vec!["eth1"]);

        let writes = store.writes().await;
        assert_eq!(writes[0], (PathBuf::from("bond0/bonding/slaves"), "+eth1".to_string()));
        assert_eq!(writes[1], (PathBuf::from("bond0/bonding/slaves"), "-eth0".to_string()));
    }

    #[tokio::test]
    async fn test_arp_targets_and_list_attr() {
        let store = MemoryAttributes::new();
        store
            .insert_list("bond0/bonding/arp_ip_target", &["10.0.0.1", "10.0.0.2"])
            .await;
        let bonding = Bonding::new(&store);

        bonding.add_arp_target("bond0", "10.0.0.3").await.unwrap();
        bonding.delete_arp_target("bond0", "10.0.0.1").await.unwrap();
        assert_eq!(
            bonding.arp_targets("bond0").await.unwrap(),
            vec!["10.0.0.2", "10.0.0.3"]
        );

        let report = bonding
            .set_list_attr("bond0", "arp_ip_target", &["10.0.0.3", "10.0.0.9"])
            .await
            .unwrap();
        assert_eq!(report.removed, vec!["10.0.0.2"]);
        assert_eq!(report.added, vec!["10.0.0.9"]);
        assert_eq!(
            store.list("bond0/bonding/arp_ip_target").await.unwrap(),
            vec!["10.0.0.3", "10.0.0.9"]
        );
    }

    #[tokio::test]
    async fn test_scalar_attributes() {
        let store = MemoryAttributes::new();
        store.insert_scalar("bond0/bonding/miimon", "0").await;
        store.insert_scalar("bond0/mtu", "1500").await;
        store.insert_scalar("bond0/flags", "0x1003").await;
        store.insert_scalar("bond0/operstate", "up").await;
        let bonding = Bonding::new(&store);

        bonding.set_attr("bond0", "miimon", "100").await.unwrap();
        assert_eq!(bonding.get_attr("bond0", "miimon").await.unwrap(), Some("100".to_string()));
        assert_eq!(bonding.netif_int("bond0", "mtu").await.unwrap(), 1500);
        assert_eq!(bonding.netif_int("bond0", "flags").await.unwrap(), 0x1003);
        assert_eq!(
            bonding.netif_string("bond0", "operstate").await.unwrap(),
            Some("up".to_string())
        );
        assert!(bonding.netif_int("bond0", "operstate").await.is_err());
        assert!(bonding.get_attr("bond0", "mode").await.is_err());
        assert!(store.exists(Path::new("bond0/mtu")).await);
    }
}
