// # Sysfs Attribute Store
//
// File-backed implementation of AttributeStore.
//
// ## Layout
//
// Paths are resolved below a root directory, `/sys/class/net` in
// production:
//
// ```text
// /sys/class/net/bonding_masters
// /sys/class/net/bond0/bonding/slaves
// /sys/class/net/bond0/bonding/arp_ip_target
// /sys/class/net/bond0/mtu
// ```
//
// Tests point the root at a temporary directory.
//
// ## Writes
//
// Every write opens the file, writes the payload once and closes it.
// Sysfs reports rejected values on write or close, so both are checked.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::error;

use crate::Error;
use crate::traits::AttributeStore;

/// Default sysfs network class directory
pub const SYS_CLASS_NET: &str = "/sys/class/net";

/// Attribute store backed by files below a root directory
#[derive(Debug, Clone)]
pub struct SysfsAttributes {
    root: PathBuf,
}

impl SysfsAttributes {
    /// Store rooted at `/sys/class/net`
    pub fn new() -> Self {
        Self::with_root(SYS_CLASS_NET)
    }

    /// Store rooted at `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

}

impl Default for SysfsAttributes {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AttributeStore for SysfsAttributes {
    async fn read_list(&self, path: &Path) -> Result<Vec<String>, Error> {
        let full = self.location(path);
        let content = fs::read_to_string(&full).await.map_err(|e| {
            error!("unable to open {}: {}", full.display(), e);
            Error::attribute(full.display().to_string(), e.to_string())
        })?;
        Ok(content.split_whitespace().map(str::to_string).collect())
    }

    async fn read_line(&self, path: &Path) -> Result<Option<String>, Error> {
        let full = self.location(path);
        let content = fs::read_to_string(&full)
            .await
            .map_err(|e| Error::attribute(full.display().to_string(), e.to_string()))?;
        Ok(content.lines().next().map(str::to_string))
    }

    async fn write(&self, path: &Path, payload: &str) -> Result<(), Error> {
        let full = self.location(path);
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&full)
            .await
            .map_err(|e| {
                error!("unable to open {}: {}", full.display(), e);
                Error::attribute(full.display().to_string(), e.to_string())
            })?;

        let written = async {
            file.write_all(payload.as_bytes()).await?;
            file.flush().await
        }
        .await;

        written.map_err(|e| {
            error!("error writing to {}: {}", full.display(), e);
            Error::attribute(full.display().to_string(), e.to_string())
        })
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(self.location(path)).await.unwrap_or(false)
    }

    fn location(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}
