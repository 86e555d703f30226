// # Attribute Store Trait
//
// Defines the interface to kernel-exposed plain-text attributes
// (sysfs under /sys/class/net).
//
// ## File Protocol
//
// - Reads are whitespace/newline delimited
// - Scalar attributes are overwritten wholesale
// - List attributes only accept single-element writes prefixed with a
//   sigil: `+value` adds, `-value` removes. Bulk replace does not exist.
//
// ## Implementations
//
// - `SysfsAttributes`: real files below a root directory
// - `MemoryAttributes`: in-memory simulation of the sigil protocol

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Trait for kernel attribute access
///
/// Paths are relative to the store's root (e.g. `bond0/bonding/slaves`).
/// Every method opens the attribute afresh; nothing is cached.
#[async_trait]
pub trait AttributeStore: Send + Sync {
    /// Read a list attribute, split on whitespace
    ///
    /// # Returns
    ///
    /// - `Ok(tokens)`: Possibly empty token list
    /// - `Err(Error::Attribute)`: Attribute could not be opened or read
    async fn read_list(&self, path: &Path) -> Result<Vec<String>, crate::Error>;

    /// Read the first line of an attribute, without its newline
    ///
    /// Returns `Ok(None)` for an empty attribute.
    async fn read_line(&self, path: &Path) -> Result<Option<String>, crate::Error>;

    /// Write `payload` to the attribute in one write
    ///
    /// The payload is written exactly as given, sigil and newline included.
    async fn write(&self, path: &Path, payload: &str) -> Result<(), crate::Error>;

    /// Whether the attribute (or attribute directory) exists
    async fn exists(&self, path: &Path) -> bool;

    /// Where `path` actually lives, for logs and error reports
    fn location(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}
