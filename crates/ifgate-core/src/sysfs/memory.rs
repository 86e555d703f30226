//! In-memory attribute store
//!
//! Simulates the kernel side of the attribute protocol: list attributes
//! accept only `+value` / `-value` writes, scalar attributes are replaced.
//! Every write attempt is logged, and writes carrying selected values can
//! be made to fail, which makes partial convergence observable in tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::AttributeStore;

#[derive(Debug, Clone)]
enum Entry {
    List(Vec<String>),
    Scalar(String),
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<PathBuf, Entry>,
    writes: Vec<(PathBuf, String)>,
    failing: HashSet<String>,
}

/// Attribute store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryAttributes {
    inner: RwLock<Inner>,
}

impl MemoryAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) a list attribute
    pub async fn insert_list<S: AsRef<str>>(&self, path: impl Into<PathBuf>, items: &[S]) {
        let items = items.iter().map(|s| s.as_ref().to_string()).collect();
        self.inner.write().await.entries.insert(path.into(), Entry::List(items));
    }

    /// Create (or replace) a scalar attribute
    pub async fn insert_scalar(&self, path: impl Into<PathBuf>, value: impl Into<String>) {
        self.inner
            .write()
            .await
            .entries
            .insert(path.into(), Entry::Scalar(value.into()));
    }

    /// Make every write whose value (sigil stripped) equals `value` fail
    pub async fn fail_on(&self, value: impl Into<String>) {
        self.inner.write().await.failing.insert(value.into());
    }

    pub async fn clear_failures(&self) {
        self.inner.write().await.failing.clear();
    }

    /// Current content of a list attribute
    pub async fn list(&self, path: impl AsRef<Path>) -> Option<Vec<String>> {
        match self.inner.read().await.entries.get(path.as_ref()) {
            Some(Entry::List(items)) => Some(items.clone()),
            _ => None,
        }
    }

    /// Current content of a scalar attribute
    pub async fn scalar(&self, path: impl AsRef<Path>) -> Option<String> {
        match self.inner.read().await.entries.get(path.as_ref()) {
            Some(Entry::Scalar(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Every write attempted so far, failed ones included, in order
    pub async fn writes(&self) -> Vec<(PathBuf, String)> {
        self.inner.read().await.writes.clone()
    }
}

fn rejected(path: &Path, message: &str) -> Error {
    Error::attribute(path.display().to_string(), message)
}

#[async_trait]
impl AttributeStore for MemoryAttributes {
    async fn read_list(&self, path: &Path) -> Result<Vec<String>, Error> {
        let inner = self.inner.read().await;
        match inner.entries.get(path) {
            Some(Entry::List(items)) => Ok(items.clone()),
            Some(Entry::Scalar(value)) => Ok(value.split_whitespace().map(str::to_string).collect()),
            None => Err(rejected(path, "No such file or directory")),
        }
    }

    async fn read_line(&self, path: &Path) -> Result<Option<String>, Error> {
        let inner = self.inner.read().await;
        match inner.entries.get(path) {
            Some(Entry::List(items)) if items.is_empty() => Ok(None),
            Some(Entry::List(items)) => Ok(Some(items.join(" "))),
            Some(Entry::Scalar(value)) => Ok(value.lines().next().map(str::to_string)),
            None => Err(rejected(path, "No such file or directory")),
        }
    }

    async fn write(&self, path: &Path, payload: &str) -> Result<(), Error> {
        let mut inner = self.inner.write().await;
        inner.writes.push((path.to_path_buf(), payload.to_string()));

        let line = payload.strip_suffix('\n').unwrap_or(payload);
        let value = line.strip_prefix(['+', '-']).unwrap_or(line);
        if inner.failing.contains(value) {
            return Err(rejected(path, "Invalid argument"));
        }

        match inner.entries.get_mut(path) {
            Some(Entry::List(items)) => {
                let (sigil, value) = match line.split_at_checked(1) {
                    Some((sigil, value)) if !value.is_empty() => (sigil, value),
                    _ => return Err(rejected(path, "Invalid argument")),
                };
                match sigil {
                    "+" if !items.iter().any(|item| item == value) => items.push(value.to_string()),
                    "+" => {}
                    "-" => match items.iter().position(|item| item == value) {
                        Some(index) => {
                            items.remove(index);
                        }
                        None => return Err(rejected(path, "Invalid argument")),
                    },
                    _ => return Err(rejected(path, "Invalid argument")),
                }
                Ok(())
            }
            Some(Entry::Scalar(current)) => {
                *current = line.to_string();
                Ok(())
            }
            None => Err(rejected(path, "No such file or directory")),
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        let inner = self.inner.read().await;
        inner.entries.keys().any(|key| key.starts_with(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sigil_writes() {
        let store = MemoryAttributes::new();
        store.insert_list("bond0/bonding/slaves", &["eth0"]).await;
        let path = Path::new("bond0/bonding/slaves");

        store.write(path, "+eth1").await.unwrap();
        store.write(path, "-eth0\n").await.unwrap();
        assert_eq!(store.list(path).await.unwrap(), vec!["eth1"]);

        assert!(store.write(path, "eth2").await.is_err());
        assert!(store.write(path, "-eth9").await.is_err());
        assert_eq!(store.writes().await.len(), 4);
    }

    #[tokio::test]
    async fn test_scalar_and_missing() {
        let store = MemoryAttributes::new();
        store.insert_scalar("bond0/bonding/mode", "balance-rr 0").await;
        let path = Path::new("bond0/bonding/mode");

        store.write(path, "active-backup").await.unwrap();
        assert_eq!(store.read_line(path).await.unwrap(), Some("active-backup".to_string()));
        assert!(store.exists(Path::new("bond0/bonding")).await);
        assert!(!store.exists(Path::new("bond1")).await);
        assert!(store.write(Path::new("bond1/mtu"), "1500").await.is_err());
    }

    #[tokio::test]
    async fn test_fail_on_value() {
        let store = MemoryAttributes::new();
        store.insert_list("bonding_masters", &[] as &[&str]).await;
        store.fail_on("bond7").await;

        let err = store.write(Path::new("bonding_masters"), "+bond7\n").await.unwrap_err();
        assert!(matches!(err, Error::Attribute { .. }));
        assert_eq!(store.list("bonding_masters").await.unwrap(), Vec::<String>::new());
    }
}
