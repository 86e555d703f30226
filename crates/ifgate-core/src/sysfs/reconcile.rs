// # List Attribute Reconciler
//
// Converges a kernel list attribute towards a desired list.
//
// ## Write Protocol
//
// List attributes cannot be replaced in bulk. Each element is removed
// with a `-value` write or added with a `+value` write, one per open.
//
// ## Ordering
//
// All removals go first, then all additions. Entries present in both
// lists are never written.
//
// ## Failure
//
// The first failed write ends the call. Earlier writes stay in effect;
// the caller converges the rest by calling again.

use std::path::Path;

use tracing::{debug, error, trace};

use super::diff::AttributeDiff;
use crate::traits::AttributeStore;

/// What a successful [`AttributeListReconciler::sync`] did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries removed, in write order
    pub removed: Vec<String>,
    /// Entries added, in write order
    pub added: Vec<String>,
    /// Entries left untouched
    pub unchanged: Vec<String>,
}

impl SyncReport {
    /// Number of writes issued
    pub fn writes(&self) -> usize {
        self.removed.len() + self.added.len()
    }
}

/// Reconciles list attributes through an [`AttributeStore`]
pub struct AttributeListReconciler<'a> {
    store: &'a dyn AttributeStore,
}

impl<'a> AttributeListReconciler<'a> {
    pub fn new(store: &'a dyn AttributeStore) -> Self {
        Self { store }
    }

    /// Make the list at `path` equal (as a set) to `desired`
    ///
    /// # Errors
    ///
    /// - `Error::Attribute`: the current list could not be read; nothing
    ///   was written
    /// - `Error::AttributeWrite`: a single-element write failed; entries
    ///   written before it stay written
    pub async fn sync<S: AsRef<str> + Sync>(
        &self,
        path: &Path,
        desired: &[S],
    ) -> Result<SyncReport, crate::Error> {
        let current = self.store.read_list(path).await?;
        let diff = AttributeDiff::compute(&current, desired);

        if diff.is_empty() {
            debug!("{}: attr list unchanged", path.display());
            return Ok(SyncReport {
                unchanged: diff.unchanged,
                ..SyncReport::default()
            });
        }

        debug!("{}: updating attr list", path.display());
        for value in &diff.to_remove {
            trace!("    remove {}", value);
        }
        for value in &diff.to_add {
            trace!("    add {}", value);
        }
        for value in &diff.unchanged {
            trace!("    leave {}", value);
        }

        for value in &diff.to_remove {
            self.write_element(path, '-', value).await?;
        }
        for value in &diff.to_add {
            self.write_element(path, '+', value).await?;
        }

        Ok(SyncReport {
            removed: diff.to_remove,
            added: diff.to_add,
            unchanged: diff.unchanged,
        })
    }

    async fn write_element(&self, path: &Path, sigil: char, value: &str) -> Result<(), crate::Error> {
        let payload = format!("{}{}\n", sigil, value);
        self.store.write(path, &payload).await.map_err(|e| {
            let action = if sigil == '-' { "remove" } else { "add" };
            let location = self.store.location(path);
            error!("{}: could not {} {}", location.display(), action, value);
            crate::Error::attribute_write(location.display().to_string(), value, e.to_string())
        })
    }
}
