//! Kernel attribute handling
//!
//! - [`AttributeDiff`]: Compare current and desired list contents
//! - [`AttributeListReconciler`]: Converge a list attribute with sigil writes
//! - [`Bonding`]: Bonding driver paths and payloads
//! - [`SysfsAttributes`] / [`MemoryAttributes`]: Store implementations

pub mod bonding;
pub mod diff;
pub mod memory;
pub mod reconcile;
pub mod store;

pub use bonding::Bonding;
pub use diff::AttributeDiff;
pub use memory::MemoryAttributes;
pub use reconcile::{AttributeListReconciler, SyncReport};
pub use store::{SYS_CLASS_NET, SysfsAttributes};
