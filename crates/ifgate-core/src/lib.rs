// # ifgate-core
//
// Core library for the interface configuration daemon.
//
// ## Architecture Overview
//
// - **Requirement gates**: Cacheable preconditions polled by the owning
//   interface worker before a transition (`gate`, `worker`)
// - **Extensions**: Ordered catalog of external helper services and the
//   runner that starts and stops them (`extension`)
// - **Kernel attributes**: Converging sysfs list attributes with
//   single-element `+value`/`-value` writes (`sysfs`)
//
// ## Collaborators
//
// Everything that touches the outside world sits behind a trait in
// `traits`: hostname resolution, reachability probing, expression
// evaluation and attribute storage. Implementations that need the network
// live in `ifgate-net`.
//
// ## Design Principles
//
// 1. **Poll, don't push**: Gates are evaluated by their owner and cache
//    their result against monotonic event counters
// 2. **Closed variants**: Gate kinds and service types are enums
// 3. **Library-First**: The daemon is a thin shell around this crate

pub mod config;
pub mod error;
pub mod events;
pub mod expression;
pub mod extension;
pub mod family;
pub mod gate;
pub mod sysfs;
pub mod traits;
pub mod worker;

// Re-export core types for convenience
pub use config::{ExtensionConfig, IfgateConfig, InterfaceConfig, ReachabilityConfig, ServiceType};
pub use error::{Error, ProcessFailure, Result};
pub use events::{EventClass, EventCounters, EventSnapshot};
pub use expression::TemplateEvaluator;
pub use extension::{ExtensionDescriptor, ExtensionRegistry, ExtensionRunner, RunOutcome};
pub use family::{AddressFamily, FamilyMask};
pub use gate::{GateEnv, Readiness, Requirement};
pub use sysfs::{AttributeListReconciler, Bonding, MemoryAttributes, SysfsAttributes};
pub use traits::{AttributeStore, ExpressionEvaluator, HostResolver, ReachabilityProbe};
pub use worker::InterfaceWorker;
