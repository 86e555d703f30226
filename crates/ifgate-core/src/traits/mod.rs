//! Collaborator traits for the ifgate core
//!
//! The core never talks to the network, the kernel or the live state
//! document directly. It goes through these seams instead:
//!
//! - [`HostResolver`]: Bounded-time hostname resolution
//! - [`ReachabilityProbe`]: Cheap "is there a route" check for an address
//! - [`ExpressionEvaluator`]: Evaluate configuration expressions against live state
//! - [`AttributeStore`]: Read and write kernel-exposed text attributes

pub mod resolver;
pub mod evaluator;
pub mod attribute_store;

pub use resolver::{HostResolver, ReachabilityProbe};
pub use evaluator::{Expression, ExpressionEvaluator, LiveState};
pub use attribute_store::AttributeStore;
