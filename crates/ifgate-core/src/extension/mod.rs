//! Extension services
//!
//! Extensions are externally managed helpers (DHCP clients, firmware
//! configuration readers, site scripts) that the daemon starts and stops
//! as interfaces come and go.
//!
//! - [`ExtensionDescriptor`]: What a service is and how to drive it
//! - [`ExtensionRegistry`]: Ordered catalog, looked up by type and family
//! - [`ExtensionRunner`]: Runs start/stop commands and verifies the result

pub mod descriptor;
pub mod process;
pub mod registry;
pub mod runner;

pub use descriptor::ExtensionDescriptor;
pub use process::{ChildProcess, ExitOutcome, ProcessLauncher, ShellCommand, ShellLauncher};
pub use registry::{ExtensionRegistry, is_active};
pub use runner::{CommandKind, ExtensionRunner, RunOutcome};
