//! Module registry
//!
//! Owns activated modules and drives their lifecycle. Tool exposure is
//! mediated by a [`ModuleContext`] that applies the mode gate before anything
//! reaches the shared transport.

mod context;
mod module_registry;
mod report;

pub use context::{ModuleContext, PublicationLedger, PublishOutcome};
pub use module_registry::{ActivatedModule, ModuleRegistry, RegistryConfig};
pub use report::{CleanupFailure, ShutdownReport};
