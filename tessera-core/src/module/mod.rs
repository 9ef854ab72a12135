//! Capability module contract
//!
//! A capability module is an independently activatable unit that exposes a
//! set of tools. The registry consumes this contract; it never implements it.
//!
//! Lifecycle, driven by [`crate::registry::ModuleRegistry`]:
//! 1. [`ModuleFactory::create`] instantiates the module from its configuration
//! 2. [`CapabilityModule::initialize`] acquires resources (may do I/O, may fail)
//! 3. [`CapabilityModule::register`] publishes tools through the context
//! 4. [`CapabilityModule::cleanup`] releases resources on deactivation
//!
//! [`CapabilityModule::health_check`] may be called any number of times while
//! the module is active.

mod config;
mod contract;
mod metadata;

pub use config::ModuleConfig;
pub use contract::{BoxedModule, CapabilityModule, FnFactory, ModuleFactory};
pub use metadata::ModuleMetadata;
