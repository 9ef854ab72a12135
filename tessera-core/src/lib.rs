//! # Tessera - Capability Module Host
//!
//! Tessera hosts independent *capability modules*. Each module publishes a set
//! of named *tools* that an external protocol client (MCP over stdio) can list
//! and invoke. The core provides:
//! - A module contract with two-phase activation (`initialize`, then `register`)
//! - Access modes resolved once per activation, from config, environment or a
//!   registry default
//! - A mode gate that keeps mutating tools off the transport under `ReadOnly`
//! - Coordinated teardown and health reporting across modules
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tessera_core::prelude::*;
//!
//! # async fn demo(factory: &dyn ModuleFactory) -> anyhow::Result<()> {
//! let catalog = Arc::new(ToolCatalog::new());
//! let mut registry = ModuleRegistry::new(catalog.clone());
//!
//! registry.activate(factory, ModuleConfig::new()).await?;
//! println!("exposed: {:?}", catalog.names().await);
//!
//! let report = registry.shutdown_all().await;
//! assert!(report.is_clean());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod mcp;
pub mod mode;
pub mod module;
pub mod registry;
pub mod tools;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{HostConfig, ModuleSpec, ServerConfig};
    pub use crate::error::{ConfigError, PublishError, RegistryError, Result};
    pub use crate::mcp::{McpServer, McpServerBuilder, MemoryTransport, MessageTransport, StdioTransport};
    pub use crate::mode::{AccessMode, EnvSource, ModeFamily, ProcessEnv, resolve_mode};
    pub use crate::module::{BoxedModule, CapabilityModule, FnFactory, ModuleConfig, ModuleFactory, ModuleMetadata};
    pub use crate::registry::{
        ActivatedModule, CleanupFailure, ModuleContext, ModuleRegistry, PublishOutcome, RegistryConfig,
        ShutdownReport,
    };
    pub use crate::tools::{
        SkipReporting, ToolCatalog, ToolDescriptor, ToolError, ToolErrorKind, ToolHandler, ToolSchema,
        ToolSummary, ToolTransport, should_expose,
    };
}
