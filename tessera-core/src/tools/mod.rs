//! Tools published by capability modules
//!
//! A [`ToolDescriptor`] names an operation, describes its input, and carries
//! the handler plus a `mutates` flag. The [`gate`] decides which descriptors
//! a module may expose under its access mode; exposed descriptors land on a
//! [`ToolTransport`], usually the shared [`ToolCatalog`].
//!
//! # Example
//!
//! ```rust,no_run
//! use tessera_core::tools::{ToolCatalog, ToolDescriptor, ToolTransport};
//! use serde_json::json;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let catalog = ToolCatalog::new();
//! catalog
//!     .publish(ToolDescriptor::from_fn("ping", "Liveness probe", |_| async {
//!         Ok(json!("pong"))
//!     }))
//!     .await?;
//!
//! let reply = catalog.call("ping", json!({})).await?;
//! # Ok(())
//! # }
//! ```

mod catalog;
pub mod gate;
mod result;
mod tool;

pub use catalog::{ToolCatalog, ToolSummary, ToolTransport};
pub use gate::{SkipReporting, should_expose};
pub use result::{ToolError, ToolErrorKind};
pub use tool::{FnHandler, ToolDescriptor, ToolHandler, ToolSchema, is_valid_tool_name};
