//! Model Context Protocol (MCP) server
//!
//! Exposes the tool catalog to MCP clients over newline-delimited JSON-RPC
//! 2.0. Supported methods:
//! - `initialize` / `notifications/initialized` - Connection setup
//! - `ping` - Liveness
//! - `tools/list` - List exposed tools
//! - `tools/call` - Call a tool
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tessera_core::mcp::{McpServer, StdioTransport};
//! use tessera_core::tools::ToolCatalog;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let catalog = Arc::new(ToolCatalog::new());
//! let server = McpServer::builder()
//!     .name("tessera")
//!     .with_catalog(catalog)
//!     .build();
//!
//! server.run(StdioTransport::new()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # References
//!
//! - [MCP Specification](https://modelcontextprotocol.io/specification)

mod protocol;
mod server;
mod transport;

pub use protocol::*;
pub use server::{McpServer, McpServerBuilder, McpServerConfig};
pub use transport::{MemoryTransport, MessageTransport, StdioTransport, TransportError};
