//! Tool transport and the in-process tool catalog
//!
//! Modules publish tools onto a [`ToolTransport`]. The registry forwards a
//! shared handle into every module context and retracts tools when a module
//! goes away. [`ToolCatalog`] is the in-process transport: it keeps the
//! published descriptors and lets the protocol server list and invoke them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::result::ToolError;
use super::tool::{ToolDescriptor, is_valid_tool_name};
use crate::error::PublishError;

/// Endpoint tools are published onto
#[async_trait]
pub trait ToolTransport: Send + Sync {
    /// Expose a tool to clients
    async fn publish(&self, tool: ToolDescriptor) -> Result<(), PublishError>;

    /// Withdraw a previously published tool.
    ///
    /// Returns `true` if the tool was present. Transports that cannot retract
    /// keep the default.
    async fn retract(&self, _name: &str) -> bool {
        false
    }
}

/// Summary of a tool for listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSummary {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for input parameters
    pub input_schema: Value,
    /// Whether the tool changes external state
    pub mutates: bool,
}

impl From<&ToolDescriptor> for ToolSummary {
    fn from(tool: &ToolDescriptor) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            input_schema: tool.schema().parameters.clone(),
            mutates: tool.mutates(),
        }
    }
}

/// In-process tool transport
///
/// Names are unique; publishing a name twice fails with
/// [`PublishError::DuplicateTool`].
#[derive(Default)]
pub struct ToolCatalog {
    tools: RwLock<HashMap<String, ToolDescriptor>>,
}

impl std::fmt::Debug for ToolCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCatalog").finish_non_exhaustive()
    }
}

impl ToolCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a tool by name
    pub async fn get(&self, name: &str) -> Option<ToolDescriptor> {
        self.tools.read().await.get(name).cloned()
    }

    /// Check if a tool is published
    pub async fn contains(&self, name: &str) -> bool {
        self.tools.read().await.contains_key(name)
    }

    /// Sorted names of all published tools
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of published tools
    pub async fn len(&self) -> usize {
        self.tools.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tools.read().await.is_empty()
    }

    /// Summaries of all published tools, sorted by name
    pub async fn list(&self) -> Vec<ToolSummary> {
        let mut summaries: Vec<ToolSummary> =
            self.tools.read().await.values().map(ToolSummary::from).collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Invoke a tool by name.
    ///
    /// The read lock is released before the handler runs, so handlers may
    /// take as long as they need without blocking publication.
    pub async fn call(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .await
            .ok_or_else(|| ToolError::not_found(format!("Tool '{}' not found", name)))?;
        tool.call(args).await
    }
}

#[async_trait]
impl ToolTransport for ToolCatalog {
    async fn publish(&self, tool: ToolDescriptor) -> Result<(), PublishError> {
        if !is_valid_tool_name(tool.name()) {
            return Err(PublishError::InvalidName(tool.name().to_string()));
        }

        let mut tools = self.tools.write().await;
        if tools.contains_key(tool.name()) {
            return Err(PublishError::DuplicateTool(tool.name().to_string()));
        }
        tools.insert(tool.name().to_string(), tool);
        Ok(())
    }

    async fn retract(&self, name: &str) -> bool {
        self.tools.write().await.remove(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo(name: &str) -> ToolDescriptor {
        ToolDescriptor::from_fn(name, "Echoes input", |args| async move { Ok(args) })
    }

    #[tokio::test]
    async fn test_publish_and_get() {
        let catalog = ToolCatalog::new();
        catalog.publish(echo("echo")).await.unwrap();

        assert!(catalog.contains("echo").await);
        assert_eq!(catalog.len().await, 1);
        assert_eq!(catalog.get("echo").await.unwrap().name(), "echo");
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let catalog = ToolCatalog::new();
        catalog.publish(echo("echo")).await.unwrap();

        let err = catalog.publish(echo("echo")).await.unwrap_err();
        assert_eq!(err, PublishError::DuplicateTool("echo".to_string()));
        assert_eq!(catalog.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_name_rejected() {
        let catalog = ToolCatalog::new();
        let err = catalog.publish(echo("bad-name")).await.unwrap_err();
        assert!(matches!(err, PublishError::InvalidName(_)));
        assert!(catalog.is_empty().await);
    }

    #[tokio::test]
    async fn test_retract() {
        let catalog = ToolCatalog::new();
        catalog.publish(echo("echo")).await.unwrap();

        assert!(catalog.retract("echo").await);
        assert!(!catalog.retract("echo").await);
        assert!(catalog.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_is_sorted() {
        let catalog = ToolCatalog::new();
        for name in ["zeta", "alpha", "mid"] {
            catalog.publish(echo(name)).await.unwrap();
        }

        let names: Vec<String> = catalog.list().await.into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
        assert_eq!(catalog.names().await, names);
    }

    #[tokio::test]
    async fn test_call() {
        let catalog = ToolCatalog::new();
        catalog.publish(echo("echo")).await.unwrap();

        let result = catalog.call("echo", json!({"x": 1})).await.unwrap();
        assert_eq!(result, json!({"x": 1}));

        let err = catalog.call("missing", json!({})).await.unwrap_err();
        assert_eq!(err.kind, crate::tools::ToolErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_default_retract_is_noop() {
        struct PublishOnly;

        #[async_trait]
        impl ToolTransport for PublishOnly {
            async fn publish(&self, _tool: ToolDescriptor) -> Result<(), PublishError> {
                Ok(())
            }
        }

        let transport = PublishOnly;
        transport.publish(echo("echo")).await.unwrap();
        assert!(!transport.retract("echo").await);
    }
}
