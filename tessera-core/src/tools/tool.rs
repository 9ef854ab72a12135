//! Tool descriptors and handlers
//!
//! A tool is a named operation a module exposes to the protocol client. The
//! descriptor pairs a human-readable contract (description + input schema)
//! with a handler and a `mutates` flag consumed by the mode gate.

use super::result::ToolError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

static TOOL_NAME: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").ok());

/// Check that a tool name is a plain identifier
pub fn is_valid_tool_name(name: &str) -> bool {
    TOOL_NAME.as_ref().is_some_and(|re| re.is_match(name))
}

/// JSON Schema for tool parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// JSON Schema for input parameters
    pub parameters: Value,
}

impl ToolSchema {
    /// Create a schema from a JSON Schema value
    pub fn new(parameters: Value) -> Self {
        Self { parameters }
    }

    /// Create an empty schema (tool takes no parameters)
    pub fn empty() -> Self {
        Self {
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        }
    }
}

impl Default for ToolSchema {
    fn default() -> Self {
        Self::empty()
    }
}

/// Handler trait for tool execution
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute and return a JSON result
    async fn handle(&self, args: Value) -> Result<Value, ToolError>;
}

/// Adapter turning an async closure into a [`ToolHandler`]
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ToolError>> + Send,
{
    async fn handle(&self, args: Value) -> Result<Value, ToolError> {
        (self.0)(args).await
    }
}

/// A named operation published by a module
///
/// Descriptors are immutable once published; cloning shares the handler.
#[derive(Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    schema: ToolSchema,
    mutates: bool,
    handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("mutates", &self.mutates)
            .finish_non_exhaustive()
    }
}

impl ToolDescriptor {
    /// Create a non-mutating tool with an empty input schema
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: ToolSchema::empty(),
            mutates: false,
            handler: Arc::new(handler),
        }
    }

    /// Create a tool from an async closure
    pub fn from_fn<F, Fut>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        Self::new(name, description, FnHandler(f))
    }

    /// Set the input schema
    pub fn with_schema(mut self, parameters: Value) -> Self {
        self.schema = ToolSchema::new(parameters);
        self
    }

    /// Mark the tool as changing external state
    pub fn mutating(mut self) -> Self {
        self.mutates = true;
        self
    }

    /// Set the mutation flag explicitly
    pub fn with_mutates(mut self, mutates: bool) -> Self {
        self.mutates = mutates;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    /// Whether invoking this tool can change external state
    pub fn mutates(&self) -> bool {
        self.mutates
    }

    /// Invoke the handler
    pub async fn call(&self, args: Value) -> Result<Value, ToolError> {
        self.handler.handle(args).await
    }
}
