//! Publication context handed to modules during activation

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::PublishError;
use crate::mode::AccessMode;
use crate::tools::{SkipReporting, ToolDescriptor, ToolTransport, should_expose};

/// Result of a single publication attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The tool is now exposed on the transport
    Published,
    /// The mode gate withheld the tool
    Skipped,
}

/// Tools a module published or had withheld during one activation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicationLedger {
    pub published: Vec<String>,
    pub skipped: Vec<String>,
}

/// Read-only view of an activation, passed to `initialize` and `register`.
///
/// Modules never see the raw transport: every publication goes through
/// [`ModuleContext::publish`], which applies the mode gate first.
pub struct ModuleContext {
    module: String,
    mode: AccessMode,
    transport: Arc<dyn ToolTransport>,
    skip_reporting: SkipReporting,
    ledger: Mutex<PublicationLedger>,
}

impl std::fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleContext")
            .field("module", &self.module)
            .field("mode", &self.mode)
            .field("skip_reporting", &self.skip_reporting)
            .finish_non_exhaustive()
    }
}

impl ModuleContext {
    /// Create a context outside a registry, e.g. to drive a module in tests
    pub fn new(
        module: impl Into<String>,
        mode: AccessMode,
        transport: Arc<dyn ToolTransport>,
        skip_reporting: SkipReporting,
    ) -> Self {
        Self {
            module: module.into(),
            mode,
            transport,
            skip_reporting,
            ledger: Mutex::new(PublicationLedger::default()),
        }
    }

    /// Name of the module being activated
    pub fn module_name(&self) -> &str {
        &self.module
    }

    /// Resolved access mode for this activation
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Publish a tool if the mode gate allows it.
    ///
    /// A gated tool is not an error: the call returns
    /// [`PublishOutcome::Skipped`] and the module carries on registering.
    pub async fn publish(&self, tool: ToolDescriptor) -> Result<PublishOutcome, PublishError> {
        let name = tool.name().to_string();

        if !should_expose(self.mode, &tool) {
            if self.skip_reporting == SkipReporting::Observable {
                warn!(
                    module = %self.module,
                    tool = %name,
                    mode = %self.mode,
                    "Mutating tool not exposed under current mode"
                );
                self.ledger.lock().await.skipped.push(name);
            }
            return Ok(PublishOutcome::Skipped);
        }

        self.transport.publish(tool).await?;
        debug!(module = %self.module, tool = %name, "Tool published");
        self.ledger.lock().await.published.push(name);
        Ok(PublishOutcome::Published)
    }

    /// Tools recorded so far
    pub async fn ledger(&self) -> PublicationLedger {
        self.ledger.lock().await.clone()
    }

    pub(crate) fn into_ledger(self) -> PublicationLedger {
        self.ledger.into_inner()
    }
}
