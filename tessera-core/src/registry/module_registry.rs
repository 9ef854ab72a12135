//! The module registry and its activation records

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::context::{ModuleContext, PublicationLedger};
use super::report::{CleanupFailure, ShutdownReport};
use crate::error::{RegistryError, Result};
use crate::mode::{AccessMode, EnvSource, ProcessEnv};
use crate::module::{BoxedModule, CapabilityModule, ModuleConfig, ModuleFactory, ModuleMetadata};
use crate::tools::{SkipReporting, ToolTransport};

/// Registry-wide policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Mode applied when a module resolves none of its own
    pub default_mode: AccessMode,

    /// How tools withheld by the mode gate are reported
    pub skip_reporting: SkipReporting,

    /// Retract published tools and call `cleanup` when `initialize` or
    /// `register` fails
    pub rollback_on_failure: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_mode: AccessMode::ReadOnly,
            skip_reporting: SkipReporting::Observable,
            rollback_on_failure: true,
        }
    }
}

/// A live module owned by the registry
pub struct ActivatedModule {
    metadata: ModuleMetadata,
    mode: AccessMode,
    instance: BoxedModule,
    published_tools: Vec<String>,
    skipped_tools: Vec<String>,
    activation_id: Uuid,
    activated_at: DateTime<Utc>,
}

impl std::fmt::Debug for ActivatedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivatedModule")
            .field("name", &self.metadata.name)
            .field("mode", &self.mode)
            .field("published_tools", &self.published_tools)
            .field("skipped_tools", &self.skipped_tools)
            .field("activation_id", &self.activation_id)
            .finish_non_exhaustive()
    }
}

impl ActivatedModule {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Metadata captured at activation
    pub fn metadata(&self) -> &ModuleMetadata {
        &self.metadata
    }

    /// Mode resolved at activation
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn instance(&self) -> &dyn CapabilityModule {
        self.instance.as_ref()
    }

    /// Tools exposed on the transport by this activation
    pub fn published_tools(&self) -> &[String] {
        &self.published_tools
    }

    /// Tools withheld by the mode gate (empty under silent reporting)
    pub fn skipped_tools(&self) -> &[String] {
        &self.skipped_tools
    }

    pub fn activation_id(&self) -> Uuid {
        self.activation_id
    }

    pub fn activated_at(&self) -> DateTime<Utc> {
        self.activated_at
    }
}

/// Owns activated modules and drives their lifecycle.
///
/// Mutating operations take `&mut self`; callers serialize activation.
/// Several registries may share one transport, as long as their modules
/// publish distinct tool names.
pub struct ModuleRegistry {
    modules: HashMap<String, ActivatedModule>,
    transport: Arc<dyn ToolTransport>,
    config: RegistryConfig,
    env: Arc<dyn EnvSource>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ModuleRegistry {
    /// Create a registry with default policy over the process environment
    pub fn new(transport: Arc<dyn ToolTransport>) -> Self {
        Self::with_config(transport, RegistryConfig::default())
    }

    /// Create a registry with explicit policy
    pub fn with_config(transport: Arc<dyn ToolTransport>, config: RegistryConfig) -> Self {
        Self {
            modules: HashMap::new(),
            transport,
            config,
            env: Arc::new(ProcessEnv),
        }
    }

    /// Replace the environment source handed to factories
    pub fn with_env(mut self, env: Arc<dyn EnvSource>) -> Self {
        self.env = env;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Shared transport modules publish onto
    pub fn transport(&self) -> &Arc<dyn ToolTransport> {
        &self.transport
    }

    /// Instantiate, initialize and register a module, then store it.
    ///
    /// A failed activation never leaves an entry behind. With
    /// `rollback_on_failure` the tools it published are retracted and its
    /// `cleanup` runs before the error is returned.
    pub async fn activate(&mut self, factory: &dyn ModuleFactory, config: ModuleConfig) -> Result<()> {
        let mut instance = factory
            .create(&config, self.env.as_ref())
            .map_err(|e| RegistryError::Configuration(format!("{} factory: {:#}", factory.kind(), e)))?;

        let metadata = instance.metadata().clone();
        let name = metadata.name.clone();
        let mode = metadata.mode.unwrap_or(self.config.default_mode);

        if !metadata.family.supports(mode) {
            return Err(RegistryError::Configuration(format!(
                "Module '{}' does not support mode {}",
                name, mode
            )));
        }

        if self.modules.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }

        debug!(module = %name, mode = %mode, "Activating module");
        let ctx = ModuleContext::new(
            name.clone(),
            mode,
            Arc::clone(&self.transport),
            self.config.skip_reporting,
        );

        if let Err(source) = contained(instance.initialize(&ctx)).await {
            self.unwind(&name, &mut instance, ctx).await;
            return Err(RegistryError::Initialization { module: name, source });
        }

        if let Err(source) = contained(instance.register(&ctx)).await {
            self.unwind(&name, &mut instance, ctx).await;
            return Err(RegistryError::Registration { module: name, source });
        }

        let PublicationLedger { published, skipped } = ctx.into_ledger();
        info!(
            module = %name,
            mode = %mode,
            published = published.len(),
            skipped = skipped.len(),
            "Module activated"
        );

        self.modules.insert(
            name,
            ActivatedModule {
                metadata,
                mode,
                instance,
                published_tools: published,
                skipped_tools: skipped,
                activation_id: Uuid::new_v4(),
                activated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn unwind(&self, name: &str, instance: &mut BoxedModule, ctx: ModuleContext) {
        if !self.config.rollback_on_failure {
            return;
        }

        let ledger = ctx.into_ledger();
        for tool in &ledger.published {
            if !self.transport.retract(tool).await {
                debug!(module = %name, tool = %tool, "Transport could not retract tool");
            }
        }

        if let Err(e) = contained(instance.cleanup()).await {
            warn!(module = %name, error = %e, "Cleanup after failed activation also failed");
        }
    }

    /// Remove a module, retract its tools and run its cleanup.
    ///
    /// The module is gone even when cleanup fails; the failure is returned
    /// as [`RegistryError::Cleanup`].
    pub async fn deactivate(&mut self, name: &str) -> Result<()> {
        let mut entry = self
            .modules
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        retract_all(self.transport.as_ref(), &entry).await;

        let result = contained(entry.instance.cleanup()).await;
        info!(module = %name, "Module deactivated");
        result.map_err(|source| RegistryError::Cleanup {
            module: name.to_string(),
            source,
        })
    }

    /// Deactivate every module, collecting cleanup failures.
    ///
    /// A panicking `cleanup` is recorded as a failure and the sweep goes on.
    /// Modules are drained in name order. The registry is empty afterwards.
    pub async fn shutdown_all(&mut self) -> ShutdownReport {
        let mut entries: Vec<(String, ActivatedModule)> = std::mem::take(&mut self.modules).into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut report = ShutdownReport::default();
        for (name, mut entry) in entries {
            retract_all(self.transport.as_ref(), &entry).await;

            if let Err(e) = contained(entry.instance.cleanup()).await {
                warn!(module = %name, error = %e, "Module cleanup failed during shutdown");
                report.failures.push(CleanupFailure {
                    module: name.clone(),
                    error: format!("{:#}", e),
                });
            }
            report.removed.push(name);
        }

        info!(
            removed = report.removed.len(),
            failed = report.failures.len(),
            "Registry shut down"
        );
        report
    }

    /// Probe every module. Errors and panics count as unhealthy.
    pub async fn health_check_all(&self) -> BTreeMap<String, bool> {
        let mut results = BTreeMap::new();
        for (name, entry) in &self.modules {
            let healthy = match contained(entry.instance.health_check()).await {
                Ok(healthy) => healthy,
                Err(e) => {
                    warn!(module = %name, error = %e, "Health check failed");
                    false
                }
            };
            results.insert(name.clone(), healthy);
        }
        results
    }

    /// Get an active module by name
    pub fn lookup(&self, name: &str) -> Option<&ActivatedModule> {
        self.modules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// All active modules, sorted by name
    pub fn list_all(&self) -> Vec<&ActivatedModule> {
        let mut modules: Vec<&ActivatedModule> = self.modules.values().collect();
        modules.sort_by(|a, b| a.name().cmp(b.name()));
        modules
    }

    /// Sorted names of active modules
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Sorted names of every tool published by an active module
    pub fn exposed_tools(&self) -> Vec<&str> {
        let mut tools: Vec<&str> = self
            .modules
            .values()
            .flat_map(|m| m.published_tools.iter().map(String::as_str))
            .collect();
        tools.sort_unstable();
        tools
    }
}

async fn retract_all(transport: &dyn ToolTransport, entry: &ActivatedModule) {
    for tool in &entry.published_tools {
        if !transport.retract(tool).await {
            debug!(module = %entry.name(), tool = %tool, "Transport could not retract tool");
        }
    }
}

/// Run a lifecycle call, turning a panic into an error
async fn contained<T>(call: impl Future<Output = anyhow::Result<T>>) -> anyhow::Result<T> {
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(anyhow::anyhow!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
