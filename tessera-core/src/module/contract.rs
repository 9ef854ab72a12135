//! Module and factory traits

use async_trait::async_trait;

use super::config::ModuleConfig;
use super::metadata::ModuleMetadata;
use crate::mode::EnvSource;
use crate::registry::ModuleContext;

/// Core capability module trait
///
/// Implement this trait to plug a data source or service into the host.
/// `initialize` and `register` are each called exactly once per activation,
/// in that order; `register` only runs if `initialize` succeeded.
#[async_trait]
pub trait CapabilityModule: Send + Sync {
    /// Module metadata. Must not change after the first read.
    fn metadata(&self) -> &ModuleMetadata;

    /// Module name (convenience method)
    fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Acquire resources (connections, pools, files).
    ///
    /// Not required to be idempotent; the registry never calls it twice.
    async fn initialize(&mut self, ctx: &ModuleContext) -> anyhow::Result<()>;

    /// Publish tools through [`ModuleContext::publish`].
    async fn register(&mut self, ctx: &ModuleContext) -> anyhow::Result<()>;

    /// Release resources. Called at most once per activation.
    async fn cleanup(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Report whether the module's backing resource is usable.
    ///
    /// Must not mutate state. Modules without a meaningful check report healthy.
    async fn health_check(&self) -> anyhow::Result<bool> {
        Ok(true)
    }
}

/// Type alias for boxed modules
pub type BoxedModule = Box<dyn CapabilityModule>;

/// Produces module instances from configuration ("module class")
pub trait ModuleFactory: Send + Sync {
    /// Kind identifier used in host configuration (e.g. `"kv"`)
    fn kind(&self) -> &str;

    /// Instantiate a module.
    ///
    /// `env` is the registry's environment source; factories use it together
    /// with [`crate::mode::resolve_mode`] to honor module-specific variables.
    fn create(&self, config: &ModuleConfig, env: &dyn EnvSource) -> anyhow::Result<BoxedModule>;
}

/// Factory backed by a closure
pub struct FnFactory<F> {
    kind: String,
    create: F,
}

impl<F> FnFactory<F>
where
    F: Fn(&ModuleConfig, &dyn EnvSource) -> anyhow::Result<BoxedModule> + Send + Sync,
{
    /// Wrap a closure as a factory
    pub fn new(kind: impl Into<String>, create: F) -> Self {
        Self {
            kind: kind.into(),
            create,
        }
    }
}

impl<F> ModuleFactory for FnFactory<F>
where
    F: Fn(&ModuleConfig, &dyn EnvSource) -> anyhow::Result<BoxedModule> + Send + Sync,
{
    fn kind(&self) -> &str {
        &self.kind
    }

    fn create(&self, config: &ModuleConfig, env: &dyn EnvSource) -> anyhow::Result<BoxedModule> {
        (self.create)(config, env)
    }
}
