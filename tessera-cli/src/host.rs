//! Host bootstrap: build a registry from configuration and activate modules

use anyhow::Context;
use std::sync::Arc;
use tessera_core::prelude::*;
use tracing::{info, warn};

use crate::modules;

/// A running set of modules and the catalog they publish onto
pub struct Host {
    pub registry: ModuleRegistry,
    pub catalog: Arc<ToolCatalog>,
}

impl Host {
    /// Activate every enabled module in declaration order.
    ///
    /// If any activation fails, modules already active are shut down before
    /// the error is returned.
    pub async fn start(config: &HostConfig, env: Arc<dyn EnvSource>) -> anyhow::Result<Self> {
        let catalog = Arc::new(ToolCatalog::new());
        let mut registry = ModuleRegistry::with_config(catalog.clone(), config.registry.clone()).with_env(env);

        for spec in config.enabled_modules() {
            if let Err(e) = activate(&mut registry, spec).await {
                let report = registry.shutdown_all().await;
                log_report(&report);
                return Err(e);
            }
        }

        info!(
            modules = registry.len(),
            tools = catalog.len().await,
            "Host started"
        );
        Ok(Self { registry, catalog })
    }

    /// Shut every module down and log the outcome
    pub async fn stop(mut self) -> ShutdownReport {
        let report = self.registry.shutdown_all().await;
        log_report(&report);
        report
    }
}

async fn activate(registry: &mut ModuleRegistry, spec: &ModuleSpec) -> anyhow::Result<()> {
    let factory = modules::factory(&spec.kind).with_context(|| {
        format!(
            "Unknown module kind '{}' (available: {})",
            spec.kind,
            modules::KINDS.join(", ")
        )
    })?;

    registry
        .activate(factory.as_ref(), spec.config.clone())
        .await
        .with_context(|| format!("Failed to activate '{}' module", spec.kind))
}

fn log_report(report: &ShutdownReport) {
    for failure in &report.failures {
        warn!(module = %failure.module, error = %failure.error, "Module did not clean up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn no_env() -> Arc<dyn EnvSource> {
        Arc::new(HashMap::<String, String>::new())
    }

    fn spec(kind: &str, config: serde_json::Value) -> ModuleSpec {
        ModuleSpec {
            kind: kind.to_string(),
            enabled: true,
            config: ModuleConfig::from_value(config).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_start_builtin_modules() {
        let config = HostConfig {
            modules: vec![spec("kv", json!({})), spec("journal", json!({ "mode": "full" }))],
            ..HostConfig::default()
        };

        let host = Host::start(&config, no_env()).await.unwrap();
        assert_eq!(host.registry.names(), vec!["journal", "kv"]);
        assert_eq!(
            host.catalog.names().await,
            vec!["journal_append", "journal_read", "kv_get", "kv_list"]
        );

        let report = host.stop().await;
        assert!(report.is_clean());
        assert_eq!(report.removed.len(), 2);
    }

    #[tokio::test]
    async fn test_default_mode_override() {
        let mut config = HostConfig {
            modules: vec![spec("kv", json!({}))],
            ..HostConfig::default()
        };
        config.registry.default_mode = AccessMode::Full;

        let host = Host::start(&config, no_env()).await.unwrap();
        assert!(host.catalog.contains("kv_set").await);
    }

    #[tokio::test]
    async fn test_disabled_modules_are_skipped() {
        let mut disabled = spec("journal", json!({}));
        disabled.enabled = false;
        let config = HostConfig {
            modules: vec![spec("kv", json!({})), disabled],
            ..HostConfig::default()
        };

        let host = Host::start(&config, no_env()).await.unwrap();
        assert_eq!(host.registry.names(), vec!["kv"]);
    }

    #[tokio::test]
    async fn test_unknown_kind_fails_cleanly() {
        let config = HostConfig {
            modules: vec![spec("kv", json!({})), spec("postgres", json!({}))],
            ..HostConfig::default()
        };

        let err = Host::start(&config, no_env()).await.err().unwrap();
        assert!(err.to_string().contains("postgres"));
    }

    #[tokio::test]
    async fn test_duplicate_module_name_fails() {
        let config = HostConfig {
            modules: vec![spec("kv", json!({})), spec("kv", json!({}))],
            ..HostConfig::default()
        };

        let err = Host::start(&config, no_env()).await.err().unwrap();
        let registry_error = err.downcast_ref::<RegistryError>().unwrap();
        assert!(matches!(registry_error, RegistryError::Duplicate(name) if name == "kv"));
    }
}
