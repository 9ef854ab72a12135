//! In-memory key-value module
//!
//! Config keys:
//! - `name`: module name and tool prefix (default `kv`)
//! - `mode`: access mode, falls back to `TESSERA_KV_MODE`
//! - `seed`: object of initial entries
//! - `max_entries`: capacity; new keys beyond it are refused, and health
//!   reports false once the store is full

use anyhow::{Context, bail};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_core::prelude::*;
use tokio::sync::RwLock;
use tracing::debug;

/// Environment variable consulted when the config has no `mode`
pub const MODE_VAR: &str = "TESSERA_KV_MODE";

type Store = Arc<RwLock<BTreeMap<String, Value>>>;

pub struct KvFactory;

impl ModuleFactory for KvFactory {
    fn kind(&self) -> &str {
        "kv"
    }

    fn create(&self, config: &ModuleConfig, env: &dyn EnvSource) -> anyhow::Result<BoxedModule> {
        let mode = resolve_mode(config, Some(MODE_VAR), env)?;
        let name = config.get_str("name").unwrap_or("kv");
        let max_entries = match config.get("max_entries") {
            None => None,
            Some(value) => Some(
                value
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .context("max_entries must be a non-negative integer")?,
            ),
        };

        Ok(Box::new(KvModule {
            metadata: ModuleMetadata::new(name, env!("CARGO_PKG_VERSION"))
                .with_description("In-memory key-value store")
                .with_mode(mode)
                .with_family(ModeFamily::Standard),
            seed: config.get("seed").cloned(),
            max_entries,
            store: Store::default(),
        }))
    }
}

struct KvModule {
    metadata: ModuleMetadata,
    seed: Option<Value>,
    max_entries: Option<usize>,
    store: Store,
}

#[async_trait]
impl CapabilityModule for KvModule {
    fn metadata(&self) -> &ModuleMetadata {
        &self.metadata
    }

    async fn initialize(&mut self, _ctx: &ModuleContext) -> anyhow::Result<()> {
        let entries = match self.seed.take() {
            None => return Ok(()),
            Some(Value::Object(entries)) => entries,
            Some(other) => bail!("seed must be an object, got {}", other),
        };

        if let Some(max) = self.max_entries {
            if entries.len() > max {
                bail!("seed has {} entries, capacity is {}", entries.len(), max);
            }
        }

        let mut store = self.store.write().await;
        store.extend(entries);
        debug!(module = %self.metadata.name, entries = store.len(), "Seeded store");
        Ok(())
    }

    async fn register(&mut self, ctx: &ModuleContext) -> anyhow::Result<()> {
        let prefix = ctx.module_name();

        let store = Arc::clone(&self.store);
        ctx.publish(
            ToolDescriptor::from_fn(format!("{prefix}_get"), "Get the value stored under a key", move |args| {
                let store = Arc::clone(&store);
                async move {
                    let key = ToolError::require_str(&args, "key")?;
                    store
                        .read()
                        .await
                        .get(key)
                        .cloned()
                        .ok_or_else(|| ToolError::not_found(format!("No value for key '{}'", key)))
                }
            })
            .with_schema(key_schema()),
        )
        .await?;

        let store = Arc::clone(&self.store);
        ctx.publish(
            ToolDescriptor::from_fn(format!("{prefix}_list"), "List stored keys", move |args| {
                let store = Arc::clone(&store);
                async move {
                    let prefix = args.get("prefix").and_then(Value::as_str).unwrap_or("");
                    let keys: Vec<String> = store
                        .read()
                        .await
                        .keys()
                        .filter(|k| k.starts_with(prefix))
                        .cloned()
                        .collect();
                    Ok(json!(keys))
                }
            })
            .with_schema(json!({
                "type": "object",
                "properties": { "prefix": { "type": "string" } }
            })),
        )
        .await?;

        let store = Arc::clone(&self.store);
        let max_entries = self.max_entries;
        ctx.publish(
            ToolDescriptor::from_fn(format!("{prefix}_set"), "Store a value under a key", move |args| {
                let store = Arc::clone(&store);
                async move {
                    let key = ToolError::require_str(&args, "key")?.to_string();
                    let value = args
                        .get("value")
                        .cloned()
                        .ok_or_else(|| ToolError::validation("'value' is required"))?;

                    let mut store = store.write().await;
                    if let Some(max) = max_entries {
                        if !store.contains_key(&key) && store.len() >= max {
                            return Err(ToolError::execution(format!("Store is full ({} entries)", max)));
                        }
                    }
                    let previous = store.insert(key, value);
                    Ok(json!({ "replaced": previous.is_some() }))
                }
            })
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "key": { "type": "string" },
                    "value": {}
                },
                "required": ["key", "value"]
            }))
            .mutating(),
        )
        .await?;

        let store = Arc::clone(&self.store);
        ctx.publish(
            ToolDescriptor::from_fn(format!("{prefix}_delete"), "Delete a key", move |args| {
                let store = Arc::clone(&store);
                async move {
                    let key = ToolError::require_str(&args, "key")?;
                    let removed = store.write().await.remove(key).is_some();
                    Ok(json!({ "removed": removed }))
                }
            })
            .with_schema(key_schema())
            .mutating(),
        )
        .await?;

        Ok(())
    }

    async fn cleanup(&mut self) -> anyhow::Result<()> {
        self.store.write().await.clear();
        Ok(())
    }

    /// Healthy while the store can still take a new key
    async fn health_check(&self) -> anyhow::Result<bool> {
        let len = self.store.read().await.len();
        Ok(self.max_entries.is_none_or(|max| len < max))
    }
}

fn key_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "key": { "type": "string" } },
        "required": ["key"]
    })
}
