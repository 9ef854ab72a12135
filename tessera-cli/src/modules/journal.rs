//! Append-only journal module
//!
//! Supports the extended mode family, so a `write_only` journal accepts
//! appends while still allowing reads. With a `path` the journal is backed by
//! a JSON-lines file that is replayed on initialize.

use anyhow::{Context, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tessera_core::prelude::*;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Environment variable consulted when the config has no `mode`
pub const MODE_VAR: &str = "TESSERA_JOURNAL_MODE";

const DEFAULT_READ_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    seq: u64,
    at: DateTime<Utc>,
    message: String,
}

#[derive(Default)]
struct Journal {
    entries: Vec<Entry>,
    file: Option<tokio::fs::File>,
    /// Set once a failed write could not be rolled back; appends are refused
    /// so the file never holds a torn line
    broken: bool,
}

impl Journal {
    async fn append(&mut self, message: String) -> anyhow::Result<Entry> {
        if self.broken {
            bail!("journal file is unusable after a failed write");
        }

        let seq = match self.entries.last() {
            None => 1,
            Some(last) => last.seq.checked_add(1).context("journal sequence numbers exhausted")?,
        };
        let entry = Entry {
            seq,
            at: Utc::now(),
            message,
        };

        if let Some(file) = self.file.as_mut() {
            let mut line = serde_json::to_string(&entry)?;
            line.push('\n');

            let len = file.metadata().await?.len();
            if let Err(e) = write_line(file, line.as_bytes()).await {
                if let Err(truncate) = file.set_len(len).await {
                    warn!(error = %truncate, "Could not roll back partial journal write");
                    self.file = None;
                    self.broken = true;
                }
                return Err(e).context("writing journal entry");
            }
        }

        self.entries.push(entry.clone());
        Ok(entry)
    }
}

async fn write_line(file: &mut tokio::fs::File, line: &[u8]) -> std::io::Result<()> {
    file.write_all(line).await?;
    file.flush().await
}

pub struct JournalFactory;

impl ModuleFactory for JournalFactory {
    fn kind(&self) -> &str {
        "journal"
    }

    fn create(&self, config: &ModuleConfig, env: &dyn EnvSource) -> anyhow::Result<BoxedModule> {
        let mode = resolve_mode(config, Some(MODE_VAR), env)?;
        let name = config.get_str("name").unwrap_or("journal");

        Ok(Box::new(JournalModule {
            metadata: ModuleMetadata::new(name, env!("CARGO_PKG_VERSION"))
                .with_description("Append-only journal")
                .with_mode(mode)
                .with_family(ModeFamily::Extended),
            path: config.get_str("path").map(PathBuf::from),
            journal: Arc::new(Mutex::new(Journal::default())),
        }))
    }
}

struct JournalModule {
    metadata: ModuleMetadata,
    path: Option<PathBuf>,
    journal: Arc<Mutex<Journal>>,
}

#[async_trait]
impl CapabilityModule for JournalModule {
    fn metadata(&self) -> &ModuleMetadata {
        &self.metadata
    }

    async fn initialize(&mut self, _ctx: &ModuleContext) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut entries = Vec::new();
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => {
                for (lineno, line) in contents.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
                    let entry: Entry = serde_json::from_str(line)
                        .with_context(|| format!("{}:{}: malformed journal entry", path.display(), lineno + 1))?;
                    entries.push(entry);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        }

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("opening {}", path.display()))?;

        info!(module = %self.metadata.name, path = %path.display(), entries = entries.len(), "Journal opened");
        let mut journal = self.journal.lock().await;
        journal.entries = entries;
        journal.file = Some(file);
        Ok(())
    }

    async fn register(&mut self, ctx: &ModuleContext) -> anyhow::Result<()> {
        let prefix = ctx.module_name();

        let journal = Arc::clone(&self.journal);
        ctx.publish(
            ToolDescriptor::from_fn(format!("{prefix}_read"), "Read the most recent journal entries", move |args| {
                let journal = Arc::clone(&journal);
                async move {
                    let limit = match args.get("limit") {
                        None | Some(Value::Null) => DEFAULT_READ_LIMIT,
                        Some(v) => v
                            .as_u64()
                            .and_then(|n| usize::try_from(n).ok())
                            .ok_or_else(|| ToolError::validation("'limit' must be a non-negative integer"))?,
                    };
                    let journal = journal.lock().await;
                    let skip = journal.entries.len().saturating_sub(limit);
                    serde_json::to_value(&journal.entries[skip..]).map_err(|e| ToolError::internal(e.to_string()))
                }
            })
            .with_schema(json!({
                "type": "object",
                "properties": { "limit": { "type": "integer", "minimum": 0 } }
            })),
        )
        .await?;

        let journal = Arc::clone(&self.journal);
        ctx.publish(
            ToolDescriptor::from_fn(format!("{prefix}_append"), "Append an entry to the journal", move |args| {
                let journal = Arc::clone(&journal);
                async move {
                    let message = ToolError::require_str(&args, "message")?.to_string();
                    let entry = journal.lock().await.append(message).await?;
                    Ok(json!({ "seq": entry.seq }))
                }
            })
            .with_schema(json!({
                "type": "object",
                "properties": { "message": { "type": "string" } },
                "required": ["message"]
            }))
            .mutating(),
        )
        .await?;

        Ok(())
    }

    async fn cleanup(&mut self) -> anyhow::Result<()> {
        let mut journal = self.journal.lock().await;
        if let Some(mut file) = journal.file.take() {
            file.flush().await?;
            file.sync_all().await?;
            debug!(module = %self.metadata.name, "Journal file closed");
        }
        Ok(())
    }

    async fn health_check(&self) -> anyhow::Result<bool> {
        match &self.path {
            None => Ok(true),
            Some(path) => Ok(tokio::fs::try_exists(path).await?),
        }
    }
}
