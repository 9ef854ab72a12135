//! Access modes and mode resolution
//!
//! Every module runs under exactly one [`AccessMode`], resolved once at
//! activation time. The mode decides which of its tools the gate exposes.
//!
//! Resolution precedence (first present value wins):
//! 1. The `mode` key of the module's configuration
//! 2. The module-specific environment variable
//! 3. The registry-wide default (itself defaulting to [`AccessMode::ReadOnly`])

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::module::ModuleConfig;

/// Configuration key consulted first during mode resolution
pub const MODE_CONFIG_KEY: &str = "mode";

/// Access mode a module runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Only non-mutating tools are exposed
    #[default]
    ReadOnly,

    /// Mutating tools are exposed (module families with a write-only split)
    WriteOnly,

    /// Every tool is exposed
    Full,
}

impl AccessMode {
    /// Whether tools that change external state may be exposed under this mode
    pub fn permits_mutation(self) -> bool {
        match self {
            AccessMode::ReadOnly => false,
            AccessMode::WriteOnly | AccessMode::Full => true,
        }
    }

    /// Canonical string name
    pub fn as_str(self) -> &'static str {
        match self {
            AccessMode::ReadOnly => "read_only",
            AccessMode::WriteOnly => "write_only",
            AccessMode::Full => "full",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A mode string that does not name any access mode
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown access mode: '{0}' (expected read_only, write_only or full)")]
pub struct ParseModeError(pub String);

impl FromStr for AccessMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "read_only" | "readonly" | "ro" | "read" => Ok(AccessMode::ReadOnly),
            "write_only" | "writeonly" | "wo" | "write" => Ok(AccessMode::WriteOnly),
            "full" | "rw" | "read_write" => Ok(AccessMode::Full),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// The set of modes a module family understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeFamily {
    /// `ReadOnly` and `Full`
    #[default]
    Standard,

    /// `ReadOnly`, `WriteOnly` and `Full`
    Extended,
}

impl ModeFamily {
    /// Modes belonging to this family
    pub fn modes(self) -> &'static [AccessMode] {
        match self {
            ModeFamily::Standard => &[AccessMode::ReadOnly, AccessMode::Full],
            ModeFamily::Extended => &[AccessMode::ReadOnly, AccessMode::WriteOnly, AccessMode::Full],
        }
    }

    /// Check whether `mode` is a member of this family
    pub fn supports(self, mode: AccessMode) -> bool {
        self.modes().contains(&mode)
    }
}

/// Source of environment variables
///
/// The registry reads the environment through this trait so that tests and
/// embedders can supply values without touching process state.
pub trait EnvSource: Send + Sync {
    /// Look up a variable, returning `None` when unset
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Resolve a module's mode from its configuration and environment.
///
/// Returns `Ok(None)` when neither source sets a mode, leaving the registry
/// default to apply. Blank values count as unset.
///
/// # Errors
///
/// Returns [`ParseModeError`] when a present value does not name a mode, or
/// when the config key holds a non-string value.
pub fn resolve_mode(
    config: &ModuleConfig,
    env_var: Option<&str>,
    env: &dyn EnvSource,
) -> Result<Option<AccessMode>, ParseModeError> {
    if let Some(value) = config.get(MODE_CONFIG_KEY) {
        let raw = value
            .as_str()
            .ok_or_else(|| ParseModeError(value.to_string()))?;
        if !raw.trim().is_empty() {
            return raw.parse().map(Some);
        }
    }

    if let Some(key) = env_var {
        if let Some(raw) = env.var(key) {
            if !raw.trim().is_empty() {
                return raw.parse().map(Some);
            }
        }
    }

    Ok(None)
}
