//! Module metadata

use serde::{Deserialize, Serialize};

use crate::mode::{AccessMode, ModeFamily};

/// Identity and declared mode of a capability module.
///
/// `name` is the registry key and must be unique among active modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    /// Unique module name
    pub name: String,

    /// Module version
    pub version: String,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Mode the module resolved from its own configuration or environment.
    /// `None` lets the registry apply its default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<AccessMode>,

    /// Modes this module understands
    #[serde(default)]
    pub family: ModeFamily,
}

impl ModuleMetadata {
    /// Create metadata with required fields
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            mode: None,
            family: ModeFamily::Standard,
        }
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the declared mode
    pub fn with_mode(mut self, mode: impl Into<Option<AccessMode>>) -> Self {
        self.mode = mode.into();
        self
    }

    /// Set the mode family
    pub fn with_family(mut self, family: ModeFamily) -> Self {
        self.family = family;
        self
    }
}
