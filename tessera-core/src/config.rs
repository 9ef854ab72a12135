//! Host configuration
//!
//! Loaded with figment, later sources overriding earlier ones:
//! 1. Built-in defaults
//! 2. `tessera.toml` in the working directory
//! 3. `tessera/tessera.toml` under the user config directory
//! 4. The file named by `TESSERA_CONFIG_PATH`
//! 5. `TESSERA_` environment variables, nested keys split on `__`
//!    (e.g. `TESSERA_REGISTRY__DEFAULT_MODE=full`)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::mode::{EnvSource, ProcessEnv};
use crate::module::ModuleConfig;
use crate::registry::RegistryConfig;

/// Environment variable naming an extra configuration file
pub const CONFIG_PATH_VAR: &str = "TESSERA_CONFIG_PATH";

const CONFIG_FILE: &str = "tessera.toml";

/// Top-level host configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Registry policy
    pub registry: RegistryConfig,

    /// Identity reported to protocol clients
    pub server: ServerConfig,

    /// Modules to activate at start-up, in order
    pub modules: Vec<ModuleSpec>,
}

/// Server identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "tessera".to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

/// One module entry in the host configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    /// Factory kind (e.g. `"kv"`)
    pub kind: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Passed to the factory untouched
    #[serde(default)]
    pub config: ModuleConfig,
}

fn default_enabled() -> bool {
    true
}

impl ModuleSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            enabled: true,
            config: ModuleConfig::new(),
        }
    }
}

impl HostConfig {
    /// Load configuration from files and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment(&ProcessEnv))
    }

    /// Load configuration from a single file, without environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_figment(Figment::from(Serialized::defaults(HostConfig::default())).merge(Toml::file(path)))
    }

    /// Build the layered figment used by [`HostConfig::load`]
    pub fn figment(env: &dyn EnvSource) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(HostConfig::default()))
            .merge(Toml::file(CONFIG_FILE));

        if let Some(path) = user_config_path() {
            figment = figment.merge(Toml::file(path));
        }

        if let Some(path) = env.var(CONFIG_PATH_VAR).filter(|p| !p.trim().is_empty()) {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("TESSERA_").split("__"))
    }

    /// Extract and validate
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: HostConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.name.trim().is_empty() {
            return Err(ConfigError::Invalid("server.name must not be empty".to_string()));
        }

        if let Some(index) = self.modules.iter().position(|m| m.kind.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("modules[{}].kind must not be empty", index)));
        }

        Ok(())
    }

    /// Modules marked enabled, in declaration order
    pub fn enabled_modules(&self) -> impl Iterator<Item = &ModuleSpec> {
        self.modules.iter().filter(|m| m.enabled)
    }
}

/// `<config dir>/tessera/tessera.toml`, if a config dir exists
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tessera").join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::AccessMode;
    use crate::tools::SkipReporting;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.server.name, "tessera");
        assert_eq!(config.registry.default_mode, AccessMode::ReadOnly);
        assert!(config.registry.rollback_on_failure);
        assert!(config.modules.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[registry]
default_mode = "full"
skip_reporting = "silent"

[server]
name = "lab-host"

[[modules]]
kind = "kv"
config = {{ mode = "read-only", seed = {{ greeting = "hello" }} }}

[[modules]]
kind = "journal"
enabled = false
"#
        )
        .unwrap();

        let config = HostConfig::from_file(file.path()).unwrap();

        assert_eq!(config.registry.default_mode, AccessMode::Full);
        assert_eq!(config.registry.skip_reporting, SkipReporting::Silent);
        assert!(config.registry.rollback_on_failure);
        assert_eq!(config.server.name, "lab-host");
        assert_eq!(config.server.version, crate::VERSION);
        assert_eq!(config.modules.len(), 2);
        assert_eq!(config.modules[0].config.get_str("mode"), Some("read-only"));

        let enabled: Vec<&str> = config.enabled_modules().map(|m| m.kind.as_str()).collect();
        assert_eq!(enabled, vec!["kv"]);
    }

    #[test]
    fn test_later_layers_win() {
        let figment = Figment::from(Serialized::defaults(HostConfig::default()))
            .merge(Toml::string("[registry]\ndefault_mode = \"full\""))
            .merge(Toml::string("[registry]\nrollback_on_failure = false"));

        let config = HostConfig::from_figment(figment).unwrap();
        assert_eq!(config.registry.default_mode, AccessMode::Full);
        assert!(!config.registry.rollback_on_failure);
    }

    #[test]
    fn test_config_path_from_env_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nname = \"from-env-path\"").unwrap();

        let env: HashMap<String, String> = [(
            CONFIG_PATH_VAR.to_string(),
            file.path().display().to_string(),
        )]
        .into();

        let config = HostConfig::from_figment(HostConfig::figment(&env)).unwrap();
        assert_eq!(config.server.name, "from-env-path");
    }

    #[test]
    fn test_validation_rejects_empty_kind() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[modules]]\nkind = \"\"").unwrap();

        let err = HostConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[registry]\ndefault_mode = \"sideways\"").unwrap();

        let err = HostConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
