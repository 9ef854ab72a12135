//! Error types for Tessera operations

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors raised on the direct activation/deactivation path
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A module with this name is already active
    #[error("Module already active: {0}")]
    Duplicate(String),

    /// The module's `initialize` call failed
    #[error("Module '{module}' failed to initialize: {source}")]
    Initialization {
        module: String,
        #[source]
        source: anyhow::Error,
    },

    /// The module's `register` call failed after a successful `initialize`
    #[error("Module '{module}' failed to register tools: {source}")]
    Registration {
        module: String,
        #[source]
        source: anyhow::Error,
    },

    /// No active module with this name
    #[error("Module not found: {0}")]
    NotFound(String),

    /// The module was removed but its `cleanup` call failed
    #[error("Module '{module}' failed to clean up: {source}")]
    Cleanup {
        module: String,
        #[source]
        source: anyhow::Error,
    },

    /// Factory or mode resolution failure before any lifecycle call ran
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RegistryError {
    /// Name of the module the error refers to, if any
    pub fn module(&self) -> Option<&str> {
        match self {
            RegistryError::Duplicate(name) | RegistryError::NotFound(name) => Some(name),
            RegistryError::Initialization { module, .. }
            | RegistryError::Registration { module, .. }
            | RegistryError::Cleanup { module, .. } => Some(module),
            RegistryError::Configuration(_) => None,
        }
    }
}

/// Errors raised by a tool transport when publishing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    /// Another tool with this name is already exposed
    #[error("Tool '{0}' is already published")]
    DuplicateTool(String),

    /// The tool name is not a valid identifier
    #[error("Invalid tool name: '{0}'")]
    InvalidName(String),
}

/// Host configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Load(Box::new(err))
    }
}
