//! Shutdown reporting

use serde::{Deserialize, Serialize};

/// A module whose `cleanup` failed during a sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupFailure {
    /// Module name
    pub module: String,
    /// Rendered error chain
    pub error: String,
}

/// Outcome of [`super::ModuleRegistry::shutdown_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownReport {
    /// Every module removed from the registry, failed or not
    pub removed: Vec<String>,
    /// Modules whose cleanup failed
    pub failures: Vec<CleanupFailure>,
}

impl ShutdownReport {
    /// True when every cleanup succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Names of the modules whose cleanup failed
    pub fn failed_modules(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.module.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_modules() {
        let report = ShutdownReport {
            removed: vec!["a".into(), "b".into()],
            failures: vec![CleanupFailure {
                module: "b".into(),
                error: "socket closed".into(),
            }],
        };

        assert!(!report.is_clean());
        assert_eq!(report.failed_modules(), vec!["b"]);
        assert!(ShutdownReport::default().is_clean());
    }
}
