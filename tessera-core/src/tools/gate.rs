//! Mode gate
//!
//! Decides whether a tool may be exposed under its owning module's access
//! mode. Gated tools are never published, so clients listing tools only see
//! operations they are allowed to invoke.

use serde::{Deserialize, Serialize};

use super::tool::ToolDescriptor;
use crate::mode::AccessMode;

/// Decide whether `tool` may be exposed under `mode`.
///
/// Non-mutating tools are always exposed. Mutating tools are exposed only
/// when the mode permits mutation.
pub fn should_expose(mode: AccessMode, tool: &ToolDescriptor) -> bool {
    permits(mode, tool.mutates())
}

/// Gate decision on the raw `(mode, mutates)` pair
pub fn permits(mode: AccessMode, mutates: bool) -> bool {
    !mutates || mode.permits_mutation()
}

/// How a gated tool is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReporting {
    /// Drop the tool without a trace
    Silent,

    /// Log a warning and record the tool in the module's skipped list
    #[default]
    Observable,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn tool(mutates: bool) -> ToolDescriptor {
        ToolDescriptor::from_fn("probe", "Gate probe", |_| async { Ok(Value::Null) })
            .with_mutates(mutates)
    }

    #[test]
    fn test_read_tools_always_exposed() {
        for mode in [AccessMode::ReadOnly, AccessMode::WriteOnly, AccessMode::Full] {
            assert!(should_expose(mode, &tool(false)), "read tool hidden under {mode}");
        }
    }

    #[test]
    fn test_mutating_tools_follow_mode() {
        assert!(!should_expose(AccessMode::ReadOnly, &tool(true)));
        assert!(should_expose(AccessMode::WriteOnly, &tool(true)));
        assert!(should_expose(AccessMode::Full, &tool(true)));
    }

    #[test]
    fn test_decision_is_deterministic() {
        let write = tool(true);
        let first = should_expose(AccessMode::ReadOnly, &write);
        for _ in 0..10 {
            assert_eq!(should_expose(AccessMode::ReadOnly, &write), first);
        }
    }

    #[test]
    fn test_skip_reporting_default_and_serde() {
        assert_eq!(SkipReporting::default(), SkipReporting::Observable);
        let parsed: SkipReporting = serde_json::from_str("\"silent\"").unwrap();
        assert_eq!(parsed, SkipReporting::Silent);
    }
}
