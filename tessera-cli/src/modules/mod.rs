//! Builtin capability modules

pub mod journal;
pub mod kv;

use tessera_core::module::ModuleFactory;

/// Factory for a builtin module kind
pub fn factory(kind: &str) -> Option<Box<dyn ModuleFactory>> {
    match kind {
        "kv" => Some(Box::new(kv::KvFactory)),
        "journal" => Some(Box::new(journal::JournalFactory)),
        _ => None,
    }
}

/// Kinds accepted by [`factory`]
pub const KINDS: &[&str] = &["kv", "journal"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_resolves() {
        for kind in KINDS {
            let built = factory(kind).unwrap();
            assert_eq!(built.kind(), *kind);
        }
        assert!(factory("postgres").is_none());
    }
}
