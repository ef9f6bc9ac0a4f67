//! Builds a frozen dispatch table for a protocol version

use crate::eips::{validate_feature_name, ActivatorRegistry};
use crate::error::ConfigError;
use crate::jump_table::JumpTable;

/// Applies registered activators on top of a base table
#[derive(Debug, Clone, Copy)]
pub struct JumpTableBuilder<'r> {
    registry: &'r ActivatorRegistry,
}

impl<'r> JumpTableBuilder<'r> {
    /// Builder resolving identifiers against `registry`
    pub fn new(registry: &'r ActivatorRegistry) -> Self {
        Self { registry }
    }

    /// Produce the table for `base` with `features` enabled.
    ///
    /// Every identifier is validated and resolved before any activator
    /// runs, so a bad identifier leaves nothing half-applied. Activators run
    /// in registry order whatever order `features` lists them in, and a
    /// feature listed twice is applied once.
    pub fn build<S: AsRef<str>>(
        &self,
        base: &JumpTable,
        features: &[S],
    ) -> Result<JumpTable, ConfigError> {
        let mut ranks = Vec::with_capacity(features.len());
        for feature in features {
            let name = feature.as_ref();
            validate_feature_name(name)?;
            let rank = self
                .registry
                .rank(name)
                .ok_or_else(|| ConfigError::UnknownFeature(name.to_string()))?;
            ranks.push(rank);
        }
        ranks.sort_unstable();
        ranks.dedup();

        let mut draft = base.draft();
        for rank in ranks {
            if let Some((id, activator)) = self.registry.at(rank) {
                activator(&mut draft)?;
                tracing::debug!(feature = %id, "applied feature");
            }
        }
        Ok(draft.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Opcode;

    #[test]
    fn test_build_no_features_matches_base() {
        let registry = ActivatorRegistry::ethereum();
        let base = JumpTable::base();
        let built = JumpTableBuilder::new(&registry)
            .build::<&str>(&base, &[])
            .unwrap();
        assert_eq!(built, base);
        assert!(!built.ptr_eq(&base));
    }

    #[test]
    fn test_first_unknown_is_reported() {
        let registry = ActivatorRegistry::ethereum();
        let base = JumpTable::base();
        let err = JumpTableBuilder::new(&registry)
            .build(&base, &["ethereum_3855", "ethereum_9999", "ethereum_8888"])
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownFeature("ethereum_9999".into()));
        assert!(base[Opcode::PUSH0].is_undefined());
    }

    #[test]
    fn test_order_independent() {
        let registry = ActivatorRegistry::ethereum();
        let base = JumpTable::base();
        let builder = JumpTableBuilder::new(&registry);
        let forward = builder
            .build(&base, &["ethereum_2929", "ethereum_3529"])
            .unwrap();
        let backward = builder
            .build(&base, &["ethereum_3529", "ethereum_2929"])
            .unwrap();
        assert_eq!(forward, backward);
    }
}
