//! VM configuration: a fork preset plus extra feature identifiers

use crate::builder::JumpTableBuilder;
use crate::eips::{validate_feature_name, ActivatorRegistry};
use crate::error::ConfigError;
use crate::jump_table::JumpTable;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Named protocol versions and the features each one enables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fork {
    /// Base instruction set only
    Petersburg,
    /// + CHAINID, EIP-1884 repricing, net-metered SSTORE
    Istanbul,
    /// + access lists
    Berlin,
    /// + BASEFEE, reduced refunds
    London,
    /// + PUSH0
    Shanghai,
    /// + MCOPY
    #[default]
    Cancun,
}

impl Fork {
    /// Feature identifiers enabled at this fork
    pub fn features(self) -> &'static [&'static str] {
        static ALL: [&str; 8] = [
            "ethereum_1344",
            "ethereum_1884",
            "ethereum_2200",
            "ethereum_2929",
            "ethereum_3198",
            "ethereum_3529",
            "ethereum_3855",
            "ethereum_5656",
        ];
        let n = match self {
            Fork::Petersburg => 0,
            Fork::Istanbul => 3,
            Fork::Berlin => 4,
            Fork::London => 6,
            Fork::Shanghai => 7,
            Fork::Cancun => 8,
        };
        &ALL[..n]
    }
}

/// Dispatch table configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Fork preset
    pub fork: Fork,
    /// Features enabled on top of the preset
    pub extra_eips: Vec<String>,
}

impl VmConfig {
    /// Config for a fork with no extras
    pub fn new(fork: Fork) -> Self {
        Self {
            fork,
            extra_eips: Vec::new(),
        }
    }

    /// Preset features followed by the extras
    pub fn features(&self) -> Vec<String> {
        self.fork
            .features()
            .iter()
            .map(|s| s.to_string())
            .chain(self.extra_eips.iter().cloned())
            .collect()
    }

    /// Reject malformed, unregistered or repeated identifiers
    pub fn validate(&self, registry: &ActivatorRegistry) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for name in self.features() {
            validate_feature_name(&name)?;
            if !registry.contains(&name) {
                return Err(ConfigError::UnknownFeature(name));
            }
            if !seen.insert(name.clone()) {
                return Err(ConfigError::DuplicateFeature(name));
            }
        }
        Ok(())
    }

    /// Validate and build the frozen table
    pub fn build_table(&self, registry: &ActivatorRegistry) -> Result<JumpTable, ConfigError> {
        self.validate(registry)?;
        let features = self.features();
        let table =
            JumpTableBuilder::new(registry).build(&JumpTable::base(), features.as_slice())?;
        tracing::info!(
            fork = ?self.fork,
            extras = self.extra_eips.len(),
            defined = table.defined_count(),
            "built dispatch table"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Opcode;

    #[test]
    fn test_fork_features_grow() {
        assert!(Fork::Petersburg.features().is_empty());
        assert_eq!(Fork::Berlin.features().last(), Some(&"ethereum_2929"));
        assert_eq!(Fork::Cancun.features().len(), 8);
    }

    #[test]
    fn test_config_serde() {
        let json = r#"{"fork":"london","extra_eips":["ethereum_3855"]}"#;
        let config: VmConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.fork, Fork::London);
        assert_eq!(config.extra_eips, vec!["ethereum_3855".to_string()]);

        let defaulted: VmConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(defaulted, VmConfig::new(Fork::Cancun));
    }

    #[test]
    fn test_validate_duplicate() {
        let registry = ActivatorRegistry::ethereum();
        let config = VmConfig {
            fork: Fork::Shanghai,
            extra_eips: vec!["ethereum_3855".into()],
        };
        assert_eq!(
            config.validate(&registry),
            Err(ConfigError::DuplicateFeature("ethereum_3855".into()))
        );
    }

    #[test]
    fn test_validate_malformed_and_unknown() {
        let registry = ActivatorRegistry::ethereum();
        let mut config = VmConfig::new(Fork::Petersburg);
        config.extra_eips = vec!["ethereum5656".into()];
        assert!(matches!(
            config.validate(&registry),
            Err(ConfigError::MalformedFeature { .. })
        ));
        config.extra_eips = vec!["ethereum_3860".into()];
        assert_eq!(
            config.validate(&registry),
            Err(ConfigError::UnknownFeature("ethereum_3860".into()))
        );
    }

    #[test]
    fn test_build_table_cancun() {
        let registry = ActivatorRegistry::ethereum();
        let table = VmConfig::new(Fork::Cancun).build_table(&registry).unwrap();
        assert!(!table[Opcode::MCOPY].is_undefined());
        assert!(!table[Opcode::PUSH0].is_undefined());
        assert_eq!(table[Opcode::SLOAD].constant_gas, 0);
    }
}
