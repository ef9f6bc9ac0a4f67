//! Feature activators and their registry
//!
//! An activator is a named edit of a draft dispatch table, keyed by an
//! identifier of the form `<namespace>_<number>` such as `ethereum_2929`.

use crate::error::ConfigError;
use crate::gas::cost;
use crate::jump_table::JumpTableDraft;
use crate::opcode::Opcode;
use crate::operation::{CallGas, DynamicGas, Instruction, Operation};
use std::fmt;

/// A parsed feature identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FeatureId {
    name: String,
    number: i64,
}

impl FeatureId {
    /// Full identifier, e.g. `ethereum_3855`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace part, e.g. `ethereum`
    pub fn namespace(&self) -> &str {
        self.name.split('_').next().unwrap_or_default()
    }

    /// Numeric part
    pub fn number(&self) -> i64 {
        self.number
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Check that `name` is `<namespace>_<number>`.
///
/// Exactly one underscore is allowed and the part after it must parse as a
/// signed integer.
pub fn validate_feature_name(name: &str) -> Result<FeatureId, ConfigError> {
    let parts: Vec<&str> = name.split('_').collect();
    if parts.len() != 2 {
        return Err(ConfigError::MalformedFeature {
            name: name.to_string(),
            reason: "eip name does not conform to structure 'chainName_Number'",
        });
    }
    let number = parts[1]
        .parse::<i64>()
        .map_err(|_| ConfigError::MalformedFeature {
            name: name.to_string(),
            reason: "eip number should be convertible to int",
        })?;
    Ok(FeatureId {
        name: name.to_string(),
        number,
    })
}

/// Boolean form of [`validate_feature_name`]
pub fn is_valid_feature_name(name: &str) -> bool {
    validate_feature_name(name).is_ok()
}

/// Edits a draft table to enable one feature
pub type Activator = fn(&mut JumpTableDraft) -> Result<(), ConfigError>;

/// Ordered set of activators.
///
/// Registration order is the order activators are applied in when a table
/// is built, so it must follow protocol history.
#[derive(Clone, Default)]
pub struct ActivatorRegistry {
    entries: Vec<(FeatureId, Activator)>,
}

impl ActivatorRegistry {
    /// Registry with nothing registered
    pub fn new() -> Self {
        Self::default()
    }

    /// The Ethereum activators, in historical order.
    ///
    /// The initcode limit (`enable_3860`) is not included.
    pub fn ethereum() -> Self {
        let mut registry = Self::new();
        let defaults: [(&str, Activator); 8] = [
            ("ethereum_1344", enable_1344),
            ("ethereum_1884", enable_1884),
            ("ethereum_2200", enable_2200),
            ("ethereum_2929", enable_2929),
            ("ethereum_3198", enable_3198),
            ("ethereum_3529", enable_3529),
            ("ethereum_3855", enable_3855),
            ("ethereum_5656", enable_5656),
        ];
        for (name, activator) in defaults {
            // names above are well-formed and distinct
            if let Err(err) = registry.register(name, activator) {
                tracing::error!(%err, "failed to register default activator");
            }
        }
        registry
    }

    /// Append an activator; it runs after everything registered before it
    pub fn register(&mut self, name: &str, activator: Activator) -> Result<(), ConfigError> {
        let id = validate_feature_name(name)?;
        if self.contains(name) {
            return Err(ConfigError::DuplicateActivator(name.to_string()));
        }
        tracing::debug!(feature = name, "registered activator");
        self.entries.push((id, activator));
        Ok(())
    }

    /// Whether an activator exists for `name`
    pub fn contains(&self, name: &str) -> bool {
        self.rank(name).is_some()
    }

    /// Activator registered under `name`
    pub fn get(&self, name: &str) -> Option<Activator> {
        self.rank(name).map(|i| self.entries[i].1)
    }

    /// Position of `name` in application order
    pub fn rank(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(id, _)| id.name() == name)
    }

    /// Activator at `rank`
    pub(crate) fn at(&self, rank: usize) -> Option<(&FeatureId, Activator)> {
        self.entries.get(rank).map(|(id, f)| (id, *f))
    }

    /// Activatable identifiers, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .map(|(id, _)| id.name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Number of registered activators
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply a single activator to `draft`
    pub fn enable(&self, name: &str, draft: &mut JumpTableDraft) -> Result<(), ConfigError> {
        validate_feature_name(name)?;
        let activator = self
            .get(name)
            .ok_or_else(|| ConfigError::UnknownFeature(name.to_string()))?;
        activator(draft)
    }
}

impl fmt::Debug for ActivatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(id, _)| id.name()))
            .finish()
    }
}

/// EIP-1344: CHAINID
pub fn enable_1344(t: &mut JumpTableDraft) -> Result<(), ConfigError> {
    t.install(
        Opcode::CHAINID,
        Operation::new(Instruction::ChainId, cost::QUICK, 0, 1),
    )
}

/// EIP-1884: repricing of trie-size-dependent reads and SELFBALANCE
pub fn enable_1884(t: &mut JumpTableDraft) -> Result<(), ConfigError> {
    t.get_mut(Opcode::SLOAD).constant_gas = cost::SLOAD_EIP1884;
    t.get_mut(Opcode::BALANCE).constant_gas = cost::BALANCE_EIP1884;
    t.get_mut(Opcode::EXTCODEHASH).constant_gas = cost::EXTCODEHASH_EIP1884;
    t.install(
        Opcode::SELFBALANCE,
        Operation::new(Instruction::SelfBalance, cost::FAST, 0, 1),
    )
}

/// EIP-2200: net-metered SSTORE
pub fn enable_2200(t: &mut JumpTableDraft) -> Result<(), ConfigError> {
    t.get_mut(Opcode::SLOAD).constant_gas = cost::SLOAD_EIP2200;
    t.get_mut(Opcode::SSTORE).dynamic_gas = Some(DynamicGas::SStoreEip2200);
    Ok(())
}

/// EIP-2929: warm/cold state access pricing
pub fn enable_2929(t: &mut JumpTableDraft) -> Result<(), ConfigError> {
    t.get_mut(Opcode::SSTORE).dynamic_gas = Some(DynamicGas::SStoreAccessList {
        clearing_refund: cost::SSTORE_CLEARS_SCHEDULE_REFUND_EIP2200,
    });

    let sload = t.get_mut(Opcode::SLOAD);
    sload.constant_gas = 0;
    sload.dynamic_gas = Some(DynamicGas::SLoadAccessList);

    let extcodecopy = t.get_mut(Opcode::EXTCODECOPY);
    extcodecopy.constant_gas = cost::WARM_STORAGE_READ;
    extcodecopy.dynamic_gas = Some(DynamicGas::ExtCodeCopyAccessList);

    for op in [Opcode::EXTCODESIZE, Opcode::EXTCODEHASH, Opcode::BALANCE] {
        let entry = t.get_mut(op);
        entry.constant_gas = cost::WARM_STORAGE_READ;
        entry.dynamic_gas = Some(DynamicGas::AccountCheck);
    }

    for (op, variant) in [
        (Opcode::CALL, CallGas::Call),
        (Opcode::CALLCODE, CallGas::CallCode),
        (Opcode::STATICCALL, CallGas::StaticCall),
        (Opcode::DELEGATECALL, CallGas::DelegateCall),
    ] {
        let entry = t.get_mut(op);
        entry.constant_gas = cost::WARM_STORAGE_READ;
        entry.dynamic_gas = Some(DynamicGas::CallAccessList(variant));
    }

    // the base 5000 moves from dynamic to constant gas
    let selfdestruct = t.get_mut(Opcode::SELFDESTRUCT);
    selfdestruct.constant_gas = cost::SELFDESTRUCT_EIP150;
    selfdestruct.dynamic_gas = Some(DynamicGas::SelfDestructAccessList { refunds: true });
    Ok(())
}

/// EIP-3198: BASEFEE
pub fn enable_3198(t: &mut JumpTableDraft) -> Result<(), ConfigError> {
    t.install(
        Opcode::BASEFEE,
        Operation::new(Instruction::BaseFee, cost::QUICK, 0, 1),
    )
}

/// EIP-3529: smaller clearing refund, no selfdestruct refund
pub fn enable_3529(t: &mut JumpTableDraft) -> Result<(), ConfigError> {
    t.get_mut(Opcode::SSTORE).dynamic_gas = Some(DynamicGas::SStoreAccessList {
        clearing_refund: cost::SSTORE_CLEARS_SCHEDULE_REFUND_EIP3529,
    });
    t.get_mut(Opcode::SELFDESTRUCT).dynamic_gas =
        Some(DynamicGas::SelfDestructAccessList { refunds: false });
    Ok(())
}

/// EIP-3855: PUSH0
pub fn enable_3855(t: &mut JumpTableDraft) -> Result<(), ConfigError> {
    t.install(
        Opcode::PUSH0,
        Operation::new(Instruction::Push0, cost::QUICK, 0, 1),
    )
}

/// EIP-5656: MCOPY
pub fn enable_5656(t: &mut JumpTableDraft) -> Result<(), ConfigError> {
    t.install(
        Opcode::MCOPY,
        Operation::new(Instruction::MCopy, cost::ZERO, 3, 0).with_dynamic_gas(DynamicGas::MCopy),
    )
}

/// EIP-3860: initcode size ceiling and per-word initcode charge.
///
/// Not part of [`ActivatorRegistry::ethereum`]; register it explicitly to
/// use it.
pub fn enable_3860(t: &mut JumpTableDraft) -> Result<(), ConfigError> {
    t.get_mut(Opcode::CREATE).dynamic_gas = Some(DynamicGas::CreateInitCodeLimit);
    t.get_mut(Opcode::CREATE2).dynamic_gas = Some(DynamicGas::CreateInitCodeLimit);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jump_table::JumpTable;

    #[test]
    fn test_validate_feature_name() {
        let id = validate_feature_name("ethereum_3855").unwrap();
        assert_eq!(id.namespace(), "ethereum");
        assert_eq!(id.number(), 3855);
        assert_eq!(id.to_string(), "ethereum_3855");

        assert!(is_valid_feature_name("chain_-1"));
        assert!(is_valid_feature_name("_42"));
        assert!(!is_valid_feature_name("ethereum5656"));
        assert!(!is_valid_feature_name("ethereum_56_56"));
        assert!(!is_valid_feature_name("ethereum_x"));
        assert!(!is_valid_feature_name("ethereum_"));
    }

    #[test]
    fn test_malformed_reason() {
        match validate_feature_name("ethereum5656") {
            Err(ConfigError::MalformedFeature { name, .. }) => assert_eq!(name, "ethereum5656"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ethereum_registry() {
        let registry = ActivatorRegistry::ethereum();
        assert_eq!(registry.len(), 8);
        assert!(registry.contains("ethereum_2929"));
        assert!(!registry.contains("ethereum_3860"));
        assert_eq!(registry.rank("ethereum_1344"), Some(0));
        assert_eq!(registry.rank("ethereum_5656"), Some(7));
        assert_eq!(
            registry.names(),
            vec![
                "ethereum_1344",
                "ethereum_1884",
                "ethereum_2200",
                "ethereum_2929",
                "ethereum_3198",
                "ethereum_3529",
                "ethereum_3855",
                "ethereum_5656",
            ]
        );
    }

    #[test]
    fn test_register_rejects_duplicates_and_bad_names() {
        let mut registry = ActivatorRegistry::ethereum();
        assert_eq!(
            registry.register("ethereum_2929", enable_2929),
            Err(ConfigError::DuplicateActivator("ethereum_2929".into()))
        );
        assert!(matches!(
            registry.register("ethereum3860", enable_3860),
            Err(ConfigError::MalformedFeature { .. })
        ));
        registry.register("ethereum_3860", enable_3860).unwrap();
        assert_eq!(registry.rank("ethereum_3860"), Some(8));
    }

    #[test]
    fn test_enable_unknown() {
        let registry = ActivatorRegistry::ethereum();
        let mut draft = JumpTable::base().draft();
        assert_eq!(
            registry.enable("ethereum_9999", &mut draft),
            Err(ConfigError::UnknownFeature("ethereum_9999".into()))
        );
    }

    #[test]
    fn test_enable_1884() {
        let mut draft = JumpTable::base().draft();
        enable_1884(&mut draft).unwrap();
        assert_eq!(draft.get(Opcode::SLOAD).constant_gas, 800);
        assert_eq!(draft.get(Opcode::BALANCE).constant_gas, 700);
        assert_eq!(draft.get(Opcode::EXTCODEHASH).constant_gas, 700);
        assert_eq!(draft.get(Opcode::SELFBALANCE).constant_gas, 5);
    }

    #[test]
    fn test_enable_2929_pricing() {
        let mut draft = JumpTable::base().draft();
        enable_2929(&mut draft).unwrap();
        assert_eq!(draft.get(Opcode::SLOAD).constant_gas, 0);
        assert_eq!(draft.get(Opcode::CALL).constant_gas, 100);
        assert_eq!(
            draft.get(Opcode::DELEGATECALL).dynamic_gas,
            Some(DynamicGas::CallAccessList(CallGas::DelegateCall))
        );
        assert_eq!(draft.get(Opcode::SELFDESTRUCT).constant_gas, 5000);
    }

    #[test]
    fn test_activators_idempotent() {
        let activators: [Activator; 9] = [
            enable_1344,
            enable_1884,
            enable_2200,
            enable_2929,
            enable_3198,
            enable_3529,
            enable_3855,
            enable_5656,
            enable_3860,
        ];
        for activator in activators {
            let mut once = JumpTable::base().draft();
            activator(&mut once).unwrap();
            let mut twice = once.clone();
            activator(&mut twice).unwrap();
            assert_eq!(once.freeze(), twice.freeze());
        }
    }

    #[test]
    fn test_new_opcode_conflict() {
        let mut draft = JumpTable::base().draft();
        draft.set(
            Opcode::PUSH0,
            Operation::new(Instruction::Push0, cost::FASTEST, 0, 1),
        );
        assert_eq!(
            enable_3855(&mut draft),
            Err(ConfigError::OpcodeConflict { opcode: 0x5F })
        );
    }
}
