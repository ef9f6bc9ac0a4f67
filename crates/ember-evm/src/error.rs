//! EVM error types

use thiserror::Error;

/// Errors raised while metering or executing a single opcode.
///
/// All of these fail the current call frame only. The caller discards the
/// frame's state changes; accesses warmed before the failure stay warm.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvmError {
    /// Out of gas
    #[error("out of gas")]
    OutOfGas,

    /// Overflow while summing gas or computing a memory bound
    #[error("gas uint64 overflow")]
    GasUintOverflow,

    /// Memory range not representable
    #[error("memory overflow")]
    MemoryOverflow,

    /// SSTORE attempted with no more than the sentry stipend left
    #[error("not enough gas for reentrancy sentry")]
    ReentrancySentry,

    /// Stack underflow
    #[error("stack underflow ({len} < {required})")]
    StackUnderflow {
        /// Current depth
        len: usize,
        /// Minimum depth required by the operation
        required: usize,
    },

    /// Stack overflow
    #[error("stack limit reached {len} ({limit})")]
    StackOverflow {
        /// Current depth
        len: usize,
        /// Maximum depth allowed by the operation
        limit: usize,
    },

    /// Invalid opcode
    #[error("invalid opcode: 0x{0:02x}")]
    InvalidOpcode(u8),

    /// Write in static context
    #[error("write protection")]
    WriteProtection,

    /// Initcode larger than the protocol ceiling
    #[error("max initcode size exceeded: {size} > {limit}")]
    MaxInitCodeSizeExceeded {
        /// Requested initcode length
        size: u64,
        /// Ceiling
        limit: u64,
    },
}

impl EvmError {
    /// Whether the caller should treat this error like an out-of-gas halt.
    ///
    /// Overflow is reported separately for diagnostics but consumes the
    /// frame exactly like running out of gas.
    pub fn is_gas_exhaustion(&self) -> bool {
        matches!(self, EvmError::OutOfGas | EvmError::GasUintOverflow)
    }
}

/// Result type for EVM operations
pub type EvmResult<T> = Result<T, EvmError>;

/// Fatal errors raised while validating feature identifiers or building a
/// dispatch table. These abort table construction and are never recovered
/// inside the VM.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Identifier does not follow `<namespace>_<number>`
    #[error("malformed feature name {name:?}: {reason}")]
    MalformedFeature {
        /// Offending identifier
        name: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Well-formed identifier with no registered activator
    #[error("undefined eip {0}")]
    UnknownFeature(String),

    /// Identifier listed more than once in a parameter set
    #[error("duplicate eip {0}")]
    DuplicateFeature(String),

    /// Activator registered twice under the same identifier
    #[error("activator already registered for {0}")]
    DuplicateActivator(String),

    /// A new-opcode activator found a different operation in its slot
    #[error("opcode 0x{opcode:02x} already defined with a different operation")]
    OpcodeConflict {
        /// Contested opcode byte
        opcode: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(format!("{}", EvmError::OutOfGas), "out of gas");
        assert_eq!(format!("{}", EvmError::GasUintOverflow), "gas uint64 overflow");
        assert_eq!(format!("{}", EvmError::MemoryOverflow), "memory overflow");
        assert_eq!(
            format!("{}", EvmError::ReentrancySentry),
            "not enough gas for reentrancy sentry"
        );
        assert_eq!(format!("{}", EvmError::InvalidOpcode(0xFE)), "invalid opcode: 0xfe");
        assert_eq!(
            format!("{}", EvmError::StackUnderflow { len: 1, required: 3 }),
            "stack underflow (1 < 3)"
        );
    }

    #[test]
    fn test_overflow_distinct_from_out_of_gas() {
        assert_ne!(EvmError::GasUintOverflow, EvmError::OutOfGas);
        assert!(EvmError::GasUintOverflow.is_gas_exhaustion());
        assert!(EvmError::OutOfGas.is_gas_exhaustion());
        assert!(!EvmError::MemoryOverflow.is_gas_exhaustion());
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            format!("{}", ConfigError::UnknownFeature("ethereum_9999".into())),
            "undefined eip ethereum_9999"
        );
        assert_eq!(
            format!("{}", ConfigError::OpcodeConflict { opcode: 0x5e }),
            "opcode 0x5e already defined with a different operation"
        );
    }
}
