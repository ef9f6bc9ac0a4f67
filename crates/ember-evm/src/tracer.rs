//! Gas metering observers

use crate::error::EvmError;

/// Hook points around each metered step. All methods default to no-ops.
pub trait GasTracer: Send {
    /// Before any gas is charged for `opcode`
    fn on_pre_charge(&mut self, _opcode: u8, _gas_left: u64, _constant_gas: u64) {}

    /// After constant and dynamic gas were charged, before the action runs
    fn on_post_charge(&mut self, _opcode: u8, _gas_left: u64, _cost: u64) {}

    /// When metering or the action fails
    fn on_error(&mut self, _opcode: u8, _error: &EvmError) {}
}

/// Tracer that forwards every hook to `tracing` at trace level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTracer;

impl GasTracer for LogTracer {
    fn on_pre_charge(&mut self, opcode: u8, gas_left: u64, constant_gas: u64) {
        tracing::trace!(opcode, gas_left, constant_gas, "pre-charge");
    }

    fn on_post_charge(&mut self, opcode: u8, gas_left: u64, cost: u64) {
        tracing::trace!(opcode, gas_left, cost, "post-charge");
    }

    fn on_error(&mut self, opcode: u8, error: &EvmError) {
        tracing::trace!(opcode, %error, "step failed");
    }
}
