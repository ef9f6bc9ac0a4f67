//! # ember-evm
//!
//! Versioned opcode dispatch and gas metering for an EVM-compatible VM.
//!
//! This crate provides:
//! - Dispatch tables built from a base set plus feature activators
//! - Warm/cold access metering against a per-transaction ledger
//! - Memory expansion pricing and MCOPY
//! - A single-step dispatcher over a [`Host`] state view

#![warn(missing_docs)]
#![warn(clippy::all)]

mod access_list;
mod builder;
mod config;
mod context;
mod eips;
mod error;
pub mod gas;
pub mod gas_acl;
mod host;
mod instructions;
mod interpreter;
mod jump_table;
mod memory;
mod opcode;
mod operation;
mod stack;
mod tracer;

pub use access_list::{AccessLedger, PRECOMPILE_COUNT};
pub use builder::JumpTableBuilder;
pub use config::{Fork, VmConfig};
pub use context::{BlockContext, Contract};
pub use eips::{
    enable_1344, enable_1884, enable_2200, enable_2929, enable_3198, enable_3529, enable_3855,
    enable_3860, enable_5656, is_valid_feature_name, validate_feature_name, Activator,
    ActivatorRegistry, FeatureId,
};
pub use error::{ConfigError, EvmError, EvmResult};
pub use host::{
    CallKind, CallOutcome, CallRequest, CreateOutcome, CreateRequest, Host, HostAccount,
    InMemoryHost,
};
pub use interpreter::{Interpreter, ScopeContext, Step};
pub use jump_table::{JumpTable, JumpTableDraft};
pub use memory::{memory_range, Memory};
pub use opcode::Opcode;
pub use operation::{max_stack, min_stack, CallGas, DynamicGas, Instruction, MemorySize, Operation};
pub use stack::Stack;
pub use tracer::{GasTracer, LogTracer};
