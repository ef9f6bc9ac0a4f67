//! Operation descriptors stored in the dispatch table

use crate::error::EvmResult;
use crate::gas::{self, calc_mem_size, calc_mem_size_with_len, cost};
use crate::gas_acl;
use crate::host::{CallKind, Host};
use crate::interpreter::{Interpreter, ScopeContext};
use crate::stack::Stack;

/// Lowest stack depth an operation popping `pops` items can run at
pub const fn min_stack(pops: usize, _pushes: usize) -> usize {
    pops
}

/// Highest stack depth an operation can run at without overflowing
pub const fn max_stack(pops: usize, pushes: usize) -> usize {
    cost::MAX_STACK_SIZE + pops - pushes
}

/// What an opcode does once its gas has been paid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Instruction {
    Stop,
    Add,
    Mul,
    Sub,
    Lt,
    Gt,
    Eq,
    IsZero,
    And,
    Or,
    Xor,
    Not,
    Address,
    Balance,
    Caller,
    CallValue,
    ExtCodeSize,
    ExtCodeCopy,
    ExtCodeHash,
    ChainId,
    SelfBalance,
    BaseFee,
    Pop,
    MLoad,
    MStore,
    MStore8,
    SLoad,
    SStore,
    MSize,
    Gas,
    MCopy,
    Push0,
    /// DUPn, 1-based depth
    Dup(u8),
    /// SWAPn, 1-based depth
    Swap(u8),
    Create,
    Create2,
    Call(CallKind),
    Return,
    SelfDestruct,
    /// Marker held by every unassigned byte
    Undefined,
}

/// Pre-access-list calculators for the call variants
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallGas {
    /// CALL
    Call,
    /// CALLCODE
    CallCode,
    /// DELEGATECALL
    DelegateCall,
    /// STATICCALL
    StaticCall,
}

impl CallGas {
    /// Kind of call this calculator prices
    pub fn kind(self) -> CallKind {
        match self {
            CallGas::Call => CallKind::Call,
            CallGas::CallCode => CallKind::CallCode,
            CallGas::DelegateCall => CallKind::DelegateCall,
            CallGas::StaticCall => CallKind::StaticCall,
        }
    }

    pub(crate) fn cost<H: Host>(
        self,
        interp: &mut Interpreter<H>,
        scope: &mut ScopeContext,
        memory_size: u64,
    ) -> EvmResult<u64> {
        gas::gas_call_variant(self.kind(), interp, scope, memory_size)
    }
}

/// Dynamic gas function attached to an operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DynamicGas {
    /// Memory expansion only
    Memory,
    /// CREATE2: memory expansion plus initcode hashing
    Create2,
    /// EXTCODECOPY before access lists
    ExtCodeCopy,
    /// A call variant before access lists
    Call(CallGas),
    /// SELFDESTRUCT before access lists
    SelfDestruct,
    /// Petersburg SSTORE
    SStoreLegacy,
    /// EIP-2200 SSTORE
    SStoreEip2200,
    /// Warm/cold account check (BALANCE, EXTCODESIZE, EXTCODEHASH)
    AccountCheck,
    /// EXTCODECOPY with access lists
    ExtCodeCopyAccessList,
    /// SLOAD with access lists
    SLoadAccessList,
    /// A call variant with access lists
    CallAccessList(CallGas),
    /// SSTORE with access lists and the given clearing refund
    SStoreAccessList {
        /// Refund granted for clearing a slot
        clearing_refund: u64,
    },
    /// SELFDESTRUCT with access lists
    SelfDestructAccessList {
        /// Whether the selfdestruct refund is still granted
        refunds: bool,
    },
    /// MCOPY
    MCopy,
    /// CREATE/CREATE2 with the initcode ceiling
    CreateInitCodeLimit,
}

impl DynamicGas {
    /// Evaluate against the current frame.
    ///
    /// `memory_size` is the word-aligned bound computed from the operation's
    /// [`MemorySize`], or zero when it has none.
    pub fn eval<H: Host>(
        self,
        interp: &mut Interpreter<H>,
        scope: &mut ScopeContext,
        memory_size: u64,
    ) -> EvmResult<u64> {
        match self {
            DynamicGas::Memory => gas::gas_memory(interp, scope, memory_size),
            DynamicGas::Create2 => gas::gas_create2(interp, scope, memory_size),
            DynamicGas::ExtCodeCopy => gas::gas_ext_code_copy(interp, scope, memory_size),
            DynamicGas::Call(variant) => variant.cost(interp, scope, memory_size),
            DynamicGas::SelfDestruct => gas::gas_selfdestruct(interp, scope, memory_size),
            DynamicGas::SStoreLegacy => gas::gas_sstore_legacy(interp, scope, memory_size),
            DynamicGas::SStoreEip2200 => gas::gas_sstore_eip2200(interp, scope, memory_size),
            DynamicGas::AccountCheck => gas_acl::gas_account_check(interp, scope, memory_size),
            DynamicGas::ExtCodeCopyAccessList => {
                gas_acl::gas_ext_code_copy_acl(interp, scope, memory_size)
            }
            DynamicGas::SLoadAccessList => gas_acl::gas_sload_acl(interp, scope, memory_size),
            DynamicGas::CallAccessList(variant) => {
                gas_acl::gas_call_acl(variant, interp, scope, memory_size)
            }
            DynamicGas::SStoreAccessList { clearing_refund } => {
                gas_acl::gas_sstore_acl(clearing_refund, interp, scope, memory_size)
            }
            DynamicGas::SelfDestructAccessList { refunds } => {
                gas_acl::gas_selfdestruct_acl(refunds, interp, scope, memory_size)
            }
            DynamicGas::MCopy => gas::gas_mcopy(interp, scope, memory_size),
            DynamicGas::CreateInitCodeLimit => {
                gas::gas_create_eip3860(interp, scope, memory_size)
            }
        }
    }
}

/// How far an operation needs memory to reach, read from its operands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemorySize {
    /// A fixed-size access at the offset on top of the stack
    Fixed(u64),
    /// `(offset, length)` at the given stack depths
    Range {
        /// Depth of the offset operand
        offset: usize,
        /// Depth of the length operand
        len: usize,
    },
    /// The larger of the input and output ranges of a call
    Call {
        /// Depth of the input offset; the input length, output offset and
        /// output length follow it
        args_offset: usize,
    },
}

impl MemorySize {
    /// Compute the unaligned byte bound; overflow is a gas overflow
    pub fn compute(self, stack: &Stack) -> EvmResult<u64> {
        match self {
            MemorySize::Fixed(len) => calc_mem_size_with_len(stack.peek()?, len),
            MemorySize::Range { offset, len } => {
                calc_mem_size(stack.back(offset)?, stack.back(len)?)
            }
            MemorySize::Call { args_offset } => {
                let input = calc_mem_size(stack.back(args_offset)?, stack.back(args_offset + 1)?)?;
                let output =
                    calc_mem_size(stack.back(args_offset + 2)?, stack.back(args_offset + 3)?)?;
                Ok(input.max(output))
            }
        }
    }
}

/// One dispatch table entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Operation {
    /// Action run after gas is charged
    pub execute: Instruction,
    /// Gas charged before anything else
    pub constant_gas: u64,
    /// Extra gas computed from the operands and state
    pub dynamic_gas: Option<DynamicGas>,
    /// Memory the operation may touch; memory is grown to it after charging
    pub memory_size: Option<MemorySize>,
    /// Minimum stack depth (inclusive)
    pub min_stack: usize,
    /// Maximum stack depth (inclusive)
    pub max_stack: usize,
    /// Whether the frame ends after this operation
    pub halts: bool,
}

impl Operation {
    /// Operation without dynamic gas or memory use
    pub const fn new(execute: Instruction, constant_gas: u64, pops: usize, pushes: usize) -> Self {
        Self {
            execute,
            constant_gas,
            dynamic_gas: None,
            memory_size: None,
            min_stack: min_stack(pops, pushes),
            max_stack: max_stack(pops, pushes),
            halts: false,
        }
    }

    /// The descriptor held by unassigned bytes
    pub const fn undefined() -> Self {
        Self {
            execute: Instruction::Undefined,
            constant_gas: 0,
            dynamic_gas: None,
            memory_size: None,
            min_stack: 0,
            max_stack: cost::MAX_STACK_SIZE,
            halts: true,
        }
    }

    /// Attach a dynamic gas function
    pub const fn with_dynamic_gas(mut self, dynamic_gas: DynamicGas) -> Self {
        self.dynamic_gas = Some(dynamic_gas);
        self
    }

    /// Attach a memory size function
    pub const fn with_memory(mut self, memory_size: MemorySize) -> Self {
        self.memory_size = Some(memory_size);
        self
    }

    /// Mark as ending the frame
    pub const fn halting(mut self) -> Self {
        self.halts = true;
        self
    }

    /// Whether this is the undefined marker
    pub fn is_undefined(&self) -> bool {
        self.execute == Instruction::Undefined
    }
}

impl Default for Operation {
    fn default() -> Self {
        Self::undefined()
    }
}
