//! 256-entry dispatch tables
//!
//! A [`JumpTableDraft`] is a mutable working copy that activators edit.
//! [`JumpTableDraft::freeze`] turns it into a [`JumpTable`], which has no
//! mutating API and is shared across executions through an `Arc`.

use crate::error::ConfigError;
use crate::gas::cost;
use crate::host::CallKind;
use crate::opcode::Opcode;
use crate::operation::{CallGas, DynamicGas, Instruction, MemorySize, Operation};
use std::ops::Index;
use std::sync::Arc;

/// Immutable dispatch table
#[derive(Clone, Debug)]
pub struct JumpTable {
    ops: Arc<[Operation; 256]>,
}

impl JumpTable {
    /// Table with every byte undefined
    pub fn empty() -> Self {
        JumpTableDraft::empty().freeze()
    }

    /// The core instruction set every protocol version starts from
    pub fn base() -> Self {
        base_draft().freeze()
    }

    /// Descriptor for `opcode`
    pub fn get(&self, opcode: u8) -> &Operation {
        &self.ops[opcode as usize]
    }

    /// Mutable working copy of this table
    pub fn draft(&self) -> JumpTableDraft {
        JumpTableDraft {
            ops: Box::new(*self.ops),
        }
    }

    /// Number of bytes with a defined operation
    pub fn defined_count(&self) -> usize {
        self.ops.iter().filter(|op| !op.is_undefined()).count()
    }

    /// Whether two handles point at the same table storage
    pub fn ptr_eq(&self, other: &JumpTable) -> bool {
        Arc::ptr_eq(&self.ops, &other.ops)
    }

    /// Iterate over `(byte, descriptor)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Operation)> {
        self.ops.iter().enumerate().map(|(i, op)| (i as u8, op))
    }
}

impl PartialEq for JumpTable {
    fn eq(&self, other: &Self) -> bool {
        self.ops[..] == other.ops[..]
    }
}

impl Eq for JumpTable {}

impl Index<u8> for JumpTable {
    type Output = Operation;

    fn index(&self, opcode: u8) -> &Operation {
        self.get(opcode)
    }
}

impl Index<Opcode> for JumpTable {
    type Output = Operation;

    fn index(&self, opcode: Opcode) -> &Operation {
        self.get(opcode.byte())
    }
}

/// Mutable table under construction
#[derive(Clone, Debug)]
pub struct JumpTableDraft {
    ops: Box<[Operation; 256]>,
}

impl JumpTableDraft {
    /// Draft with every byte undefined
    pub fn empty() -> Self {
        Self {
            ops: Box::new([Operation::undefined(); 256]),
        }
    }

    /// Descriptor for `opcode`
    pub fn get(&self, opcode: Opcode) -> &Operation {
        &self.ops[opcode.index()]
    }

    /// Mutable descriptor for `opcode`, for in-place repricing
    pub fn get_mut(&mut self, opcode: Opcode) -> &mut Operation {
        &mut self.ops[opcode.index()]
    }

    /// Overwrite a slot unconditionally
    pub fn set(&mut self, opcode: Opcode, operation: Operation) {
        self.ops[opcode.index()] = operation;
    }

    /// Install a new opcode.
    ///
    /// Installing the identical descriptor again is a no-op. Replacing a
    /// different defined descriptor is refused.
    pub fn install(&mut self, opcode: Opcode, operation: Operation) -> Result<(), ConfigError> {
        let slot = &mut self.ops[opcode.index()];
        if *slot == operation {
            return Ok(());
        }
        if !slot.is_undefined() {
            tracing::warn!(opcode = opcode.byte(), "opcode slot already taken");
            return Err(ConfigError::OpcodeConflict {
                opcode: opcode.byte(),
            });
        }
        *slot = operation;
        Ok(())
    }

    /// Freeze into a shareable table
    pub fn freeze(self) -> JumpTable {
        JumpTable {
            ops: Arc::from(self.ops),
        }
    }
}

fn base_draft() -> JumpTableDraft {
    use Instruction as I;
    let mut t = JumpTableDraft::empty();

    t.set(Opcode::STOP, Operation::new(I::Stop, cost::ZERO, 0, 0).halting());
    t.set(Opcode::ADD, Operation::new(I::Add, cost::FASTEST, 2, 1));
    t.set(Opcode::MUL, Operation::new(I::Mul, cost::FAST, 2, 1));
    t.set(Opcode::SUB, Operation::new(I::Sub, cost::FASTEST, 2, 1));
    t.set(Opcode::LT, Operation::new(I::Lt, cost::FASTEST, 2, 1));
    t.set(Opcode::GT, Operation::new(I::Gt, cost::FASTEST, 2, 1));
    t.set(Opcode::EQ, Operation::new(I::Eq, cost::FASTEST, 2, 1));
    t.set(Opcode::ISZERO, Operation::new(I::IsZero, cost::FASTEST, 1, 1));
    t.set(Opcode::AND, Operation::new(I::And, cost::FASTEST, 2, 1));
    t.set(Opcode::OR, Operation::new(I::Or, cost::FASTEST, 2, 1));
    t.set(Opcode::XOR, Operation::new(I::Xor, cost::FASTEST, 2, 1));
    t.set(Opcode::NOT, Operation::new(I::Not, cost::FASTEST, 1, 1));

    t.set(Opcode::ADDRESS, Operation::new(I::Address, cost::QUICK, 0, 1));
    t.set(Opcode::BALANCE, Operation::new(I::Balance, cost::BALANCE_EIP150, 1, 1));
    t.set(Opcode::CALLER, Operation::new(I::Caller, cost::QUICK, 0, 1));
    t.set(Opcode::CALLVALUE, Operation::new(I::CallValue, cost::QUICK, 0, 1));
    t.set(
        Opcode::EXTCODESIZE,
        Operation::new(I::ExtCodeSize, cost::EXTCODESIZE_EIP150, 1, 1),
    );
    t.set(
        Opcode::EXTCODECOPY,
        Operation::new(I::ExtCodeCopy, cost::EXTCODECOPY_EIP150, 4, 0)
            .with_dynamic_gas(DynamicGas::ExtCodeCopy)
            .with_memory(MemorySize::Range { offset: 1, len: 3 }),
    );
    t.set(
        Opcode::EXTCODEHASH,
        Operation::new(I::ExtCodeHash, cost::EXTCODEHASH_CONSTANTINOPLE, 1, 1),
    );

    t.set(Opcode::POP, Operation::new(I::Pop, cost::QUICK, 1, 0));
    t.set(
        Opcode::MLOAD,
        Operation::new(I::MLoad, cost::FASTEST, 1, 1)
            .with_dynamic_gas(DynamicGas::Memory)
            .with_memory(MemorySize::Fixed(32)),
    );
    t.set(
        Opcode::MSTORE,
        Operation::new(I::MStore, cost::FASTEST, 2, 0)
            .with_dynamic_gas(DynamicGas::Memory)
            .with_memory(MemorySize::Fixed(32)),
    );
    t.set(
        Opcode::MSTORE8,
        Operation::new(I::MStore8, cost::FASTEST, 2, 0)
            .with_dynamic_gas(DynamicGas::Memory)
            .with_memory(MemorySize::Fixed(1)),
    );
    t.set(Opcode::SLOAD, Operation::new(I::SLoad, cost::SLOAD_EIP150, 1, 1));
    t.set(
        Opcode::SSTORE,
        Operation::new(I::SStore, cost::ZERO, 2, 0).with_dynamic_gas(DynamicGas::SStoreLegacy),
    );
    t.set(Opcode::MSIZE, Operation::new(I::MSize, cost::QUICK, 0, 1));
    t.set(Opcode::GAS, Operation::new(I::Gas, cost::QUICK, 0, 1));

    for n in 1..=16u8 {
        let depth = n as usize;
        if let Some(op) = Opcode::dup(depth) {
            t.set(op, Operation::new(I::Dup(n), cost::FASTEST, depth, depth + 1));
        }
        if let Some(op) = Opcode::swap(depth) {
            t.set(op, Operation::new(I::Swap(n), cost::FASTEST, depth + 1, depth + 1));
        }
    }

    t.set(
        Opcode::CREATE,
        Operation::new(I::Create, cost::CREATE, 3, 1)
            .with_dynamic_gas(DynamicGas::Memory)
            .with_memory(MemorySize::Range { offset: 1, len: 2 }),
    );
    t.set(
        Opcode::CREATE2,
        Operation::new(I::Create2, cost::CREATE2, 4, 1)
            .with_dynamic_gas(DynamicGas::Create2)
            .with_memory(MemorySize::Range { offset: 1, len: 2 }),
    );
    t.set(
        Opcode::CALL,
        Operation::new(I::Call(CallKind::Call), cost::CALL_EIP150, 7, 1)
            .with_dynamic_gas(DynamicGas::Call(CallGas::Call))
            .with_memory(MemorySize::Call { args_offset: 3 }),
    );
    t.set(
        Opcode::CALLCODE,
        Operation::new(I::Call(CallKind::CallCode), cost::CALL_EIP150, 7, 1)
            .with_dynamic_gas(DynamicGas::Call(CallGas::CallCode))
            .with_memory(MemorySize::Call { args_offset: 3 }),
    );
    t.set(
        Opcode::DELEGATECALL,
        Operation::new(I::Call(CallKind::DelegateCall), cost::CALL_EIP150, 6, 1)
            .with_dynamic_gas(DynamicGas::Call(CallGas::DelegateCall))
            .with_memory(MemorySize::Call { args_offset: 2 }),
    );
    t.set(
        Opcode::STATICCALL,
        Operation::new(I::Call(CallKind::StaticCall), cost::CALL_EIP150, 6, 1)
            .with_dynamic_gas(DynamicGas::Call(CallGas::StaticCall))
            .with_memory(MemorySize::Call { args_offset: 2 }),
    );
    t.set(
        Opcode::RETURN,
        Operation::new(I::Return, cost::ZERO, 2, 0)
            .with_dynamic_gas(DynamicGas::Memory)
            .with_memory(MemorySize::Range { offset: 0, len: 1 })
            .halting(),
    );
    t.set(
        Opcode::SELFDESTRUCT,
        Operation::new(I::SelfDestruct, cost::ZERO, 1, 0)
            .with_dynamic_gas(DynamicGas::SelfDestruct)
            .halting(),
    );

    t
}
