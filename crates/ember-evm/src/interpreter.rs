//! Single-step opcode dispatcher

use crate::access_list::AccessLedger;
use crate::context::{BlockContext, Contract};
use crate::error::{EvmError, EvmResult};
use crate::gas::to_word_size;
use crate::host::Host;
use crate::jump_table::JumpTable;
use crate::memory::Memory;
use crate::stack::Stack;
use crate::tracer::GasTracer;
use bytes::Bytes;

/// Per-frame state: the stack, memory and the running contract
#[derive(Debug, Default)]
pub struct ScopeContext {
    /// Operand stack
    pub stack: Stack,
    /// Frame memory
    pub memory: Memory,
    /// Running contract and its remaining gas
    pub contract: Contract,
}

impl ScopeContext {
    /// Fresh frame for `contract`
    pub fn new(contract: Contract) -> Self {
        Self {
            stack: Stack::new(),
            memory: Memory::new(),
            contract,
        }
    }
}

/// Outcome of a successful step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Continue with the next opcode
    Continue,
    /// The frame ended with this output
    Halt(Bytes),
}

/// Drives a frozen dispatch table against one transaction's state.
///
/// Owns the host view and the access ledger for the transaction; nested
/// frames share both through the same interpreter.
pub struct Interpreter<H: Host> {
    host: H,
    ledger: AccessLedger,
    table: JumpTable,
    block: BlockContext,
    read_only: bool,
    /// Gas forwarded to the next call, computed during metering
    pub(crate) call_gas_temp: u64,
    return_data: Bytes,
    tracer: Option<Box<dyn GasTracer>>,
}

impl<H: Host> Interpreter<H> {
    /// Create an interpreter
    pub fn new(host: H, table: JumpTable, block: BlockContext, ledger: AccessLedger) -> Self {
        Self {
            host,
            ledger,
            table,
            block,
            read_only: false,
            call_gas_temp: 0,
            return_data: Bytes::new(),
            tracer: None,
        }
    }

    /// Attach a gas tracer
    pub fn with_tracer(mut self, tracer: Box<dyn GasTracer>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Enter or leave a static context
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Whether state writes are forbidden
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Host view
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host view
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Access ledger
    pub fn ledger(&self) -> &AccessLedger {
        &self.ledger
    }

    /// Mutable access ledger
    pub fn ledger_mut(&mut self) -> &mut AccessLedger {
        &mut self.ledger
    }

    /// Dispatch table in use
    pub fn table(&self) -> &JumpTable {
        &self.table
    }

    /// Block environment
    pub fn block(&self) -> &BlockContext {
        &self.block
    }

    /// Gas set aside for the pending call
    pub fn call_gas_temp(&self) -> u64 {
        self.call_gas_temp
    }

    /// Output of the last nested call or failed create
    pub fn return_data(&self) -> &Bytes {
        &self.return_data
    }

    pub(crate) fn set_return_data(&mut self, data: Bytes) {
        self.return_data = data;
    }

    /// Give back the host and ledger
    pub fn into_parts(self) -> (H, AccessLedger) {
        (self.host, self.ledger)
    }

    /// Meter and execute one opcode.
    ///
    /// Order: stack bounds, constant gas, memory bound, dynamic gas, memory
    /// growth, action. Any error fails the frame; nothing is refunded and
    /// accesses warmed during metering stay warm.
    pub fn step(&mut self, opcode: u8, scope: &mut ScopeContext) -> EvmResult<Step> {
        match self.step_inner(opcode, scope) {
            Ok(step) => Ok(step),
            Err(err) => {
                tracing::trace!(opcode, error = %err, "opcode failed");
                if let Some(tracer) = self.tracer.as_mut() {
                    tracer.on_error(opcode, &err);
                }
                Err(err)
            }
        }
    }

    fn step_inner(&mut self, opcode: u8, scope: &mut ScopeContext) -> EvmResult<Step> {
        let op = *self.table.get(opcode);
        if op.is_undefined() {
            return Err(EvmError::InvalidOpcode(opcode));
        }

        let len = scope.stack.len();
        if len < op.min_stack {
            return Err(EvmError::StackUnderflow {
                len,
                required: op.min_stack,
            });
        }
        if len > op.max_stack {
            return Err(EvmError::StackOverflow {
                len,
                limit: op.max_stack,
            });
        }

        if let Some(tracer) = self.tracer.as_mut() {
            tracer.on_pre_charge(opcode, scope.contract.gas, op.constant_gas);
        }
        if !scope.contract.use_gas(op.constant_gas) {
            return Err(EvmError::OutOfGas);
        }
        let mut cost = op.constant_gas;

        let mut memory_size = 0u64;
        if let Some(dynamic) = op.dynamic_gas {
            if let Some(bound) = op.memory_size {
                let size = bound.compute(&scope.stack)?;
                memory_size = to_word_size(size)
                    .checked_mul(32)
                    .ok_or(EvmError::GasUintOverflow)?;
            }
            let dynamic_cost = dynamic.eval(self, scope, memory_size)?;
            if !scope.contract.use_gas(dynamic_cost) {
                return Err(EvmError::OutOfGas);
            }
            cost = cost.saturating_add(dynamic_cost);
        }

        if let Some(tracer) = self.tracer.as_mut() {
            tracer.on_post_charge(opcode, scope.contract.gas, cost);
        }

        if memory_size > 0 {
            let size = usize::try_from(memory_size).map_err(|_| EvmError::MemoryOverflow)?;
            scope.memory.resize(size);
        }

        let output = op.execute.execute(self, scope)?;
        if op.halts {
            return Ok(Step::Halt(output));
        }
        Ok(Step::Continue)
    }
}

impl<H: Host + std::fmt::Debug> std::fmt::Debug for Interpreter<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("host", &self.host)
            .field("ledger", &self.ledger)
            .field("block", &self.block)
            .field("read_only", &self.read_only)
            .field("call_gas_temp", &self.call_gas_temp)
            .finish_non_exhaustive()
    }
}
