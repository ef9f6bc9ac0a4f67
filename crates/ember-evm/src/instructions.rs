//! Opcode actions, run after gas has been charged

use crate::error::{EvmError, EvmResult};
use crate::gas::cost;
use crate::host::{CallKind, CallRequest, CreateRequest, Host};
use crate::interpreter::{Interpreter, ScopeContext};
use crate::memory::memory_range;
use crate::operation::Instruction;
use crate::stack::{bool_to_word, u256_to_u64};
use bytes::Bytes;
use ember_primitives::{Address, H256, U256};

fn to_usize(value: &U256) -> EvmResult<usize> {
    u256_to_u64(value)
        .and_then(|v| usize::try_from(v).ok())
        .ok_or(EvmError::MemoryOverflow)
}

/// Read `len` bytes of `data` from `offset`, zero-padded past the end
fn padded_slice(data: &[u8], offset: &U256, len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    let start = match u256_to_u64(offset).and_then(|v| usize::try_from(v).ok()) {
        Some(start) if start < data.len() => start,
        _ => return out,
    };
    let end = start.saturating_add(len).min(data.len());
    out[..end - start].copy_from_slice(&data[start..end]);
    out
}

/// Memory contents for an `(offset, len)` operand pair
fn memory_input(scope: &ScopeContext, offset: &U256, len: &U256) -> EvmResult<Bytes> {
    match memory_range(offset, len)? {
        Some((offset, len)) => Ok(Bytes::from(scope.memory.get_copy(offset, len))),
        None => Ok(Bytes::new()),
    }
}

impl Instruction {
    /// Run the action. Returns the frame output for halting operations and
    /// an empty buffer otherwise.
    pub fn execute<H: Host>(
        self,
        interp: &mut Interpreter<H>,
        scope: &mut ScopeContext,
    ) -> EvmResult<Bytes> {
        let stack = &mut scope.stack;
        match self {
            Instruction::Stop => {}
            Instruction::Add => {
                let a = stack.pop()?;
                let b = stack.pop()?;
                stack.push(a.overflowing_add(b).0)?;
            }
            Instruction::Mul => {
                let a = stack.pop()?;
                let b = stack.pop()?;
                stack.push(a.overflowing_mul(b).0)?;
            }
            Instruction::Sub => {
                let a = stack.pop()?;
                let b = stack.pop()?;
                stack.push(a.overflowing_sub(b).0)?;
            }
            Instruction::Lt => {
                let a = stack.pop()?;
                let b = stack.pop()?;
                stack.push(bool_to_word(a < b))?;
            }
            Instruction::Gt => {
                let a = stack.pop()?;
                let b = stack.pop()?;
                stack.push(bool_to_word(a > b))?;
            }
            Instruction::Eq => {
                let a = stack.pop()?;
                let b = stack.pop()?;
                stack.push(bool_to_word(a == b))?;
            }
            Instruction::IsZero => {
                let a = stack.pop()?;
                stack.push(bool_to_word(a.is_zero()))?;
            }
            Instruction::And => {
                let a = stack.pop()?;
                let b = stack.pop()?;
                stack.push(a & b)?;
            }
            Instruction::Or => {
                let a = stack.pop()?;
                let b = stack.pop()?;
                stack.push(a | b)?;
            }
            Instruction::Xor => {
                let a = stack.pop()?;
                let b = stack.pop()?;
                stack.push(a ^ b)?;
            }
            Instruction::Not => {
                let a = stack.pop()?;
                stack.push(!a)?;
            }
            Instruction::Address => {
                stack.push(scope.contract.address.to_word())?;
            }
            Instruction::Balance => {
                let address = Address::from_word(&stack.pop()?);
                stack.push(interp.host().balance(&address))?;
            }
            Instruction::Caller => {
                stack.push(scope.contract.caller.to_word())?;
            }
            Instruction::CallValue => {
                stack.push(scope.contract.value)?;
            }
            Instruction::ExtCodeSize => {
                let address = Address::from_word(&stack.pop()?);
                stack.push(U256::from(interp.host().code_size(&address)))?;
            }
            Instruction::ExtCodeCopy => {
                let address = Address::from_word(&stack.pop()?);
                let mem_offset = stack.pop()?;
                let code_offset = stack.pop()?;
                let len = stack.pop()?;
                if let Some((mem_offset, len)) = memory_range(&mem_offset, &len)? {
                    let code = interp.host().code(&address);
                    let data = padded_slice(&code, &code_offset, len);
                    scope.memory.set(mem_offset, &data)?;
                }
            }
            Instruction::ExtCodeHash => {
                let address = Address::from_word(&stack.pop()?);
                let hash = if interp.host().is_empty(&address) {
                    H256::ZERO
                } else {
                    interp.host().code_hash(&address)
                };
                stack.push(hash.to_word())?;
            }
            Instruction::ChainId => {
                stack.push(U256::from(interp.block().chain_id))?;
            }
            Instruction::SelfBalance => {
                stack.push(interp.host().balance(&scope.contract.address))?;
            }
            Instruction::BaseFee => {
                stack.push(interp.block().base_fee)?;
            }
            Instruction::Pop => {
                stack.pop()?;
            }
            Instruction::MLoad => {
                let offset = to_usize(&stack.pop()?)?;
                stack.push(scope.memory.load_word(offset))?;
            }
            Instruction::MStore => {
                let offset = to_usize(&stack.pop()?)?;
                let value = stack.pop()?;
                scope.memory.store_word(offset, &value)?;
            }
            Instruction::MStore8 => {
                let offset = to_usize(&stack.pop()?)?;
                let value = stack.pop()?;
                scope.memory.store_byte(offset, value.byte(0))?;
            }
            Instruction::SLoad => {
                let key = H256::from_word(&stack.pop()?);
                let value = interp.host().storage(&scope.contract.address, &key);
                stack.push(value.to_word())?;
            }
            Instruction::SStore => {
                if interp.is_read_only() {
                    return Err(EvmError::WriteProtection);
                }
                let key = H256::from_word(&stack.pop()?);
                let value = H256::from_word(&stack.pop()?);
                interp
                    .host_mut()
                    .set_storage(scope.contract.address, key, value);
            }
            Instruction::MSize => {
                stack.push(U256::from(scope.memory.len()))?;
            }
            Instruction::Gas => {
                stack.push(U256::from(scope.contract.gas))?;
            }
            Instruction::MCopy => {
                let len = stack.pop()?;
                let dst = stack.pop()?;
                let src = stack.pop()?;
                if len.is_zero() {
                    return Ok(Bytes::new());
                }
                let len = to_usize(&len)?;
                let dst = to_usize(&dst)?;
                let src = to_usize(&src)?;
                scope.memory.copy(dst, src, len)?;
            }
            Instruction::Push0 => {
                stack.push(U256::zero())?;
            }
            Instruction::Dup(n) => {
                stack.dup(n as usize)?;
            }
            Instruction::Swap(n) => {
                stack.swap(n as usize)?;
            }
            Instruction::Create | Instruction::Create2 => {
                if interp.is_read_only() {
                    return Err(EvmError::WriteProtection);
                }
                let value = stack.pop()?;
                let offset = stack.pop()?;
                let size = stack.pop()?;
                let salt = if self == Instruction::Create2 {
                    Some(H256::from_word(&stack.pop()?))
                } else {
                    None
                };
                let init_code = memory_input(scope, &offset, &size)?;

                // all but one 64th
                let gas = scope.contract.gas - scope.contract.gas / 64;
                scope.contract.gas -= gas;

                let outcome = interp.host_mut().create(CreateRequest {
                    caller: scope.contract.address,
                    value,
                    init_code,
                    gas,
                    salt,
                });
                scope.contract.gas += outcome.gas_left;
                let pushed = outcome.address.map(|a| a.to_word()).unwrap_or_default();
                if outcome.address.is_none() {
                    interp.set_return_data(outcome.output);
                } else {
                    interp.set_return_data(Bytes::new());
                }
                scope.stack.push(pushed)?;
            }
            Instruction::Call(kind) => {
                return execute_call(kind, interp, scope);
            }
            Instruction::Return => {
                let offset = stack.pop()?;
                let len = stack.pop()?;
                return memory_input(scope, &offset, &len);
            }
            Instruction::SelfDestruct => {
                if interp.is_read_only() {
                    return Err(EvmError::WriteProtection);
                }
                let beneficiary = Address::from_word(&stack.pop()?);
                interp
                    .host_mut()
                    .self_destruct(scope.contract.address, beneficiary);
            }
            // 0xFE is the designated invalid opcode; the dispatcher rejects
            // undefined bytes before getting here
            Instruction::Undefined => return Err(EvmError::InvalidOpcode(0xFE)),
        }
        Ok(Bytes::new())
    }
}

fn execute_call<H: Host>(
    kind: CallKind,
    interp: &mut Interpreter<H>,
    scope: &mut ScopeContext,
) -> EvmResult<Bytes> {
    let stack = &mut scope.stack;
    // requested gas was already resolved into call_gas_temp
    stack.pop()?;
    let target = Address::from_word(&stack.pop()?);
    let value = if kind.has_value() {
        stack.pop()?
    } else {
        U256::zero()
    };
    let in_offset = stack.pop()?;
    let in_len = stack.pop()?;
    let out_offset = stack.pop()?;
    let out_len = stack.pop()?;

    if kind == CallKind::Call && interp.is_read_only() && !value.is_zero() {
        return Err(EvmError::WriteProtection);
    }

    let mut gas = interp.call_gas_temp();
    if !value.is_zero() {
        gas += cost::CALL_STIPEND;
    }
    let input = memory_input(scope, &in_offset, &in_len)?;

    let (caller, value) = match kind {
        CallKind::DelegateCall => (scope.contract.caller, scope.contract.value),
        _ => (scope.contract.address, value),
    };
    let outcome = interp.host_mut().call(CallRequest {
        kind,
        caller,
        target,
        value,
        input,
        gas,
    });

    if let Some((out_offset, out_len)) = memory_range(&out_offset, &out_len)? {
        let n = out_len.min(outcome.output.len());
        scope.memory.set(out_offset, &outcome.output[..n])?;
    }
    scope.contract.gas += outcome.gas_left;
    scope.stack.push(bool_to_word(outcome.success))?;
    interp.set_return_data(outcome.output);
    Ok(Bytes::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_list::AccessLedger;
    use crate::context::{BlockContext, Contract};
    use crate::host::InMemoryHost;
    use crate::jump_table::JumpTable;

    fn setup() -> (Interpreter<InMemoryHost>, ScopeContext) {
        let interp = Interpreter::new(
            InMemoryHost::new(),
            JumpTable::base(),
            BlockContext::default(),
            AccessLedger::new(),
        );
        let contract = Contract::new(
            Address::from_bytes([1; 20]),
            Address::from_bytes([2; 20]),
            U256::from(7),
            1_000_000,
        );
        (interp, ScopeContext::new(contract))
    }

    #[test]
    fn test_padded_slice() {
        let data = [1u8, 2, 3];
        assert_eq!(padded_slice(&data, &U256::from(1), 4), vec![2, 3, 0, 0]);
        assert_eq!(padded_slice(&data, &U256::from(10), 2), vec![0, 0]);
        assert_eq!(padded_slice(&data, &U256::MAX, 2), vec![0, 0]);
    }

    #[test]
    fn test_sub_wraps() {
        let (mut interp, mut scope) = setup();
        scope.stack.push(U256::from(1)).unwrap();
        scope.stack.push(U256::from(0)).unwrap();
        Instruction::Sub.execute(&mut interp, &mut scope).unwrap();
        assert_eq!(*scope.stack.peek().unwrap(), U256::MAX);
    }

    #[test]
    fn test_lt_operand_order() {
        let (mut interp, mut scope) = setup();
        scope.stack.push(U256::from(5)).unwrap();
        scope.stack.push(U256::from(3)).unwrap();
        // top (3) < second (5)
        Instruction::Lt.execute(&mut interp, &mut scope).unwrap();
        assert_eq!(*scope.stack.peek().unwrap(), U256::one());
    }

    #[test]
    fn test_sstore_write_protection() {
        let (mut interp, mut scope) = setup();
        interp.set_read_only(true);
        scope.stack.push(U256::from(1)).unwrap();
        scope.stack.push(U256::from(1)).unwrap();
        assert_eq!(
            Instruction::SStore.execute(&mut interp, &mut scope),
            Err(EvmError::WriteProtection)
        );
    }

    #[test]
    fn test_mcopy_zero_length_leaves_memory() {
        let (mut interp, mut scope) = setup();
        scope.stack.push(U256::MAX).unwrap(); // src
        scope.stack.push(U256::MAX).unwrap(); // dst
        scope.stack.push(U256::zero()).unwrap(); // len
        Instruction::MCopy.execute(&mut interp, &mut scope).unwrap();
        assert!(scope.memory.is_empty());
        assert!(scope.stack.is_empty());
    }

    #[test]
    fn test_mcopy_pop_order() {
        let (mut interp, mut scope) = setup();
        scope.memory.set(0, &[0xAA, 0xBB]).unwrap();
        scope.stack.push(U256::from(0)).unwrap(); // src
        scope.stack.push(U256::from(40)).unwrap(); // dst
        scope.stack.push(U256::from(2)).unwrap(); // len
        Instruction::MCopy.execute(&mut interp, &mut scope).unwrap();
        assert_eq!(scope.memory.get_copy(40, 2), vec![0xAA, 0xBB]);
        assert_eq!(scope.memory.len(), 64);
    }

    #[test]
    fn test_call_adds_stipend_with_value() {
        let (mut interp, mut scope) = setup();
        interp.call_gas_temp = 1000;
        for v in [0u64, 0, 0, 0, 5, 0x42, 50_000] {
            scope.stack.push(U256::from(v)).unwrap();
        }
        Instruction::Call(CallKind::Call)
            .execute(&mut interp, &mut scope)
            .unwrap();
        let call = &interp.host().calls[0];
        assert_eq!(call.gas, 1000 + cost::CALL_STIPEND);
        assert_eq!(call.value, U256::from(5));
        assert_eq!(call.target, Address::from_word(&U256::from(0x42)));
        // default outcome reports failure
        assert_eq!(*scope.stack.peek().unwrap(), U256::zero());
    }

    #[test]
    fn test_static_context_blocks_value_call() {
        let (mut interp, mut scope) = setup();
        interp.set_read_only(true);
        for v in [0u64, 0, 0, 0, 1, 0x42, 0] {
            scope.stack.push(U256::from(v)).unwrap();
        }
        assert_eq!(
            Instruction::Call(CallKind::Call).execute(&mut interp, &mut scope),
            Err(EvmError::WriteProtection)
        );
    }

    #[test]
    fn test_create_forwards_all_but_one_64th() {
        let (mut interp, mut scope) = setup();
        scope.contract.gas = 6400;
        scope.memory.set(0, &[0x60, 0x00]).unwrap();
        scope.stack.push(U256::from(2)).unwrap(); // size
        scope.stack.push(U256::from(0)).unwrap(); // offset
        scope.stack.push(U256::from(0)).unwrap(); // value
        Instruction::Create.execute(&mut interp, &mut scope).unwrap();
        let create = &interp.host().creates[0];
        assert_eq!(create.gas, 6300);
        assert_eq!(create.init_code.as_ref(), &[0x60, 0x00]);
        assert_eq!(create.salt, None);
        assert_eq!(scope.contract.gas, 100);
    }
}
