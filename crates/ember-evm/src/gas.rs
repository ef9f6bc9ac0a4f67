//! Gas cost constants, memory expansion pricing and the pre-access-list
//! dynamic gas functions

use crate::error::{EvmError, EvmResult};
use crate::host::{CallKind, Host};
use crate::interpreter::{Interpreter, ScopeContext};
use crate::memory::Memory;
use crate::stack::u256_to_u64;
use ember_primitives::{Address, H256, U256};

/// Gas costs for EVM operations
pub mod cost {
    /// Zero gas
    pub const ZERO: u64 = 0;
    /// Quick step (2)
    pub const QUICK: u64 = 2;
    /// Fastest step (3)
    pub const FASTEST: u64 = 3;
    /// Fast step (5)
    pub const FAST: u64 = 5;

    /// Memory gas per word
    pub const MEMORY: u64 = 3;
    /// Quadratic memory cost divisor
    pub const QUAD_COEFF_DIV: u64 = 512;
    /// Copy gas per word
    pub const COPY: u64 = 3;
    /// Keccak gas per word, charged by CREATE2 for hashing initcode
    pub const KECCAK_WORD: u64 = 6;

    /// SLOAD (EIP-150)
    pub const SLOAD_EIP150: u64 = 200;
    /// BALANCE (EIP-150)
    pub const BALANCE_EIP150: u64 = 400;
    /// EXTCODESIZE (EIP-150)
    pub const EXTCODESIZE_EIP150: u64 = 700;
    /// EXTCODECOPY (EIP-150)
    pub const EXTCODECOPY_EIP150: u64 = 700;
    /// EXTCODEHASH (Constantinople)
    pub const EXTCODEHASH_CONSTANTINOPLE: u64 = 400;
    /// CALL family (EIP-150)
    pub const CALL_EIP150: u64 = 700;
    /// SELFDESTRUCT (EIP-150)
    pub const SELFDESTRUCT_EIP150: u64 = 5000;

    /// SLOAD (EIP-1884)
    pub const SLOAD_EIP1884: u64 = 800;
    /// BALANCE (EIP-1884)
    pub const BALANCE_EIP1884: u64 = 700;
    /// EXTCODEHASH (EIP-1884)
    pub const EXTCODEHASH_EIP1884: u64 = 700;

    /// Legacy SSTORE: zero to non-zero
    pub const SSTORE_SET: u64 = 20000;
    /// Legacy SSTORE: non-zero to non-zero
    pub const SSTORE_RESET: u64 = 5000;
    /// Legacy SSTORE: non-zero to zero
    pub const SSTORE_CLEAR: u64 = 5000;
    /// Legacy SSTORE clearing refund
    pub const SSTORE_REFUND: u64 = 15000;

    /// SLOAD (EIP-2200), also the SSTORE no-op charge
    pub const SLOAD_EIP2200: u64 = 800;
    /// Minimum gas left for SSTORE to run at all
    pub const SSTORE_SENTRY_EIP2200: u64 = 2300;
    /// Fresh slot write (EIP-2200)
    pub const SSTORE_SET_EIP2200: u64 = 20000;
    /// Existing slot write (EIP-2200)
    pub const SSTORE_RESET_EIP2200: u64 = 5000;
    /// Clearing refund (EIP-2200)
    pub const SSTORE_CLEARS_SCHEDULE_REFUND_EIP2200: u64 = 15000;
    /// Clearing refund (EIP-3529)
    pub const SSTORE_CLEARS_SCHEDULE_REFUND_EIP3529: u64 = 4800;

    /// Cold account access (EIP-2929)
    pub const COLD_ACCOUNT_ACCESS: u64 = 2600;
    /// Cold slot access (EIP-2929)
    pub const COLD_SLOAD: u64 = 2100;
    /// Warm read (EIP-2929)
    pub const WARM_STORAGE_READ: u64 = 100;

    /// Call value transfer gas
    pub const CALL_VALUE: u64 = 9000;
    /// Call new account gas
    pub const CALL_NEW_ACCOUNT: u64 = 25000;
    /// Call stipend
    pub const CALL_STIPEND: u64 = 2300;

    /// Create gas
    pub const CREATE: u64 = 32000;
    /// Create2 gas
    pub const CREATE2: u64 = 32000;
    /// Gas per initcode word (EIP-3860)
    pub const INIT_CODE_WORD: u64 = 2;
    /// Max init code size (EIP-3860)
    pub const MAX_INIT_CODE_SIZE: u64 = 49152;

    /// SELFDESTRUCT to an empty account with value
    pub const CREATE_BY_SELFDESTRUCT: u64 = 25000;
    /// SELFDESTRUCT refund
    pub const SELFDESTRUCT_REFUND: u64 = 24000;

    /// Max stack size
    pub const MAX_STACK_SIZE: usize = 1024;
}

/// Largest memory size whose expansion fee still fits in a u64
pub const MAX_MEMORY_SIZE: u64 = 0x1F_FFFF_FFE0;

/// Round a byte count up to 32-byte words
pub fn to_word_size(size: u64) -> u64 {
    if size > u64::MAX - 31 {
        return u64::MAX / 32 + 1;
    }
    (size + 31) / 32
}

/// Total expansion fee for `words` words: `3 * words + words^2 / 512`
pub fn memory_fee(words: u64) -> u64 {
    cost::MEMORY * words + words * words / cost::QUAD_COEFF_DIV
}

/// Charge for growing memory to cover `new_size` bytes.
///
/// Only the difference to the fee already paid is returned, and the new
/// total is remembered on `mem`. Sizes that are already covered cost
/// nothing.
pub fn memory_gas_cost(mem: &mut Memory, new_size: u64) -> EvmResult<u64> {
    if new_size == 0 {
        return Ok(0);
    }
    if new_size > MAX_MEMORY_SIZE {
        return Err(EvmError::GasUintOverflow);
    }
    let words = to_word_size(new_size);
    let aligned = words * 32;
    if aligned > mem.len() as u64 {
        let total = memory_fee(words);
        let fee = total.saturating_sub(mem.last_gas_cost());
        mem.set_last_gas_cost(total);
        return Ok(fee);
    }
    Ok(0)
}

/// Memory bound `offset + len` for operands taken from the stack.
///
/// A zero length needs no memory regardless of the offset. Bounds that do
/// not fit in a u64 are reported as overflow.
pub fn calc_mem_size(offset: &U256, len: &U256) -> EvmResult<u64> {
    let len = u256_to_u64(len).ok_or(EvmError::GasUintOverflow)?;
    calc_mem_size_with_len(offset, len)
}

/// Same as [`calc_mem_size`] with a fixed length
pub fn calc_mem_size_with_len(offset: &U256, len: u64) -> EvmResult<u64> {
    if len == 0 {
        return Ok(0);
    }
    let offset = u256_to_u64(offset).ok_or(EvmError::GasUintOverflow)?;
    offset.checked_add(len).ok_or(EvmError::GasUintOverflow)
}

/// Gas made available to a nested call under the 63/64 rule.
///
/// `base` is the rest of the call's dynamic cost, already committed from
/// `available`. A request above the cap is clamped to it.
pub fn call_gas(available: u64, base: u64, requested: &U256) -> u64 {
    let remaining = available.saturating_sub(base);
    let cap = remaining - remaining / 64;
    match u256_to_u64(requested) {
        Some(requested) if requested <= cap => requested,
        _ => cap,
    }
}

pub(crate) fn word_to_address(word: &U256) -> Address {
    Address::from_word(word)
}

pub(crate) fn word_to_slot(word: &U256) -> H256 {
    H256::from_word(word)
}

/// Memory-only dynamic gas (MLOAD, MSTORE, MSTORE8, RETURN, CREATE)
pub fn gas_memory<H: Host>(
    _interp: &mut Interpreter<H>,
    scope: &mut ScopeContext,
    memory_size: u64,
) -> EvmResult<u64> {
    memory_gas_cost(&mut scope.memory, memory_size)
}

/// CREATE2: memory expansion plus hashing of the initcode
pub fn gas_create2<H: Host>(
    _interp: &mut Interpreter<H>,
    scope: &mut ScopeContext,
    memory_size: u64,
) -> EvmResult<u64> {
    let gas = memory_gas_cost(&mut scope.memory, memory_size)?;
    let size = u256_to_u64(scope.stack.back(2)?).ok_or(EvmError::GasUintOverflow)?;
    let hashing = to_word_size(size)
        .checked_mul(cost::KECCAK_WORD)
        .ok_or(EvmError::GasUintOverflow)?;
    gas.checked_add(hashing).ok_or(EvmError::GasUintOverflow)
}

/// EXTCODECOPY before access lists: memory expansion plus 3 per copied word
pub fn gas_ext_code_copy<H: Host>(
    _interp: &mut Interpreter<H>,
    scope: &mut ScopeContext,
    memory_size: u64,
) -> EvmResult<u64> {
    let gas = memory_gas_cost(&mut scope.memory, memory_size)?;
    let len = u256_to_u64(scope.stack.back(3)?).ok_or(EvmError::GasUintOverflow)?;
    let copy = to_word_size(len)
        .checked_mul(cost::COPY)
        .ok_or(EvmError::GasUintOverflow)?;
    gas.checked_add(copy).ok_or(EvmError::GasUintOverflow)
}

/// Pre-access-list gas for the four call variants.
///
/// Charges new-account and value-transfer surcharges where they apply,
/// memory expansion, and finally the gas forwarded to the callee, which is
/// also left in `call_gas_temp` for the action.
pub fn gas_call_variant<H: Host>(
    kind: CallKind,
    interp: &mut Interpreter<H>,
    scope: &mut ScopeContext,
    memory_size: u64,
) -> EvmResult<u64> {
    let mut gas = 0u64;
    if kind.has_value() {
        let transfers_value = !scope.stack.back(2)?.is_zero();
        if kind == CallKind::Call {
            let target = word_to_address(scope.stack.back(1)?);
            if transfers_value && interp.host().is_empty(&target) {
                gas += cost::CALL_NEW_ACCOUNT;
            }
        }
        if transfers_value {
            gas += cost::CALL_VALUE;
        }
    }
    let mem = memory_gas_cost(&mut scope.memory, memory_size)?;
    gas = gas.checked_add(mem).ok_or(EvmError::GasUintOverflow)?;

    let forwarded = call_gas(scope.contract.gas, gas, scope.stack.back(0)?);
    interp.call_gas_temp = forwarded;
    gas.checked_add(forwarded).ok_or(EvmError::GasUintOverflow)
}

/// SELFDESTRUCT before access lists (EIP-150 and EIP-161 rules)
pub fn gas_selfdestruct<H: Host>(
    interp: &mut Interpreter<H>,
    scope: &mut ScopeContext,
    _memory_size: u64,
) -> EvmResult<u64> {
    let mut gas = cost::SELFDESTRUCT_EIP150;
    let beneficiary = word_to_address(scope.stack.peek()?);
    let address = scope.contract.address;
    if interp.host().is_empty(&beneficiary) && !interp.host().balance(&address).is_zero() {
        gas += cost::CREATE_BY_SELFDESTRUCT;
    }
    if !interp.host().has_self_destructed(&address) {
        interp.ledger_mut().add_refund(cost::SELFDESTRUCT_REFUND);
    }
    Ok(gas)
}

/// Petersburg SSTORE: priced on the current value only
pub fn gas_sstore_legacy<H: Host>(
    interp: &mut Interpreter<H>,
    scope: &mut ScopeContext,
    _memory_size: u64,
) -> EvmResult<u64> {
    let key = word_to_slot(scope.stack.peek()?);
    let value = scope.stack.back(1)?;
    let current = interp.host().storage(&scope.contract.address, &key);
    if current.is_zero() && !value.is_zero() {
        return Ok(cost::SSTORE_SET);
    }
    if !current.is_zero() && value.is_zero() {
        interp.ledger_mut().add_refund(cost::SSTORE_REFUND);
        return Ok(cost::SSTORE_CLEAR);
    }
    Ok(cost::SSTORE_RESET)
}

/// Net-metered SSTORE (EIP-2200)
pub fn gas_sstore_eip2200<H: Host>(
    interp: &mut Interpreter<H>,
    scope: &mut ScopeContext,
    _memory_size: u64,
) -> EvmResult<u64> {
    if scope.contract.gas <= cost::SSTORE_SENTRY_EIP2200 {
        return Err(EvmError::ReentrancySentry);
    }
    let address = scope.contract.address;
    let key = word_to_slot(scope.stack.peek()?);
    let value = word_to_slot(scope.stack.back(1)?);
    let current = interp.host().storage(&address, &key);
    if current == value {
        return Ok(cost::SLOAD_EIP2200);
    }
    let original = interp.host().committed_storage(&address, &key);
    let refund = cost::SSTORE_CLEARS_SCHEDULE_REFUND_EIP2200;
    let ledger = interp.ledger_mut();
    if original == current {
        if original.is_zero() {
            return Ok(cost::SSTORE_SET_EIP2200);
        }
        if value.is_zero() {
            ledger.add_refund(refund);
        }
        return Ok(cost::SSTORE_RESET_EIP2200);
    }
    if !original.is_zero() {
        if current.is_zero() {
            ledger.sub_refund(refund);
        } else if value.is_zero() {
            ledger.add_refund(refund);
        }
    }
    if original == value {
        if original.is_zero() {
            ledger.add_refund(cost::SSTORE_SET_EIP2200 - cost::SLOAD_EIP2200);
        } else {
            ledger.add_refund(cost::SSTORE_RESET_EIP2200 - cost::SLOAD_EIP2200);
        }
    }
    Ok(cost::SLOAD_EIP2200)
}

/// MCOPY: expansion to cover both ranges plus 3 gas per copied byte.
///
/// A zero-length copy touches no memory and costs nothing.
pub fn gas_mcopy<H: Host>(
    _interp: &mut Interpreter<H>,
    scope: &mut ScopeContext,
    _memory_size: u64,
) -> EvmResult<u64> {
    let len = u256_to_u64(scope.stack.back(0)?).ok_or(EvmError::GasUintOverflow)?;
    if len == 0 {
        return Ok(0);
    }
    let dst = u256_to_u64(scope.stack.back(1)?).ok_or(EvmError::GasUintOverflow)?;
    let src = u256_to_u64(scope.stack.back(2)?).ok_or(EvmError::GasUintOverflow)?;
    let end_src = src.checked_add(len).ok_or(EvmError::GasUintOverflow)?;
    let end_dst = dst.checked_add(len).ok_or(EvmError::GasUintOverflow)?;
    let mem = memory_gas_cost(&mut scope.memory, end_src.max(end_dst))?;
    let copy = len.checked_mul(cost::COPY).ok_or(EvmError::GasUintOverflow)?;
    mem.checked_add(copy).ok_or(EvmError::GasUintOverflow)
}

/// CREATE/CREATE2 with the initcode ceiling (EIP-3860).
///
/// Rejects initcode over 49152 bytes, then charges memory expansion for
/// the initcode range and 2 gas per initcode word.
pub fn gas_create_eip3860<H: Host>(
    _interp: &mut Interpreter<H>,
    scope: &mut ScopeContext,
    _memory_size: u64,
) -> EvmResult<u64> {
    let offset = scope.stack.back(1)?;
    let size = scope.stack.back(2)?;
    let size = match u256_to_u64(size) {
        Some(size) if size <= cost::MAX_INIT_CODE_SIZE => size,
        other => {
            return Err(EvmError::MaxInitCodeSizeExceeded {
                size: other.unwrap_or(u64::MAX),
                limit: cost::MAX_INIT_CODE_SIZE,
            })
        }
    };
    let required = calc_mem_size_with_len(offset, size)?;
    let mem = memory_gas_cost(&mut scope.memory, required)?;
    let overhead = to_word_size(size)
        .checked_mul(cost::INIT_CODE_WORD)
        .ok_or(EvmError::GasUintOverflow)?;
    mem.checked_add(overhead).ok_or(EvmError::GasUintOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_word_size() {
        assert_eq!(to_word_size(0), 0);
        assert_eq!(to_word_size(1), 1);
        assert_eq!(to_word_size(32), 1);
        assert_eq!(to_word_size(33), 2);
        assert_eq!(to_word_size(u64::MAX), u64::MAX / 32 + 1);
    }

    #[test]
    fn test_memory_fee_quadratic() {
        // 3*words + words^2/512
        assert_eq!(memory_fee(1), 3);
        assert_eq!(memory_fee(2), 6);
        assert_eq!(memory_fee(32), 98);
        assert_eq!(memory_fee(512), 2048);
    }

    #[test]
    fn test_memory_gas_cost_delta() {
        let mut mem = Memory::new();
        assert_eq!(memory_gas_cost(&mut mem, 32).unwrap(), 3);
        mem.resize(32);
        // already covered
        assert_eq!(memory_gas_cost(&mut mem, 10).unwrap(), 0);
        assert_eq!(memory_gas_cost(&mut mem, 64).unwrap(), 3);
        mem.resize(64);
        assert_eq!(mem.last_gas_cost(), 6);
        assert_eq!(memory_gas_cost(&mut mem, 1024).unwrap(), 98 - 6);
    }

    #[test]
    fn test_memory_gas_cost_zero_size() {
        let mut mem = Memory::new();
        assert_eq!(memory_gas_cost(&mut mem, 0).unwrap(), 0);
        assert_eq!(mem.last_gas_cost(), 0);
    }

    #[test]
    fn test_memory_gas_cost_overflow() {
        let mut mem = Memory::new();
        assert_eq!(
            memory_gas_cost(&mut mem, MAX_MEMORY_SIZE + 1),
            Err(EvmError::GasUintOverflow)
        );
        assert!(memory_gas_cost(&mut mem, MAX_MEMORY_SIZE).is_ok());
    }

    #[test]
    fn test_calc_mem_size() {
        assert_eq!(calc_mem_size(&U256::from(10), &U256::zero()).unwrap(), 0);
        // huge offset with zero length is fine
        assert_eq!(calc_mem_size(&U256::MAX, &U256::zero()).unwrap(), 0);
        assert_eq!(calc_mem_size(&U256::from(10), &U256::from(22)).unwrap(), 32);
        assert_eq!(
            calc_mem_size(&U256::from(u64::MAX), &U256::one()),
            Err(EvmError::GasUintOverflow)
        );
        assert_eq!(
            calc_mem_size(&U256::zero(), &U256::MAX),
            Err(EvmError::GasUintOverflow)
        );
    }

    #[test]
    fn test_call_gas_cap() {
        // 63/64 of what is left after the base charge
        assert_eq!(call_gas(6400, 0, &U256::MAX), 6300);
        assert_eq!(call_gas(6400, 0, &U256::from(100)), 100);
        assert_eq!(call_gas(6464, 64, &U256::from(10_000)), 6300);
        assert_eq!(call_gas(10, 20, &U256::from(5)), 0);
    }

    #[test]
    fn test_sstore_constants() {
        assert_eq!(cost::SSTORE_SET_EIP2200, 20000);
        assert_eq!(cost::SSTORE_RESET_EIP2200 - cost::COLD_SLOAD, 2900);
        assert_eq!(cost::SSTORE_CLEARS_SCHEDULE_REFUND_EIP2200, 15000);
        assert_eq!(cost::SSTORE_CLEARS_SCHEDULE_REFUND_EIP3529, 4800);
    }

    #[test]
    fn test_eip2929_cold_warm_costs() {
        assert_eq!(cost::COLD_ACCOUNT_ACCESS - cost::WARM_STORAGE_READ, 2500);
        assert_eq!(cost::COLD_SLOAD, 2100);
        assert_eq!(cost::WARM_STORAGE_READ, 100);
    }
}
