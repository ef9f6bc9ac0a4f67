//! Access-list aware dynamic gas (EIP-2929 and EIP-3529)
//!
//! Every function here may warm an address or slot on the ledger before it
//! returns. Those marks stay even if the frame later runs out of gas.

use crate::error::{EvmError, EvmResult};
use crate::gas::{cost, gas_ext_code_copy, word_to_address, word_to_slot};
use crate::host::Host;
use crate::interpreter::{Interpreter, ScopeContext};
use crate::operation::CallGas;

/// Surcharge for a cold account on top of the warm constant cost
pub const COLD_ACCOUNT_SURCHARGE: u64 = cost::COLD_ACCOUNT_ACCESS - cost::WARM_STORAGE_READ;

/// BALANCE, EXTCODESIZE, EXTCODEHASH: the warm read is in the constant
/// cost, a cold account adds the difference.
pub fn gas_account_check<H: Host>(
    interp: &mut Interpreter<H>,
    scope: &mut ScopeContext,
    _memory_size: u64,
) -> EvmResult<u64> {
    let address = word_to_address(scope.stack.peek()?);
    if interp.ledger_mut().add_address(address) {
        return Ok(COLD_ACCOUNT_SURCHARGE);
    }
    Ok(0)
}

/// EXTCODECOPY: memory and copy cost first, then the cold surcharge
pub fn gas_ext_code_copy_acl<H: Host>(
    interp: &mut Interpreter<H>,
    scope: &mut ScopeContext,
    memory_size: u64,
) -> EvmResult<u64> {
    let gas = gas_ext_code_copy(interp, scope, memory_size)?;
    let address = word_to_address(scope.stack.peek()?);
    if interp.ledger_mut().add_address(address) {
        return gas
            .checked_add(COLD_ACCOUNT_SURCHARGE)
            .ok_or(EvmError::GasUintOverflow);
    }
    Ok(gas)
}

/// SLOAD: 2100 for a cold slot, 100 once warm
pub fn gas_sload_acl<H: Host>(
    interp: &mut Interpreter<H>,
    scope: &mut ScopeContext,
    _memory_size: u64,
) -> EvmResult<u64> {
    let slot = word_to_slot(scope.stack.peek()?);
    let (_, slot_added) = interp.ledger_mut().add_slot(scope.contract.address, slot);
    if slot_added {
        return Ok(cost::COLD_SLOAD);
    }
    Ok(cost::WARM_STORAGE_READ)
}

/// Call variants with access lists.
///
/// A cold target's surcharge is taken from the frame before the
/// pre-access-list calculator runs, so the 63/64 cap sees the reduced
/// balance. It is then handed back and included in the returned total.
pub fn gas_call_acl<H: Host>(
    variant: CallGas,
    interp: &mut Interpreter<H>,
    scope: &mut ScopeContext,
    memory_size: u64,
) -> EvmResult<u64> {
    let address = word_to_address(scope.stack.back(1)?);
    let cold = interp.ledger_mut().add_address(address);
    if cold && !scope.contract.use_gas(COLD_ACCOUNT_SURCHARGE) {
        return Err(EvmError::OutOfGas);
    }
    let result = variant.cost(interp, scope, memory_size);
    if !cold {
        return result;
    }
    scope.contract.gas += COLD_ACCOUNT_SURCHARGE;
    let gas = result?;
    gas.checked_add(COLD_ACCOUNT_SURCHARGE)
        .ok_or(EvmError::GasUintOverflow)
}

/// SSTORE with access lists, parameterised by the clearing refund.
pub fn gas_sstore_acl<H: Host>(
    clearing_refund: u64,
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

    let mut gas = 0;
    let (address_added, slot_added) = interp.ledger_mut().add_slot(address, key);
    if slot_added {
        gas = cost::COLD_SLOAD;
        if address_added {
            tracing::warn!(
                address = %address,
                "executing contract was not warm during sstore"
            );
        }
    }

    if current == value {
        return Ok(gas + cost::WARM_STORAGE_READ);
    }
    let original = interp.host().committed_storage(&address, &key);
    let reset = cost::SSTORE_RESET_EIP2200 - cost::COLD_SLOAD;
    let ledger = interp.ledger_mut();
    if original == current {
        if original.is_zero() {
            return Ok(gas + cost::SSTORE_SET_EIP2200);
        }
        if value.is_zero() {
            ledger.add_refund(clearing_refund);
        }
        return Ok(gas + reset);
    }
    if !original.is_zero() {
        if current.is_zero() {
            ledger.sub_refund(clearing_refund);
        } else if value.is_zero() {
            ledger.add_refund(clearing_refund);
        }
    }
    if original == value {
        if original.is_zero() {
            ledger.add_refund(cost::SSTORE_SET_EIP2200 - cost::WARM_STORAGE_READ);
        } else {
            ledger.add_refund(reset - cost::WARM_STORAGE_READ);
        }
    }
    Ok(gas + cost::WARM_STORAGE_READ)
}

/// SELFDESTRUCT with access lists. `refunds` is false from EIP-3529 on.
pub fn gas_selfdestruct_acl<H: Host>(
    refunds: bool,
    interp: &mut Interpreter<H>,
    scope: &mut ScopeContext,
    _memory_size: u64,
) -> EvmResult<u64> {
    let mut gas = 0;
    let beneficiary = word_to_address(scope.stack.peek()?);
    if interp.ledger_mut().add_address(beneficiary) {
        gas = cost::COLD_ACCOUNT_ACCESS;
    }
    let address = scope.contract.address;
    if interp.host().is_empty(&beneficiary) && !interp.host().balance(&address).is_zero() {
        gas += cost::CREATE_BY_SELFDESTRUCT;
    }
    if refunds && !interp.host().has_self_destructed(&address) {
        interp.ledger_mut().add_refund(cost::SELFDESTRUCT_REFUND);
    }
    Ok(gas)
}
