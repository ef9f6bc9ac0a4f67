//! Execution context for a single call frame

use ember_primitives::{Address, U256};

/// The contract whose code is running in the current frame
#[derive(Clone, Debug)]
pub struct Contract {
    /// Caller address
    pub caller: Address,
    /// Contract address being executed
    pub address: Address,
    /// Call value in wei
    pub value: U256,
    /// Gas remaining in this frame
    pub gas: u64,
}

impl Contract {
    /// Create a new contract frame
    pub fn new(caller: Address, address: Address, value: U256, gas: u64) -> Self {
        Self {
            caller,
            address,
            value,
            gas,
        }
    }

    /// Deduct `amount` if affordable. Nothing is deducted otherwise.
    pub fn use_gas(&mut self, amount: u64) -> bool {
        if self.gas < amount {
            return false;
        }
        self.gas -= amount;
        true
    }
}

impl Default for Contract {
    fn default() -> Self {
        Self::new(Address::ZERO, Address::ZERO, U256::zero(), 0)
    }
}

/// Block environment information read by the query opcodes
#[derive(Clone, Debug)]
pub struct BlockContext {
    /// Chain ID (EIP-155)
    pub chain_id: u64,
    /// Base fee (EIP-1559)
    pub base_fee: U256,
}

impl Default for BlockContext {
    fn default() -> Self {
        Self {
            chain_id: 1,
            base_fee: U256::zero(),
        }
    }
}
