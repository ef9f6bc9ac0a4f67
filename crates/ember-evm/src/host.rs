//! State-access collaborator consumed by the gas functions and actions

use bytes::Bytes;
use ember_primitives::{keccak256, Address, H256, U256};
use std::collections::{HashMap, HashSet};

/// Kind of message call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// CALL
    Call,
    /// CALLCODE
    CallCode,
    /// DELEGATECALL
    DelegateCall,
    /// STATICCALL
    StaticCall,
}

impl CallKind {
    /// Whether the opcode carries a value operand at stack position 2
    pub fn has_value(self) -> bool {
        matches!(self, CallKind::Call | CallKind::CallCode)
    }
}

/// Nested call handed to the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRequest {
    /// Call flavour
    pub kind: CallKind,
    /// Frame issuing the call
    pub caller: Address,
    /// Address whose code runs
    pub target: Address,
    /// Value transferred, or the inherited value for DELEGATECALL
    pub value: U256,
    /// Call data
    pub input: Bytes,
    /// Gas forwarded to the callee
    pub gas: u64,
}

/// Result of a nested call
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallOutcome {
    /// Whether the callee succeeded
    pub success: bool,
    /// Return or revert data
    pub output: Bytes,
    /// Unused gas handed back to the caller
    pub gas_left: u64,
}

/// Contract creation handed to the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateRequest {
    /// Creator
    pub caller: Address,
    /// Endowment
    pub value: U256,
    /// Initcode
    pub init_code: Bytes,
    /// Gas forwarded to the initcode
    pub gas: u64,
    /// CREATE2 salt
    pub salt: Option<H256>,
}

/// Result of a contract creation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateOutcome {
    /// Address of the new contract, if creation succeeded
    pub address: Option<Address>,
    /// Revert data, if any
    pub output: Bytes,
    /// Unused gas handed back to the creator
    pub gas_left: u64,
}

/// World-state view used while metering and executing opcodes.
///
/// Implemented by the hosting ledger. Storage commits, journaling and
/// reverts happen on the host side.
pub trait Host {
    /// Account balance
    fn balance(&self, address: &Address) -> U256;

    /// Whether the account is empty (EIP-161: no code, zero nonce and balance)
    fn is_empty(&self, address: &Address) -> bool;

    /// Size of the account's code
    fn code_size(&self, address: &Address) -> usize;

    /// Hash of the account's code, zero for non-existent accounts
    fn code_hash(&self, address: &Address) -> H256;

    /// The account's code
    fn code(&self, address: &Address) -> Bytes;

    /// Current value of a storage slot
    fn storage(&self, address: &Address, key: &H256) -> H256;

    /// Value of a storage slot at the start of the transaction
    fn committed_storage(&self, address: &Address, key: &H256) -> H256;

    /// Write a storage slot
    fn set_storage(&mut self, address: Address, key: H256, value: H256);

    /// Whether the account already self-destructed in this transaction
    fn has_self_destructed(&self, address: &Address) -> bool;

    /// Schedule the account for destruction, moving its balance
    fn self_destruct(&mut self, address: Address, beneficiary: Address);

    /// Run a nested message call
    fn call(&mut self, request: CallRequest) -> CallOutcome;

    /// Run a nested contract creation
    fn create(&mut self, request: CreateRequest) -> CreateOutcome;
}

/// Account record kept by [`InMemoryHost`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostAccount {
    /// Nonce
    pub nonce: u64,
    /// Balance
    pub balance: U256,
    /// Code
    pub code: Bytes,
    /// Code hash
    pub code_hash: H256,
}

impl HostAccount {
    /// Account holding `code`, with its hash filled in
    pub fn with_code(code: Bytes) -> Self {
        Self {
            code_hash: keccak256(&code),
            code,
            ..Self::default()
        }
    }
}

/// Simple in-memory [`Host`] for tests and tooling.
///
/// Calls and creates are recorded and answered with a configurable outcome
/// instead of executing anything.
#[derive(Clone, Debug, Default)]
pub struct InMemoryHost {
    accounts: HashMap<Address, HostAccount>,
    storage: HashMap<(Address, H256), H256>,
    committed: HashMap<(Address, H256), H256>,
    destructed: HashSet<Address>,
    /// Calls received, in order
    pub calls: Vec<CallRequest>,
    /// Creates received, in order
    pub creates: Vec<CreateRequest>,
    /// Outcome returned for every call
    pub call_outcome: CallOutcome,
    /// Outcome returned for every create
    pub create_outcome: CreateOutcome,
}

impl InMemoryHost {
    /// Create an empty host
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account
    pub fn insert_account(&mut self, address: Address, account: HostAccount) {
        self.accounts.insert(address, account);
    }

    /// Set an account balance, creating the account if needed
    pub fn set_balance(&mut self, address: Address, balance: U256) {
        self.accounts.entry(address).or_default().balance = balance;
    }

    /// Seed a slot as both committed and current value
    pub fn set_committed(&mut self, address: Address, key: H256, value: H256) {
        self.committed.insert((address, key), value);
        self.storage.insert((address, key), value);
    }
}

impl Host for InMemoryHost {
    fn balance(&self, address: &Address) -> U256 {
        self.accounts.get(address).map(|a| a.balance).unwrap_or_default()
    }

    fn is_empty(&self, address: &Address) -> bool {
        self.accounts
            .get(address)
            .map(|a| a.nonce == 0 && a.balance.is_zero() && a.code.is_empty())
            .unwrap_or(true)
    }

    fn code_size(&self, address: &Address) -> usize {
        self.accounts.get(address).map(|a| a.code.len()).unwrap_or(0)
    }

    fn code_hash(&self, address: &Address) -> H256 {
        self.accounts.get(address).map(|a| a.code_hash).unwrap_or_default()
    }

    fn code(&self, address: &Address) -> Bytes {
        self.accounts
            .get(address)
            .map(|a| a.code.clone())
            .unwrap_or_default()
    }

    fn storage(&self, address: &Address, key: &H256) -> H256 {
        self.storage.get(&(*address, *key)).copied().unwrap_or_default()
    }

    fn committed_storage(&self, address: &Address, key: &H256) -> H256 {
        self.committed.get(&(*address, *key)).copied().unwrap_or_default()
    }

    fn set_storage(&mut self, address: Address, key: H256, value: H256) {
        self.storage.insert((address, key), value);
    }

    fn has_self_destructed(&self, address: &Address) -> bool {
        self.destructed.contains(address)
    }

    fn self_destruct(&mut self, address: Address, beneficiary: Address) {
        let balance = self.balance(&address);
        if let Some(account) = self.accounts.get_mut(&address) {
            account.balance = U256::zero();
        }
        let target = self.accounts.entry(beneficiary).or_default();
        target.balance = target.balance.saturating_add(balance);
        self.destructed.insert(address);
    }

    fn call(&mut self, request: CallRequest) -> CallOutcome {
        self.calls.push(request);
        self.call_outcome.clone()
    }

    fn create(&mut self, request: CreateRequest) -> CreateOutcome {
        self.creates.push(request);
        self.create_outcome.clone()
    }
}
