//! Per-transaction access ledger (EIP-2929 warm/cold tracking and refunds)

use ember_primitives::{Address, H256};
use std::collections::{HashMap, HashSet};

/// Number of precompile addresses warmed at transaction start.
pub const PRECOMPILE_COUNT: u8 = 9;

/// Warm addresses, warm storage slots and the refund counter of one
/// top-level transaction.
///
/// Created fresh per transaction and threaded through every nested call.
/// Membership only ever grows; the refund counter moves in both directions
/// as SSTORE grants and reverses clearing refunds.
///
/// Only the refund counter can be rolled back. A host undoing a failed
/// nested frame reads [`AccessLedger::refund`] before the call and hands it
/// to [`AccessLedger::restore_refund`] afterwards; warm marks stay.
#[derive(Clone, Debug, Default)]
pub struct AccessLedger {
    addresses: HashSet<Address>,
    slots: HashMap<Address, HashSet<H256>>,
    refund: i64,
}

impl AccessLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger with the addresses every transaction starts warm with:
    /// the sender, the recipient and the precompiles.
    pub fn for_transaction(origin: Address, recipient: Address) -> Self {
        let mut ledger = Self::new();
        ledger.add_address(origin);
        ledger.add_address(recipient);
        for i in 1..=PRECOMPILE_COUNT {
            ledger.add_address(Address::precompile(i));
        }
        ledger
    }

    /// Warm the entries of an EIP-2930 transaction access list
    pub fn prewarm<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (Address, Vec<H256>)>,
    {
        for (address, keys) in entries {
            self.add_address(address);
            for key in keys {
                self.add_slot(address, key);
            }
        }
    }

    /// Whether the address is warm
    pub fn contains_address(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    /// Returns `(address_warm, slot_warm)`
    pub fn contains_slot(&self, address: &Address, slot: &H256) -> (bool, bool) {
        let address_present = self.addresses.contains(address);
        let slot_present = self
            .slots
            .get(address)
            .map(|slots| slots.contains(slot))
            .unwrap_or(false);
        (address_present, slot_present)
    }

    /// Mark the address warm. Returns true if it was cold.
    pub fn add_address(&mut self, address: Address) -> bool {
        self.addresses.insert(address)
    }

    /// Mark the (address, slot) pair warm; the address is warmed with it.
    /// Returns `(address_was_cold, slot_was_cold)`.
    pub fn add_slot(&mut self, address: Address, slot: H256) -> (bool, bool) {
        let address_added = self.addresses.insert(address);
        let slot_added = self.slots.entry(address).or_default().insert(slot);
        (address_added, slot_added)
    }

    /// Credit the refund counter
    pub fn add_refund(&mut self, gas: u64) {
        self.refund = self.refund.saturating_add(gas as i64);
    }

    /// Debit the refund counter
    pub fn sub_refund(&mut self, gas: u64) {
        self.refund = self.refund.saturating_sub(gas as i64);
    }

    /// Accumulated refund; settled and capped at transaction end by the host.
    ///
    /// Also serves as a snapshot: read it before a nested frame and pass it
    /// to [`AccessLedger::restore_refund`] if the frame fails.
    pub fn refund(&self) -> i64 {
        self.refund
    }

    /// Roll the refund counter back to a value read with
    /// [`AccessLedger::refund`].
    ///
    /// Warm marks are left alone; they survive a failed frame.
    pub fn restore_refund(&mut self, snapshot: i64) {
        self.refund = snapshot;
    }

    /// Number of warm addresses
    pub fn address_count(&self) -> usize {
        self.addresses.len()
    }

    /// Number of warm slots across all addresses
    pub fn slot_count(&self) -> usize {
        self.slots.values().map(HashSet::len).sum()
    }
}
