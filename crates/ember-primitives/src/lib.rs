//! # ember-primitives
//!
//! Fixed-width value types shared by the ember EVM core.
//!
//! The VM stack carries 256-bit words; addresses and storage slots are
//! recovered from those words through the conversions defined here.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod hash;
mod keccak;

pub use address::Address;
pub use hash::H256;
pub use keccak::keccak256;

// Re-export primitive-types for U256
pub use primitive_types::U256;
