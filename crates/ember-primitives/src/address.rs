//! Ethereum-compatible address type (20 bytes)

use primitive_types::U256;
use std::fmt;

/// Ethereum-compatible 20-byte address
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// Zero address (0x0000...0000)
    pub const ZERO: Address = Address([0u8; 20]);

    /// Create address from bytes
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Take the low 20 bytes of a stack word.
    ///
    /// The upper 12 bytes are discarded, matching how the VM interprets
    /// address operands.
    pub fn from_word(word: &U256) -> Self {
        let mut buf = [0u8; 32];
        word.to_big_endian(&mut buf);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&buf[12..]);
        Address(bytes)
    }

    /// Left-pad the address into a stack word
    pub fn to_word(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    /// Precompile address `0x00..0n`
    pub const fn precompile(index: u8) -> Self {
        let mut bytes = [0u8; 20];
        bytes[19] = index;
        Address(bytes)
    }

    /// Get as byte slice
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Convert to hex string with 0x prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display() {
        let addr = Address::from_bytes([0xAB; 20]);
        assert_eq!(format!("{}", addr), format!("0x{}", "ab".repeat(20)));
        assert_eq!(format!("{:?}", Address::ZERO), format!("Address(0x{})", "00".repeat(20)));
    }

    // ==================== Word conversion ====================

    #[test]
    fn test_address_from_word_truncates_high_bytes() {
        let word = U256::MAX;
        assert_eq!(Address::from_word(&word), Address::from_bytes([0xFF; 20]));
    }

    #[test]
    fn test_address_word_roundtrip() {
        let addr = Address::from_bytes([0xAB; 20]);
        let word = addr.to_word();
        assert!(word.bits() <= 160);
        assert_eq!(Address::from_word(&word), addr);
    }

    #[test]
    fn test_precompile_address() {
        let one = Address::precompile(1);
        assert_eq!(one.as_bytes()[19], 1);
        assert!(one.as_bytes()[..19].iter().all(|&b| b == 0));
        assert_eq!(one.to_word(), U256::one());
    }
}
