//! 256-bit hash / storage slot type

use primitive_types::U256;
use std::fmt;

/// 256-bit hash (32 bytes). Also used for storage keys and values.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct H256([u8; 32]);

impl H256 {
    /// Zero hash
    pub const ZERO: H256 = H256([0u8; 32]);

    /// Create from bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        H256(bytes)
    }

    /// Big-endian bytes of a stack word
    pub fn from_word(word: &U256) -> Self {
        let mut bytes = [0u8; 32];
        word.to_big_endian(&mut bytes);
        H256(bytes)
    }

    /// Interpret as a big-endian stack word
    pub fn to_word(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    /// Get as bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H256({})", self.to_hex())
    }
}

impl fmt::Display for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<u64> for H256 {
    fn from(value: u64) -> Self {
        H256::from_word(&U256::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_h256_display() {
        let hash = H256::from(1u64);
        assert_eq!(hash.to_hex(), format!("0x{}01", "00".repeat(31)));
        assert_eq!(format!("{}", hash), hash.to_hex());
    }

    #[test]
    fn test_h256_from_u64() {
        let slot = H256::from(5u64);
        assert_eq!(slot.as_bytes()[31], 5);
        assert_eq!(slot.to_word(), U256::from(5u64));
    }

    #[test]
    fn test_h256_word_roundtrip() {
        let word = U256::MAX - U256::from(7u64);
        assert_eq!(H256::from_word(&word).to_word(), word);
    }

    #[test]
    fn test_h256_zero_word() {
        assert!(H256::from_word(&U256::zero()).is_zero());
        assert_eq!(H256::ZERO.to_word(), U256::zero());
    }
}
