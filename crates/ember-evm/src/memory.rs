//! EVM memory implementation

use crate::error::{EvmError, EvmResult};
use crate::stack::u256_to_u64;
use ember_primitives::U256;

/// EVM memory (byte-addressable, expandable in 32-byte words)
///
/// Alongside the bytes it remembers the total expansion fee charged so far,
/// so that growth is always billed as a delta against the high-water mark.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    data: Vec<u8>,
    last_gas_cost: u64,
}

impl Memory {
    /// Create new empty memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current memory size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if nothing has been allocated yet
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Total expansion fee charged for the current size
    pub fn last_gas_cost(&self) -> u64 {
        self.last_gas_cost
    }

    pub(crate) fn set_last_gas_cost(&mut self, cost: u64) {
        self.last_gas_cost = cost;
    }

    /// Grow to cover `size` bytes, rounded up to a whole word. Never shrinks.
    pub fn resize(&mut self, size: usize) {
        if size <= self.data.len() {
            return;
        }
        let aligned = size.div_ceil(32) * 32;
        self.data.resize(aligned, 0);
    }

    /// Copy `size` bytes starting at `offset`; bytes past the end read as zero
    pub fn get_copy(&self, offset: usize, size: usize) -> Vec<u8> {
        let mut out = vec![0u8; size];
        if size == 0 || offset >= self.data.len() {
            return out;
        }
        let end = offset.saturating_add(size).min(self.data.len());
        out[..end - offset].copy_from_slice(&self.data[offset..end]);
        out
    }

    /// Write `value` at `offset`, growing memory if needed
    pub fn set(&mut self, offset: usize, value: &[u8]) -> EvmResult<()> {
        if value.is_empty() {
            return Ok(());
        }
        let end = offset.checked_add(value.len()).ok_or(EvmError::MemoryOverflow)?;
        self.resize(end);
        self.data[offset..end].copy_from_slice(value);
        Ok(())
    }

    /// Load a 32-byte word
    pub fn load_word(&self, offset: usize) -> U256 {
        U256::from_big_endian(&self.get_copy(offset, 32))
    }

    /// Store a 32-byte word
    pub fn store_word(&mut self, offset: usize, value: &U256) -> EvmResult<()> {
        let mut buf = [0u8; 32];
        value.to_big_endian(&mut buf);
        self.set(offset, &buf)
    }

    /// Store a single byte
    pub fn store_byte(&mut self, offset: usize, value: u8) -> EvmResult<()> {
        self.set(offset, &[value])
    }

    /// Copy `len` bytes from `src` to `dst` within memory.
    ///
    /// Behaves as if the source range were read into a temporary buffer
    /// before any destination byte is written, so overlapping ranges in
    /// either direction are handled.
    pub fn copy(&mut self, dst: usize, src: usize, len: usize) -> EvmResult<()> {
        if len == 0 {
            return Ok(());
        }
        let src_end = src.checked_add(len).ok_or(EvmError::MemoryOverflow)?;
        let dst_end = dst.checked_add(len).ok_or(EvmError::MemoryOverflow)?;
        self.resize(src_end.max(dst_end));
        self.data.copy_within(src..src_end, dst);
        Ok(())
    }

    /// Get raw data slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Convert an (offset, length) operand pair into a host-sized range.
///
/// A zero length yields `None` regardless of the offset: such an access
/// never touches memory.
pub fn memory_range(offset: &U256, len: &U256) -> EvmResult<Option<(usize, usize)>> {
    if len.is_zero() {
        return Ok(None);
    }
    let offset = u256_to_u64(offset).ok_or(EvmError::MemoryOverflow)?;
    let len = u256_to_u64(len).ok_or(EvmError::MemoryOverflow)?;
    offset.checked_add(len).ok_or(EvmError::MemoryOverflow)?;
    let offset = usize::try_from(offset).map_err(|_| EvmError::MemoryOverflow)?;
    let len = usize::try_from(len).map_err(|_| EvmError::MemoryOverflow)?;
    Ok(Some((offset, len)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_word_alignment() {
        let mut mem = Memory::new();
        assert!(mem.is_empty());

        mem.resize(1);
        assert_eq!(mem.len(), 32);

        mem.resize(33);
        assert_eq!(mem.len(), 64);

        mem.resize(64);
        assert_eq!(mem.len(), 64);

        // Never shrinks
        mem.resize(10);
        assert_eq!(mem.len(), 64);
    }

    #[test]
    fn test_store_load_word() {
        let mut mem = Memory::new();
        let value = U256::from(0x1234_5678_90AB_CDEFu64);
        mem.store_word(0, &value).unwrap();
        assert_eq!(mem.load_word(0), value);
        assert_eq!(mem.len(), 32);

        // Crossing a word boundary
        mem.store_word(48, &value).unwrap();
        assert_eq!(mem.load_word(48), value);
        assert_eq!(mem.len(), 96);
    }

    #[test]
    fn test_store_byte() {
        let mut mem = Memory::new();
        mem.store_byte(32, 0x42).unwrap();
        assert_eq!(mem.data()[32], 0x42);
        assert_eq!(mem.len(), 64);
    }

    #[test]
    fn test_get_copy_zero_fills() {
        let mut mem = Memory::new();
        mem.set(0, &[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(mem.get_copy(3, 5), vec![4, 5, 0, 0, 0]);
        assert_eq!(mem.get_copy(100, 3), vec![0, 0, 0]);
        assert!(mem.get_copy(0, 0).is_empty());
    }

    #[test]
    fn test_set_empty_does_not_grow() {
        let mut mem = Memory::new();
        mem.set(1_000_000, &[]).unwrap();
        assert_eq!(mem.len(), 0);
    }

    #[test]
    fn test_copy_non_overlapping() {
        let mut mem = Memory::new();
        mem.set(0, &[1, 2, 3, 4, 5]).unwrap();
        mem.copy(10, 0, 5).unwrap();
        assert_eq!(mem.get_copy(10, 5), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_copy_overlapping_forward() {
        let mut mem = Memory::new();
        mem.set(0, &[1, 2, 3, 4, 5]).unwrap();
        mem.copy(2, 0, 5).unwrap();
        assert_eq!(mem.get_copy(0, 7), vec![1, 2, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_copy_overlapping_backward() {
        let mut mem = Memory::new();
        mem.set(0, &[0, 0, 1, 2, 3, 4, 5, 0, 0, 0]).unwrap();
        mem.copy(0, 2, 5).unwrap();
        assert_eq!(mem.get_copy(0, 10), vec![1, 2, 3, 4, 5, 4, 5, 0, 0, 0]);
    }

    #[test]
    fn test_copy_grows_to_destination() {
        let mut mem = Memory::new();
        mem.set(0, &[9; 32]).unwrap();
        mem.copy(64, 0, 32).unwrap();
        assert_eq!(mem.len(), 96);
        assert_eq!(mem.get_copy(64, 32), vec![9; 32]);
    }

    #[test]
    fn test_copy_zero_len_untouched() {
        let mut mem = Memory::new();
        mem.copy(usize::MAX, usize::MAX, 0).unwrap();
        assert_eq!(mem.len(), 0);
    }

    #[test]
    fn test_copy_overflow() {
        let mut mem = Memory::new();
        assert_eq!(mem.copy(usize::MAX, 0, 2), Err(EvmError::MemoryOverflow));
    }

    #[test]
    fn test_memory_range() {
        assert_eq!(memory_range(&U256::MAX, &U256::zero()), Ok(None));
        assert_eq!(
            memory_range(&U256::from(4u64), &U256::from(8u64)),
            Ok(Some((4, 8)))
        );
        assert_eq!(
            memory_range(&U256::from(u64::MAX), &U256::one()),
            Err(EvmError::MemoryOverflow)
        );
        assert_eq!(
            memory_range(&U256::MAX, &U256::one()),
            Err(EvmError::MemoryOverflow)
        );
    }
}
