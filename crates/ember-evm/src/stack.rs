//! EVM stack implementation

use crate::error::{EvmError, EvmResult};
use crate::gas::cost::MAX_STACK_SIZE;
use ember_primitives::U256;

/// EVM stack (max 1024 items, 256-bit each)
#[derive(Clone, Debug)]
pub struct Stack {
    data: Vec<U256>,
}

impl Stack {
    /// Create a new empty stack
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(MAX_STACK_SIZE),
        }
    }

    /// Push a value onto the stack
    pub fn push(&mut self, value: U256) -> EvmResult<()> {
        if self.data.len() >= MAX_STACK_SIZE {
            return Err(EvmError::StackOverflow {
                len: self.data.len(),
                limit: MAX_STACK_SIZE,
            });
        }
        self.data.push(value);
        Ok(())
    }

    /// Pop a value from the stack
    pub fn pop(&mut self) -> EvmResult<U256> {
        self.data.pop().ok_or(EvmError::StackUnderflow { len: 0, required: 1 })
    }

    /// Peek at the top of the stack
    pub fn peek(&self) -> EvmResult<&U256> {
        self.back(0)
    }

    /// Peek at a specific depth (0 = top)
    pub fn back(&self, depth: usize) -> EvmResult<&U256> {
        if depth >= self.data.len() {
            return Err(EvmError::StackUnderflow {
                len: self.data.len(),
                required: depth + 1,
            });
        }
        Ok(&self.data[self.data.len() - 1 - depth])
    }

    /// Swap top with item at depth (1 = swap with second item)
    pub fn swap(&mut self, depth: usize) -> EvmResult<()> {
        if depth == 0 || depth >= self.data.len() {
            return Err(EvmError::StackUnderflow {
                len: self.data.len(),
                required: depth + 1,
            });
        }
        let len = self.data.len();
        self.data.swap(len - 1, len - 1 - depth);
        Ok(())
    }

    /// Duplicate item at depth to top (1 = dup top)
    pub fn dup(&mut self, depth: usize) -> EvmResult<()> {
        if depth == 0 || depth > self.data.len() {
            return Err(EvmError::StackUnderflow {
                len: self.data.len(),
                required: depth,
            });
        }
        let value = self.data[self.data.len() - depth];
        self.push(value)
    }

    /// Get current stack size
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

/// Try to convert a word to u64 (returns None if it does not fit)
pub fn u256_to_u64(value: &U256) -> Option<u64> {
    if value.bits() > 64 {
        return None;
    }
    Some(value.low_u64())
}

/// Boolean as a stack word
pub fn bool_to_word(value: bool) -> U256 {
    if value {
        U256::one()
    } else {
        U256::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(n: u64) -> U256 {
        U256::from(n)
    }

    #[test]
    fn test_push_pop() {
        let mut stack = Stack::new();
        stack.push(word(1)).unwrap();
        stack.push(word(2)).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop().unwrap(), word(2));
        assert_eq!(stack.pop().unwrap(), word(1));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_pop_empty() {
        let mut stack = Stack::new();
        assert!(matches!(stack.pop(), Err(EvmError::StackUnderflow { .. })));
    }

    #[test]
    fn test_overflow_at_limit() {
        let mut stack = Stack::new();
        for i in 0..MAX_STACK_SIZE {
            stack.push(word(i as u64)).unwrap();
        }
        assert_eq!(
            stack.push(word(0)),
            Err(EvmError::StackOverflow { len: 1024, limit: 1024 })
        );
    }

    #[test]
    fn test_back() {
        let mut stack = Stack::new();
        for i in 1..=3 {
            stack.push(word(i)).unwrap();
        }
        assert_eq!(*stack.back(0).unwrap(), word(3));
        assert_eq!(*stack.back(2).unwrap(), word(1));
        assert!(stack.back(3).is_err());
        assert_eq!(*stack.peek().unwrap(), word(3));
    }

    #[test]
    fn test_dup_swap() {
        let mut stack = Stack::new();
        stack.push(word(1)).unwrap();
        stack.push(word(2)).unwrap();

        stack.dup(2).unwrap();
        assert_eq!(*stack.peek().unwrap(), word(1));
        assert_eq!(stack.len(), 3);

        stack.swap(2).unwrap();
        assert_eq!(*stack.back(0).unwrap(), word(1));
        assert_eq!(*stack.back(2).unwrap(), word(1));
        assert!(stack.swap(3).is_err());
        assert!(stack.dup(0).is_err());
    }

    #[test]
    fn test_u256_to_u64() {
        assert_eq!(u256_to_u64(&word(42)), Some(42));
        assert_eq!(u256_to_u64(&U256::from(u64::MAX)), Some(u64::MAX));
        assert_eq!(u256_to_u64(&(U256::from(u64::MAX) + 1)), None);
        assert_eq!(u256_to_u64(&U256::MAX), None);
    }

    #[test]
    fn test_bool_to_word() {
        assert_eq!(bool_to_word(true), U256::one());
        assert_eq!(bool_to_word(false), U256::zero());
    }
}
