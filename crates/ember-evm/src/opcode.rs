//! Opcode bytes known to the dispatch tables

/// Opcodes installed by the base table or by a feature activator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Opcode {
    // Stop and Arithmetic
    STOP = 0x00,
    ADD = 0x01,
    MUL = 0x02,
    SUB = 0x03,

    // Comparison & Bitwise Logic
    LT = 0x10,
    GT = 0x11,
    EQ = 0x14,
    ISZERO = 0x15,
    AND = 0x16,
    OR = 0x17,
    XOR = 0x18,
    NOT = 0x19,

    // Environmental Information
    ADDRESS = 0x30,
    BALANCE = 0x31,
    CALLER = 0x33,
    CALLVALUE = 0x34,
    EXTCODESIZE = 0x3B,
    EXTCODECOPY = 0x3C,
    EXTCODEHASH = 0x3F,

    // Block Information
    CHAINID = 0x46,
    SELFBALANCE = 0x47,
    BASEFEE = 0x48,

    // Stack, Memory, Storage
    POP = 0x50,
    MLOAD = 0x51,
    MSTORE = 0x52,
    MSTORE8 = 0x53,
    SLOAD = 0x54,
    SSTORE = 0x55,
    MSIZE = 0x59,
    GAS = 0x5A,
    MCOPY = 0x5E,
    PUSH0 = 0x5F,

    DUP1 = 0x80,
    DUP2 = 0x81,
    DUP3 = 0x82,
    DUP4 = 0x83,
    DUP5 = 0x84,
    DUP6 = 0x85,
    DUP7 = 0x86,
    DUP8 = 0x87,
    DUP9 = 0x88,
    DUP10 = 0x89,
    DUP11 = 0x8A,
    DUP12 = 0x8B,
    DUP13 = 0x8C,
    DUP14 = 0x8D,
    DUP15 = 0x8E,
    DUP16 = 0x8F,

    SWAP1 = 0x90,
    SWAP2 = 0x91,
    SWAP3 = 0x92,
    SWAP4 = 0x93,
    SWAP5 = 0x94,
    SWAP6 = 0x95,
    SWAP7 = 0x96,
    SWAP8 = 0x97,
    SWAP9 = 0x98,
    SWAP10 = 0x99,
    SWAP11 = 0x9A,
    SWAP12 = 0x9B,
    SWAP13 = 0x9C,
    SWAP14 = 0x9D,
    SWAP15 = 0x9E,
    SWAP16 = 0x9F,

    // System Operations
    CREATE = 0xF0,
    CALL = 0xF1,
    CALLCODE = 0xF2,
    RETURN = 0xF3,
    DELEGATECALL = 0xF4,
    CREATE2 = 0xF5,
    STATICCALL = 0xFA,
    SELFDESTRUCT = 0xFF,
}

const DUPS: [Opcode; 16] = [
    Opcode::DUP1,
    Opcode::DUP2,
    Opcode::DUP3,
    Opcode::DUP4,
    Opcode::DUP5,
    Opcode::DUP6,
    Opcode::DUP7,
    Opcode::DUP8,
    Opcode::DUP9,
    Opcode::DUP10,
    Opcode::DUP11,
    Opcode::DUP12,
    Opcode::DUP13,
    Opcode::DUP14,
    Opcode::DUP15,
    Opcode::DUP16,
];

const SWAPS: [Opcode; 16] = [
    Opcode::SWAP1,
    Opcode::SWAP2,
    Opcode::SWAP3,
    Opcode::SWAP4,
    Opcode::SWAP5,
    Opcode::SWAP6,
    Opcode::SWAP7,
    Opcode::SWAP8,
    Opcode::SWAP9,
    Opcode::SWAP10,
    Opcode::SWAP11,
    Opcode::SWAP12,
    Opcode::SWAP13,
    Opcode::SWAP14,
    Opcode::SWAP15,
    Opcode::SWAP16,
];

impl Opcode {
    /// Try to convert from byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        let op = match byte {
            0x00 => Self::STOP,
            0x01 => Self::ADD,
            0x02 => Self::MUL,
            0x03 => Self::SUB,
            0x10 => Self::LT,
            0x11 => Self::GT,
            0x14 => Self::EQ,
            0x15 => Self::ISZERO,
            0x16 => Self::AND,
            0x17 => Self::OR,
            0x18 => Self::XOR,
            0x19 => Self::NOT,
            0x30 => Self::ADDRESS,
            0x31 => Self::BALANCE,
            0x33 => Self::CALLER,
            0x34 => Self::CALLVALUE,
            0x3B => Self::EXTCODESIZE,
            0x3C => Self::EXTCODECOPY,
            0x3F => Self::EXTCODEHASH,
            0x46 => Self::CHAINID,
            0x47 => Self::SELFBALANCE,
            0x48 => Self::BASEFEE,
            0x50 => Self::POP,
            0x51 => Self::MLOAD,
            0x52 => Self::MSTORE,
            0x53 => Self::MSTORE8,
            0x54 => Self::SLOAD,
            0x55 => Self::SSTORE,
            0x59 => Self::MSIZE,
            0x5A => Self::GAS,
            0x5E => Self::MCOPY,
            0x5F => Self::PUSH0,
            0x80..=0x8F => DUPS[(byte - 0x80) as usize],
            0x90..=0x9F => SWAPS[(byte - 0x90) as usize],
            0xF0 => Self::CREATE,
            0xF1 => Self::CALL,
            0xF2 => Self::CALLCODE,
            0xF3 => Self::RETURN,
            0xF4 => Self::DELEGATECALL,
            0xF5 => Self::CREATE2,
            0xFA => Self::STATICCALL,
            0xFF => Self::SELFDESTRUCT,
            _ => return None,
        };
        Some(op)
    }

    /// DUPn for n in 1..=16
    pub fn dup(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| DUPS.get(i).copied())
    }

    /// SWAPn for n in 1..=16
    pub fn swap(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| SWAPS.get(i).copied())
    }

    /// Byte value
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Table index
    pub fn index(self) -> usize {
        self as usize
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_byte() {
        assert_eq!(Opcode::from_byte(0x00), Some(Opcode::STOP));
        assert_eq!(Opcode::from_byte(0x5E), Some(Opcode::MCOPY));
        assert_eq!(Opcode::from_byte(0x5F), Some(Opcode::PUSH0));
        assert_eq!(Opcode::from_byte(0x8F), Some(Opcode::DUP16));
        assert_eq!(Opcode::from_byte(0x90), Some(Opcode::SWAP1));
        assert_eq!(Opcode::from_byte(0xFF), Some(Opcode::SELFDESTRUCT));
        assert_eq!(Opcode::from_byte(0x0C), None);
        assert_eq!(Opcode::from_byte(0xFE), None);
    }

    #[test]
    fn test_dup_swap_lookup() {
        assert_eq!(Opcode::dup(1), Some(Opcode::DUP1));
        assert_eq!(Opcode::dup(16), Some(Opcode::DUP16));
        assert_eq!(Opcode::dup(0), None);
        assert_eq!(Opcode::dup(17), None);
        assert_eq!(Opcode::swap(16), Some(Opcode::SWAP16));
        assert_eq!(Opcode::swap(0), None);
    }

    #[test]
    fn test_all_known_opcodes_roundtrip() {
        for byte in 0..=255u8 {
            if let Some(op) = Opcode::from_byte(byte) {
                assert_eq!(op.byte(), byte);
                assert_eq!(op.index(), byte as usize);
            }
        }
    }
}
