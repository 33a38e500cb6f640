//! Helpers for extracting data from opcodes.
//!
//! An instruction word is two bytes, big-endian. The fields overlap
//! and which ones are meaningful depends on the opcode class:
//!
//! ```text
//! 0xF000  class
//! 0x0F00  X (register)
//! 0x00F0  Y (register)
//! 0x000F  N (nibble)
//! 0x00FF  NN (byte)
//! 0x0FFF  NNN (address)
//! ```
use crate::constants::ADDRESS_MASK;

/// Read the instruction word at the cursor, wrapping around the end of memory.
#[inline(always)]
pub fn fetch(ram: &[u8], cursor: usize) -> u16 {
    let a = ram[cursor & ADDRESS_MASK] as u16;
    let b = ram[(cursor + 1) & ADDRESS_MASK] as u16;
    (a << 8) | b
}

/// Build an instruction word from two bytes.
#[inline(always)]
pub fn word(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// Extract the opcode class from the highest nibble.
#[inline(always)]
pub fn op_code(word: u16) -> u8 {
    ((word & 0xF000) >> 12) as u8
}

/// Extract register index X from the second nibble.
#[inline(always)]
pub fn op_x(word: u16) -> u8 {
    ((word & 0x0F00) >> 8) as u8
}

/// Extract register index Y from the third nibble.
#[inline(always)]
pub fn op_y(word: u16) -> u8 {
    ((word & 0x00F0) >> 4) as u8
}

/// Extract operand N from the lowest nibble.
#[inline(always)]
pub fn op_n(word: u16) -> u8 {
    (word & 0x000F) as u8
}

/// Extract operand NN from the lowest byte.
#[inline(always)]
pub fn op_nn(word: u16) -> u8 {
    (word & 0x00FF) as u8
}

/// Extract operand NNN, the lowest 12 bits.
#[inline(always)]
pub fn op_nnn(word: u16) -> u16 {
    word & 0x0FFF
}
