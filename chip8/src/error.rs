//! Result and errors.
use std::fmt::{self, Display, Formatter};

use crate::constants::{Address, MAX_PROGRAM_SIZE};

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

/// Faults raised by the virtual machine.
///
/// None of these terminate the process. Once a fault is returned from
/// a step, the machine stays halted until it is reset or a new program
/// is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chip8Error {
    /// Instruction word is not part of the instruction set.
    IllegalInstruction { opcode: u16, address: Address },
    /// `CALL` with a full call stack.
    StackOverflow { address: Address },
    /// `RET` with an empty call stack.
    StackUnderflow { address: Address },
    /// Attempt to load a bytecode program that can't fit in memory.
    LoadTooLarge { size: usize },
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalInstruction { opcode, address } => {
                write!(f, "illegal instruction {opcode:04X} at 0x{address:03X}")
            }
            Self::StackOverflow { address } => {
                write!(f, "call stack overflow at 0x{address:03X}")
            }
            Self::StackUnderflow { address } => {
                write!(f, "call stack underflow at 0x{address:03X}")
            }
            Self::LoadTooLarge { size } => write!(
                f,
                "program of {size} bytes is too large for VM memory (max {MAX_PROGRAM_SIZE})"
            ),
        }
    }
}

impl std::error::Error for Chip8Error {}
