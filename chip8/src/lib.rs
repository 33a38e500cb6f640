//! Chip-8 virtual machine.
//!
//! The machine is a passive state machine driven by its host. The host
//! loads a program, calls [`Chip8Vm::step`](prelude::Chip8Vm::step) at
//! whatever instruction rate it likes, calls
//! [`Chip8Vm::tick_timers`](prelude::Chip8Vm::tick_timers) at 60Hz, and
//! reads back the display buffer and sound timer.
mod bytecode;
pub mod constants;
mod cpu;
mod disasm;
mod display;
mod error;
mod keys;
mod op;
mod vm;

pub use self::bytecode::{op_code, op_n, op_nn, op_nnn, op_x, op_y};

pub mod prelude {
    pub use super::{
        cpu::ExecState,
        disasm::Disassembler,
        error::{Chip8Error, Chip8Result},
        keys::{InvalidKeyCode, KeyCode},
        op::Op,
        vm::{Chip8Conf, Chip8Vm, Flow},
    };
}

pub const IMPL_VERSION: &str = env!("CARGO_PKG_VERSION");
