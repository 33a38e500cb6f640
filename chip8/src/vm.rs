//! Virtual machine.
use std::fmt::{self, Write};

use rand::prelude::*;

use crate::{
    bytecode::fetch,
    constants::*,
    cpu::{Chip8Cpu, ExecState},
    error::{Chip8Error, Chip8Result},
    keys::KeyCode,
    op::Op,
};

pub struct Chip8Vm {
    cpu: Chip8Cpu,
    rng: StdRng,
    /// Fault that halted the machine, if any.
    fault: Option<Chip8Error>,
    conf: Chip8Conf,
}

impl Chip8Vm {
    pub fn new(conf: Chip8Conf) -> Self {
        Chip8Vm {
            cpu: Chip8Cpu::new(),
            rng: seed_rng(&conf),
            fault: None,
            conf,
        }
    }

    /// Configuration that was used to instantiate the VM.
    pub fn config(&self) -> &Chip8Conf {
        &self.conf
    }

    /// Reset the machine and copy the program into memory at `MEM_START`.
    ///
    /// A program that does not fit is rejected before anything is reset.
    pub fn load_bytecode(&mut self, bytecode: &[u8]) -> Chip8Result<()> {
        if !check_program_size(bytecode) {
            return Err(Chip8Error::LoadTooLarge {
                size: bytecode.len(),
            });
        }

        // Start with clean memory to avoid leaking previous program.
        self.reset();

        // Load program into virtual RAM
        self.cpu.ram[MEM_START..MEM_START + bytecode.len()].copy_from_slice(bytecode);

        log::debug!("loaded program of {} bytes", bytecode.len());

        Ok(())
    }

    /// Return the machine to its freshly constructed state.
    ///
    /// Clears memory, registers, stack, display, keyboard and any fault,
    /// and re-seeds the random number generator.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.fault = None;
        self.rng = seed_rng(&self.conf);

        log::debug!("machine reset");
    }

    pub fn display_buffer(&self) -> &[bool; DISPLAY_BUFFER_SIZE] {
        self.cpu.display.pixels()
    }

    /// Pixel at the coordinate, wrapped around the edges of the screen.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.cpu.display.pixel(x, y)
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.cpu.registers
    }

    pub fn pc(&self) -> Address {
        self.cpu.pc as Address
    }

    /// Value of the address register `I`.
    pub fn address(&self) -> Address {
        self.cpu.address
    }

    pub fn memory(&self) -> &[u8; MEM_SIZE] {
        &self.cpu.ram
    }

    /// Number of return addresses on the call stack.
    pub fn stack_depth(&self) -> usize {
        self.cpu.sp
    }

    pub fn delay_timer(&self) -> u8 {
        self.cpu.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.cpu.sound_timer
    }

    /// The buzzer sounds for as long as the sound timer is counting down.
    pub fn is_buzzing(&self) -> bool {
        self.cpu.sound_timer > 0
    }

    pub fn state(&self) -> ExecState {
        self.cpu.state
    }

    /// Fault that halted the machine.
    pub fn fault(&self) -> Option<&Chip8Error> {
        self.fault.as_ref()
    }
}

fn seed_rng(conf: &Chip8Conf) -> StdRng {
    match conf.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[inline]
fn check_program_size(bytecode: &[u8]) -> bool {
    bytecode.len() <= MAX_PROGRAM_SIZE
}

/// Control flow reported by a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Flow {
    Ok,
    /// Program counter has jumped to a new address.
    ///
    /// This is useful for the caller to avoid being
    /// blocked on infinite or long running loops.
    ///
    /// This is returned when the interpreter encounters:
    ///
    /// - 1nnn (`JP addr`)
    /// - 2nnn (`CALL addr`)
    /// - 00EE (`RET`)
    /// - Bnnn (`JP V0, addr`)
    Jump,
    /// Display buffer changed.
    Draw,
    /// Sound timer was set.
    Sound,
    /// Wait for a keypress.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`), which stops
    /// execution until a key is pressed, and loads the key value into `Vx`.
    KeyWait,
}

/// VM Configuration Parameters.
#[derive(Debug, Default, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct Chip8Conf {
    /// Seed for the `RND` instruction. Seeded from system entropy when unset.
    pub seed: Option<u64>,
}

/// Interpreter
impl Chip8Vm {
    /// Sets the keyboard key input state.
    ///
    /// Pressing a key that was up also latches it for a pending
    /// `LD Vx, K`, even if it is released again before the next step.
    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        self.cpu.set_key_state(key, pressed);
    }

    /// Checks whether the given key is currently pressed.
    pub fn key(&self, key: KeyCode) -> bool {
        self.cpu.key_state(key.as_u8())
    }

    /// Clear the keyboard input state, setting all keys to up.
    pub fn clear_keys(&mut self) {
        self.cpu.clear_keys()
    }

    /// Count down the delay and sound timers.
    ///
    /// Must be called at 60Hz, independently of how fast the
    /// interpreter is stepped.
    pub fn tick_timers(&mut self) {
        self.cpu.tick_delay();
        self.cpu.tick_sound();
    }

    /// Step up to `step_count` instructions.
    ///
    /// Returns early when the machine starts waiting for a key, since
    /// it cannot make progress until the caller provides input.
    pub fn run_steps(&mut self, step_count: usize) -> Chip8Result<Flow> {
        for _ in 0..step_count {
            if let Flow::KeyWait = self.step()? {
                return Ok(Flow::KeyWait);
            }
        }

        Ok(Flow::Ok)
    }

    /// Execute a single instruction.
    ///
    /// While the machine is waiting for a key, no instruction is decoded.
    /// Instead the keyboard is polled for a key that went down.
    ///
    /// An error halts the machine. Every following step returns the
    /// same error until the machine is reset or a program is loaded.
    pub fn step(&mut self) -> Chip8Result<Flow> {
        if let Some(err) = &self.fault {
            return Err(err.clone());
        }

        let result = match self.cpu.state {
            ExecState::Running => self.exec(),
            ExecState::AwaitingKey { register } => Ok(self.poll_key(register)),
        };

        if let Err(ref err) = result {
            log::warn!("machine halted: {err}");
            self.fault = Some(err.clone());
        }

        result
    }

    fn poll_key(&mut self, register: u8) -> Flow {
        match self.cpu.take_key_edge() {
            Some(key) => {
                self.cpu.set_vx(register, key);
                self.cpu.advance(2);
                self.cpu.state = ExecState::Running;
                Flow::Ok
            }
            None => Flow::KeyWait,
        }
    }

    fn exec(&mut self) -> Chip8Result<Flow> {
        // Each instruction is two bytes, with the opcode identity in the first 4-bit nibble.
        let word = fetch(&*self.cpu.ram, self.cpu.pc);

        let op = Op::decode(word).ok_or(Chip8Error::IllegalInstruction {
            opcode: word,
            address: self.cpu.pc as Address,
        })?;

        op_trace(self.cpu.pc, word, &op);

        self.exec_op(op)
    }

    #[inline]
    fn skip_if(&mut self, cond: bool) {
        self.cpu.advance(if cond { 4 } else { 2 });
    }

    fn exec_op(&mut self, op: Op) -> Chip8Result<Flow> {
        let mut control_flow = Flow::Ok;

        match op {
            // 0nnn (SYS addr)
            //
            // Machine code routines don't exist on this machine.
            Op::Sys { .. } => self.cpu.advance(2),
            // 00E0 (CLS)
            Op::ClearScreen => {
                self.cpu.display.clear();
                self.cpu.advance(2);
                control_flow = Flow::Draw;
            }
            // 00EE (RET)
            //
            // Set the program counter to the value at the top of the stack.
            Op::Return => {
                let addr = self.cpu.pop()?;
                self.cpu.jump(addr as usize);
                control_flow = Flow::Jump;
            }
            // 1nnn (JP addr)
            Op::JumpAddress { address } => {
                self.cpu.jump(address as usize);
                control_flow = Flow::Jump;
            }
            // 2nnn (CALL addr)
            //
            // The return address is the instruction following the call.
            Op::Call { address } => {
                let return_addr = (self.cpu.pc + 2) & ADDRESS_MASK;
                self.cpu.push(return_addr as Address)?;
                self.cpu.jump(address as usize);
                control_flow = Flow::Jump;
            }
            // 3xnn (SE Vx, byte)
            Op::Skip_Eq_Byte { vx, nn } => self.skip_if(self.cpu.vx(vx) == nn),
            // 4xnn (SNE Vx, byte)
            Op::Skip_NotEq_Byte { vx, nn } => self.skip_if(self.cpu.vx(vx) != nn),
            // 5xy0 (SE Vx, Vy)
            Op::Skip_Eq { vx, vy } => self.skip_if(self.cpu.vx(vx) == self.cpu.vx(vy)),
            // 6xnn (LD Vx, byte)
            Op::Load_Byte { vx, nn } => {
                self.cpu.set_vx(vx, nn);
                self.cpu.advance(2);
            }
            // 7xnn (ADD Vx, byte)
            //
            // Carry flag is not set.
            Op::Add_Byte { vx, nn } => {
                self.cpu.set_vx(vx, self.cpu.vx(vx).wrapping_add(nn));
                self.cpu.advance(2);
            }
            // Arithmetic instructions
            Op::Load_Vx_Vy { .. }
            | Op::Or_Vx_Vy { .. }
            | Op::And_Vx_Vy { .. }
            | Op::Xor_Vx_Vy { .. }
            | Op::Add_Vx_Vy { .. }
            | Op::Sub_Vx_Vy { .. }
            | Op::ShiftRight { .. }
            | Op::SubReverse_Vx_Vy { .. }
            | Op::ShiftLeft { .. } => {
                self.exec_math(op);
                self.cpu.advance(2);
            }
            // 9xy0 (SNE Vx, Vy)
            Op::Skip_NotEq { vx, vy } => self.skip_if(self.cpu.vx(vx) != self.cpu.vx(vy)),
            // Annn (LD I, addr)
            Op::Load_Address { address } => {
                self.cpu.address = address & ADDRESS_MASK as Address;
                self.cpu.advance(2);
            }
            // Bnnn (JP V0, addr)
            Op::Jump_V0 { address } => {
                self.cpu.jump(address as usize + self.cpu.vx(0) as usize);
                control_flow = Flow::Jump;
            }
            // Cxnn (RND Vx, byte)
            //
            // Set register VX to the result of bitwise AND between a random number and NN.
            Op::Random { vx, nn } => {
                let value = self.rng.gen::<u8>() & nn;
                self.cpu.set_vx(vx, value);
                self.cpu.advance(2);
            }
            // Dxyn (DRW Vx, Vy, nibble)
            //
            // Sprite is encoded as 8 pixels wide, N pixels high, stored in bits located in
            // memory pointed to by address register I.
            //
            // If the drawing operation erases existing pixels in the display buffer, register VF is set to
            // 1, and set to 0 if no display bits are unset. This is used for collision detection.
            Op::Draw { vx, vy, n } => {
                let (x, y) = (self.cpu.vx(vx) as usize, self.cpu.vx(vy) as usize);
                let addr = self.cpu.address as usize;

                let ram = &self.cpu.ram;
                let rows = (0..n as usize).map(|r| ram[(addr + r) & ADDRESS_MASK]);
                let is_erased = self.cpu.display.draw_sprite(x, y, rows);

                self.cpu.set_flag(is_erased);
                self.cpu.advance(2);
                control_flow = Flow::Draw;
            }
            // Ex9E (SKP Vx)
            Op::Skip_Key { vx } => self.skip_if(self.cpu.key_state(self.cpu.vx(vx))),
            // ExA1 (SKNP Vx)
            Op::Skip_NotKey { vx } => self.skip_if(!self.cpu.key_state(self.cpu.vx(vx))),
            // Fx07 (LD Vx, DT)
            Op::Load_Vx_Delay { vx } => {
                self.cpu.set_vx(vx, self.cpu.delay_timer);
                self.cpu.advance(2);
            }
            // Fx0A (LD Vx, K)
            //
            // All execution stops until a key is pressed, then the value of that key is stored in Vx.
            // The program counter stays on this instruction until then.
            Op::WaitKey { vx } => {
                self.cpu.key_edges = 0;
                self.cpu.state = ExecState::AwaitingKey { register: vx };
                control_flow = Flow::KeyWait;
            }
            // Fx15 (LD DT, Vx)
            Op::Load_Delay_Vx { vx } => {
                self.cpu.delay_timer = self.cpu.vx(vx);
                self.cpu.advance(2);
            }
            // Fx18 (LD ST, Vx)
            Op::Load_Sound_Vx { vx } => {
                self.cpu.sound_timer = self.cpu.vx(vx);
                self.cpu.advance(2);
                control_flow = Flow::Sound;
            }
            // Fx1E (ADD I, Vx)
            Op::Add_Address { vx } => {
                let addr = self.cpu.address as usize + self.cpu.vx(vx) as usize;
                self.cpu.address = (addr & ADDRESS_MASK) as Address;
                self.cpu.advance(2);
            }
            // Fx29 (LD F, Vx)
            //
            // Set I = location of sprite for digit Vx.
            Op::Load_Font { vx } => {
                let digit = (self.cpu.vx(vx) & 0xF) as Address;
                self.cpu.address = FONTSET_START + digit * FONTSET_HEIGHT as Address;
                self.cpu.advance(2);
            }
            // Fx33 (LD B, Vx)
            //
            // Store the binary-coded decimal representation of Vx
            // in the memory locations I, I+1, and I+2.
            #[rustfmt::skip]
            Op::Load_Bcd { vx } => {
                let addr = self.cpu.address as usize;
                let x = self.cpu.vx(vx);
                self.cpu.write(addr,     x / 100);
                self.cpu.write(addr + 1, x / 10 % 10);
                self.cpu.write(addr + 2, x      % 10);
                self.cpu.advance(2);
            }
            // Fx55 (LD [I], Vx)
            //
            // Store registers V0 through Vx in memory starting at location I.
            // I is left unchanged.
            Op::Store_Registers { vx } => {
                let addr = self.cpu.address as usize;
                for v in 0..=vx as usize {
                    self.cpu.write(addr + v, self.cpu.registers[v]);
                }
                self.cpu.advance(2);
            }
            // Fx65 (LD Vx, [I])
            //
            // Read registers V0 through Vx from memory starting at location I.
            // I is left unchanged.
            Op::Load_Registers { vx } => {
                let addr = self.cpu.address as usize;
                for v in 0..=vx as usize {
                    self.cpu.registers[v] = self.cpu.read(addr + v);
                }
                self.cpu.advance(2);
            }
        }

        Ok(control_flow)
    }

    /// Execute an arithmetic instruction.
    ///
    /// The result is stored in Vx before the flag is written to VF,
    /// so the flag wins when Vx is VF.
    #[inline]
    fn exec_math(&mut self, op: Op) {
        match op {
            // 8xy0 (LD Vx, Vy)
            Op::Load_Vx_Vy { vx, vy } => self.cpu.set_vx(vx, self.cpu.vx(vy)),
            // 8xy1 (OR Vx, Vy)
            Op::Or_Vx_Vy { vx, vy } => self.cpu.set_vx(vx, self.cpu.vx(vx) | self.cpu.vx(vy)),
            // 8xy2 (AND Vx, Vy)
            Op::And_Vx_Vy { vx, vy } => self.cpu.set_vx(vx, self.cpu.vx(vx) & self.cpu.vx(vy)),
            // 8xy3 (XOR Vx, Vy)
            Op::Xor_Vx_Vy { vx, vy } => self.cpu.set_vx(vx, self.cpu.vx(vx) ^ self.cpu.vx(vy)),
            // 8xy4 (ADD Vx, Vy)
            //
            // If overflow, set VF to 1, else 0.
            Op::Add_Vx_Vy { vx, vy } => {
                let (result, carry) = self.cpu.vx(vx).overflowing_add(self.cpu.vx(vy));
                self.cpu.set_vx(vx, result);
                self.cpu.set_flag(carry);
            }
            // 8xy5 (SUB Vx, Vy)
            //
            // VF is set to 0 when there is a borrow, set to 1 when there isn't.
            Op::Sub_Vx_Vy { vx, vy } => {
                let (x, y) = (self.cpu.vx(vx), self.cpu.vx(vy));
                self.cpu.set_vx(vx, x.wrapping_sub(y));
                self.cpu.set_flag(x >= y);
            }
            // 8xy6 (SHR Vx)
            //
            // VF is set to the least-significant bit shifted out of Vx.
            Op::ShiftRight { vx, .. } => {
                let x = self.cpu.vx(vx);
                self.cpu.set_vx(vx, x >> 1);
                self.cpu.set_flag(x & 1 == 1);
            }
            // 8xy7 (SUBN Vx, Vy)
            //
            // Subtracts VX from VY, and stores the result in VX.
            Op::SubReverse_Vx_Vy { vx, vy } => {
                let (x, y) = (self.cpu.vx(vx), self.cpu.vx(vy));
                self.cpu.set_vx(vx, y.wrapping_sub(x));
                self.cpu.set_flag(y >= x);
            }
            // 8xyE (SHL Vx)
            //
            // VF is set to the most-significant bit shifted out of Vx.
            Op::ShiftLeft { vx, .. } => {
                let x = self.cpu.vx(vx);
                self.cpu.set_vx(vx, x << 1);
                self.cpu.set_flag(x >> 7 == 1);
            }
            _ => unreachable!("not an arithmetic instruction: {op:?}"),
        }
    }
}

/// Troubleshooting
#[doc(hidden)]
impl Chip8Vm {
    /// Returns the contents of the memory as a human readable string.
    pub fn dump_ram(&self, count: usize) -> Result<String, fmt::Error> {
        let iter = self
            .cpu
            .ram
            .iter()
            .enumerate()
            .skip(MEM_START)
            .take(count)
            .step_by(2);
        let mut buf = String::new();

        for (i, op) in iter {
            writeln!(buf, "{:04X}: {:02X}{:02X}", i, op, self.cpu.read(i + 1))?;
        }

        Ok(buf)
    }

    pub fn dump_display(&self) -> Result<String, fmt::Error> {
        self.cpu.display.dump()
    }

    pub fn dump_keys(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        if self.cpu.any_key() {
            write!(buf, "keys: ")?;
            for i in 0..KEY_COUNT {
                if self.cpu.key_state(i) {
                    write!(buf, "k{i:x}")?;
                }
            }
        }

        Ok(buf)
    }
}

#[cfg(feature = "op_trace")]
#[inline]
fn op_trace(pc: usize, word: u16, op: &Op) {
    log::trace!("{pc:04X}: {word:04X} {op}");
}

#[cfg(not(feature = "op_trace"))]
#[inline]
fn op_trace(_: usize, _: u16, _: &Op) {}
