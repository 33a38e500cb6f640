//! CPU and memory state.
use crate::{
    constants::*,
    display::Display,
    error::{Chip8Error, Chip8Result},
    keys::KeyCode,
};

/// Execution state of the interpreter loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    /// Fetching and executing instructions.
    Running,
    /// Stalled on `Fx0A (LD Vx, K)` until a key goes down.
    AwaitingKey { register: u8 },
}

/// Core state for a chip8 interpreter.
pub struct Chip8Cpu {
    // ------------------------------------------------------------------------
    // Registers
    /// Program counter pointing to the current position in the bytecode.
    pub(crate) pc: usize,
    /// Stack pointer, the number of return addresses on the stack.
    pub(crate) sp: usize,
    /// General purpose registers for temporary values.
    ///
    /// Register 16 (VF) is used for either the carry flag or borrow switch depending on opcode.
    pub(crate) registers: [u8; REGISTER_COUNT],
    /// Pointer register used for temporarily storing an address. Since addresses are 12 bits, only the
    /// lowest (rightmost) bits are used.
    pub(crate) address: Address,
    /// (DT) Delay timer that counts down to 0.
    pub(crate) delay_timer: u8,
    /// (ST) Sound timer that counts down to 0. When it has a non-zero value, a beep is played.
    pub(crate) sound_timer: u8,
    /// Keyboard input state. Pressed is a 1 bit, released is a 0 bit.
    pub(crate) key_state: u16,
    /// Keys that went down since the latch was last cleared.
    pub(crate) key_edges: u16,
    pub(crate) state: ExecState,

    // ------------------------------------------------------------------------
    // Memory
    /// Main memory storage space.
    pub(crate) ram: Box<[u8; MEM_SIZE]>,
    /// Stack of return pointers used for jumping when a routine call finishes.
    pub(crate) stack: [Address; STACK_SIZE],
    /// Screen buffer that is drawn too.
    pub(crate) display: Display,
}

impl Default for Chip8Cpu {
    fn default() -> Self {
        let mut cpu = Self {
            pc: MEM_START,
            sp: 0,
            registers: [0; REGISTER_COUNT],
            address: 0,
            delay_timer: 0,
            sound_timer: 0,
            key_state: 0,
            key_edges: 0,
            state: ExecState::Running,

            ram: Box::new([0; MEM_SIZE]),
            stack: [0; STACK_SIZE],
            display: Display::default(),
        };
        cpu.load_font();
        cpu
    }
}

impl Chip8Cpu {
    pub fn new() -> Self {
        Default::default()
    }

    /// Return every register, buffer and latch to its power-on value.
    pub(crate) fn reset(&mut self) {
        self.pc = MEM_START;
        self.sp = 0;
        self.registers.fill(0);
        self.address = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.clear_keys();
        self.state = ExecState::Running;

        self.clear_memory();
        self.load_font();
    }

    /// Erase the contents of the memory buffers `ram`, `stack` and `display`.
    pub(crate) fn clear_memory(&mut self) {
        self.ram.fill(0);
        self.stack.fill(0);
        self.display.clear();
    }

    fn load_font(&mut self) {
        let start = FONTSET_START as usize;
        self.ram[start..start + FONTSET_DATA_LENGTH].copy_from_slice(&FONTSET);
    }

    /// Read a byte, wrapping the address into the 12-bit memory space.
    #[inline(always)]
    pub(crate) fn read(&self, addr: usize) -> u8 {
        self.ram[addr & ADDRESS_MASK]
    }

    /// Write a byte, wrapping the address into the 12-bit memory space.
    #[inline(always)]
    pub(crate) fn write(&mut self, addr: usize, value: u8) {
        self.ram[addr & ADDRESS_MASK] = value;
    }

    /// Move the program counter forward by the given number of bytes.
    #[inline(always)]
    pub(crate) fn advance(&mut self, bytes: usize) {
        self.pc = (self.pc + bytes) & ADDRESS_MASK;
    }

    #[inline(always)]
    pub(crate) fn jump(&mut self, addr: usize) {
        self.pc = addr & ADDRESS_MASK;
    }

    /// Push a return address onto the call stack.
    pub(crate) fn push(&mut self, return_addr: Address) -> Chip8Result<()> {
        if self.sp >= STACK_SIZE {
            return Err(Chip8Error::StackOverflow {
                address: self.pc as Address,
            });
        }
        self.stack[self.sp] = return_addr;
        self.sp += 1;
        Ok(())
    }

    /// Pop the most recent return address off the call stack.
    pub(crate) fn pop(&mut self) -> Chip8Result<Address> {
        let (sp, underflow) = self.sp.overflowing_sub(1);
        if underflow {
            return Err(Chip8Error::StackUnderflow {
                address: self.pc as Address,
            });
        }
        self.sp = sp;
        Ok(self.stack[sp])
    }

    #[inline(always)]
    pub(crate) fn vx(&self, vx: u8) -> u8 {
        self.registers[vx as usize]
    }

    #[inline(always)]
    pub(crate) fn set_vx(&mut self, vx: u8, value: u8) {
        self.registers[vx as usize] = value;
    }

    #[inline(always)]
    pub(crate) fn set_flag(&mut self, flag: bool) {
        self.registers[FLAG_REGISTER] = flag as u8;
    }

    pub fn set_key_state(&mut self, key: KeyCode, pressed: bool) {
        let mask = key.mask();
        if pressed {
            if self.key_state & mask == 0 {
                self.key_edges |= mask;
            }
            self.key_state |= mask;
        } else {
            self.key_state &= !mask;
        }
    }

    /// Checks whether the key is currently down.
    ///
    /// Key numbers outside of the keypad are never pressed.
    pub fn key_state(&self, key_id: u8) -> bool {
        if key_id < KEY_COUNT {
            self.key_state & (1 << key_id) > 0
        } else {
            false
        }
    }

    /// Check whether any key is pressed down.
    #[inline(always)]
    pub fn any_key(&self) -> bool {
        self.key_state > 0
    }

    /// Take the lowest key that went down since the edge latch was
    /// last cleared, and clear the latch.
    #[inline]
    pub(crate) fn take_key_edge(&mut self) -> Option<u8> {
        if self.key_edges == 0 {
            return None;
        }
        let key = self.key_edges.trailing_zeros() as u8;
        self.key_edges = 0;
        Some(key)
    }

    /// Clear the keyboard input state, setting all keys to up.
    #[inline(always)]
    pub fn clear_keys(&mut self) {
        self.key_state = 0;
        self.key_edges = 0;
    }

    /// Count down the delay timer.
    #[inline]
    pub fn tick_delay(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
    }

    /// Count down the sound timer.
    #[inline]
    pub fn tick_sound(&mut self) {
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut cpu = Chip8Cpu::default();

        cpu.set_key_state(KeyCode::Key0, true);
        assert_eq!(cpu.key_state, 0b00000000_00000001);
        assert!(cpu.key_state(0));
        assert!(!cpu.key_state(1));
        assert!(!cpu.key_state(7));

        cpu.set_key_state(KeyCode::Key7, true);
        assert_eq!(cpu.key_state, 0b00000000_10000001);
        assert!(cpu.key_state(0));
        assert!(!cpu.key_state(1));
        assert!(cpu.key_state(7));

        cpu.set_key_state(KeyCode::Key0, false);
        assert_eq!(cpu.key_state, 0b00000000_10000000);
        assert!(!cpu.key_state(0));
        assert!(!cpu.key_state(1));
        assert!(cpu.key_state(7));

        cpu.set_key_state(KeyCode::KeyF, true);
        assert_eq!(cpu.key_state, 0b10000000_10000000);
        assert!(!cpu.key_state(0));
        assert!(!cpu.key_state(1));
        assert!(cpu.key_state(7));
        assert!(cpu.key_state(15));

        // Out of range
        assert!(!cpu.key_state(16));
        assert!(!cpu.key_state(0xFF));
    }

    #[test]
    fn test_key_edges() {
        let mut cpu = Chip8Cpu::default();

        cpu.set_key_state(KeyCode::Key9, true);
        cpu.set_key_state(KeyCode::Key3, true);
        // Holding a key does not latch a second edge.
        cpu.set_key_state(KeyCode::Key3, true);
        assert_eq!(cpu.take_key_edge(), Some(3));
        assert_eq!(cpu.take_key_edge(), None);

        // A tap between polls is still latched.
        cpu.set_key_state(KeyCode::KeyC, true);
        cpu.set_key_state(KeyCode::KeyC, false);
        assert_eq!(cpu.take_key_edge(), Some(0xC));
    }

    #[test]
    fn test_stack_bounds() {
        let mut cpu = Chip8Cpu::default();

        assert_eq!(
            cpu.pop(),
            Err(Chip8Error::StackUnderflow {
                address: MEM_START as Address
            })
        );

        for i in 0..STACK_SIZE {
            cpu.push(i as Address).unwrap();
        }
        assert!(matches!(
            cpu.push(0xFFF),
            Err(Chip8Error::StackOverflow { .. })
        ));

        assert_eq!(cpu.pop(), Ok(STACK_SIZE as Address - 1));
        assert_eq!(cpu.sp, STACK_SIZE - 1);
    }

    #[test]
    fn test_timers_clamp() {
        let mut cpu = Chip8Cpu::default();
        cpu.delay_timer = 1;
        cpu.tick_delay();
        cpu.tick_delay();
        assert_eq!(cpu.delay_timer, 0);
        cpu.tick_sound();
        assert_eq!(cpu.sound_timer, 0);
    }

    #[test]
    fn test_memory_wraps() {
        let mut cpu = Chip8Cpu::default();
        cpu.write(MEM_SIZE + 0x10, 0xAB);
        assert_eq!(cpu.ram[0x10], 0xAB);
        assert_eq!(cpu.read(0x10), 0xAB);

        cpu.pc = 0xFFE;
        cpu.advance(2);
        assert_eq!(cpu.pc, 0x000);
    }

    #[test]
    fn test_font_loaded() {
        let cpu = Chip8Cpu::default();
        assert_eq!(&cpu.ram[0..5], &[0xF0, 0x90, 0x90, 0x90, 0xF0]);
        assert_eq!(cpu.pc, MEM_START);
    }
}
