use chip8::{constants::*, prelude::*};

fn load(program: &[u8]) -> Chip8Vm {
    let mut vm = Chip8Vm::new(Chip8Conf { seed: Some(1234) });
    vm.load_bytecode(program).unwrap();
    vm
}

/// Counts v1 up to 10 in a loop, then spins on a self-jump.
#[test]
#[rustfmt::skip]
fn test_counting_loop() {
    let mut vm = load(&[
        0x61, 0x00, // 200 LD v1, 0
        0x71, 0x01, // 202 ADD v1, 1
        0x31, 0x0A, // 204 SE v1, 10
        0x12, 0x02, // 206 JP 0x202
        0x12, 0x08, // 208 JP 0x208
    ]);

    vm.run_steps(1 + 10 * 3).unwrap();

    assert_eq!(vm.registers()[1], 10);
    assert_eq!(vm.pc(), 0x208);

    // Spinning on the final jump.
    assert_eq!(vm.step(), Ok(Flow::Jump));
    assert_eq!(vm.pc(), 0x208);
}

/// Waits for a key, then draws its hex glyph with the builtin font.
#[test]
#[rustfmt::skip]
fn test_draw_pressed_key() {
    let mut vm = load(&[
        0x00, 0xE0, // 200 CLS
        0xF0, 0x0A, // 202 LD v0, K
        0xF0, 0x29, // 204 LD F, v0
        0x61, 0x00, // 206 LD v1, 0
        0xD1, 0x15, // 208 DRW v1, v1, 5
        0x12, 0x0A, // 20A JP 0x20A
    ]);

    vm.step().unwrap();
    assert_eq!(vm.run_steps(10), Ok(Flow::KeyWait));
    assert_eq!(vm.pc(), 0x202);

    vm.set_key(KeyCode::Key7, true);
    vm.run_steps(5).unwrap();

    assert_eq!(vm.registers()[0], 7);
    // Glyph 7: 0xF0, 0x10, 0x20, 0x40, 0x40
    let rows: Vec<u8> = (0..5)
        .map(|y| {
            (0..8).fold(0_u8, |acc, x| (acc << 1) | vm.pixel(x, y) as u8)
        })
        .collect();
    assert_eq!(rows, [0xF0, 0x10, 0x20, 0x40, 0x40]);
}

/// Stores the decimal digits of a register and reads them back into registers.
#[test]
#[rustfmt::skip]
fn test_bcd_round_trip_through_registers() {
    let mut vm = load(&[
        0x6A, 0x9F, // 200 LD vA, 159
        0xA3, 0x00, // 202 LD I, 0x300
        0xFA, 0x33, // 204 LD B, vA
        0xF2, 0x65, // 206 LD v2, [I]
    ]);
    vm.run_steps(4).unwrap();

    assert_eq!(&vm.registers()[0..3], &[1, 5, 9]);
}

/// Delay timer polling loop, driven by the host timer clock.
#[test]
#[rustfmt::skip]
fn test_delay_loop() {
    let mut vm = load(&[
        0x61, 0x03, // 200 LD v1, 3
        0xF1, 0x15, // 202 LD DT, v1
        0xF2, 0x07, // 204 LD v2, DT
        0x32, 0x00, // 206 SE v2, 0
        0x12, 0x04, // 208 JP 0x204
        0x63, 0x01, // 20A LD v3, 1
    ]);

    // The program can't get past the loop until the timer runs out.
    vm.run_steps(50).unwrap();
    assert_eq!(vm.registers()[3], 0);

    for _ in 0..3 {
        vm.tick_timers();
        vm.run_steps(4).unwrap();
    }
    vm.run_steps(4).unwrap();

    assert_eq!(vm.delay_timer(), 0);
    assert_eq!(vm.registers()[3], 1);
}

/// Nested subroutines return in order.
#[test]
#[rustfmt::skip]
fn test_nested_calls() {
    let mut vm = load(&[
        0x22, 0x06, // 200 CALL 0x206
        0x12, 0x02, // 202 JP 0x202
        0x00, 0x00, // 204
        0x71, 0x01, // 206 ADD v1, 1
        0x22, 0x0C, // 208 CALL 0x20C
        0x00, 0xEE, // 20A RET
        0x71, 0x10, // 20C ADD v1, 0x10
        0x00, 0xEE, // 20E RET
    ]);

    vm.run_steps(6).unwrap();

    assert_eq!(vm.pc(), 0x202);
    assert_eq!(vm.stack_depth(), 0);
    assert_eq!(vm.registers()[1], 0x11);
}

/// Unbounded recursion is caught as a fault instead of corrupting memory.
#[test]
fn test_runaway_recursion_faults() {
    let mut vm = load(&[0x22, 0x00]);

    let err = vm.run_steps(100).unwrap_err();

    assert_eq!(err, Chip8Error::StackOverflow { address: 0x200 });
    assert_eq!(vm.stack_depth(), STACK_SIZE);
    assert_eq!(vm.fault(), Some(&err));
}

/// An illegal instruction stops the machine without panicking,
/// and the host can recover by loading another program.
#[test]
fn test_recover_from_illegal_instruction() {
    let mut vm = load(&[0x61, 0x01, 0xE1, 0x00]);

    let err = vm.run_steps(10).unwrap_err();
    assert_eq!(
        err,
        Chip8Error::IllegalInstruction {
            opcode: 0xE100,
            address: 0x202
        }
    );
    assert_eq!(vm.pc(), 0x202);

    vm.load_bytecode(&[0x61, 0x02]).unwrap();
    assert_eq!(vm.step(), Ok(Flow::Ok));
    assert_eq!(vm.registers()[1], 2);
}

/// Program counter wraps around the end of memory.
#[test]
fn test_program_counter_wraps() {
    let mut program = vec![0; MAX_PROGRAM_SIZE];
    // 200: JP 0xFFE
    program[0] = 0x1F;
    program[1] = 0xFE;
    // FFE: LD v1, 0x33
    program[MAX_PROGRAM_SIZE - 2] = 0x61;
    program[MAX_PROGRAM_SIZE - 1] = 0x33;
    let mut vm = load(&program);

    vm.step().unwrap();
    assert_eq!(vm.pc(), 0xFFE);

    vm.step().unwrap();
    assert_eq!(vm.registers()[1], 0x33);
    assert_eq!(vm.pc(), 0x000);
}
