//! Disassembler.
use std::fmt::{self, Write as FmtWrite};

use crate::{
    bytecode::word,
    constants::{Address, ADDRESS_MASK, MEM_START},
    op::Op,
};

/// Linear disassembler that decodes a program two bytes at a time.
///
/// There is no control flow analysis, so sprite data embedded in the
/// program is decoded as if it were code. Words that are not part of
/// the instruction set are printed as raw data.
pub struct Disassembler<'a> {
    bytecode: &'a [u8],
}

impl<'a> Disassembler<'a> {
    pub fn new(bytecode: &'a [u8]) -> Self {
        Self { bytecode }
    }

    /// Write the listing of the whole program to the given writer.
    pub fn disassemble<W: FmtWrite>(&self, w: &mut W) -> fmt::Result {
        for (i, chunk) in self.bytecode.chunks(2).enumerate() {
            let addr = ((MEM_START + i * 2) & ADDRESS_MASK) as Address;

            match *chunk {
                [a, b] => {
                    let bytecode = word([a, b]);
                    match Op::decode(bytecode) {
                        Some(op) => writeln!(w, "0x{addr:03X} {bytecode:04X} {op}")?,
                        None => writeln!(w, "0x{addr:03X} {bytecode:04X} 0x{bytecode:04X}")?,
                    }
                }
                // Trailing odd byte.
                [a] => writeln!(w, "0x{addr:03X} {a:02X}   0x{a:02X}")?,
                _ => unreachable!("chunks are one or two bytes"),
            }
        }

        Ok(())
    }

    pub fn print_bytecode(&self) -> fmt::Result {
        let mut s = String::new();
        self.disassemble(&mut s)?;
        print!("{s}");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    #[rustfmt::skip]
    fn test_disassemble() {
        let rom = [
            0x00, 0xE0, // CLS
            0xA2, 0x0A, // LD I, 0x20A
            0x81, 0x24, // ADD v1, v2
            0xF5, 0x65, // LD v5, [I]
            0xFF, 0xFF, // ???
            0xAB,
        ];

        let mut buf = String::new();
        Disassembler::new(&rom).disassemble(&mut buf).unwrap();

        let lines: Vec<&str> = buf.lines().collect();
        assert_eq!(
            lines,
            [
                "0x200 00E0 CLS",
                "0x202 A20A LD I, 0x20A",
                "0x204 8124 ADD v1, v2",
                "0x206 F565 LD v5, [I]",
                "0x208 FFFF 0xFFFF",
                "0x20A AB   0xAB",
            ]
        );
    }
}
