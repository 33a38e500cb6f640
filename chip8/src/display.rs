//! Monochrome display buffer.
use std::fmt::{self, Write};

use crate::constants::*;

/// Row-major 64x32 pixel grid.
pub struct Display {
    pixels: Box<[bool; DISPLAY_BUFFER_SIZE]>,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            pixels: Box::new([false; DISPLAY_BUFFER_SIZE]),
        }
    }
}

impl Display {
    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    #[inline(always)]
    pub fn pixels(&self) -> &[bool; DISPLAY_BUFFER_SIZE] {
        &self.pixels
    }

    /// Pixel at the coordinate, wrapped around the edges of the screen.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[index(x, y)]
    }

    /// XOR a sprite onto the buffer, with its top-left corner at (x, y).
    ///
    /// Each byte is one row of 8 pixels, most significant bit on the left.
    /// The origin is wrapped into the screen, and so is every pixel that
    /// would land past the right or bottom edge.
    ///
    /// Returns `true` if any pixel was erased, which signals a collision.
    pub fn draw_sprite(&mut self, x: usize, y: usize, rows: impl IntoIterator<Item = u8>) -> bool {
        let (x, y) = (x & DISPLAY_WIDTH_MASK, y & DISPLAY_HEIGHT_MASK);
        let mut is_erased = false;

        for (r, row) in rows.into_iter().enumerate() {
            for c in 0..SPRITE_WIDTH {
                let d = index(x + c, y + r);

                let old_px = self.pixels[d];
                let new_px = (row >> (7 - c) & 1) != 0;

                // XOR erases a pixel when both the old and new values are both 1.
                is_erased |= old_px && new_px;

                self.pixels[d] = old_px ^ new_px;
            }
        }

        is_erased
    }

    /// Render the buffer as text, one line per row.
    pub fn dump(&self) -> Result<String, fmt::Error> {
        let mut buf = String::with_capacity((DISPLAY_WIDTH + 1) * DISPLAY_HEIGHT);

        for row in self.pixels.chunks(DISPLAY_WIDTH) {
            for px in row {
                buf.write_char(if *px { '#' } else { '.' })?;
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }
}

#[inline(always)]
fn index(x: usize, y: usize) -> usize {
    (x & DISPLAY_WIDTH_MASK) + (y & DISPLAY_HEIGHT_MASK) * DISPLAY_WIDTH
}
