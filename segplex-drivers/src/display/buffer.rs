//! Display buffer shared between normal and interrupt context
//!
//! Each digit code sits in its own byte-sized atomic, so [`DisplayBuffer::set`]
//! needs no lock and never blocks the refresh interrupt. The price is
//! tearing: a refresh that preempts `set` halfway through can show old and
//! new digits side by side for one pass over the display. The next full
//! pass after `set` returns shows only the new values.

use portable_atomic::{AtomicU8, Ordering};

/// Number of digits on the display
pub const DIGITS: usize = 4;

/// Largest valid display code
const MAX_CODE: u8 = 0xF;

/// Display code outside 0x0-0xF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidCode(pub u8);

/// Four display codes, left to right
pub struct DisplayBuffer {
    cells: [AtomicU8; DIGITS],
}

impl DisplayBuffer {
    /// Codes loaded when a multiplexer takes over the buffer
    pub const INITIAL_CODES: [u8; DIGITS] = [0, 1, 2, 3];

    /// Create a buffer holding `codes`
    ///
    /// # Panics
    /// If a code is above 0xF. In a `static` initializer this is a
    /// compile-time error.
    pub const fn new(codes: [u8; DIGITS]) -> Self {
        let mut i = 0;
        while i < DIGITS {
            assert!(codes[i] <= MAX_CODE, "display code out of range");
            i += 1;
        }

        Self {
            cells: [
                AtomicU8::new(codes[0]),
                AtomicU8::new(codes[1]),
                AtomicU8::new(codes[2]),
                AtomicU8::new(codes[3]),
            ],
        }
    }

    /// Replace all four codes
    ///
    /// Every code is checked before the first cell changes, so a rejected
    /// call leaves the display untouched.
    pub fn set(&self, codes: [u8; DIGITS]) -> Result<(), InvalidCode> {
        if let Some(&bad) = codes.iter().find(|&&c| c > MAX_CODE) {
            return Err(InvalidCode(bad));
        }

        for (cell, code) in self.cells.iter().zip(codes) {
            cell.store(code, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Restore [`Self::INITIAL_CODES`]
    pub fn reset(&self) {
        for (cell, code) in self.cells.iter().zip(Self::INITIAL_CODES) {
            cell.store(code, Ordering::Relaxed);
        }
    }

    /// Code at one digit position (0 = left-most)
    ///
    /// Positions past the last digit wrap around.
    pub fn get(&self, position: usize) -> u8 {
        self.cells[position % DIGITS].load(Ordering::Relaxed)
    }

    /// Copy of all four codes
    pub fn snapshot(&self) -> [u8; DIGITS] {
        [self.get(0), self.get(1), self.get(2), self.get(3)]
    }
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self::new(Self::INITIAL_CODES)
    }
}
