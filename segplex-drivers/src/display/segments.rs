//! Hexadecimal glyphs for a 7-segment digit
//!
//! Patterns are active high with the layout `0b.ABCDEFG` (bit 7 is the
//! decimal point, unused here):
//!
//! ```text
//!      A
//!     ===
//! F ||   || B
//!     =G=
//! E ||   || C
//!     ===
//!      D
//! ```
//!
//! A common-anode display sinks segment current, so the driver writes the
//! bitwise inverse of these patterns.

/// Decimal point
pub const SEG_DP: u8 = 1 << 7;
/// Top
pub const SEG_A: u8 = 1 << 6;
/// Upper right
pub const SEG_B: u8 = 1 << 5;
/// Lower right
pub const SEG_C: u8 = 1 << 4;
/// Bottom
pub const SEG_D: u8 = 1 << 3;
/// Lower left
pub const SEG_E: u8 = 1 << 2;
/// Upper left
pub const SEG_F: u8 = 1 << 1;
/// Middle
pub const SEG_G: u8 = 1 << 0;

/// Segment patterns for the codes 0x0-0xF
#[rustfmt::skip]
pub const SEGMENTS: [u8; 16] = [
    0b0111_1110, 0b0011_0000, 0b0110_1101, 0b0111_1001, // 0123
    0b0011_0011, 0b0101_1011, 0b0101_1111, 0b0111_0000, // 4567
    0b0111_1111, 0b0111_1011, 0b0111_0111, 0b0001_1111, // 89Ab
    0b0100_1110, 0b0011_1101, 0b0100_1111, 0b0100_0111, // CdEF
];

/// Code shown before the first refresh ('E' for error)
pub const ERROR_CODE: u8 = 0xE;

/// Segment pattern for a display code, `None` outside 0x0-0xF
pub fn glyph(code: u8) -> Option<u8> {
    SEGMENTS.get(code as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_range() {
        assert_eq!(glyph(0x0), Some(SEGMENTS[0]));
        assert_eq!(glyph(0xF), Some(SEGMENTS[15]));
        assert_eq!(glyph(0x10), None);
        assert_eq!(glyph(0xFF), None);
    }

    #[test]
    fn test_glyph_shapes() {
        assert_eq!(glyph(0).unwrap(), SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F);
        assert_eq!(glyph(1).unwrap(), SEG_B | SEG_C);
        assert_eq!(glyph(8).unwrap(), 0x7F);
        assert_eq!(
            glyph(ERROR_CODE).unwrap(),
            SEG_A | SEG_D | SEG_E | SEG_F | SEG_G
        );
    }

    #[test]
    fn test_no_pattern_uses_decimal_point() {
        assert!(SEGMENTS.iter().all(|p| p & SEG_DP == 0));
    }

    #[test]
    fn test_patterns_are_distinct() {
        for (i, a) in SEGMENTS.iter().enumerate() {
            for b in &SEGMENTS[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
