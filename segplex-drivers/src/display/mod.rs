//! Multiplexed 4-digit 7-segment display
//!
//! The display's four common-anode lines hang off port A (bits 3..0, left
//! to right) and its eight segment cathodes off port B. Only one digit is
//! lit at a time; the timer interrupt advances to the next digit every
//! dwell period, fast enough that all four appear lit.
//!
//! ```text
//!  normal context            interrupt context
//!  ──────────────            ─────────────────
//!  DisplayBuffer::set ──▶ [ DisplayBuffer ] ◀── DigitMultiplexer::refresh_step
//!                                                        ▲
//!                                          DisplayBinding::on_overflow
//! ```

pub mod binding;
pub mod buffer;
pub mod multiplexer;
pub mod segments;

pub use binding::{DisplayBinding, Service, Serviced};
pub use buffer::{DisplayBuffer, InvalidCode, DIGITS};
pub use multiplexer::{Cursor, DigitMultiplexer, DisplayError, Frame};
pub use segments::{glyph, ERROR_CODE, SEGMENTS};
