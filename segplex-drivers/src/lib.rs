//! Hardware driver implementations
//!
//! This crate drives a 4-digit common-anode 7-segment display through an
//! MCP23018 I/O expander:
//!
//! - [`expander`] - MCP23018 register access (whole register, register
//!   pair, single bit and masked read-modify-write)
//! - [`display`] - segment table, display buffer, digit multiplexer and
//!   the interrupt binding that paces it

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod display;
pub mod expander;

#[cfg(test)]
pub(crate) mod testing;
