//! Segplex Hardware Abstraction Layer
//!
//! This crate defines the small set of hardware traits the display
//! driver needs from the host microcontroller beyond an I2C bus. Chip
//! support lives in the firmware crate, which implements these traits
//! for its own peripherals.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (segplex-firmware)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  segplex-drivers (MCP23018, display)    │
//! └─────────────────────────────────────────┘
//!           │                     │
//!           ▼                     ▼
//! ┌───────────────────┐ ┌───────────────────┐
//! │ embedded-hal I2C  │ │ segplex-hal       │
//! │ (bus transport)   │ │ (this crate)      │
//! └───────────────────┘ └───────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`timer::OverflowTimer`] - Periodic overflow timer with a writable counter
//! - [`interrupt::InterruptNesting`] - Re-enabling interrupts inside a handler
//!
//! The I2C transport itself is taken from `embedded-hal`; [`i2c`] only
//! carries bus configuration.

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;
pub mod interrupt;
pub mod timer;

// Re-export key traits at crate root for convenience
pub use i2c::I2cConfig;
pub use interrupt::{InterruptNesting, NoNesting};
pub use timer::{Compensation, OverflowTimer, TimerConfig, TimerError};
