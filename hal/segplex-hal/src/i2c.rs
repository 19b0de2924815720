//! I2C bus configuration
//!
//! Drivers talk to the bus through [`embedded_hal::i2c::I2c`]. This module
//! only describes how the host should clock the bus.
//!
//! A transport used from the display refresh interrupt must complete its
//! transfers without needing interrupts of its own (polled/blocking mode).
//! If it does need them, the interrupt handler has to re-enable nesting
//! first, see [`crate::interrupt`].
//!
//! [`embedded_hal::i2c::I2c`]: https://docs.rs/embedded-hal/1/embedded_hal/i2c/trait.I2c.html

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };

    /// Fast mode plus (1 MHz)
    pub const FAST_PLUS: Self = Self {
        frequency: 1_000_000,
    };

    /// Highest clock the MCP23018 accepts (3.4 MHz high-speed mode)
    pub const MCP23018_MAX_HZ: u32 = 3_400_000;

    /// Build a configuration from a frequency, clamped to the expander's limit
    pub fn from_hz(frequency: u32) -> Self {
        Self {
            frequency: frequency.min(Self::MCP23018_MAX_HZ),
        }
    }

    /// Clamp the clock to what the host controller supports
    pub fn limited_to(self, host_max_hz: u32) -> Self {
        Self {
            frequency: self.frequency.min(host_max_hz),
        }
    }

    /// Time to clock one byte plus ACK, in microseconds (rounded up)
    ///
    /// A register write is four of these (address, register, two data
    /// bytes for a pair), which bounds how long a refresh keeps the bus.
    pub fn byte_time_us(&self) -> u32 {
        9_000_000u32.div_ceil(self.frequency.max(1))
    }
}
