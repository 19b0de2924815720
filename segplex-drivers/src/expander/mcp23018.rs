//! MCP23018 16-bit I/O expander (I2C mode)
//!
//! The MCP23018 exposes two 8-bit ports (A and B) with open-drain outputs.
//! Three address pins select one of eight bus addresses.
//!
//! # Bus Protocol
//!
//! - Write: `[S, addr+W, register, data.., P]`. With IOCON.SEQOP = 0 (the
//!   reset state) the register pointer auto-increments, so a second data
//!   byte lands in the sibling port register.
//! - Read: `[S, addr+W, register, P]` followed by `[S, addr+R, data, P]`.
//!
//! All registers are assumed to be in the reset bank layout (IOCON.BANK = 0),
//! where every A/B register pair occupies two adjacent offsets.
//!
//! # Read-modify-write
//!
//! [`Mcp23018::set_bit`] and [`Mcp23018::set_bit_group`] read the register,
//! patch the selected bits and write it back. The two transactions are not
//! atomic against other masters or other handles to the same device.

use embedded_hal::i2c::I2c;

/// MCP23018 register addresses (IOCON.BANK = 0)
pub mod reg {
    /// I/O direction, port A (1 = input)
    pub const IODIRA: u8 = 0x00;
    /// I/O direction, port B (1 = input)
    pub const IODIRB: u8 = 0x01;
    /// Device configuration
    pub const IOCON: u8 = 0x0A;
    /// Pull-up enable, port A
    pub const GPPUA: u8 = 0x0C;
    /// Pull-up enable, port B
    pub const GPPUB: u8 = 0x0D;
    /// Port value, port A
    pub const GPIOA: u8 = 0x12;
    /// Port value, port B
    pub const GPIOB: u8 = 0x13;
    /// Output latch, port A
    pub const OLATA: u8 = 0x14;
    /// Output latch, port B
    pub const OLATB: u8 = 0x15;
}

/// IOCON bit that disables the address auto-increment
pub const IOCON_SEQOP: BitAddress = BitAddress::new(reg::IOCON, 5);

/// Fixed upper bits of the MCP23018 bus address
const FAMILY_ADDRESS: u8 = 0b010_0000;

/// Mask for the strap-selectable address bits
const ADDRESS_PIN_MASK: u8 = 0b111;

/// 7-bit I2C address of one expander
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusAddress(u8);

impl BusAddress {
    /// Build the address from the strap value on the ADDR pin (0-7)
    ///
    /// Bits above the low three are ignored.
    pub const fn from_pins(pins: u8) -> Self {
        Self(FAMILY_ADDRESS | (pins & ADDRESS_PIN_MASK))
    }

    /// Raw 7-bit address
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// One of the two 8-bit ports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
}

impl Port {
    /// Offset from the port A register of a pair
    const fn offset(self) -> u8 {
        match self {
            Port::A => 0,
            Port::B => 1,
        }
    }
}

/// Register address plus bit index (0-7)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitAddress {
    /// Register address
    pub register: u8,
    /// Bit index within the register
    pub bit: u8,
}

impl BitAddress {
    /// Create a bit address
    pub const fn new(register: u8, bit: u8) -> Self {
        Self { register, bit }
    }

    /// Single-bit mask, or `None` for an index past bit 7
    pub const fn mask(&self) -> Option<u8> {
        if self.bit < 8 {
            Some(1 << self.bit)
        } else {
            None
        }
    }
}

/// MCP23018 errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Bus transaction failed
    Bus(E),
    /// Bit index outside 0-7
    InvalidBit(u8),
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Bus(e)
    }
}

/// MCP23018 driver configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mcp23018Config {
    /// Read every written register back and count mismatches
    ///
    /// Diagnostic only: doubles bus traffic and never fails a write.
    pub verify_writes: bool,
}

/// MCP23018 driver
pub struct Mcp23018<I2C> {
    i2c: I2C,
    address: BusAddress,
    config: Mcp23018Config,
    verify_failures: u32,
}

impl<I2C: I2c> Mcp23018<I2C> {
    /// Create a new driver
    ///
    /// # Arguments
    /// - `i2c`: Bus handle
    /// - `address_pins`: Strap value on the ADDR pin (0-7)
    pub fn new(i2c: I2C, address_pins: u8) -> Self {
        Self::with_config(i2c, address_pins, Mcp23018Config::default())
    }

    /// Create a new driver with an explicit configuration
    pub fn with_config(i2c: I2C, address_pins: u8, config: Mcp23018Config) -> Self {
        Self {
            i2c,
            address: BusAddress::from_pins(address_pins),
            config,
            verify_failures: 0,
        }
    }

    /// Bus address of the device
    pub fn address(&self) -> BusAddress {
        self.address
    }

    /// Number of read-backs that did not match the written value
    pub fn verify_failures(&self) -> u32 {
        self.verify_failures
    }

    /// Release the bus handle
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Prepare the device: both ports become outputs
    ///
    /// Must run before any port write; after reset every line is an input.
    pub fn init(&mut self) -> Result<(), Error<I2C::Error>> {
        self.set_direction(0x00, 0x00)
    }

    /// Write an entire register
    pub fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.i2c.write(self.address.get(), &[register, value])?;

        if self.config.verify_writes {
            self.verify(register, value);
        }
        Ok(())
    }

    /// Write two sibling registers in one transaction
    ///
    /// `first` goes to `register`, `second` to `register + 1` through the
    /// device's address auto-increment.
    pub fn write_register_pair(
        &mut self,
        register: u8,
        first: u8,
        second: u8,
    ) -> Result<(), Error<I2C::Error>> {
        self.i2c
            .write(self.address.get(), &[register, first, second])?;

        if self.config.verify_writes {
            self.verify(register, first);
            self.verify(register.wrapping_add(1), second);
        }
        Ok(())
    }

    /// Read an entire register
    pub fn read_register(&mut self, register: u8) -> Result<u8, Error<I2C::Error>> {
        let mut buf = [0u8; 1];
        self.i2c.write(self.address.get(), &[register])?;
        self.i2c.read(self.address.get(), &mut buf)?;
        Ok(buf[0])
    }

    /// Read a register, substituting zero if the bus fails
    ///
    /// A zero from a failed read fed into a read-modify-write clears every
    /// bit outside the caller's mask. Prefer [`Self::read_register`] unless
    /// a stale value is acceptable.
    pub fn read_register_or_zero(&mut self, register: u8) -> u8 {
        match self.read_register(register) {
            Ok(value) => value,
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("MCP23018 read of {=u8:#x} failed, using 0", register);
                0
            }
        }
    }

    /// Set or clear one bit of a register
    pub fn set_bit(&mut self, address: BitAddress, state: bool) -> Result<(), Error<I2C::Error>> {
        let mask = address.mask().ok_or(Error::InvalidBit(address.bit))?;
        let data = if state { 0xFF } else { 0x00 };
        self.set_bit_group(address.register, data, mask)
    }

    /// Replace the bits selected by `mask` with the same bits of `data`
    ///
    /// The register ends up as `(old & !mask) | (data & mask)`.
    pub fn set_bit_group(
        &mut self,
        register: u8,
        data: u8,
        mask: u8,
    ) -> Result<(), Error<I2C::Error>> {
        let old = self.read_register(register)?;
        self.write_register(register, merge_bits(old, data, mask))
    }

    /// Set the direction of both ports (1 = input, 0 = output)
    pub fn set_direction(&mut self, a: u8, b: u8) -> Result<(), Error<I2C::Error>> {
        self.write_register_pair(reg::IODIRA, a, b)
    }

    /// Enable pull-up resistors, one bit per line
    ///
    /// The outputs are open-drain: a line only drives high through its
    /// pull-up.
    pub fn set_pullups(&mut self, a: u8, b: u8) -> Result<(), Error<I2C::Error>> {
        self.write_register_pair(reg::GPPUA, a, b)
    }

    /// Set the outputs of one port
    pub fn set_port(&mut self, port: Port, value: u8) -> Result<(), Error<I2C::Error>> {
        self.write_register(reg::GPIOA + port.offset(), value)
    }

    /// Set the outputs of both ports in one transaction
    pub fn set_ports(&mut self, a: u8, b: u8) -> Result<(), Error<I2C::Error>> {
        self.write_register_pair(reg::GPIOA, a, b)
    }

    /// Read the logic levels on one port
    pub fn port(&mut self, port: Port) -> Result<u8, Error<I2C::Error>> {
        self.read_register(reg::GPIOA + port.offset())
    }

    /// Read the output latch of one port
    pub fn latch(&mut self, port: Port) -> Result<u8, Error<I2C::Error>> {
        self.read_register(reg::OLATA + port.offset())
    }

    /// Change the masked bits of one port's output latch
    pub fn set_port_bits(&mut self, port: Port, data: u8, mask: u8) -> Result<(), Error<I2C::Error>> {
        self.set_bit_group(reg::OLATA + port.offset(), data, mask)
    }

    fn verify(&mut self, register: u8, expected: u8) {
        match self.read_register(register) {
            Ok(actual) if actual == expected => {}
            _ => {
                self.verify_failures = self.verify_failures.saturating_add(1);
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "MCP23018 read-back of {=u8:#x} did not return {=u8:#x}",
                    register,
                    expected
                );
            }
        }
    }
}

/// Merge the `mask` bits of `data` into `old`
pub const fn merge_bits(old: u8, data: u8, mask: u8) -> u8 {
    (old & !mask) | (data & mask)
}
