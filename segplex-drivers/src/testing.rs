//! Host test doubles: a register-level MCP23018 model, a timer and an
//! interrupt nesting counter

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};
use segplex_hal::{InterruptNesting, OverflowTimer, TimerConfig};
use std::vec::Vec;

/// Number of registers in the BANK = 0 map (0x00-0x15)
const REGISTER_COUNT: usize = 0x16;

/// Injected bus failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

impl embedded_hal::i2c::Error for BusFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Fake expander with a register pointer that auto-increments like the
/// real device
pub struct RegisterFile {
    address: u8,
    registers: [u8; REGISTER_COUNT],
    pointer: usize,
    /// Bits that always read back as zero, per register
    pub unimplemented_bits: [u8; REGISTER_COUNT],
    /// Fail every read transfer
    pub fail_reads: bool,
    /// Fail every write transfer that carries data
    pub fail_writes: bool,
    /// Every data-carrying write, register byte first
    pub writes: Vec<Vec<u8>>,
}

impl RegisterFile {
    /// Fake device at address pins 0
    pub fn new() -> Self {
        Self {
            address: 0x20,
            registers: [0; REGISTER_COUNT],
            pointer: 0,
            unimplemented_bits: [0; REGISTER_COUNT],
            fail_reads: false,
            fail_writes: false,
            writes: Vec::new(),
        }
    }

    /// Current register contents
    pub fn register(&self, register: u8) -> u8 {
        self.registers[register as usize]
    }

    /// Preload a register
    pub fn set_register(&mut self, register: u8, value: u8) {
        self.registers[register as usize] = value;
    }

    fn advance(&mut self) {
        self.pointer = (self.pointer + 1) % REGISTER_COUNT;
    }
}

impl ErrorType for RegisterFile {
    type Error = BusFault;
}

impl I2c for RegisterFile {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(BusFault);
        }

        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    let Some((&register, data)) = bytes.split_first() else {
                        continue;
                    };
                    if !data.is_empty() && self.fail_writes {
                        return Err(BusFault);
                    }
                    self.pointer = register as usize % REGISTER_COUNT;
                    for &value in data {
                        self.registers[self.pointer] = value & !self.unimplemented_bits[self.pointer];
                        self.advance();
                    }
                    if !data.is_empty() {
                        self.writes.push(bytes.to_vec());
                    }
                }
                Operation::Read(buf) => {
                    if self.fail_reads {
                        return Err(BusFault);
                    }
                    for byte in buf.iter_mut() {
                        *byte = self.registers[self.pointer];
                        self.advance();
                    }
                }
            }
        }

        Ok(())
    }
}

/// Fake overflow timer
///
/// The counter does not run on its own; tests set [`FakeTimer::latency`]
/// to simulate dispatch latency.
#[derive(Debug, Default)]
pub struct FakeTimer {
    pub config: Option<TimerConfig>,
    pub counter: u16,
    /// Value every counter read returns instead of `counter`
    pub latency: Option<u16>,
    /// Every value written through `set_counter`
    pub loads: Vec<u16>,
    pub interrupt_enabled: bool,
    pub acknowledged: u32,
}

impl OverflowTimer for FakeTimer {
    fn configure(&mut self, config: &TimerConfig) {
        self.config = Some(*config);
    }

    fn counter(&self) -> u16 {
        self.latency.unwrap_or(self.counter)
    }

    fn set_counter(&mut self, value: u16) {
        self.counter = value;
        self.loads.push(value);
    }

    fn enable_overflow_interrupt(&mut self) {
        self.interrupt_enabled = true;
    }

    fn acknowledge_overflow(&mut self) {
        self.acknowledged += 1;
    }
}

/// Counts how often nesting was re-enabled
#[derive(Debug, Default)]
pub struct CountingNesting(pub u32);

impl InterruptNesting for CountingNesting {
    fn allow_nesting(&mut self) {
        self.0 += 1;
    }
}
