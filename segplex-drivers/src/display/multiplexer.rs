//! Digit multiplexer
//!
//! Lights one digit per call. Each [`DigitMultiplexer::refresh_step`] does
//! a single bus transaction that writes both ports at once:
//!
//! - port A: one-hot digit select, `0b1000` for the left-most digit
//! - port B: inverted segment pattern (common anode, cathodes sink)
//!
//! After the fourth digit the cursor wraps to the left again.

use embedded_hal::i2c::I2c;
use segplex_hal::{OverflowTimer, TimerConfig, TimerError};

use super::buffer::{DisplayBuffer, InvalidCode, DIGITS};
use super::segments::{ERROR_CODE, SEGMENTS};
use crate::expander::{self, Mcp23018};

/// Pull-ups on the four digit-select lines of port A
const SELECT_PULLUPS: u8 = 0x0F;

/// Select pattern of the right-most digit
const RIGHTMOST_SELECT: u8 = 0b0001;

/// Position of the next digit to light
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cursor {
    position: u8,
    select: u8,
}

impl Cursor {
    /// Select pattern of the left-most digit
    pub const INITIAL_SELECT: u8 = 0b1000;

    /// Cursor on the left-most digit
    pub const fn new() -> Self {
        Self {
            position: 0,
            select: Self::INITIAL_SELECT,
        }
    }

    /// Digit index, 0 = left-most
    pub fn position(&self) -> usize {
        self.position as usize
    }

    /// One-hot port A pattern for the current digit
    pub fn select(&self) -> u8 {
        self.select
    }

    /// Move one digit to the right, wrapping after the last
    pub fn advance(&mut self) {
        self.position += 1;
        self.select >>= 1;
        if self.position as usize >= DIGITS {
            *self = Self::new();
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Port levels written by one refresh step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Digit that was lit
    pub position: u8,
    /// Port A value
    pub select: u8,
    /// Port B value (active low)
    pub segments: u8,
}

/// Display errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError<E> {
    /// Expander access failed
    Expander(expander::Error<E>),
    /// Display code above 0xF
    InvalidCode(u8),
    /// Timer cannot realize the requested dwell
    Timer(TimerError),
}

impl<E> From<expander::Error<E>> for DisplayError<E> {
    fn from(e: expander::Error<E>) -> Self {
        DisplayError::Expander(e)
    }
}

impl<E> From<InvalidCode> for DisplayError<E> {
    fn from(e: InvalidCode) -> Self {
        DisplayError::InvalidCode(e.0)
    }
}

impl<E> From<TimerError> for DisplayError<E> {
    fn from(e: TimerError) -> Self {
        DisplayError::Timer(e)
    }
}

/// Drives a 4-digit display from a shared [`DisplayBuffer`]
pub struct DigitMultiplexer<'a, I2C> {
    expander: Mcp23018<I2C>,
    buffer: &'a DisplayBuffer,
    cursor: Cursor,
    timer_config: Option<TimerConfig>,
}

impl<'a, I2C: I2c> DigitMultiplexer<'a, I2C> {
    /// Create a multiplexer
    ///
    /// Loads [`DisplayBuffer::INITIAL_CODES`] into `buffer`. The expander
    /// must already be initialized ([`Mcp23018::init`]).
    pub fn new(expander: Mcp23018<I2C>, buffer: &'a DisplayBuffer) -> Self {
        buffer.reset();
        Self {
            expander,
            buffer,
            cursor: Cursor::new(),
            timer_config: None,
        }
    }

    /// Replace the four displayed codes
    pub fn set(&self, codes: [u8; DIGITS]) -> Result<(), DisplayError<I2C::Error>> {
        self.buffer.set(codes)?;
        Ok(())
    }

    /// Shared display buffer
    pub fn buffer(&self) -> &'a DisplayBuffer {
        self.buffer
    }

    /// Next digit to be lit
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Timer configuration from the last successful [`Self::setup`]
    pub fn timer_config(&self) -> Option<TimerConfig> {
        self.timer_config
    }

    /// Release the expander
    pub fn release(self) -> Mcp23018<I2C> {
        self.expander
    }

    /// Prepare the expander and arm the refresh timer
    ///
    /// Enables the pull-ups on the select lines, shows the error glyph on
    /// the right-most digit until the first refresh, then programs `timer`
    /// for one dwell period and enables its overflow interrupt. The
    /// interrupt must not reach [`Self::refresh_step`] before this
    /// returns.
    pub fn setup<T: OverflowTimer>(
        &mut self,
        timer: &mut T,
        config: TimerConfig,
    ) -> Result<(), DisplayError<I2C::Error>> {
        config.validate()?;

        self.expander.set_pullups(SELECT_PULLUPS, 0x00)?;
        self.expander
            .set_ports(RIGHTMOST_SELECT, !SEGMENTS[ERROR_CODE as usize])?;

        timer.configure(&config);
        timer.set_counter(config.reload());
        timer.enable_overflow_interrupt();
        self.timer_config = Some(config);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "display armed: {} ticks/digit, reload {}",
            config.dwell_ticks,
            config.reload()
        );

        Ok(())
    }

    /// Light the digit under the cursor and move to the next one
    ///
    /// The cursor advances even when the bus write fails, so a flaky bus
    /// drops single digits instead of stalling the display.
    pub fn refresh_step(&mut self) -> Result<Frame, expander::Error<I2C::Error>> {
        let code = self.buffer.get(self.cursor.position());
        let frame = Frame {
            position: self.cursor.position,
            select: self.cursor.select(),
            segments: !SEGMENTS[(code & 0x0F) as usize],
        };
        self.cursor.advance();

        self.expander.set_ports(frame.select, frame.segments)?;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expander::mcp23018::reg;
    use crate::testing::{FakeTimer, RegisterFile};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    use proptest::prelude::*;
    use std::vec::Vec;

    fn multiplexer(buffer: &DisplayBuffer) -> DigitMultiplexer<'_, RegisterFile> {
        DigitMultiplexer::new(Mcp23018::new(RegisterFile::new(), 0), buffer)
    }

    #[test]
    fn test_cursor_sequence() {
        let mut cursor = Cursor::new();
        let mut seen = vec![];
        for _ in 0..5 {
            seen.push((cursor.position(), cursor.select()));
            cursor.advance();
        }
        assert_eq!(
            seen,
            vec![(0, 0b1000), (1, 0b0100), (2, 0b0010), (3, 0b0001), (0, 0b1000)]
        );
    }

    #[test]
    fn test_new_loads_initial_codes() {
        let buffer = DisplayBuffer::new([0xF; DIGITS]);
        let mux = multiplexer(&buffer);
        assert_eq!(buffer.snapshot(), [0, 1, 2, 3]);
        assert!(core::ptr::eq(mux.buffer(), &buffer));
        assert_eq!(mux.cursor(), Cursor::new());
        assert_eq!(mux.timer_config(), None);
    }

    #[test]
    fn test_refresh_framing() {
        let expectations = [
            I2cTransaction::write(0x20, vec![reg::GPIOA, 0b1000, !SEGMENTS[0]]),
            I2cTransaction::write(0x20, vec![reg::GPIOA, 0b0100, !SEGMENTS[1]]),
        ];
        let buffer = DisplayBuffer::default();
        let mut mux = DigitMultiplexer::new(Mcp23018::new(I2cMock::new(&expectations), 0), &buffer);

        mux.refresh_step().unwrap();
        mux.refresh_step().unwrap();

        mux.release().release().done();
    }

    #[test]
    fn test_scenario_1234() {
        let buffer = DisplayBuffer::default();
        let mut mux = multiplexer(&buffer);
        mux.set([1, 2, 3, 4]).unwrap();

        for _ in 0..4 {
            mux.refresh_step().unwrap();
        }

        let bus = mux.release().release();
        assert_eq!(
            bus.writes,
            vec![
                vec![reg::GPIOA, 0b1000, !0x30],
                vec![reg::GPIOA, 0b0100, !0x6D],
                vec![reg::GPIOA, 0b0010, !0x79],
                vec![reg::GPIOA, 0b0001, !0x33],
            ]
        );
    }

    #[test]
    fn test_fifth_refresh_repeats_first() {
        let buffer = DisplayBuffer::default();
        let mut mux = multiplexer(&buffer);

        let first = mux.refresh_step().unwrap();
        for _ in 0..3 {
            mux.refresh_step().unwrap();
        }
        assert_eq!(mux.refresh_step().unwrap(), first);
    }

    #[test]
    fn test_all_error_code_matches_setup_glyph() {
        let buffer = DisplayBuffer::default();
        let mut mux = multiplexer(&buffer);
        let mut timer = FakeTimer::default();
        mux.setup(&mut timer, TimerConfig::AVR_TIMER2).unwrap();
        mux.set([ERROR_CODE; DIGITS]).unwrap();

        let frames: Vec<Frame> = (0..4).map(|_| mux.refresh_step().unwrap()).collect();

        let bus = mux.release().release();
        // Setup wrote the error glyph to the right-most digit
        assert_eq!(bus.writes[1], vec![reg::GPIOA, 0b0001, !0x4F]);
        for frame in frames {
            assert_eq!(frame.segments, bus.writes[1][2]);
        }
    }

    #[test]
    fn test_setup_arms_timer() {
        let buffer = DisplayBuffer::default();
        let mut mux = multiplexer(&buffer);
        let mut timer = FakeTimer::default();

        mux.setup(&mut timer, TimerConfig::AVR_TIMER2).unwrap();

        assert_eq!(timer.config, Some(TimerConfig::AVR_TIMER2));
        assert_eq!(timer.loads, vec![206]);
        assert!(timer.interrupt_enabled);
        assert_eq!(mux.timer_config(), Some(TimerConfig::AVR_TIMER2));

        let bus = mux.release().release();
        assert_eq!(bus.register(reg::GPPUA), 0x0F);
        assert_eq!(bus.register(reg::GPPUB), 0x00);
        assert_eq!(bus.writes[0], vec![reg::GPPUA, 0x0F, 0x00]);
    }

    #[test]
    fn test_setup_rejects_bad_config_before_touching_hardware() {
        let buffer = DisplayBuffer::default();
        let mut mux = multiplexer(&buffer);
        let mut timer = FakeTimer::default();
        let config = TimerConfig {
            dwell_ticks: 0,
            ..TimerConfig::AVR_TIMER2
        };

        assert_eq!(
            mux.setup(&mut timer, config),
            Err(DisplayError::Timer(TimerError::DwellTooShort))
        );
        assert!(!timer.interrupt_enabled);
        assert!(mux.release().release().writes.is_empty());
    }

    #[test]
    fn test_set_rejects_invalid_code() {
        let buffer = DisplayBuffer::default();
        let mux = multiplexer(&buffer);
        mux.set([5, 6, 7, 8]).unwrap();

        assert_eq!(mux.set([0, 0x10, 0, 0]), Err(DisplayError::InvalidCode(0x10)));
        assert_eq!(buffer.snapshot(), [5, 6, 7, 8]);
    }

    #[test]
    fn test_set_is_idempotent() {
        let buffer = DisplayBuffer::default();
        let mut mux = multiplexer(&buffer);
        mux.set([0xC, 0xA, 0xF, 0xE]).unwrap();
        let once: Vec<Frame> = (0..4).map(|_| mux.refresh_step().unwrap()).collect();

        mux.set([0xC, 0xA, 0xF, 0xE]).unwrap();
        mux.set([0xC, 0xA, 0xF, 0xE]).unwrap();
        let twice: Vec<Frame> = (0..4).map(|_| mux.refresh_step().unwrap()).collect();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_bus_failure_still_advances() {
        let buffer = DisplayBuffer::default();
        let mut bus = RegisterFile::new();
        bus.fail_writes = true;
        let mut mux = DigitMultiplexer::new(Mcp23018::new(bus, 0), &buffer);

        assert!(matches!(mux.refresh_step(), Err(expander::Error::Bus(_))));
        assert_eq!(mux.cursor().position(), 1);
        assert!(mux.refresh_step().is_err());
        assert_eq!(mux.cursor().select(), 0b0010);
    }

    proptest! {
        #[test]
        fn prop_cursor_after_n_steps(n in 0usize..64) {
            let buffer = DisplayBuffer::default();
            let mut mux = multiplexer(&buffer);
            for _ in 0..n {
                mux.refresh_step().unwrap();
            }
            let cursor = mux.cursor();
            prop_assert_eq!(cursor.position(), n % DIGITS);
            prop_assert_eq!(cursor.select(), Cursor::INITIAL_SELECT >> (n % DIGITS));
        }

        #[test]
        fn prop_frame_shows_buffer(codes in prop::array::uniform4(0u8..16)) {
            let buffer = DisplayBuffer::default();
            let mut mux = multiplexer(&buffer);
            mux.set(codes).unwrap();
            for code in codes {
                let frame = mux.refresh_step().unwrap();
                prop_assert_eq!(!frame.segments, SEGMENTS[code as usize]);
                prop_assert_eq!(frame.select.count_ones(), 1);
            }
        }
    }
}
