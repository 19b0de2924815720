//! Periodic overflow timer abstraction
//!
//! The display refresh is paced by a free-running up-counter that raises
//! an interrupt when it wraps past its maximum value. Loading the counter
//! with a preload value shortens the period: starting from `reload`, the
//! counter overflows after `max - reload + 1` ticks.
//!
//! # Latency compensation
//!
//! The handler does not run at the exact overflow instant. By the time it
//! reads the counter, the counter has already advanced by the dispatch
//! latency `L` (ticks since the wrap). Loading `L + reload` instead of
//! `reload` makes the next overflow happen one nominal period after the
//! previous overflow, so dispatch jitter does not accumulate into drift.

/// Periodic overflow timer
///
/// Implementations wrap one hardware timer channel. Counter values are
/// `u16` so both 8-bit and 16-bit timers fit; [`TimerConfig::max`]
/// carries the actual wrap value.
pub trait OverflowTimer {
    /// Program the timer so that it counts at `config.input_hz` and wraps
    /// after `config.max`
    fn configure(&mut self, config: &TimerConfig);

    /// Current counter value
    fn counter(&self) -> u16;

    /// Overwrite the counter
    fn set_counter(&mut self, value: u16);

    /// Enable the overflow interrupt
    fn enable_overflow_interrupt(&mut self);

    /// Clear a pending overflow flag
    ///
    /// Timers whose flag is cleared by hardware on interrupt entry keep
    /// the default no-op.
    fn acknowledge_overflow(&mut self) {}
}

/// Timer configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// Input clock of zero Hz
    NoClock,
    /// Dwell rounds down to zero ticks
    DwellTooShort,
    /// Dwell needs more ticks than the counter can hold
    DwellTooLong,
}

/// Timer configuration for the display refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerConfig {
    /// Counter input clock after the prescaler, in Hz
    pub input_hz: u32,
    /// Ticks each digit stays lit (one overflow period)
    pub dwell_ticks: u16,
    /// Last counter value before the wrap (255 for an 8-bit timer)
    pub max: u16,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self::AVR_TIMER2
    }
}

impl TimerConfig {
    /// 8-bit timer on a 16 MHz AVR with a /1024 prescaler
    ///
    /// 50 ticks at 15.625 kHz = 3.2 ms per digit, 78.125 Hz for all four.
    pub const AVR_TIMER2: Self = Self {
        input_hz: 15_625,
        dwell_ticks: 50,
        max: 0xFF,
    };

    /// Compute a configuration for a dwell time in microseconds
    pub fn for_dwell_us(input_hz: u32, dwell_us: u32, max: u16) -> Result<Self, TimerError> {
        if input_hz == 0 {
            return Err(TimerError::NoClock);
        }

        let ticks = (input_hz as u64 * dwell_us as u64) / 1_000_000;
        if ticks == 0 {
            return Err(TimerError::DwellTooShort);
        }
        if ticks > max as u64 {
            return Err(TimerError::DwellTooLong);
        }

        Ok(Self {
            input_hz,
            dwell_ticks: ticks as u16,
            max,
        })
    }

    /// Check that the timer can realize this configuration
    pub fn validate(&self) -> Result<(), TimerError> {
        if self.input_hz == 0 {
            return Err(TimerError::NoClock);
        }
        if self.dwell_ticks == 0 {
            return Err(TimerError::DwellTooShort);
        }
        if self.dwell_ticks > self.max {
            return Err(TimerError::DwellTooLong);
        }
        Ok(())
    }

    /// Counter preload that yields one dwell period until the overflow
    ///
    /// Only meaningful for a configuration that passes [`Self::validate`].
    pub const fn reload(&self) -> u16 {
        self.max.wrapping_sub(self.dwell_ticks).wrapping_add(1)
    }

    /// Dwell time per digit in microseconds, saturating at `u32::MAX`
    pub fn dwell_us(&self) -> u32 {
        if self.input_hz == 0 {
            return 0;
        }
        let us = (self.dwell_ticks as u64 * 1_000_000) / self.input_hz as u64;
        u32::try_from(us).unwrap_or(u32::MAX)
    }

    /// Full refresh rate over `digits` digits, in millihertz, saturating at
    /// `u32::MAX`
    pub fn refresh_millihertz(&self, digits: u8) -> u32 {
        let period_ticks = self.dwell_ticks as u64 * digits as u64;
        if period_ticks == 0 {
            return 0;
        }
        let millihertz = (self.input_hz as u64 * 1000) / period_ticks;
        u32::try_from(millihertz).unwrap_or(u32::MAX)
    }

    /// Counter value to load after observing `latency` ticks past the wrap
    ///
    /// A latency of a full dwell period or more means the next deadline has
    /// already passed; the counter is then parked at `max` so the overflow
    /// fires on the next tick.
    pub fn compensate(&self, latency: u16) -> Compensation {
        if latency < self.dwell_ticks {
            Compensation::OnTime(latency.wrapping_add(self.reload()))
        } else {
            Compensation::Overrun { latency }
        }
    }
}

/// Result of a latency-compensated reload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Compensation {
    /// Counter preload keeping the nominal period
    OnTime(u16),
    /// Handler ran past the next deadline
    Overrun {
        /// Observed ticks since the wrap
        latency: u16,
    },
}

impl Compensation {
    /// Value to write into the counter
    pub fn counter(&self, config: &TimerConfig) -> u16 {
        match *self {
            Compensation::OnTime(value) => value,
            Compensation::Overrun { .. } => config.max,
        }
    }

    /// Check if the handler overran its period
    pub fn is_overrun(&self) -> bool {
        matches!(self, Compensation::Overrun { .. })
    }
}
