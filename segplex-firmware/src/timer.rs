//! PWM slice as the display refresh timer
//!
//! A PWM slice in free-running mode counts from 0 to `top` and raises
//! `PWM_IRQ_WRAP` when it wraps. Writing the counter shortens the next
//! period, which is all [`OverflowTimer`] needs.

use defmt::*;
use embassy_rp::interrupt;
use embassy_rp::interrupt::InterruptExt;
use embassy_rp::pac;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use segplex_hal::{OverflowTimer, TimerConfig};

use crate::board::SYS_CLOCK_HZ;

/// Slice used for the refresh timer (PWM_SLICE0)
const SLICE: usize = 0;

/// Overflow timer on one PWM slice
pub struct PwmOverflowTimer {
    pwm: Pwm<'static>,
    divider: u8,
}

impl PwmOverflowTimer {
    /// Wrap a free-running PWM slice
    ///
    /// # Arguments
    /// - `pwm`: Slice created with `Pwm::new_free`
    /// - `divider`: Integer clock divider, counter runs at 125 MHz / divider
    pub fn new(pwm: Pwm<'static>, divider: u8) -> Self {
        Self { pwm, divider }
    }

    /// Clear a pending wrap without a timer instance
    ///
    /// Used by the interrupt handler while no display is bound, so an
    /// unserviced wrap does not retrigger forever.
    pub fn clear_pending() {
        pac::PWM.intr().write(|w| w.set_ch(SLICE, true));
    }
}

impl OverflowTimer for PwmOverflowTimer {
    fn configure(&mut self, config: &TimerConfig) {
        let counter_hz = SYS_CLOCK_HZ / self.divider.max(1) as u32;
        if counter_hz != config.input_hz {
            warn!(
                "PWM counter runs at {} Hz, display expects {} Hz",
                counter_hz, config.input_hz
            );
        }

        let mut pwm_config = PwmConfig::default();
        pwm_config.top = config.max;
        pwm_config.divider = self.divider.max(1).into();
        self.pwm.set_config(&pwm_config);
    }

    fn counter(&self) -> u16 {
        self.pwm.counter()
    }

    fn set_counter(&mut self, value: u16) {
        self.pwm.set_counter(value);
    }

    fn enable_overflow_interrupt(&mut self) {
        self.pwm.clear_wrapped();
        pac::PWM.inte().modify(|w| w.set_ch(SLICE, true));
        // SAFETY: the PWM_IRQ_WRAP handler only touches the display binding
        unsafe { interrupt::PWM_IRQ_WRAP.enable() };
    }

    fn acknowledge_overflow(&mut self) {
        self.pwm.clear_wrapped();
    }
}
