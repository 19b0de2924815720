//! Interrupt binding for the digit multiplexer
//!
//! A [`DisplayBinding`] is the one place the timer interrupt looks for a
//! multiplexer to service. It is meant to live in a `static`:
//!
//! ```ignore
//! static DISPLAY: DisplayBinding<'static, Bus, Timer> = DisplayBinding::new();
//!
//! #[interrupt]
//! fn TIMER_IRQ() {
//!     DISPLAY.on_overflow(NoNesting);
//! }
//! ```
//!
//! While a refresh runs, the multiplexer and its timer are taken out of
//! the slot. The critical section only covers the take and the put back,
//! never the bus transfer, so a handler that re-enables interrupts can be
//! preempted by itself. The nested call finds the slot in service and
//! returns [`Service::Busy`].

use core::cell::RefCell;
use core::mem;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal::i2c::I2c;
use segplex_hal::{Compensation, InterruptNesting, OverflowTimer};

use super::multiplexer::{DigitMultiplexer, Frame};
use crate::expander;

/// Outcome of one overflow interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Service<E> {
    /// Nothing bound
    Unbound,
    /// Preempted a refresh already in progress; nothing done
    Busy,
    /// One digit refreshed
    Serviced(Serviced<E>),
}

/// Details of a serviced interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Serviced<E> {
    /// Result of the bus write
    pub refresh: Result<Frame, expander::Error<E>>,
    /// Counter reload, `None` if the multiplexer was never set up
    pub compensation: Option<Compensation>,
}

impl<E> Serviced<E> {
    /// Check if the handler ran past the next deadline
    pub fn is_overrun(&self) -> bool {
        self.compensation.is_some_and(|c| c.is_overrun())
    }
}

struct Bound<'a, I2C, T> {
    multiplexer: DigitMultiplexer<'a, I2C>,
    timer: T,
}

enum Slot<'a, I2C, T> {
    Vacant,
    Ready(Bound<'a, I2C, T>),
    InService,
}

/// Slot holding the multiplexer serviced by the timer interrupt
pub struct DisplayBinding<'a, I2C, T> {
    slot: Mutex<CriticalSectionRawMutex, RefCell<Slot<'a, I2C, T>>>,
}

impl<'a, I2C, T> DisplayBinding<'a, I2C, T> {
    /// Create an empty binding
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(Slot::Vacant)),
        }
    }

    /// Check if a multiplexer is bound (including one being serviced)
    pub fn is_bound(&self) -> bool {
        self.slot
            .lock(|slot| !matches!(*slot.borrow(), Slot::Vacant))
    }
}

impl<'a, I2C: I2c, T: OverflowTimer> DisplayBinding<'a, I2C, T> {
    /// Hand a multiplexer and its timer to the interrupt
    ///
    /// Returns the previously bound pair, if any. Call
    /// [`DigitMultiplexer::setup`] first so the interrupt can reload the
    /// timer. A set-up timer is restarted for one full dwell period here,
    /// since a wrap that fired before the bind went unserviced.
    pub fn bind(
        &self,
        multiplexer: DigitMultiplexer<'a, I2C>,
        mut timer: T,
    ) -> Option<(DigitMultiplexer<'a, I2C>, T)> {
        if let Some(config) = multiplexer.timer_config() {
            timer.set_counter(config.reload());
        }

        let bound = Bound { multiplexer, timer };
        let previous = self
            .slot
            .lock(|slot| mem::replace(&mut *slot.borrow_mut(), Slot::Ready(bound)));

        match previous {
            Slot::Ready(old) => Some((old.multiplexer, old.timer)),
            _ => None,
        }
    }

    /// Take the bound pair back
    ///
    /// The timer keeps firing; later interrupts return
    /// [`Service::Unbound`]. Called from a context that preempted a
    /// refresh, the pair in service is dropped once that refresh ends and
    /// `None` is returned.
    pub fn unbind(&self) -> Option<(DigitMultiplexer<'a, I2C>, T)> {
        let previous = self
            .slot
            .lock(|slot| mem::replace(&mut *slot.borrow_mut(), Slot::Vacant));

        match previous {
            Slot::Ready(old) => Some((old.multiplexer, old.timer)),
            _ => None,
        }
    }

    /// Service one timer overflow
    ///
    /// Acknowledges the overflow, lets `nesting` re-enable interrupts,
    /// refreshes one digit and reloads the counter with the observed
    /// latency folded in, so the next overflow lands one dwell period
    /// after this one.
    pub fn on_overflow<N: InterruptNesting>(&self, mut nesting: N) -> Service<I2C::Error> {
        let mut bound = match self.take() {
            Ok(bound) => bound,
            Err(service) => return service,
        };

        bound.timer.acknowledge_overflow();
        nesting.allow_nesting();

        let refresh = bound.multiplexer.refresh_step();
        let compensation = bound.multiplexer.timer_config().map(|config| {
            let compensation = config.compensate(bound.timer.counter());
            bound.timer.set_counter(compensation.counter(&config));
            compensation
        });

        #[cfg(feature = "defmt")]
        {
            if refresh.is_err() {
                defmt::warn!("display refresh failed");
            }
            if let Some(Compensation::Overrun { latency }) = compensation {
                defmt::warn!("display refresh overran: {} ticks", latency);
            }
        }

        self.restore(bound);
        Service::Serviced(Serviced {
            refresh,
            compensation,
        })
    }

    fn take(&self) -> Result<Bound<'a, I2C, T>, Service<I2C::Error>> {
        self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            match mem::replace(&mut *slot, Slot::InService) {
                Slot::Ready(bound) => Ok(bound),
                Slot::Vacant => {
                    *slot = Slot::Vacant;
                    Err(Service::Unbound)
                }
                Slot::InService => Err(Service::Busy),
            }
        })
    }

    fn restore(&self, bound: Bound<'a, I2C, T>) {
        let stale = self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            if matches!(*slot, Slot::InService) {
                *slot = Slot::Ready(bound);
                None
            } else {
                Some(bound)
            }
        });

        // Rebound or unbound while in service
        if stale.is_some() {
            #[cfg(feature = "defmt")]
            defmt::debug!("dropping multiplexer replaced during refresh");
        }
    }
}

impl<'a, I2C, T> Default for DisplayBinding<'a, I2C, T> {
    fn default() -> Self {
        Self::new()
    }
}
