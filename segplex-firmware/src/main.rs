//! Segplex - multiplexed 7-segment display firmware
//!
//! Drives a 4-digit common-anode display through an MCP23018 on I2C0.
//! A PWM slice paces the refresh: every wrap interrupt lights the next
//! digit and reloads the counter, compensating for handler latency.
//!
//! Wiring (RP2040):
//! - GP4: I2C0 SDA
//! - GP5: I2C0 SCL
//! - MCP23018 port A bits 3..0: digit anodes, left to right
//! - MCP23018 port B: segment cathodes (A = bit 6 ... G = bit 0, DP = bit 7)

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::i2c::{self, I2c};
use embassy_rp::interrupt;
use embassy_rp::peripherals::I2C0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use portable_atomic::Ordering;
use segplex_drivers::display::{DigitMultiplexer, DisplayBinding, DisplayBuffer, Service};
use segplex_drivers::expander::Mcp23018;
use segplex_hal::{I2cConfig, NoNesting, TimerConfig};
use {defmt_rtt as _, panic_probe as _};

use crate::board::{
    DWELL_US, EXPANDER_ADDRESS_PINS, I2C_FREQUENCY_HZ, PWM_DIVIDER, RP2040_I2C_MAX_HZ,
    TIMER_INPUT_HZ,
};
use crate::tasks::monitor::{OVERRUNS, REFRESH_ERRORS};
use crate::timer::PwmOverflowTimer;

mod board;
mod tasks;
mod timer;

type DisplayBus = I2c<'static, I2C0, i2c::Blocking>;

/// Codes shown on the display, written from tasks
static DISPLAY_BUFFER: DisplayBuffer = DisplayBuffer::new(DisplayBuffer::INITIAL_CODES);

/// Multiplexer serviced by the PWM wrap interrupt
static DISPLAY: DisplayBinding<'static, DisplayBus, PwmOverflowTimer> = DisplayBinding::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Segplex firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Expander and controller limits both apply
    let bus_config = I2cConfig::from_hz(I2C_FREQUENCY_HZ).limited_to(RP2040_I2C_MAX_HZ);
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = bus_config.frequency;
    let bus = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c_config);

    let mut expander = Mcp23018::new(bus, EXPANDER_ADDRESS_PINS);
    info!("MCP23018 at {=u8:#x}", expander.address().get());
    if let Err(e) = expander.init() {
        error!("MCP23018 init failed: {}", e);
        return;
    }

    let timer_config = match TimerConfig::for_dwell_us(TIMER_INPUT_HZ, DWELL_US, u16::MAX) {
        Ok(config) => config,
        Err(e) => {
            error!("Display timer config rejected: {}", e);
            return;
        }
    };
    info!(
        "Display timer: {} ticks/digit at {} Hz, {} mHz refresh",
        timer_config.dwell_ticks,
        timer_config.input_hz,
        timer_config.refresh_millihertz(4)
    );

    // Address, register and two data bytes per refresh
    let refresh_us = 4 * bus_config.byte_time_us();
    if refresh_us >= timer_config.dwell_us() {
        warn!(
            "Refresh write takes {} us, dwell is only {} us",
            refresh_us,
            timer_config.dwell_us()
        );
    }

    let pwm = Pwm::new_free(p.PWM_SLICE0, PwmConfig::default());
    let mut timer = PwmOverflowTimer::new(pwm, PWM_DIVIDER);

    let mut multiplexer = DigitMultiplexer::new(expander, &DISPLAY_BUFFER);
    if let Err(e) = multiplexer.setup(&mut timer, timer_config) {
        error!("Display setup failed: {}", e);
        return;
    }

    if DISPLAY.bind(multiplexer, timer).is_some() {
        warn!("Replaced a previously bound display");
    }
    info!("Display running");

    spawner.spawn(tasks::counter_task(&DISPLAY_BUFFER)).unwrap();
    spawner.spawn(tasks::monitor_task()).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Display refresh, once per dwell period
///
/// The I2C transport is polled, so the handler never needs to nest.
#[interrupt]
fn PWM_IRQ_WRAP() {
    match DISPLAY.on_overflow(NoNesting) {
        Service::Serviced(serviced) => {
            if serviced.refresh.is_err() {
                REFRESH_ERRORS.fetch_add(1, Ordering::Relaxed);
            }
            if serviced.is_overrun() {
                OVERRUNS.fetch_add(1, Ordering::Relaxed);
            }
        }
        Service::Unbound => PwmOverflowTimer::clear_pending(),
        Service::Busy => {}
    }
}
