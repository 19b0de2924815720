//! Demo task: counts 0000-FFFF in hex on the display

use defmt::*;
use embassy_time::{Duration, Ticker};
use segplex_drivers::display::{DisplayBuffer, DIGITS};

/// Count interval in milliseconds
pub const COUNT_INTERVAL_MS: u64 = 100;

/// Split a value into four hex digit codes, most significant first
pub fn hex_codes(value: u16) -> [u8; DIGITS] {
    [
        (value >> 12) as u8 & 0x0F,
        (value >> 8) as u8 & 0x0F,
        (value >> 4) as u8 & 0x0F,
        value as u8 & 0x0F,
    ]
}

/// Counter task - writes an incrementing value into the display buffer
#[embassy_executor::task]
pub async fn counter_task(buffer: &'static DisplayBuffer) {
    info!("Counter task started");

    let mut ticker = Ticker::every(Duration::from_millis(COUNT_INTERVAL_MS));
    let mut value: u16 = 0;

    loop {
        ticker.next().await;

        if let Err(e) = buffer.set(hex_codes(value)) {
            warn!("Rejected display code {}", e.0);
        }
        value = value.wrapping_add(1);
    }
}
