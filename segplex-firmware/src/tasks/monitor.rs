//! Display health monitor
//!
//! The refresh interrupt cannot log at full rate, so it only counts
//! failures; this task reports the counters periodically.

use defmt::*;
use embassy_time::{Duration, Ticker};
use portable_atomic::{AtomicU32, Ordering};

/// Report interval in seconds
pub const REPORT_INTERVAL_S: u64 = 10;

/// Refresh steps whose bus write failed
pub static REFRESH_ERRORS: AtomicU32 = AtomicU32::new(0);

/// Interrupts that ran past the next deadline
pub static OVERRUNS: AtomicU32 = AtomicU32::new(0);

/// Monitor task - logs refresh failures and overruns since the last report
#[embassy_executor::task]
pub async fn monitor_task() {
    let mut ticker = Ticker::every(Duration::from_secs(REPORT_INTERVAL_S));

    loop {
        ticker.next().await;

        let errors = REFRESH_ERRORS.swap(0, Ordering::Relaxed);
        let overruns = OVERRUNS.swap(0, Ordering::Relaxed);

        if errors > 0 || overruns > 0 {
            warn!(
                "Display: {} failed refreshes, {} overruns in {}s",
                errors, overruns, REPORT_INTERVAL_S
            );
        } else {
            trace!("Display healthy");
        }
    }
}
