//! Embassy async tasks

pub mod counter;
pub mod monitor;

pub use counter::counter_task;
pub use monitor::monitor_task;
