//! Board settings from board.toml

include!(concat!(env!("OUT_DIR"), "/board_config.rs"));

/// System clock after `embassy_rp::init` with default settings
pub const SYS_CLOCK_HZ: u32 = 125_000_000;

/// Fastest clock the RP2040 I2C controller accepts (fast mode plus)
pub const RP2040_I2C_MAX_HZ: u32 = 1_000_000;
