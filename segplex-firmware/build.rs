//! Build script for segplex-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates board.toml at compile time
//! - Emits the board settings as constants (`$OUT_DIR/board_config.rs`)

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// RP2040 system clock after `embassy_rp::init` with default settings
const SYS_CLOCK_HZ: u64 = 125_000_000;

/// Fastest clock the RP2040 I2C controller accepts (fast mode plus)
const RP2040_I2C_MAX_HZ: i64 = 1_000_000;

/// Board settings extracted from board.toml
struct Board {
    address_pins: i64,
    frequency_hz: i64,
    divider: i64,
    dwell_us: i64,
}

fn main() {
    setup_linker();
    let board = validate_config();
    write_constants(&board);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate board.toml and extract the settings
fn validate_config() -> Board {
    println!("cargo:rerun-if-changed=board.toml");

    let config_path = Path::new("board.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: board.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a board.toml configuration file.          ║\n\
            ║  Please create one in the segplex-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read board.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in board.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();

    let address_pins = integer(&config, "expander", "address_pins", 0..=7, None, &mut errors);
    let frequency_hz = integer(
        &config,
        "i2c",
        "frequency_hz",
        1_000..=RP2040_I2C_MAX_HZ,
        Some("RP2040 I2C limit"),
        &mut errors,
    );
    let divider = integer(&config, "timer", "divider", 1..=255, None, &mut errors);
    let dwell_us = integer(&config, "timer", "dwell_us", 1..=1_000_000, None, &mut errors);

    // The PWM counter is 16 bits wide
    if errors.is_empty() {
        let ticks = SYS_CLOCK_HZ / divider as u64 * dwell_us as u64 / 1_000_000;
        if ticks == 0 {
            errors.push(format!(
                "[timer] dwell_us {} is shorter than one tick at divider {}",
                dwell_us, divider
            ));
        } else if ticks > u16::MAX as u64 {
            errors.push(format!(
                "[timer] dwell_us {} needs {} ticks, more than 65535",
                dwell_us, ticks
            ));
        }
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid board configuration                              ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=board.toml validated successfully");

    Board {
        address_pins,
        frequency_hz,
        divider,
        dwell_us,
    }
}

/// Look up `[section] key` and check its range
///
/// `reason` is appended to the range error when the bound comes from
/// hardware rather than from the setting itself.
fn integer(
    config: &toml::Value,
    section: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    reason: Option<&str>,
    errors: &mut Vec<String>,
) -> i64 {
    let value = match config.get(section) {
        Some(toml::Value::Table(t)) => t.get(key),
        Some(_) => {
            errors.push(format!("[{}] must be a table", section));
            return *range.start();
        }
        None => {
            errors.push(format!("Missing [{}] section", section));
            return *range.start();
        }
    };

    match value {
        Some(toml::Value::Integer(v)) if range.contains(v) => *v,
        Some(toml::Value::Integer(_)) => {
            let mut message = format!(
                "[{}] {} must be {}-{}",
                section,
                key,
                range.start(),
                range.end()
            );
            if let Some(reason) = reason {
                message.push_str(&format!(" ({})", reason));
            }
            errors.push(message);
            *range.start()
        }
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            *range.start()
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            *range.start()
        }
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the validated settings as Rust constants
fn write_constants(board: &Board) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut f = File::create(out_dir.join("board_config.rs")).unwrap();

    writeln!(f, "/// Strap value on the expander ADDR pin").unwrap();
    writeln!(f, "pub const EXPANDER_ADDRESS_PINS: u8 = {};", board.address_pins).unwrap();
    writeln!(f, "/// I2C bus clock").unwrap();
    writeln!(f, "pub const I2C_FREQUENCY_HZ: u32 = {};", board.frequency_hz).unwrap();
    writeln!(f, "/// PWM slice clock divider").unwrap();
    writeln!(f, "pub const PWM_DIVIDER: u8 = {};", board.divider).unwrap();
    writeln!(f, "/// PWM counter clock").unwrap();
    writeln!(
        f,
        "pub const TIMER_INPUT_HZ: u32 = {};",
        SYS_CLOCK_HZ / board.divider as u64
    )
    .unwrap();
    writeln!(f, "/// Time each digit stays lit").unwrap();
    writeln!(f, "pub const DWELL_US: u32 = {};", board.dwell_us).unwrap();
}
