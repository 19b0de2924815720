//! I/O expander drivers

pub mod mcp23018;

pub use mcp23018::{BitAddress, BusAddress, Error, Mcp23018, Mcp23018Config, Port};
