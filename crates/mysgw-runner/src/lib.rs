//! Runner for the `mysgw` binary: configuration loading and the host
//! command bus.

pub mod commands;
pub mod config;

pub use commands::{parse_line, Command, CommandBus, InputError};
pub use config::{ConfigError, ItemConfig, RunnerConfig};
