//! Command-line interface for evalforge.
//!
//! Provides commands for single-shot questions, batch generation runs,
//! judge passes, and CSV report building.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli};
