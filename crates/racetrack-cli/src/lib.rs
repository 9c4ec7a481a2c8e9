//! Racetrack CLI library.
//!
//! Subcommand handlers, terminal styling and output formatting for the
//! `racetrack` binary.

pub mod commands;
pub mod output;
pub mod terminal;
