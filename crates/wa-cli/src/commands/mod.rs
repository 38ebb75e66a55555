//! Subcommand implementations.

pub mod run;
pub mod schedule;
pub mod status;
