//! Worklog autopilot CLI library.
//!
//! Wires the reconciliation engine to its concrete collaborators: the
//! tracker client, the TOML-backed config store, and the log sink.

mod app;
mod cli;
pub mod commands;
mod config;
mod store;

pub use app::App;
pub use cli::{Cli, Commands};
pub use config::Config;
pub use store::{FilteredStore, TomlConfigStore};
