//! panel-probe CLI library
//!
//! Command-line interface over the panel-probe suite: run scenarios, clean up
//! what they created and inspect the entity ledger.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod logging;
mod output;
mod runner;

pub use commands::{
    BackendArg, CleanupArgs, Cli, ColorArg, Commands, EnvArgs, LedgerAction, LedgerArgs,
    ListArgs, RunArgs, TestArgs,
};
pub use config::{Backend, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
pub use runner::{resolve_environment, CommandRunner, PanelBackend, SIMULATED_BASE_URL};
