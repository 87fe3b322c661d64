//! CLI command definitions using clap

use crate::config::{Backend, ColorChoice};
use clap::{Args, Parser, Subcommand, ValueEnum};
use panel_probe::config::{DEFAULT_RETRIES, DEFAULT_SCENARIO_TIMEOUT_MS};
use panel_probe::config::{ENV_BASE_URL, ENV_CLIENT_ID, ENV_LOGIN_EMAIL, ENV_LOGIN_PASSWORD};
use panel_probe::{EntityKind, DEFAULT_LEDGER_PATH};
use std::path::PathBuf;

/// panel-probe: end-to-end suite for the admin panel with ledger-driven cleanup
#[derive(Parser, Debug)]
#[command(name = "panel-probe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Ledger file of created entities
    #[arg(long, default_value = DEFAULT_LEDGER_PATH, global = true)]
    pub ledger: PathBuf,

    /// Console backend
    #[arg(long, default_value = "simulated", global = true)]
    pub backend: BackendArg,

    /// Show the browser window (browser backend)
    #[arg(long, global = true)]
    pub headed: bool,

    #[command(flatten)]
    pub env: EnvArgs,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Target panel and credentials
#[derive(Args, Debug, Clone, Default)]
pub struct EnvArgs {
    /// Panel base URL
    #[arg(long, env = ENV_BASE_URL, global = true)]
    pub base_url: Option<String>,

    /// Admin login email
    #[arg(long, env = ENV_LOGIN_EMAIL, global = true)]
    pub email: Option<String>,

    /// Admin login password
    #[arg(long, env = ENV_LOGIN_PASSWORD, global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Tenant id shown in the client_id columns
    #[arg(long, env = ENV_CLIENT_ID, global = true)]
    pub client_id: Option<String>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scenarios
    Test(TestArgs),

    /// Delete every entity the ledger still tracks
    Cleanup(CleanupArgs),

    /// Run the scenarios, then clean up
    Run(RunArgs),

    /// List scenarios
    List(ListArgs),

    /// Inspect or edit the ledger
    Ledger(LedgerArgs),
}

/// Arguments for the test command
#[derive(Args, Debug, Clone)]
pub struct TestArgs {
    /// Regex over `suite::scenario` ids
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Concurrent sessions (0 = one per CPU)
    #[arg(short = 'j', long, default_value = "0")]
    pub workers: usize,

    /// Extra attempts for a failed scenario
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    pub retries: u32,

    /// Scenario timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_SCENARIO_TIMEOUT_MS)]
    pub timeout: u64,

    /// Output directory for the report and failure screenshots
    #[arg(short, long, default_value = "test-results")]
    pub output: PathBuf,
}

/// Arguments for the cleanup command
#[derive(Args, Debug, Clone, Default)]
pub struct CleanupArgs {
    /// Untrack entries whose row no longer exists
    #[arg(long)]
    pub prune_missing: bool,
}

/// Arguments for the run command
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub test: TestArgs,

    #[command(flatten)]
    pub cleanup: CleanupArgs,
}

/// Arguments for the list command
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Regex over `suite::scenario` ids
    #[arg(short, long)]
    pub filter: Option<String>,
}

/// Arguments for the ledger command
#[derive(Args, Debug)]
pub struct LedgerArgs {
    #[command(subcommand)]
    pub action: LedgerAction,
}

/// Ledger subcommands
#[derive(Subcommand, Debug)]
pub enum LedgerAction {
    /// Print tracked entities
    Show {
        /// Print the raw JSON snapshot
        #[arg(long)]
        json: bool,
    },

    /// Forget every tracked entity
    Reset,

    /// Forget one tracked entity
    Untrack {
        /// Entity kind (user, param, domain)
        kind: EntityKind,
        /// Nickname, parameter name or domain name
        id: String,
    },
}

/// Color argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Backend argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum BackendArg {
    /// In-memory panel model
    #[default]
    Simulated,
    /// Chromium over CDP (needs the `browser` feature)
    Browser,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Simulated => Self::Simulated,
            BackendArg::Browser => Self::Browser,
        }
    }
}
