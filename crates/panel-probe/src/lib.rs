//! panel-probe: end-to-end suite for the domains / profile-params / users
//! admin panel, with a persistent ledger of created entities.
//!
//! Scenarios drive the panel through the [`AdminConsole`] boundary. Every
//! entity a scenario creates is recorded in the [`EntityLedger`] once the panel
//! confirms the creation; the cleanup phase later deletes whatever is still
//! recorded, even when it runs in a different process.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────────────────┐
//! │ Scenarios    │───►│ Harness      │───►│ AdminConsole             │
//! │ (suites)     │    │ (workers,    │    │  BrowserConsole (CDP)    │
//! └──────┬───────┘    │  retries)    │    │  SimulatedConsole        │
//!        │            └──────────────┘    └──────────────────────────┘
//!        ▼
//! ┌──────────────┐    ┌──────────────┐
//! │ EntityLedger │───►│ Cleanup      │
//! │ (.cache/...) │    │ phase        │
//! └──────────────┘    └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use panel_probe::{EntityLedger, DEFAULT_LEDGER_PATH};
//!
//! let ledger = EntityLedger::open(DEFAULT_LEDGER_PATH)?;
//! ledger.track_domain("acme123")?;
//! ledger.track_user("bob")?;
//! ledger.untrack_user("bob")?;
//! assert_eq!(ledger.domains(), vec!["acme123"]);
//! # Ok::<(), panel_probe::ProbeError>(())
//! ```

// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod browser;
pub mod cleanup;
pub mod config;
pub mod console;
pub mod data;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod driver;
pub mod harness;
pub mod ledger;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod locator;
#[allow(clippy::must_use_candidate, clippy::doc_markdown)]
pub mod page_object;
pub mod reporter;
mod result;
pub mod scenarios;
pub mod simulated;
pub mod verify;

pub use browser::{BrowserConfig, BrowserConsole};
#[cfg(feature = "browser")]
pub use browser::{CdpConsoleFactory, CdpDriver};
pub use cleanup::{run_cleanup, CleanupEntry, CleanupOptions, CleanupReport};
pub use config::{Environment, RunConfig};
pub use console::{
    AdminConsole, ConsoleFactory, DomainForm, DynamicField, EditorSnapshot, ParamForm, ParamType,
    Signal, TableRow, UserEdit, UserForm, View,
};
pub use data::DataGenerator;
pub use driver::{MockDriver, PanelDriver};
pub use harness::{filter_scenarios, Harness, Scenario, ScenarioContext};
pub use ledger::{EntityKind, EntityLedger, LedgerState, DEFAULT_LEDGER_PATH};
pub use locator::{Locator, Selector};
pub use reporter::{RunReport, ScenarioOutcome, TestStatus};
pub use result::{ProbeError, ProbeResult};
pub use simulated::{SimulatedConsole, SimulatedPanel};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::cleanup::*;
    pub use super::config::*;
    pub use super::console::*;
    pub use super::harness::*;
    pub use super::ledger::*;
    pub use super::reporter::*;
    pub use super::result::*;
    pub use super::simulated::*;
    pub use super::verify::*;
}
