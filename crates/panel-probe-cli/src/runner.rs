//! Command execution: backends, test runs, cleanup and ledger maintenance

use crate::commands::{CleanupArgs, EnvArgs, LedgerAction, ListArgs, RunArgs, TestArgs};
use crate::config::{Backend, CliConfig};
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use panel_probe::{
    filter_scenarios, run_cleanup, scenarios, CleanupOptions, CleanupReport, ConsoleFactory,
    EntityKind, EntityLedger, Environment, Harness, RunConfig, RunReport, SimulatedPanel,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

/// Base URL reported for the in-memory panel
pub const SIMULATED_BASE_URL: &str = "http://simulated.panel";
const SIMULATED_EMAIL: &str = "admin@testsh.com";
const SIMULATED_PASSWORD: &str = "simulated";
const SIMULATED_CLIENT_ID: &str = "1";

/// Resolve the target environment
///
/// The browser backend needs every value; the simulated panel falls back to
/// built-in credentials.
pub fn resolve_environment(args: &EnvArgs, backend: Backend) -> CliResult<Environment> {
    let pick = |value: &Option<String>, flag: &str, fallback: &str| match (value, backend) {
        (Some(v), _) if !v.trim().is_empty() => Ok(v.clone()),
        (_, Backend::Simulated) => Ok(fallback.to_string()),
        (_, Backend::Browser) => Err(CliError::config(format!(
            "--{flag} is required for the browser backend"
        ))),
    };
    Ok(Environment::new(
        pick(&args.base_url, "base-url", SIMULATED_BASE_URL)?,
        pick(&args.email, "email", SIMULATED_EMAIL)?,
        pick(&args.password, "password", SIMULATED_PASSWORD)?,
        pick(&args.client_id, "client-id", SIMULATED_CLIENT_ID)?,
    ))
}

/// A started console backend
#[derive(Debug)]
pub enum PanelBackend {
    /// In-memory panel shared by every session of this process
    Simulated(SimulatedPanel),
    /// Chromium
    #[cfg(feature = "browser")]
    Browser(Arc<panel_probe::CdpConsoleFactory>),
}

impl PanelBackend {
    /// Start the configured backend
    pub async fn start(config: &CliConfig, env: Arc<Environment>) -> CliResult<Self> {
        match config.backend {
            Backend::Simulated => Ok(Self::Simulated(SimulatedPanel::new(env))),
            #[cfg(feature = "browser")]
            Backend::Browser => {
                let browser = panel_probe::BrowserConfig::default().with_headless(!config.headed);
                let factory = panel_probe::CdpConsoleFactory::launch(browser, env).await?;
                Ok(Self::Browser(Arc::new(factory)))
            }
            #[cfg(not(feature = "browser"))]
            Backend::Browser => Err(CliError::config(
                "browser backend not enabled. Rebuild with --features browser",
            )),
        }
    }

    /// Session factory for the harness
    #[must_use]
    pub fn factory(&self) -> Arc<dyn ConsoleFactory> {
        match self {
            Self::Simulated(panel) => Arc::new(panel.clone()),
            #[cfg(feature = "browser")]
            Self::Browser(factory) => Arc::clone(factory) as Arc<dyn ConsoleFactory>,
        }
    }

    /// Stop the backend
    pub async fn stop(self) -> CliResult<()> {
        match self {
            Self::Simulated(_) => Ok(()),
            #[cfg(feature = "browser")]
            Self::Browser(factory) => match Arc::try_unwrap(factory) {
                Ok(factory) => Ok(factory.shutdown().await?),
                Err(_) => Ok(()),
            },
        }
    }
}

/// Executes CLI commands
#[derive(Debug)]
pub struct CommandRunner {
    config: CliConfig,
    env_args: EnvArgs,
    ledger_path: PathBuf,
    reporter: Arc<Mutex<ProgressReporter>>,
}

impl CommandRunner {
    /// Runner for one invocation
    #[must_use]
    pub fn new(config: CliConfig, env_args: EnvArgs, ledger_path: PathBuf) -> Self {
        let reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self {
            config,
            env_args,
            ledger_path,
            reporter: Arc::new(Mutex::new(reporter)),
        }
    }

    fn reporter(&self) -> std::sync::MutexGuard<'_, ProgressReporter> {
        self.reporter.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open_ledger(&self) -> CliResult<Arc<EntityLedger>> {
        Ok(Arc::new(EntityLedger::open(&self.ledger_path)?))
    }

    /// `test`: run scenarios and fail when any of them failed
    pub async fn test(&self, args: &TestArgs) -> CliResult<()> {
        let env = Arc::new(resolve_environment(&self.env_args, self.config.backend)?);
        let ledger = self.open_ledger()?;
        let backend = PanelBackend::start(&self.config, Arc::clone(&env)).await?;
        let outcome = self
            .run_scenarios(&backend, ledger, env, args)
            .await
            .and_then(|report| check_report(&report));
        settle(outcome, backend.stop().await)
    }

    /// `cleanup`: delete every tracked entity
    pub async fn cleanup(&self, args: &CleanupArgs) -> CliResult<()> {
        let env = Arc::new(resolve_environment(&self.env_args, self.config.backend)?);
        let ledger = self.open_ledger()?;
        let backend = PanelBackend::start(&self.config, Arc::clone(&env)).await?;
        let outcome = self
            .run_cleanup_phase(&backend, &ledger, &env, args)
            .await
            .and_then(|report| check_cleanup(&report));
        settle(outcome, backend.stop().await)
    }

    /// `run`: scenarios, then cleanup even when scenarios failed
    pub async fn run(&self, args: &RunArgs) -> CliResult<()> {
        let env = Arc::new(resolve_environment(&self.env_args, self.config.backend)?);
        let ledger = self.open_ledger()?;
        let backend = PanelBackend::start(&self.config, Arc::clone(&env)).await?;

        let tests = self
            .run_scenarios(&backend, Arc::clone(&ledger), Arc::clone(&env), &args.test)
            .await;
        let cleanup = self
            .run_cleanup_phase(&backend, &ledger, &env, &args.cleanup)
            .await;
        let outcome = tests
            .and_then(|report| check_report(&report))
            .and_then(|()| cleanup.and_then(|report| check_cleanup(&report)));
        settle(outcome, backend.stop().await)
    }

    async fn run_scenarios(
        &self,
        backend: &PanelBackend,
        ledger: Arc<EntityLedger>,
        env: Arc<Environment>,
        args: &TestArgs,
    ) -> CliResult<RunReport> {
        let selected = filter_scenarios(&scenarios::all(), args.filter.as_deref())?;
        if selected.is_empty() {
            return Err(CliError::invalid_argument(format!(
                "no scenario matches {:?}",
                args.filter.as_deref().unwrap_or_default()
            )));
        }

        let config = RunConfig::default()
            .with_workers(args.workers)
            .with_retries(args.retries)
            .with_scenario_timeout(Duration::from_millis(args.timeout))
            .with_output_dir(&args.output);
        info!(
            scenarios = selected.len(),
            backend = ?self.config.backend,
            workers = config.effective_workers(),
            "starting run"
        );

        {
            let mut reporter = self.reporter();
            reporter.header("Scenarios");
            reporter.start_progress(selected.len() as u64, "running");
        }
        let observer_reporter = Arc::clone(&self.reporter);
        let harness = Harness::new(backend.factory(), ledger, env, config).with_observer(
            Arc::new(move |outcome| {
                observer_reporter
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .outcome(outcome);
            }),
        );
        let result = harness.run(&selected).await;

        let mut reporter = self.reporter();
        reporter.finish();
        let report = result?;
        reporter.summary(
            report.passed_count(),
            report.flaky_count(),
            report.failed_count(),
            report.duration,
        );
        reporter.info(&format!(
            "report written to {}",
            args.output.join(panel_probe::reporter::REPORT_FILE).display()
        ));
        Ok(report)
    }

    async fn run_cleanup_phase(
        &self,
        backend: &PanelBackend,
        ledger: &EntityLedger,
        env: &Environment,
        args: &CleanupArgs,
    ) -> CliResult<CleanupReport> {
        self.reporter().header("Cleanup");
        let options = CleanupOptions::default().with_prune_missing(args.prune_missing);
        let mut console = backend.factory().session().await?;
        let result = run_cleanup(console.as_mut(), ledger, env, options).await;
        console.close().await?;
        let report = result?;
        self.reporter().cleanup(&report);
        Ok(report)
    }

    /// `list`: print scenario ids
    pub fn list(&self, args: &ListArgs) -> CliResult<()> {
        let selected = filter_scenarios(&scenarios::all(), args.filter.as_deref())?;
        for scenario in &selected {
            println!("{}", scenario.id());
        }
        self.reporter()
            .info(&format!("{} scenarios", selected.len()));
        Ok(())
    }

    /// `ledger ...`: inspect or edit the ledger
    pub fn ledger(&self, action: &LedgerAction) -> CliResult<()> {
        let ledger = self.open_ledger()?;
        match action {
            LedgerAction::Show { json } => {
                if *json {
                    println!("{}", serde_json::to_string_pretty(&ledger.state())?);
                } else {
                    for kind in EntityKind::ALL {
                        let ids = ledger.snapshot(kind);
                        println!("{} ({}): {}", kind.field_name(), ids.len(), ids.join(", "));
                    }
                }
            }
            LedgerAction::Reset => {
                let count = ledger.len();
                ledger.reset_all()?;
                self.reporter()
                    .success(&format!("forgot {count} tracked entities"));
            }
            LedgerAction::Untrack { kind, id } => {
                ledger.untrack(*kind, id)?;
                self.reporter().success(&format!("untracked {kind} {id}"));
            }
        }
        Ok(())
    }
}

/// Combine a phase outcome with the backend shutdown; the phase error wins
fn settle<T>(outcome: CliResult<T>, stopped: CliResult<()>) -> CliResult<T> {
    match (outcome, stopped) {
        (Err(err), Err(stop_err)) => {
            warn!(error = %stop_err, "backend shutdown failed");
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
        (Ok(value), stopped) => stopped.map(|()| value),
    }
}

fn check_report(report: &RunReport) -> CliResult<()> {
    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::test_execution(format!(
            "{} of {} scenarios failed",
            report.failed_count(),
            report.outcomes.len()
        )))
    }
}

fn check_cleanup(report: &CleanupReport) -> CliResult<()> {
    if report.is_clean() {
        Ok(())
    } else {
        Err(CliError::test_execution(format!(
            "cleanup left {} entities behind",
            report.failed.len()
        )))
    }
}
