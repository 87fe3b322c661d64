//! Scenario harness.
//!
//! Each [`Scenario`] runs in a fresh console session with its own
//! [`ScenarioContext`]. The harness fans scenarios out over `workers`
//! concurrent sessions, bounds every attempt by the scenario timeout, retries
//! failures, saves a screenshot per failed attempt and writes `report.json`.

use crate::config::{Environment, RunConfig};
use crate::console::{AdminConsole, ConsoleFactory, DomainForm, ParamForm, Signal, UserForm, View};
use crate::data::DataGenerator;
use crate::ledger::{EntityKind, EntityLedger};
use crate::reporter::{RunReport, ScenarioOutcome, TestStatus};
use crate::result::{ProbeError, ProbeResult};
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Future returned by scenario steps
pub type ScenarioFuture<'a> = BoxFuture<'a, ProbeResult<()>>;

/// A scenario step
pub type ScenarioFn = for<'a> fn(&'a mut ScenarioContext) -> ScenarioFuture<'a>;

/// Called with every finished scenario
pub type OutcomeObserver = Arc<dyn Fn(&ScenarioOutcome) + Send + Sync>;

/// Directory under the output dir holding failure screenshots
pub const ARTIFACTS_DIR: &str = "artifacts";

/// A named end-to-end scenario
#[derive(Clone, Copy)]
pub struct Scenario {
    /// Suite name
    pub suite: &'static str,
    /// Scenario name
    pub name: &'static str,
    /// Fixture run before the body, inside the same attempt
    pub setup: Option<ScenarioFn>,
    /// Scenario body
    pub body: ScenarioFn,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("suite", &self.suite)
            .field("name", &self.name)
            .field("has_setup", &self.setup.is_some())
            .finish_non_exhaustive()
    }
}

impl Scenario {
    /// Scenario without a fixture
    #[must_use]
    pub const fn new(suite: &'static str, name: &'static str, body: ScenarioFn) -> Self {
        Self {
            suite,
            name,
            setup: None,
            body,
        }
    }

    /// Set the fixture
    #[must_use]
    pub const fn with_setup(mut self, setup: ScenarioFn) -> Self {
        self.setup = Some(setup);
        self
    }

    /// `suite::name`
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}::{}", self.suite, self.name)
    }
}

/// Scenarios whose id matches `pattern`; all of them when `None`
pub fn filter_scenarios(scenarios: &[Scenario], pattern: Option<&str>) -> ProbeResult<Vec<Scenario>> {
    let Some(pattern) = pattern else {
        return Ok(scenarios.to_vec());
    };
    let re = Regex::new(pattern)
        .map_err(|e| ProbeError::config(format!("invalid filter {pattern:?}: {e}")))?;
    Ok(scenarios
        .iter()
        .filter(|s| re.is_match(&s.id()))
        .copied()
        .collect())
}

/// Ledger kind recorded for rows of a view
#[must_use]
pub const fn kind_of(view: View) -> EntityKind {
    match view {
        View::Domains => EntityKind::Domain,
        View::ProfileParams => EntityKind::Param,
        View::Users => EntityKind::User,
    }
}

/// View listing entities of a ledger kind
#[must_use]
pub const fn view_of(kind: EntityKind) -> View {
    match kind {
        EntityKind::Domain => View::Domains,
        EntityKind::Param => View::ProfileParams,
        EntityKind::User => View::Users,
    }
}

/// Everything a scenario step can use
pub struct ScenarioContext {
    /// Session for this attempt
    pub console: Box<dyn AdminConsole>,
    /// Shared ledger
    pub ledger: Arc<EntityLedger>,
    /// Target environment
    pub env: Arc<Environment>,
    /// Test data
    pub data: DataGenerator,
    /// Domain created by the fixture
    pub domain_id: Option<String>,
}

impl fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("ledger", &self.ledger.path())
            .field("base_url", &self.env.base_url)
            .field("domain_id", &self.domain_id)
            .finish_non_exhaustive()
    }
}

impl ScenarioContext {
    /// Context over a session
    #[must_use]
    pub fn new(
        console: Box<dyn AdminConsole>,
        ledger: Arc<EntityLedger>,
        env: Arc<Environment>,
    ) -> Self {
        Self {
            console,
            ledger,
            env,
            data: DataGenerator::new(),
            domain_id: None,
        }
    }

    /// Log in with the environment's credentials
    pub async fn login(&mut self) -> ProbeResult<()> {
        let email = self.env.login_email.clone();
        let password = self.env.login_password.clone();
        self.console
            .login(&email, &password)
            .await?
            .expect_success("login")
    }

    /// Domain id from the fixture
    pub fn domain_id(&self) -> ProbeResult<String> {
        self.domain_id
            .clone()
            .ok_or_else(|| ProbeError::config("scenario has no domain fixture"))
    }

    /// Submit the domain form; tracks the domain when creation succeeds
    pub async fn submit_domain(&mut self, form: &DomainForm) -> ProbeResult<Signal> {
        let signal = self.console.create_domain(form).await?;
        if signal.is_success() {
            self.ledger.track_domain(&form.domain)?;
        }
        Ok(signal)
    }

    /// Submit the parameter form; tracks the parameter when creation succeeds
    pub async fn submit_param(&mut self, form: &ParamForm) -> ProbeResult<Signal> {
        let signal = self.console.create_param(form).await?;
        if signal.is_success() {
            self.ledger.track_param(&form.name)?;
        }
        Ok(signal)
    }

    /// Submit the user form; tracks the user when creation succeeds
    pub async fn submit_user(&mut self, form: &UserForm) -> ProbeResult<Signal> {
        let signal = self.console.create_user(form).await?;
        if signal.is_success() {
            self.ledger.track_user(&form.nickname)?;
        }
        Ok(signal)
    }

    /// Create a domain on the open domains view and return its id
    pub async fn create_domain(&mut self, form: &DomainForm) -> ProbeResult<String> {
        self.submit_domain(form)
            .await?
            .expect_success("create domain")?;
        let row = self
            .console
            .find_row(View::Domains, &form.domain)
            .await?
            .ok_or_else(|| ProbeError::RowNotFound {
                view: View::Domains.to_string(),
                key: form.domain.clone(),
            })?;
        Ok(row.cell(0).to_string())
    }

    /// Create a parameter on the open parameters view
    pub async fn create_param(&mut self, form: &ParamForm) -> ProbeResult<()> {
        self.submit_param(form)
            .await?
            .expect_success("create parameter")
    }

    /// Create a user on the open users view
    pub async fn create_user(&mut self, form: &UserForm) -> ProbeResult<()> {
        self.submit_user(form).await?.expect_success("create user")
    }

    /// Delete a row; untracks it when deletion succeeds
    pub async fn delete(&mut self, view: View, key: &str) -> ProbeResult<Signal> {
        let signal = self.console.delete_row(view, key).await?;
        if signal.is_success() {
            self.ledger.untrack(kind_of(view), key)?;
        }
        Ok(signal)
    }
}

/// Runs scenarios against a console factory
pub struct Harness {
    factory: Arc<dyn ConsoleFactory>,
    ledger: Arc<EntityLedger>,
    env: Arc<Environment>,
    config: RunConfig,
    observer: Option<OutcomeObserver>,
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("backend", &self.factory.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Harness {
    /// Create a harness
    #[must_use]
    pub fn new(
        factory: Arc<dyn ConsoleFactory>,
        ledger: Arc<EntityLedger>,
        env: Arc<Environment>,
        config: RunConfig,
    ) -> Self {
        Self {
            factory,
            ledger,
            env,
            config,
            observer: None,
        }
    }

    /// Call `observer` as each scenario finishes
    #[must_use]
    pub fn with_observer(mut self, observer: OutcomeObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Harness settings
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run the scenarios matching the configured filter
    pub async fn run(&self, scenarios: &[Scenario]) -> ProbeResult<RunReport> {
        let selected = filter_scenarios(scenarios, self.config.filter.as_deref())?;
        let workers = self.config.effective_workers();
        let mut report = RunReport::new(self.factory.name());
        let started = Instant::now();
        info!(
            scenarios = selected.len(),
            workers,
            backend = self.factory.name(),
            "starting run"
        );

        report.outcomes = stream::iter(selected)
            .map(|scenario| self.run_scenario(scenario))
            .buffer_unordered(workers)
            .collect()
            .await;
        report.duration = started.elapsed();

        let path = report.write_json(&self.config.output_dir)?;
        info!(report = %path.display(), summary = %report.summary(), "run finished");
        Ok(report)
    }

    async fn run_scenario(&self, scenario: Scenario) -> ScenarioOutcome {
        let started = Instant::now();
        let max_attempts = self.config.max_attempts();
        let mut artifacts = Vec::new();
        let mut last_error = None;
        let mut attempts = 0;

        while attempts < max_attempts {
            attempts += 1;
            match self.attempt(scenario, attempts, &mut artifacts).await {
                Ok(()) => {
                    last_error = None;
                    break;
                }
                Err(err) => {
                    warn!(scenario = %scenario.id(), attempt = attempts, error = %err, "attempt failed");
                    last_error = Some(err.to_string());
                }
            }
        }

        let status = match (&last_error, attempts) {
            (Some(_), _) => TestStatus::Failed,
            (None, 1) => TestStatus::Passed,
            (None, _) => TestStatus::Flaky,
        };
        info!(scenario = %scenario.id(), ?status, attempts, "scenario finished");

        let outcome = ScenarioOutcome {
            suite: scenario.suite.to_string(),
            name: scenario.name.to_string(),
            status,
            attempts,
            duration: started.elapsed(),
            error: last_error,
            artifacts,
        };
        if let Some(observer) = &self.observer {
            observer(&outcome);
        }
        outcome
    }

    async fn attempt(
        &self,
        scenario: Scenario,
        attempt: u32,
        artifacts: &mut Vec<PathBuf>,
    ) -> ProbeResult<()> {
        let console = self.factory.session().await?;
        let mut ctx = ScenarioContext::new(console, Arc::clone(&self.ledger), Arc::clone(&self.env));
        let timeout = self.config.scenario_timeout;

        let result = tokio::time::timeout(timeout, async {
            if let Some(setup) = scenario.setup {
                setup(&mut ctx).await?;
            }
            (scenario.body)(&mut ctx).await
        })
        .await
        .unwrap_or_else(|_| {
            Err(ProbeError::Timeout {
                ms: timeout.as_millis() as u64,
                what: scenario.id(),
            })
        });

        if result.is_err() {
            if let Some(path) = self.capture(&mut ctx, scenario, attempt).await {
                artifacts.push(path);
            }
        }
        if let Err(err) = ctx.console.close().await {
            warn!(scenario = %scenario.id(), error = %err, "failed to close session");
        }
        result
    }

    async fn capture(
        &self,
        ctx: &mut ScenarioContext,
        scenario: Scenario,
        attempt: u32,
    ) -> Option<PathBuf> {
        let bytes = match ctx.console.screenshot().await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => return None,
            Err(err) => {
                warn!(scenario = %scenario.id(), error = %err, "screenshot failed");
                return None;
            }
        };
        let dir = self.config.output_dir.join(ARTIFACTS_DIR);
        let path = dir.join(format!(
            "{}-{}-attempt{attempt}.png",
            scenario.suite, scenario.name
        ));
        if let Err(err) = tokio::fs::create_dir_all(&dir).await {
            warn!(dir = %dir.display(), error = %err, "failed to create artifacts dir");
            return None;
        }
        match tokio::fs::write(&path, bytes).await {
            Ok(()) => Some(path),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to save screenshot");
                None
            }
        }
    }
}
