//! Run configuration: target environment and harness settings.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the panel's base URL
pub const ENV_BASE_URL: &str = "BASE_URL";
/// Environment variable holding the login email
pub const ENV_LOGIN_EMAIL: &str = "LOGIN_EMAIL";
/// Environment variable holding the login password
pub const ENV_LOGIN_PASSWORD: &str = "LOGIN_PASSWORD";
/// Environment variable holding the tenant client id shown in tables
pub const ENV_CLIENT_ID: &str = "CLIENT_ID";

/// Default per-scenario timeout (30 seconds)
pub const DEFAULT_SCENARIO_TIMEOUT_MS: u64 = 30_000;
/// Default assertion timeout (5 seconds)
pub const DEFAULT_EXPECT_TIMEOUT_MS: u64 = 5_000;
/// Default retry count for failed scenarios
pub const DEFAULT_RETRIES: u32 = 1;

/// The panel under test and its credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Account email
    pub login_email: String,
    /// Account password
    pub login_password: String,
    /// Tenant client id every created domain and parameter carries
    pub client_id: String,
}

impl Environment {
    /// Build an environment, trimming a trailing slash from the URL
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        login_email: impl Into<String>,
        login_password: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            login_email: login_email.into(),
            login_password: login_password.into(),
            client_id: client_id.into(),
        }
    }

    /// Read `BASE_URL`, `LOGIN_EMAIL`, `LOGIN_PASSWORD` and `CLIENT_ID`
    pub fn from_env() -> ProbeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ProbeResult<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ProbeError::config(format!("{key} is not set")))
        };
        Ok(Self::new(
            required(ENV_BASE_URL)?,
            required(ENV_LOGIN_EMAIL)?,
            required(ENV_LOGIN_PASSWORD)?,
            required(ENV_CLIENT_ID)?,
        ))
    }

    /// Absolute URL for a panel path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Path component of an absolute panel URL
    #[must_use]
    pub fn path_of<'a>(&self, url: &'a str) -> &'a str {
        let rest = url.strip_prefix(self.base_url.as_str()).unwrap_or(url);
        if rest.is_empty() {
            "/"
        } else {
            rest
        }
    }
}

/// Harness settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Concurrent sessions (0 = one per available CPU)
    pub workers: usize,
    /// Extra attempts for a failed scenario
    pub retries: u32,
    /// Budget for one scenario attempt, including its setup
    pub scenario_timeout: Duration,
    /// Where reports and failure artifacts go
    pub output_dir: PathBuf,
    /// Regex over `suite::scenario` ids
    pub filter: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            retries: DEFAULT_RETRIES,
            scenario_timeout: Duration::from_millis(DEFAULT_SCENARIO_TIMEOUT_MS),
            output_dir: PathBuf::from("test-results"),
            filter: None,
        }
    }
}

impl RunConfig {
    /// Set worker count
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set retry count
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set scenario timeout
    #[must_use]
    pub const fn with_scenario_timeout(mut self, timeout: Duration) -> Self {
        self.scenario_timeout = timeout;
        self
    }

    /// Set output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set scenario filter
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Attempts per scenario: the first run plus retries
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Effective worker count
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        }
    }
}
