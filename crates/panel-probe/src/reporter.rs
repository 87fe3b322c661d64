//! Run reports: per-scenario outcomes and the `report.json` artifact.

use crate::result::ProbeResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// File name of the JSON report inside the output directory
pub const REPORT_FILE: &str = "report.json";

/// Scenario result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Passed on the first attempt
    Passed,
    /// Passed after at least one failed attempt
    Flaky,
    /// Every attempt failed
    Failed,
}

impl TestStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed | Self::Flaky)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// One scenario's result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Suite name
    pub suite: String,
    /// Scenario name
    pub name: String,
    /// Final status
    pub status: TestStatus,
    /// Attempts made
    pub attempts: u32,
    /// Wall time over all attempts
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// Error of the last failed attempt
    pub error: Option<String>,
    /// Screenshots captured for failed attempts
    pub artifacts: Vec<PathBuf>,
}

impl ScenarioOutcome {
    /// `suite::name`
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}::{}", self.suite, self.name)
    }
}

/// Result of one harness run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run identifier
    pub run_id: Uuid,
    /// Backend the scenarios ran against
    pub backend: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Total wall time
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// Outcomes in completion order
    pub outcomes: Vec<ScenarioOutcome>,
}

impl RunReport {
    /// Empty report for a new run
    #[must_use]
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            backend: backend.into(),
            started_at: Utc::now(),
            duration: Duration::ZERO,
            outcomes: Vec::new(),
        }
    }

    /// Count passed (including flaky) scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_passed()).count()
    }

    /// Count flaky scenarios
    #[must_use]
    pub fn flaky_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == TestStatus::Flaky)
            .count()
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.is_failed()).count()
    }

    /// Check if all scenarios passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// Get failed scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_failed()).collect()
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} passed ({} flaky), {} failed in {:.1}s",
            self.passed_count(),
            self.flaky_count(),
            self.failed_count(),
            self.duration.as_secs_f64()
        )
    }

    /// Write `report.json` into `dir`, creating it if needed
    pub fn write_json(&self, dir: &Path) -> ProbeResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(REPORT_FILE);
        std::fs::write(&path, serde_json::to_vec_pretty(self)?)?;
        Ok(path)
    }

    /// Read a report written by [`RunReport::write_json`]
    pub fn read_json(path: &Path) -> ProbeResult<Self> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn outcome(name: &str, status: TestStatus) -> ScenarioOutcome {
        ScenarioOutcome {
            suite: "domains".to_string(),
            name: name.to_string(),
            status,
            attempts: 1,
            duration: Duration::from_millis(120),
            error: status.is_failed().then(|| "boom".to_string()),
            artifacts: Vec::new(),
        }
    }

    mod report_tests {
        use super::*;

        #[test]
        fn test_counts_and_summary() {
            let mut report = RunReport::new("simulated");
            report.outcomes.push(outcome("a", TestStatus::Passed));
            report.outcomes.push(outcome("b", TestStatus::Flaky));
            report.outcomes.push(outcome("c", TestStatus::Failed));
            assert_eq!(report.passed_count(), 2);
            assert_eq!(report.flaky_count(), 1);
            assert_eq!(report.failed_count(), 1);
            assert!(!report.all_passed());
            assert_eq!(report.failures()[0].id(), "domains::c");
            assert!(report.summary().starts_with("2 passed (1 flaky), 1 failed"));
        }

        #[test]
        fn test_json_written_and_read_back() {
            let dir = TempDir::new().unwrap();
            let mut report = RunReport::new("simulated");
            report.outcomes.push(outcome("a", TestStatus::Passed));
            let path = report.write_json(&dir.path().join("out")).unwrap();
            assert!(path.ends_with("report.json"));

            let raw: serde_json::Value =
                serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
            assert_eq!(raw["outcomes"][0]["status"], "passed");
            assert_eq!(raw["outcomes"][0]["duration"], 120);

            let back = RunReport::read_json(&path).unwrap();
            assert_eq!(back.run_id, report.run_id);
        }
    }
}
