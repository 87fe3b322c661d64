//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use panel_probe::{CleanupReport, ScenarioOutcome, TestStatus};
use std::time::Duration;

/// Progress reporter for scenario runs and cleanup
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Finish progress bar
    pub fn finish(&mut self) {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }
    }

    fn line(&self, text: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.println(text);
        } else {
            let _ = self.term.write_line(text);
        }
    }

    fn prefixed(&self, symbol: &str, plain: &str, color: Style, message: &str) -> String {
        let prefix = if self.use_color {
            color.bold().apply_to(symbol).to_string()
        } else {
            plain.to_string()
        };
        format!("{prefix} {message}")
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.line(&self.prefixed("✓", "PASS", Style::new().green(), message));
        }
    }

    /// Print a failure message, even in quiet mode
    pub fn failure(&self, message: &str) {
        self.line(&self.prefixed("✗", "FAIL", Style::new().red(), message));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            self.line(&self.prefixed("⚠", "WARN", Style::new().yellow(), message));
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.line(&self.prefixed("ℹ", "INFO", Style::new().blue(), message));
        }
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Report one finished scenario
    pub fn outcome(&self, outcome: &ScenarioOutcome) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
        let id = outcome.id();
        match outcome.status {
            TestStatus::Passed => {
                if self.progress_bar.is_none() {
                    self.success(&id);
                }
            }
            TestStatus::Flaky => self.warning(&format!(
                "{id} passed after {} attempts",
                outcome.attempts
            )),
            TestStatus::Failed => self.failure(&format!(
                "{id}: {}",
                outcome.error.as_deref().unwrap_or("failed")
            )),
        }
    }

    /// Print the run summary; `passed` includes `flaky`
    pub fn summary(&self, passed: usize, flaky: usize, failed: usize, duration: Duration) {
        if self.quiet && failed == 0 {
            return;
        }

        let _ = self.term.write_line("");
        let total = passed + failed;
        let secs = duration.as_secs_f64();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let flaky_style = Style::new().yellow();
            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };
            let _ = self.term.write_line(&format!(
                "{status} {total} scenarios in {secs:.2}s ({} passed, {} flaky, {} failed)",
                passed_style.apply_to(passed),
                flaky_style.apply_to(flaky),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            let _ = self.term.write_line(&format!(
                "{status} {total} scenarios in {secs:.2}s ({passed} passed, {flaky} flaky, {failed} failed)"
            ));
        }
    }

    /// Print the cleanup result
    pub fn cleanup(&self, report: &CleanupReport) {
        for entry in &report.missing {
            self.warning(&format!("{} {} not found on the panel", entry.kind, entry.id));
        }
        for entry in &report.failed {
            self.failure(&format!(
                "{} {} could not be deleted: {}",
                entry.kind,
                entry.id,
                entry.message.as_deref().unwrap_or("no message")
            ));
        }
        if report.is_clean() {
            self.success(&format!("cleanup: {}", report.summary()));
        } else {
            self.failure(&format!("cleanup: {}", report.summary()));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod reporter_tests {
        use super::*;

        #[test]
        fn test_quiet_skips_progress() {
            let mut reporter = ProgressReporter::new(false, true);
            reporter.start_progress(10, "running");
            assert!(reporter.progress_bar.is_none());
            reporter.finish();
        }

        #[test]
        fn test_progress_lifecycle() {
            let mut reporter = ProgressReporter::new(false, false);
            reporter.start_progress(2, "running");
            assert!(reporter.progress_bar.is_some());
            let outcome = ScenarioOutcome {
                suite: "login".to_string(),
                name: "logout".to_string(),
                status: TestStatus::Passed,
                attempts: 1,
                duration: Duration::from_millis(5),
                error: None,
                artifacts: Vec::new(),
            };
            reporter.outcome(&outcome);
            assert_eq!(reporter.progress_bar.as_ref().unwrap().position(), 1);
            reporter.finish();
            assert!(reporter.progress_bar.is_none());
        }

        #[test]
        fn test_plain_prefix_without_color() {
            let reporter = ProgressReporter::new(false, false);
            let line = reporter.prefixed("✓", "PASS", Style::new().green(), "ok");
            assert_eq!(line, "PASS ok");
        }
    }
}
