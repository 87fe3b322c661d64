//! PanelDriver: the browser primitives page objects are built on.
//!
//! Implementations auto-wait: actions on a locator poll until an element
//! matches or the locator's timeout expires. [`MockDriver`] records every call
//! and answers from scripted tables keyed by the selector's display form, so
//! page objects can be tested without a browser.

use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

/// Low-level browser operations used by the page objects
#[async_trait]
pub trait PanelDriver: Send + Sync {
    /// Navigate to an absolute URL
    async fn goto(&mut self, url: &str) -> ProbeResult<()>;

    /// Reload the current page
    async fn reload(&mut self) -> ProbeResult<()>;

    /// Current absolute URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Click the first match
    async fn click(&mut self, locator: &Locator) -> ProbeResult<()>;

    /// Replace the value of the first matching input
    ///
    /// Number inputs reject non-numeric text with [`ProbeError::InputRejected`].
    async fn fill(&mut self, locator: &Locator, value: &str) -> ProbeResult<()>;

    /// Choose an option of the first matching `<select>` by value or label
    async fn select_option(&mut self, locator: &Locator, value: &str) -> ProbeResult<()>;

    /// Set a checkbox state
    async fn set_checked(&mut self, locator: &Locator, checked: bool) -> ProbeResult<()>;

    /// Number of visible matches, without waiting
    async fn count(&self, locator: &Locator) -> ProbeResult<usize>;

    /// Normalized text of every visible match
    async fn inner_texts(&self, locator: &Locator) -> ProbeResult<Vec<String>>;

    /// Current value of the first matching input
    async fn input_value(&self, locator: &Locator) -> ProbeResult<String>;

    /// Whether the first match has keyboard focus
    async fn is_focused(&self, locator: &Locator) -> ProbeResult<bool>;

    /// Evaluate a script and return its JSON result
    async fn evaluate(&self, script: &str) -> ProbeResult<serde_json::Value>;

    /// Alert messages raised since the previous call
    async fn take_dialogs(&mut self) -> ProbeResult<Vec<String>>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> ProbeResult<Vec<u8>>;

    /// Let the page settle
    async fn pause(&mut self, duration: Duration) -> ProbeResult<()>;

    /// Close the page
    async fn close(&mut self) -> ProbeResult<()>;
}

/// Whether the locator currently has at least one visible match
pub async fn is_visible<D: PanelDriver + ?Sized>(
    driver: &D,
    locator: &Locator,
) -> ProbeResult<bool> {
    Ok(driver.count(locator).await? > 0)
}

/// Poll until `predicate(count)` holds or the locator times out
pub async fn wait_for_count<D, F>(driver: &D, locator: &Locator, predicate: F) -> ProbeResult<usize>
where
    D: PanelDriver + ?Sized,
    F: Fn(usize) -> bool + Send,
{
    let options = *locator.options();
    let started = Instant::now();
    loop {
        let count = driver.count(locator).await?;
        if predicate(count) {
            return Ok(count);
        }
        if started.elapsed() >= options.timeout {
            return Err(ProbeError::Timeout {
                ms: options.timeout.as_millis() as u64,
                what: format!("{locator} (last count {count})"),
            });
        }
        tokio::time::sleep(options.poll_interval).await;
    }
}

/// Poll until the locator has a visible match
pub async fn wait_for_visible<D: PanelDriver + ?Sized>(
    driver: &D,
    locator: &Locator,
) -> ProbeResult<()> {
    wait_for_count(driver, locator, |count| count > 0)
        .await
        .map(|_| ())
}

/// One recorded driver call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    /// goto(url)
    Goto(String),
    /// reload()
    Reload,
    /// click(selector)
    Click(String),
    /// fill(selector, value)
    Fill(String, String),
    /// select_option(selector, value)
    Select(String, String),
    /// set_checked(selector, state)
    Check(String, bool),
    /// pause(ms)
    Pause(u64),
    /// close()
    Close,
}

/// Scripted driver for unit tests
#[derive(Debug, Default)]
pub struct MockDriver {
    /// Current URL
    pub current_url: String,
    /// Call history for verification
    pub call_history: Vec<DriverCall>,
    counts: HashMap<String, usize>,
    texts: HashMap<String, Vec<String>>,
    values: HashMap<String, String>,
    focused: HashSet<String>,
    number_inputs: HashSet<String>,
    navigations: HashMap<String, String>,
    dialogs: VecDeque<String>,
    js_results: std::sync::Mutex<VecDeque<serde_json::Value>>,
    screenshot: Vec<u8>,
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the visible count for a locator
    pub fn set_count(&mut self, locator: &Locator, count: usize) {
        self.counts.insert(locator.to_string(), count);
    }

    /// Script the texts for a locator (also sets its count)
    pub fn set_texts(&mut self, locator: &Locator, texts: Vec<String>) {
        self.counts.insert(locator.to_string(), texts.len());
        self.texts.insert(locator.to_string(), texts);
    }

    /// Script an input value
    pub fn set_value(&mut self, locator: &Locator, value: impl Into<String>) {
        self.values.insert(locator.to_string(), value.into());
    }

    /// Mark a locator as focused
    pub fn set_focused(&mut self, locator: &Locator) {
        self.focused.insert(locator.to_string());
    }

    /// Mark a locator as a number input
    pub fn set_number_input(&mut self, locator: &Locator) {
        self.number_inputs.insert(locator.to_string());
    }

    /// Navigate to `url` whenever `locator` is clicked
    pub fn navigate_on_click(&mut self, locator: &Locator, url: impl Into<String>) {
        self.navigations.insert(locator.to_string(), url.into());
    }

    /// Queue an alert message
    pub fn push_dialog(&mut self, message: impl Into<String>) {
        self.dialogs.push_back(message.into());
    }

    /// Queue a result for the next `evaluate` call
    pub fn push_js_result(&mut self, value: serde_json::Value) {
        self.js_results
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push_back(value);
    }

    /// Set screenshot bytes
    pub fn set_screenshot(&mut self, bytes: Vec<u8>) {
        self.screenshot = bytes;
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[DriverCall] {
        &self.call_history
    }

    /// Values filled into a locator, in order
    #[must_use]
    pub fn filled(&self, locator: &Locator) -> Vec<&str> {
        let key = locator.to_string();
        self.call_history
            .iter()
            .filter_map(|call| match call {
                DriverCall::Fill(selector, value) if *selector == key => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether a locator was clicked
    #[must_use]
    pub fn was_clicked(&self, locator: &Locator) -> bool {
        let key = locator.to_string();
        self.call_history
            .iter()
            .any(|call| matches!(call, DriverCall::Click(selector) if *selector == key))
    }
}

#[async_trait]
impl PanelDriver for MockDriver {
    async fn goto(&mut self, url: &str) -> ProbeResult<()> {
        self.call_history.push(DriverCall::Goto(url.to_string()));
        self.current_url = url.to_string();
        Ok(())
    }

    async fn reload(&mut self) -> ProbeResult<()> {
        self.call_history.push(DriverCall::Reload);
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.current_url.clone())
    }

    async fn click(&mut self, locator: &Locator) -> ProbeResult<()> {
        let key = locator.to_string();
        if let Some(url) = self.navigations.get(&key) {
            self.current_url = url.clone();
        }
        self.call_history.push(DriverCall::Click(key));
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> ProbeResult<()> {
        let key = locator.to_string();
        if self.number_inputs.contains(&key) && value.trim().parse::<f64>().is_err() {
            return Err(ProbeError::InputRejected {
                field: key,
                value: value.to_string(),
            });
        }
        self.values.insert(key.clone(), value.to_string());
        self.call_history.push(DriverCall::Fill(key, value.to_string()));
        Ok(())
    }

    async fn select_option(&mut self, locator: &Locator, value: &str) -> ProbeResult<()> {
        let key = locator.to_string();
        self.values.insert(key.clone(), value.to_string());
        self.call_history
            .push(DriverCall::Select(key, value.to_string()));
        Ok(())
    }

    async fn set_checked(&mut self, locator: &Locator, checked: bool) -> ProbeResult<()> {
        self.call_history
            .push(DriverCall::Check(locator.to_string(), checked));
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> ProbeResult<usize> {
        Ok(self.counts.get(&locator.to_string()).copied().unwrap_or(0))
    }

    async fn inner_texts(&self, locator: &Locator) -> ProbeResult<Vec<String>> {
        Ok(self
            .texts
            .get(&locator.to_string())
            .cloned()
            .unwrap_or_default())
    }

    async fn input_value(&self, locator: &Locator) -> ProbeResult<String> {
        self.values
            .get(&locator.to_string())
            .cloned()
            .ok_or_else(|| ProbeError::ElementNotFound {
                selector: locator.to_string(),
            })
    }

    async fn is_focused(&self, locator: &Locator) -> ProbeResult<bool> {
        Ok(self.focused.contains(&locator.to_string()))
    }

    async fn evaluate(&self, _script: &str) -> ProbeResult<serde_json::Value> {
        let mut results = self
            .js_results
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(results.pop_front().unwrap_or(serde_json::Value::Null))
    }

    async fn take_dialogs(&mut self) -> ProbeResult<Vec<String>> {
        Ok(self.dialogs.drain(..).collect())
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        Ok(self.screenshot.clone())
    }

    async fn pause(&mut self, duration: Duration) -> ProbeResult<()> {
        self.call_history
            .push(DriverCall::Pause(duration.as_millis() as u64));
        Ok(())
    }

    async fn close(&mut self) -> ProbeResult<()> {
        self.call_history.push(DriverCall::Close);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod mock_driver_tests {
        use super::*;

        #[tokio::test]
        async fn test_goto_and_history() {
            let mut driver = MockDriver::new();
            driver.goto("https://panel.test/").await.unwrap();
            driver.reload().await.unwrap();
            driver.close().await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "https://panel.test/");
            assert_eq!(
                driver.history(),
                &[
                    DriverCall::Goto("https://panel.test/".to_string()),
                    DriverCall::Reload,
                    DriverCall::Close
                ]
            );
        }

        #[tokio::test]
        async fn test_scripted_counts_and_texts() {
            let mut driver = MockDriver::new();
            let rows = Locator::css("table tbody tr");
            driver.set_texts(&rows, vec!["1 acme".to_string(), "2 beta".to_string()]);
            assert_eq!(driver.count(&rows).await.unwrap(), 2);
            assert_eq!(driver.inner_texts(&rows).await.unwrap().len(), 2);
            assert!(!is_visible(&driver, &Locator::css("dialog")).await.unwrap());
        }

        #[tokio::test]
        async fn test_evaluate_pops_queued_results() {
            let mut driver = MockDriver::new();
            driver.push_js_result(serde_json::json!([["1", "acme"]]));
            let first = driver.evaluate("tables()").await.unwrap();
            assert_eq!(first[0][1], "acme");
            assert!(driver.evaluate("tables()").await.unwrap().is_null());
        }

        #[tokio::test]
        async fn test_number_input_rejects_text() {
            let mut driver = MockDriver::new();
            let age = Locator::css("input[name=age]");
            driver.set_number_input(&age);
            let err = driver.fill(&age, "abcdef").await.unwrap_err();
            assert!(matches!(err, ProbeError::InputRejected { .. }));
            driver.fill(&age, "42").await.unwrap();
            assert_eq!(driver.input_value(&age).await.unwrap(), "42");
        }

        #[tokio::test]
        async fn test_click_navigation_and_dialogs() {
            let mut driver = MockDriver::new();
            let submit = Locator::role("button", "Войти");
            driver.navigate_on_click(&submit, "https://panel.test/dashboard");
            driver.push_dialog("Заполните все обязательные поля");
            driver.click(&submit).await.unwrap();
            assert!(driver.was_clicked(&submit));
            assert_eq!(driver.current_url, "https://panel.test/dashboard");
            assert_eq!(driver.take_dialogs().await.unwrap().len(), 1);
            assert!(driver.take_dialogs().await.unwrap().is_empty());
        }
    }

    mod wait_tests {
        use super::*;

        #[tokio::test]
        async fn test_wait_for_visible_times_out() {
            let driver = MockDriver::new();
            let locator = Locator::text("Успешно удалено")
                .with_timeout(Duration::from_millis(30))
                .with_poll_interval(Duration::from_millis(5));
            let err = wait_for_visible(&driver, &locator).await.unwrap_err();
            assert!(matches!(err, ProbeError::Timeout { ms: 30, .. }));
        }

        #[tokio::test]
        async fn test_wait_for_count_returns_immediately() {
            let mut driver = MockDriver::new();
            let locator = Locator::css("tr");
            driver.set_count(&locator, 3);
            let count = wait_for_count(&driver, &locator, |c| c == 3).await.unwrap();
            assert_eq!(count, 3);
        }
    }
}
