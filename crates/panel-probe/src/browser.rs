//! Browser-backed console.
//!
//! [`BrowserConsole`] drives the panel's pages through any [`PanelDriver`].
//! With the `browser` feature, [`CdpDriver`] implements the driver over the
//! Chrome DevTools Protocol via chromiumoxide and [`CdpConsoleFactory`] opens
//! one page per scenario in a shared browser.

use crate::config::Environment;
use crate::console::{
    row_by_key, AdminConsole, DomainForm, DynamicField, EditorSnapshot, ParamForm, Signal,
    TableRow, UserEdit, UserForm, View,
};
use crate::driver::{wait_for_visible, PanelDriver};
use crate::locator::Locator;
use crate::page_object::{
    is_dashboard_landing, nav_link, param_type_of_input, row_delete_button, table_cells_script,
    text, DomainsPage, LoginPage, ProfileParamsPage, Settle, UsersPage,
};
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Browser configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Settle times between actions
    pub settle: Settle,
    /// Budget for each expectation
    pub expect_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            chromium_path: None,
            sandbox: true,
            settle: Settle::default(),
            expect_timeout: Duration::from_millis(crate::config::DEFAULT_EXPECT_TIMEOUT_MS),
        }
    }
}

impl BrowserConfig {
    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport size
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set settle times
    #[must_use]
    pub const fn with_settle(mut self, settle: Settle) -> Self {
        self.settle = settle;
        self
    }

    /// Set expectation timeout
    #[must_use]
    pub const fn with_expect_timeout(mut self, timeout: Duration) -> Self {
        self.expect_timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct RenderedField {
    name: String,
    #[serde(rename = "type")]
    input_type: String,
    required: bool,
}

/// [`AdminConsole`] implemented with page objects over a driver
#[derive(Debug)]
pub struct BrowserConsole<D: PanelDriver> {
    driver: D,
    env: Arc<Environment>,
    settle: Settle,
    expect_timeout: Duration,
    login: LoginPage,
    domains: DomainsPage,
    params: ProfileParamsPage,
    users: UsersPage,
}

impl<D: PanelDriver> BrowserConsole<D> {
    /// Wrap a driver
    pub fn new(driver: D, env: Arc<Environment>) -> Self {
        Self {
            driver,
            env,
            settle: Settle::default(),
            expect_timeout: Duration::from_millis(crate::config::DEFAULT_EXPECT_TIMEOUT_MS),
            login: LoginPage,
            domains: DomainsPage,
            params: ProfileParamsPage,
            users: UsersPage,
        }
    }

    /// Set settle times
    #[must_use]
    pub fn with_settle(mut self, settle: Settle) -> Self {
        self.settle = settle;
        self
    }

    /// Set expectation timeout
    #[must_use]
    pub fn with_expect_timeout(mut self, timeout: Duration) -> Self {
        self.expect_timeout = timeout;
        self
    }

    /// The underlying driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Consume the console, returning the driver
    pub fn into_driver(self) -> D {
        self.driver
    }

    fn expecting(&self, locator: Locator) -> Locator {
        locator.with_timeout(self.expect_timeout)
    }

    /// Poll for an alert or one of the notifications until the expectation
    /// timeout; `Silent` when nothing shows up.
    async fn observe(&mut self, successes: &[&str], errors: &[&str]) -> ProbeResult<Signal> {
        self.driver.pause(self.settle.after_submit).await?;
        let started = Instant::now();
        loop {
            if let Some(message) = self.driver.take_dialogs().await?.into_iter().next() {
                return Ok(Signal::Alert(message));
            }
            for needle in errors {
                let texts = self.driver.inner_texts(&Locator::text(*needle)).await?;
                if let Some(message) = texts.into_iter().next() {
                    return Ok(Signal::Error(message));
                }
            }
            for needle in successes {
                if self.driver.count(&Locator::text(*needle)).await? > 0 {
                    return Ok(Signal::Success((*needle).to_string()));
                }
            }
            if started.elapsed() >= self.expect_timeout {
                return Ok(Signal::Silent);
            }
            tokio::time::sleep(Duration::from_millis(crate::locator::DEFAULT_POLL_INTERVAL_MS))
                .await;
        }
    }

    async fn table(&mut self) -> ProbeResult<Vec<TableRow>> {
        let value = self.driver.evaluate(&table_cells_script()).await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        let cells: Vec<Vec<String>> = serde_json::from_value(value)?;
        Ok(cells.into_iter().map(TableRow::new).collect())
    }

    async fn row_index(&mut self, view: View, key: &str) -> ProbeResult<usize> {
        self.table()
            .await?
            .iter()
            .position(|row| row.cell(view.key_column()) == key)
            .ok_or_else(|| ProbeError::RowNotFound {
                view: view.to_string(),
                key: key.to_string(),
            })
    }

    async fn rendered_fields(&mut self) -> ProbeResult<Vec<DynamicField>> {
        let value = self
            .driver
            .evaluate(&self.users.dynamic_fields_script())
            .await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        let fields: Vec<RenderedField> = serde_json::from_value(value)?;
        Ok(fields
            .into_iter()
            .map(|field| DynamicField {
                kind: param_type_of_input(&field.input_type),
                name: field.name,
                required: field.required,
            })
            .collect())
    }

    async fn select_user_domain(&mut self, domain_id: &str) -> ProbeResult<()> {
        self.driver
            .select_option(&self.users.domain_select(), domain_id)
            .await?;
        self.driver.pause(self.settle.after_load).await
    }

    async fn fill_if_set(&mut self, locator: Locator, value: &str) -> ProbeResult<()> {
        if value.is_empty() {
            return Ok(());
        }
        self.driver.fill(&locator, value).await
    }
}

#[async_trait]
impl<D: PanelDriver> AdminConsole for BrowserConsole<D> {
    async fn login(&mut self, email: &str, password: &str) -> ProbeResult<Signal> {
        self.driver.goto(&self.env.url("/")).await?;
        let email_input = self.login.email_input();
        let password_input = self.login.password_input();
        self.driver.fill(&email_input, email).await?;
        self.driver.fill(&password_input, password).await?;
        self.driver.click(&self.login.submit_button()).await?;
        self.driver.pause(self.settle.after_submit).await?;

        let started = Instant::now();
        loop {
            let path = self.current_path().await?;
            if is_dashboard_landing(&path) {
                debug!(%path, "logged in");
                return Ok(Signal::Success(path));
            }
            if self
                .driver
                .count(&Locator::text(text::LOGIN_FAILED))
                .await?
                > 0
            {
                return Ok(Signal::Error(text::LOGIN_FAILED.to_string()));
            }
            if email.is_empty() && self.driver.is_focused(&email_input).await? {
                return Ok(Signal::Invalid("email".to_string()));
            }
            if password.is_empty() && self.driver.is_focused(&password_input).await? {
                return Ok(Signal::Invalid("password".to_string()));
            }
            if started.elapsed() >= self.expect_timeout {
                return Ok(Signal::Silent);
            }
            tokio::time::sleep(Duration::from_millis(crate::locator::DEFAULT_POLL_INTERVAL_MS))
                .await;
        }
    }

    async fn logout(&mut self) -> ProbeResult<Signal> {
        self.driver.click(&self.login.logout_link()).await?;
        self.observe(&[text::LOGGED_OUT], &[]).await
    }

    async fn visit(&mut self, path: &str) -> ProbeResult<()> {
        self.driver.goto(&self.env.url(path)).await?;
        self.driver.pause(self.settle.after_submit).await
    }

    async fn current_path(&self) -> ProbeResult<String> {
        let url = self.driver.current_url().await?;
        let path = self.env.path_of(&url);
        let path = path.split(['?', '#']).next().unwrap_or("/");
        Ok(if path.is_empty() { "/" } else { path }.to_string())
    }

    async fn has_text(&mut self, needle: &str) -> ProbeResult<bool> {
        let locator = self.expecting(Locator::text(needle));
        match wait_for_visible(&self.driver, &locator).await {
            Ok(()) => Ok(true),
            Err(ProbeError::Timeout { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn open(&mut self, view: View) -> ProbeResult<()> {
        self.driver.pause(self.settle.before_navigation).await?;
        self.driver.click(&nav_link(view)).await?;
        self.driver.pause(self.settle.after_submit).await
    }

    async fn create_domain(&mut self, form: &DomainForm) -> ProbeResult<Signal> {
        let page = self.domains.clone();
        self.driver.fill(&page.domain_input(), &form.domain).await?;
        self.driver.fill(&page.otp_email_input(), &form.otp_email).await?;
        self.driver.fill(&page.otp_url_input(), &form.otp_url).await?;
        self.driver.fill(&page.team_name_input(), &form.team_name).await?;
        self.driver.fill(&page.homepage_input(), &form.homepage).await?;
        self.driver.click(&page.submit_button()).await?;
        self.observe(&[text::DOMAIN_CREATED], &[text::DOMAIN_CREATE_FAILED])
            .await
    }

    async fn create_param(&mut self, form: &ParamForm) -> ProbeResult<Signal> {
        let page = self.params.clone();
        self.fill_if_set(page.name_input(), &form.name).await?;
        if let Some(kind) = form.kind {
            self.driver.click(&page.type_dropdown()).await?;
            self.driver.click(&page.type_option(kind)).await?;
        }
        if form.required {
            self.driver.set_checked(&page.required_checkbox(), true).await?;
        }
        if let Some(domain_id) = &form.domain_id {
            self.driver.select_option(&page.domain_select(), domain_id).await?;
        }
        self.driver.click(&page.submit_button()).await?;
        self.observe(
            &[text::PARAM_CREATED],
            &[
                text::PARAM_NAME_MISSING,
                text::PARAM_TYPE_MISSING,
                text::PARAM_DOMAIN_MISSING,
                text::PARAM_CREATE_FAILED,
            ],
        )
        .await
    }

    async fn create_user(&mut self, form: &UserForm) -> ProbeResult<Signal> {
        let page = self.users.clone();
        self.fill_if_set(page.nickname_input(), &form.nickname).await?;
        self.fill_if_set(page.email_input(), &form.email).await?;
        if !form.domain_id.is_empty() {
            self.select_user_domain(&form.domain_id).await?;
        }
        self.fill_if_set(page.full_name_input(), &form.full_name).await?;
        self.fill_if_set(page.password_input(), &form.password).await?;
        for (name, value) in &form.dynamic_fields {
            self.driver.fill(&page.dynamic_field(name), value).await?;
        }
        self.driver.click(&page.submit_button()).await?;
        self.observe(
            &[text::USER_CREATED],
            &[text::USER_CREATE_FAILED, text::FIELD_REQUIRED_TAIL],
        )
        .await
    }

    async fn dynamic_fields_for(&mut self, domain_id: &str) -> ProbeResult<Vec<DynamicField>> {
        self.select_user_domain(domain_id).await?;
        self.rendered_fields().await
    }

    async fn try_fill_dynamic_field(
        &mut self,
        domain_id: &str,
        field: &str,
        value: &str,
    ) -> ProbeResult<()> {
        self.select_user_domain(domain_id).await?;
        let input = self.expecting(self.users.dynamic_field(field));
        wait_for_visible(&self.driver, &input).await?;
        self.driver.fill(&input, value).await
    }

    async fn open_user_editor(&mut self, nickname: &str) -> ProbeResult<EditorSnapshot> {
        let index = self.row_index(View::Users, nickname).await?;
        let page = self.users.clone();
        self.driver.click(&page.edit_button(index)).await?;
        self.driver.pause(self.settle.after_load).await?;
        Ok(EditorSnapshot {
            nickname: self.driver.input_value(&page.nickname_input()).await?,
            email: self.driver.input_value(&page.email_input()).await?,
            full_name: self.driver.input_value(&page.full_name_input()).await?,
            fields: self.rendered_fields().await?,
        })
    }

    async fn save_user_edit(&mut self, edit: &UserEdit) -> ProbeResult<Signal> {
        let page = self.users.clone();
        if let Some(nickname) = &edit.nickname {
            self.driver.fill(&page.nickname_input(), nickname).await?;
        }
        if let Some(full_name) = &edit.full_name {
            self.driver.fill(&page.full_name_input(), full_name).await?;
        }
        for (name, value) in &edit.dynamic_fields {
            self.driver.fill(&page.dynamic_field(name), value).await?;
        }
        self.driver.click(&page.save_button()).await?;
        self.observe(
            &[text::USER_UPDATED],
            &[text::FIELD_REQUIRED_TAIL, text::USER_CREATE_FAILED],
        )
        .await
    }

    async fn rows_containing(&mut self, _view: View, needle: &str) -> ProbeResult<Vec<TableRow>> {
        Ok(self
            .table()
            .await?
            .into_iter()
            .filter(|row| row.contains(needle))
            .collect())
    }

    async fn find_row(&mut self, view: View, key: &str) -> ProbeResult<Option<TableRow>> {
        let rows = self.table().await?;
        Ok(row_by_key(rows, view, key))
    }

    async fn delete_row(&mut self, view: View, key: &str) -> ProbeResult<Signal> {
        let index = self.row_index(view, key).await?;
        self.driver.click(&row_delete_button(view, index)).await?;
        self.observe(&[text::DELETED], &[text::DELETE_FAILED]).await
    }

    async fn screenshot(&mut self) -> ProbeResult<Vec<u8>> {
        self.driver.screenshot().await
    }

    async fn close(&mut self) -> ProbeResult<()> {
        self.driver.close().await
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
#[allow(clippy::significant_drop_tightening, clippy::missing_errors_doc)]
mod cdp {
    use super::*;
    use crate::console::ConsoleFactory;
    use crate::driver::wait_for_visible;
    use crate::locator::js_string;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use tokio::sync::Mutex;

    /// Replaces `window.alert` so dialogs are recorded instead of blocking
    const ALERT_SHIM: &str = "if (!window.__ppDialogs) { window.__ppDialogs = []; \
        window.alert = (m) => { window.__ppDialogs.push(String(m)); }; }";

    /// [`PanelDriver`] over a chromiumoxide page
    #[derive(Debug)]
    pub struct CdpDriver {
        page: CdpPage,
    }

    impl CdpDriver {
        /// Wrap an open page
        #[must_use]
        pub const fn new(page: CdpPage) -> Self {
            Self { page }
        }

        async fn eval(&self, script: &str) -> ProbeResult<serde_json::Value> {
            let wrapped = format!("(() => {{ {ALERT_SHIM} return {script}; }})()");
            let result = self
                .page
                .evaluate(wrapped)
                .await
                .map_err(|e| ProbeError::browser(e.to_string()))?;
            Ok(result
                .into_value::<serde_json::Value>()
                .unwrap_or(serde_json::Value::Null))
        }

        async fn act(&self, locator: &Locator, body: &str) -> ProbeResult<serde_json::Value> {
            wait_for_visible(self, locator).await?;
            let value = self
                .eval(&locator.selector().script(&format!(
                    "const el = els.filter(__pp.visible)[0]; if (!el) {{ return null; }} {body}"
                )))
                .await?;
            if value.is_null() {
                return Err(ProbeError::ElementNotFound {
                    selector: locator.to_string(),
                });
            }
            Ok(value)
        }
    }

    #[async_trait]
    impl PanelDriver for CdpDriver {
        async fn goto(&mut self, url: &str) -> ProbeResult<()> {
            self.page
                .goto(url)
                .await
                .map_err(|e| ProbeError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            self.eval("true").await?;
            Ok(())
        }

        async fn reload(&mut self) -> ProbeResult<()> {
            let url = self.current_url().await?;
            self.goto(&url).await
        }

        async fn current_url(&self) -> ProbeResult<String> {
            let value = self.eval("location.href").await?;
            Ok(value.as_str().unwrap_or_default().to_string())
        }

        async fn click(&mut self, locator: &Locator) -> ProbeResult<()> {
            self.act(locator, "el.click(); return true;").await?;
            Ok(())
        }

        async fn fill(&mut self, locator: &Locator, value: &str) -> ProbeResult<()> {
            let value_js = js_string(value);
            let outcome = self
                .act(
                    locator,
                    &format!(
                        "const v = {value_js}; \
                         if (el.type === 'number' && v.trim() !== '' && isNaN(Number(v))) {{ return 'rejected'; }} \
                         const proto = el.tagName === 'TEXTAREA' ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype; \
                         Object.getOwnPropertyDescriptor(proto, 'value').set.call(el, v); \
                         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                         el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
                         el.focus(); return 'ok';"
                    ),
                )
                .await?;
            if outcome == "rejected" {
                return Err(ProbeError::InputRejected {
                    field: locator.to_string(),
                    value: value.to_string(),
                });
            }
            Ok(())
        }

        async fn select_option(&mut self, locator: &Locator, value: &str) -> ProbeResult<()> {
            let value_js = js_string(value);
            let found = self
                .act(
                    locator,
                    &format!(
                        "const v = {value_js}; \
                         const opt = Array.from(el.options || []).find((o) => o.value === v || __pp.norm(o.textContent) === v); \
                         if (!opt) {{ return false; }} \
                         Object.getOwnPropertyDescriptor(HTMLSelectElement.prototype, 'value').set.call(el, opt.value); \
                         el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true;"
                    ),
                )
                .await?;
            if found == serde_json::Value::Bool(false) {
                return Err(ProbeError::ElementNotFound {
                    selector: format!("{locator} >> option={value}"),
                });
            }
            Ok(())
        }

        async fn set_checked(&mut self, locator: &Locator, checked: bool) -> ProbeResult<()> {
            self.act(
                locator,
                &format!("if (el.checked !== {checked}) {{ el.click(); }} return true;"),
            )
            .await?;
            Ok(())
        }

        async fn count(&self, locator: &Locator) -> ProbeResult<usize> {
            let value = self.eval(&locator.selector().count_script()).await?;
            Ok(value.as_u64().unwrap_or(0) as usize)
        }

        async fn inner_texts(&self, locator: &Locator) -> ProbeResult<Vec<String>> {
            let value = self.eval(&locator.selector().texts_script()).await?;
            Ok(serde_json::from_value(value).unwrap_or_default())
        }

        async fn input_value(&self, locator: &Locator) -> ProbeResult<String> {
            let value = self
                .act(locator, "return el.value === undefined ? '' : String(el.value);")
                .await?;
            Ok(value.as_str().unwrap_or_default().to_string())
        }

        async fn is_focused(&self, locator: &Locator) -> ProbeResult<bool> {
            let value = self
                .eval(&locator.selector().script(
                    "return els.length > 0 && document.activeElement === els[0];",
                ))
                .await?;
            Ok(value.as_bool().unwrap_or(false))
        }

        async fn evaluate(&self, script: &str) -> ProbeResult<serde_json::Value> {
            self.eval(script).await
        }

        async fn take_dialogs(&mut self) -> ProbeResult<Vec<String>> {
            let value = self
                .eval("(() => { const d = window.__ppDialogs.splice(0); return d; })()")
                .await?;
            Ok(serde_json::from_value(value).unwrap_or_default())
        }

        async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();
            let screenshot = self
                .page
                .execute(params)
                .await
                .map_err(|e| ProbeError::browser(e.to_string()))?;

            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(|e| ProbeError::browser(e.to_string()))
        }

        async fn pause(&mut self, duration: Duration) -> ProbeResult<()> {
            tokio::time::sleep(duration).await;
            Ok(())
        }

        async fn close(&mut self) -> ProbeResult<()> {
            self.page
                .clone()
                .close()
                .await
                .map_err(|e| ProbeError::browser(e.to_string()))
        }
    }

    /// Shared chromium instance handing out one page per session
    #[derive(Debug)]
    pub struct CdpConsoleFactory {
        config: BrowserConfig,
        env: Arc<Environment>,
        inner: Arc<Mutex<CdpBrowser>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl CdpConsoleFactory {
        /// Launch chromium
        pub async fn launch(config: BrowserConfig, env: Arc<Environment>) -> ProbeResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height);
            if !config.headless {
                builder = builder.with_head();
            }
            if !config.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }
            let cdp_config = builder.build().map_err(ProbeError::browser)?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| ProbeError::browser(e.to_string()))?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            Ok(Self {
                config,
                env,
                inner: Arc::new(Mutex::new(browser)),
                handle,
            })
        }

        /// Close the browser
        pub async fn shutdown(self) -> ProbeResult<()> {
            let mut browser = self.inner.lock().await;
            browser
                .close()
                .await
                .map_err(|e| ProbeError::browser(e.to_string()))?;
            self.handle.abort();
            Ok(())
        }
    }

    #[async_trait]
    impl ConsoleFactory for CdpConsoleFactory {
        async fn session(&self) -> ProbeResult<Box<dyn AdminConsole>> {
            let page = {
                let browser = self.inner.lock().await;
                browser
                    .new_page("about:blank")
                    .await
                    .map_err(|e| ProbeError::browser(e.to_string()))?
            };
            let console = BrowserConsole::new(CdpDriver::new(page), Arc::clone(&self.env))
                .with_settle(self.config.settle)
                .with_expect_timeout(self.config.expect_timeout);
            Ok(Box::new(console))
        }

        fn name(&self) -> &str {
            "browser"
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{CdpConsoleFactory, CdpDriver};
