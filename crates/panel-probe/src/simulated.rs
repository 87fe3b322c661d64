//! In-memory model of the admin panel.
//!
//! [`SimulatedPanel`] holds the application state shared by every session it
//! opens; each [`SimulatedConsole`] is one logged-out browser tab. The model
//! applies the panel's validation and referential rules and reports the same
//! notifications the real pages render, so the whole suite and the cleanup
//! phase can run without a browser.

use crate::config::Environment;
use crate::console::{
    row_by_key, AdminConsole, ConsoleFactory, DomainForm, DynamicField, EditorSnapshot,
    ParamForm, ParamType, Signal, TableRow, UserEdit, UserForm, View,
};
use crate::page_object::text;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Clone)]
struct DomainRecord {
    id: u64,
    client_id: String,
    domain: String,
    team_name: String,
    otp_email: String,
    otp_url: String,
    homepage: String,
}

#[derive(Debug, Clone)]
struct ParamRecord {
    name: String,
    kind: ParamType,
    required: bool,
    domain_id: u64,
    client_id: String,
}

#[derive(Debug, Clone)]
struct UserRecord {
    id: u64,
    nickname: String,
    email: String,
    domain_id: u64,
    full_name: String,
    values: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct PanelState {
    domains: Vec<DomainRecord>,
    params: Vec<ParamRecord>,
    users: Vec<UserRecord>,
    next_id: u64,
}

impl PanelState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn domain_by_id(&self, domain_id: &str) -> Option<&DomainRecord> {
        let id: u64 = domain_id.trim().parse().ok()?;
        self.domains.iter().find(|d| d.id == id)
    }

    fn fields_of(&self, domain_id: u64) -> Vec<DynamicField> {
        self.params
            .iter()
            .filter(|p| p.domain_id == domain_id)
            .map(|p| DynamicField {
                name: p.name.clone(),
                kind: p.kind,
                required: p.required,
            })
            .collect()
    }

    fn rows(&self, view: View) -> Vec<TableRow> {
        match view {
            View::Domains => self
                .domains
                .iter()
                .map(|d| {
                    TableRow::new(vec![
                        d.id.to_string(),
                        d.client_id.clone(),
                        d.domain.clone(),
                        d.team_name.clone(),
                        d.otp_email.clone(),
                        d.otp_url.clone(),
                        d.homepage.clone(),
                    ])
                })
                .collect(),
            View::ProfileParams => self
                .params
                .iter()
                .map(|p| {
                    TableRow::new(vec![
                        p.name.clone(),
                        if p.required { "Да" } else { "Нет" }.to_string(),
                        p.kind.label().to_string(),
                        p.domain_id.to_string(),
                        p.client_id.clone(),
                    ])
                })
                .collect(),
            View::Users => self
                .users
                .iter()
                .map(|u| {
                    TableRow::new(vec![
                        u.id.to_string(),
                        u.nickname.clone(),
                        u.email.clone(),
                        u.domain_id.to_string(),
                        u.full_name.clone(),
                    ])
                })
                .collect(),
        }
    }
}

/// Email shape the panel accepts: `local@host.tld`
fn is_valid_email(value: &str) -> bool {
    let Some((local, host)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !host.contains('@')
        && !value.chars().any(char::is_whitespace)
        && host
            .split_once('.')
            .is_some_and(|(name, tld)| !name.is_empty() && !tld.is_empty())
}

/// URL shape the panel accepts: `http(s)://host...`
fn is_valid_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    rest.is_some_and(|rest| {
        let host = rest.split(['/', '?', '#']).next().unwrap_or("");
        !host.is_empty() && !value.chars().any(char::is_whitespace)
    })
}

fn first_number_violation<'a>(
    fields: &[DynamicField],
    values: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> Option<(String, String)> {
    values.into_iter().find_map(|(name, value)| {
        fields
            .iter()
            .find(|f| &f.name == name)
            .filter(|f| !f.kind.accepts(value) && !value.is_empty())
            .map(|_| (name.clone(), value.clone()))
    })
}

fn missing_required(fields: &[DynamicField], values: &BTreeMap<String, String>) -> Option<String> {
    fields
        .iter()
        .filter(|f| f.required)
        .find(|f| values.get(&f.name).map_or(true, |v| v.trim().is_empty()))
        .map(|f| f.name.clone())
}

/// Shared application state; opens [`SimulatedConsole`] sessions
#[derive(Debug, Clone)]
pub struct SimulatedPanel {
    state: Arc<Mutex<PanelState>>,
    env: Arc<Environment>,
}

impl SimulatedPanel {
    /// Empty panel accepting the environment's credentials
    #[must_use]
    pub fn new(env: Arc<Environment>) -> Self {
        Self {
            state: Arc::new(Mutex::new(PanelState::default())),
            env,
        }
    }

    /// Open a logged-out session
    #[must_use]
    pub fn console(&self) -> SimulatedConsole {
        SimulatedConsole {
            state: Arc::clone(&self.state),
            env: Arc::clone(&self.env),
            logged_in: false,
            path: "/".to_string(),
            notices: Vec::new(),
            editing: None,
        }
    }

    /// Number of rows currently in a view
    #[must_use]
    pub fn row_count(&self, view: View) -> usize {
        lock(&self.state).rows(view).len()
    }

    /// Whether a view has a row with this key
    #[must_use]
    pub fn has_row(&self, view: View, key: &str) -> bool {
        row_by_key(lock(&self.state).rows(view), view, key).is_some()
    }
}

#[async_trait]
impl ConsoleFactory for SimulatedPanel {
    async fn session(&self) -> ProbeResult<Box<dyn AdminConsole>> {
        Ok(Box::new(self.console()))
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

fn lock(state: &Mutex<PanelState>) -> MutexGuard<'_, PanelState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One session against a [`SimulatedPanel`]
#[derive(Debug)]
pub struct SimulatedConsole {
    state: Arc<Mutex<PanelState>>,
    env: Arc<Environment>,
    logged_in: bool,
    path: String,
    notices: Vec<String>,
    editing: Option<u64>,
}

impl SimulatedConsole {
    fn navigate(&mut self, path: &str) {
        self.path = path.to_string();
        self.notices.clear();
        self.editing = None;
    }

    fn notify(&mut self, message: impl Into<String>) -> String {
        let message = message.into();
        self.notices = vec![message.clone()];
        message
    }

    fn success(&mut self, message: &str) -> Signal {
        Signal::Success(self.notify(message))
    }

    fn error(&mut self, message: impl Into<String>) -> Signal {
        Signal::Error(self.notify(message))
    }

    fn require_login(&self) -> ProbeResult<()> {
        if self.logged_in {
            Ok(())
        } else {
            Err(ProbeError::NotAuthenticated {
                message: format!("session is logged out (at {})", self.path),
            })
        }
    }

    fn require_view(&self, view: View) -> ProbeResult<()> {
        self.require_login()?;
        if self.path == view.path() {
            Ok(())
        } else {
            Err(ProbeError::ElementNotFound {
                selector: format!("{view} view (current page {})", self.path),
            })
        }
    }

    fn page_texts(&self) -> &'static [&'static str] {
        if self.path == "/" {
            &[text::LOGIN_EMAIL, text::LOGIN_PASSWORD, text::LOGIN_SUBMIT]
        } else if self.logged_in {
            &[
                text::NAV_DOMAINS,
                text::NAV_PARAMS,
                text::NAV_USERS,
                text::NAV_LOGOUT,
            ]
        } else {
            &[]
        }
    }

    fn editor_snapshot(&self, user_id: u64) -> ProbeResult<EditorSnapshot> {
        let state = lock(&self.state);
        let user = state
            .users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| ProbeError::RowNotFound {
                view: View::Users.to_string(),
                key: user_id.to_string(),
            })?;
        Ok(EditorSnapshot {
            nickname: user.nickname.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            fields: state.fields_of(user.domain_id),
        })
    }

    fn insert_domain(&mut self, form: &DomainForm) -> Signal {
        if form.otp_email.is_empty() || form.otp_url.is_empty() || form.team_name.is_empty() {
            return Signal::Alert(text::REQUIRED_ALERT.to_string());
        }
        let rejected = {
            let state = lock(&self.state);
            form.domain.trim().is_empty()
                || form.homepage.trim().is_empty()
                || !is_valid_email(&form.otp_email)
                || !is_valid_url(&form.otp_url)
                || !is_valid_url(&form.homepage)
                || state
                    .domains
                    .iter()
                    .any(|d| d.domain.to_lowercase() == form.domain.to_lowercase())
        };
        if rejected {
            return self.error(text::DOMAIN_CREATE_FAILED);
        }
        {
            let mut state = lock(&self.state);
            let id = state.allocate_id();
            state.domains.push(DomainRecord {
                id,
                client_id: self.env.client_id.clone(),
                domain: form.domain.clone(),
                team_name: form.team_name.clone(),
                otp_email: form.otp_email.clone(),
                otp_url: form.otp_url.clone(),
                homepage: form.homepage.clone(),
            });
            debug!(id, domain = %form.domain, "domain created");
        }
        self.success(text::DOMAIN_CREATED)
    }

    fn insert_param(&mut self, form: &ParamForm) -> Signal {
        if form.name.trim().is_empty() {
            return self.error(text::PARAM_NAME_MISSING);
        }
        let Some(kind) = form.kind else {
            return self.error(text::PARAM_TYPE_MISSING);
        };
        let Some(domain_id) = form.domain_id.as_deref() else {
            return self.error(text::PARAM_DOMAIN_MISSING);
        };
        let created = {
            let mut state = lock(&self.state);
            match state.domain_by_id(domain_id).map(|d| d.id) {
                Some(domain_id)
                    if !state
                        .params
                        .iter()
                        .any(|p| p.domain_id == domain_id && p.name == form.name) =>
                {
                    state.params.push(ParamRecord {
                        name: form.name.clone(),
                        kind,
                        required: form.required,
                        domain_id,
                        client_id: self.env.client_id.clone(),
                    });
                    debug!(name = %form.name, domain_id, "parameter created");
                    true
                }
                _ => false,
            }
        };
        if created {
            self.success(text::PARAM_CREATED)
        } else {
            self.error(text::PARAM_CREATE_FAILED)
        }
    }

    fn insert_user(&mut self, form: &UserForm) -> ProbeResult<Signal> {
        let base_missing = [
            &form.nickname,
            &form.email,
            &form.domain_id,
            &form.full_name,
            &form.password,
        ]
        .iter()
        .any(|value| value.trim().is_empty());
        if base_missing {
            return Ok(self.error(text::USER_CREATE_FAILED));
        }

        let mut state = lock(&self.state);
        let Some(domain_id) = state.domain_by_id(&form.domain_id).map(|d| d.id) else {
            drop(state);
            return Ok(self.error(text::USER_CREATE_FAILED));
        };
        let fields = state.fields_of(domain_id);
        if let Some(name) = form
            .dynamic_fields
            .keys()
            .find(|name| !fields.iter().any(|f| &f.name == *name))
        {
            return Err(ProbeError::ElementNotFound {
                selector: format!("input[placeholder=\"{name}\"]"),
            });
        }
        if let Some((field, value)) = first_number_violation(&fields, &form.dynamic_fields) {
            return Err(ProbeError::InputRejected { field, value });
        }
        if !is_valid_email(&form.email)
            || state
                .users
                .iter()
                .any(|u| u.domain_id == domain_id && u.email.eq_ignore_ascii_case(&form.email))
        {
            drop(state);
            return Ok(self.error(text::USER_CREATE_FAILED));
        }
        if let Some(name) = missing_required(&fields, &form.dynamic_fields) {
            drop(state);
            return Ok(self.error(text::field_required(&name)));
        }

        let id = state.allocate_id();
        state.users.push(UserRecord {
            id,
            nickname: form.nickname.clone(),
            email: form.email.clone(),
            domain_id,
            full_name: form.full_name.clone(),
            values: form
                .dynamic_fields
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        });
        debug!(id, nickname = %form.nickname, "user created");
        drop(state);
        Ok(self.success(text::USER_CREATED))
    }

    fn update_user(&mut self, user_id: u64, edit: &UserEdit) -> ProbeResult<Signal> {
        let mut state = lock(&self.state);
        let Some(index) = state.users.iter().position(|u| u.id == user_id) else {
            return Err(ProbeError::RowNotFound {
                view: View::Users.to_string(),
                key: user_id.to_string(),
            });
        };
        let fields = state.fields_of(state.users[index].domain_id);
        if let Some((field, value)) = first_number_violation(&fields, &edit.dynamic_fields) {
            return Err(ProbeError::InputRejected { field, value });
        }

        let mut updated = state.users[index].clone();
        if let Some(nickname) = &edit.nickname {
            updated.nickname = nickname.clone();
        }
        if let Some(full_name) = &edit.full_name {
            updated.full_name = full_name.clone();
        }
        for (name, value) in &edit.dynamic_fields {
            updated.values.insert(name.clone(), value.clone());
        }
        if updated.nickname.trim().is_empty() || updated.full_name.trim().is_empty() {
            drop(state);
            return Ok(self.error(text::USER_CREATE_FAILED));
        }
        if let Some(name) = missing_required(&fields, &updated.values) {
            drop(state);
            return Ok(self.error(text::field_required(&name)));
        }

        debug!(id = user_id, nickname = %updated.nickname, "user updated");
        state.users[index] = updated;
        drop(state);
        Ok(self.success(text::USER_UPDATED))
    }

    fn remove(&mut self, view: View, key: &str) -> ProbeResult<Signal> {
        let mut state = lock(&self.state);
        let column = view.key_column();
        let index = state
            .rows(view)
            .iter()
            .position(|row| row.cell(column) == key)
            .ok_or_else(|| ProbeError::RowNotFound {
                view: view.to_string(),
                key: key.to_string(),
            })?;

        match view {
            View::Domains => {
                let id = state.domains[index].id;
                let referenced = state.users.iter().any(|u| u.domain_id == id)
                    || state.params.iter().any(|p| p.domain_id == id);
                if referenced {
                    drop(state);
                    return Ok(self.error(text::DELETE_FAILED));
                }
                state.domains.remove(index);
            }
            View::ProfileParams => {
                let param = state.params.remove(index);
                for user in state
                    .users
                    .iter_mut()
                    .filter(|u| u.domain_id == param.domain_id)
                {
                    user.values.remove(&param.name);
                }
            }
            View::Users => {
                state.users.remove(index);
            }
        }
        debug!(%view, key, "row deleted");
        drop(state);
        Ok(self.success(text::DELETED))
    }
}

#[async_trait]
impl AdminConsole for SimulatedConsole {
    async fn login(&mut self, email: &str, password: &str) -> ProbeResult<Signal> {
        self.navigate("/");
        if email.is_empty() {
            return Ok(Signal::Invalid("email".to_string()));
        }
        if password.is_empty() {
            return Ok(Signal::Invalid("password".to_string()));
        }
        if email == self.env.login_email && password == self.env.login_password {
            self.logged_in = true;
            self.navigate(View::Domains.path());
            Ok(Signal::Success(self.path.clone()))
        } else {
            Ok(self.error(text::LOGIN_FAILED))
        }
    }

    async fn logout(&mut self) -> ProbeResult<Signal> {
        self.require_login()?;
        self.logged_in = false;
        self.navigate("/");
        Ok(self.success(text::LOGGED_OUT))
    }

    async fn visit(&mut self, path: &str) -> ProbeResult<()> {
        if path.starts_with("/dashboard") && !self.logged_in {
            self.navigate("/");
            self.notify(text::LOGIN_REQUIRED);
        } else {
            self.navigate(path);
        }
        Ok(())
    }

    async fn current_path(&self) -> ProbeResult<String> {
        Ok(self.path.clone())
    }

    async fn has_text(&mut self, needle: &str) -> ProbeResult<bool> {
        Ok(self.notices.iter().any(|notice| notice.contains(needle))
            || self.page_texts().iter().any(|t| t.contains(needle)))
    }

    async fn open(&mut self, view: View) -> ProbeResult<()> {
        self.require_login()?;
        self.navigate(view.path());
        Ok(())
    }

    async fn create_domain(&mut self, form: &DomainForm) -> ProbeResult<Signal> {
        self.require_view(View::Domains)?;
        Ok(self.insert_domain(form))
    }

    async fn create_param(&mut self, form: &ParamForm) -> ProbeResult<Signal> {
        self.require_view(View::ProfileParams)?;
        Ok(self.insert_param(form))
    }

    async fn create_user(&mut self, form: &UserForm) -> ProbeResult<Signal> {
        self.require_view(View::Users)?;
        self.editing = None;
        self.insert_user(form)
    }

    async fn dynamic_fields_for(&mut self, domain_id: &str) -> ProbeResult<Vec<DynamicField>> {
        self.require_view(View::Users)?;
        let state = lock(&self.state);
        let domain = state
            .domain_by_id(domain_id)
            .ok_or_else(|| ProbeError::ElementNotFound {
                selector: format!("option[value=\"{domain_id}\"]"),
            })?;
        Ok(state.fields_of(domain.id))
    }

    async fn try_fill_dynamic_field(
        &mut self,
        domain_id: &str,
        field: &str,
        value: &str,
    ) -> ProbeResult<()> {
        let fields = self.dynamic_fields_for(domain_id).await?;
        let target = fields
            .iter()
            .find(|f| f.name == field)
            .ok_or_else(|| ProbeError::ElementNotFound {
                selector: format!("input[placeholder=\"{field}\"]"),
            })?;
        if target.kind.accepts(value) {
            Ok(())
        } else {
            Err(ProbeError::InputRejected {
                field: field.to_string(),
                value: value.to_string(),
            })
        }
    }

    async fn open_user_editor(&mut self, nickname: &str) -> ProbeResult<EditorSnapshot> {
        self.require_view(View::Users)?;
        let user_id = lock(&self.state)
            .users
            .iter()
            .find(|u| u.nickname == nickname)
            .map(|u| u.id)
            .ok_or_else(|| ProbeError::RowNotFound {
                view: View::Users.to_string(),
                key: nickname.to_string(),
            })?;
        let snapshot = self.editor_snapshot(user_id)?;
        self.editing = Some(user_id);
        Ok(snapshot)
    }

    async fn save_user_edit(&mut self, edit: &UserEdit) -> ProbeResult<Signal> {
        self.require_view(View::Users)?;
        let user_id = self.editing.ok_or_else(|| ProbeError::ElementNotFound {
            selector: format!("role=button[name=\"{}\"i]", text::USER_SAVE),
        })?;
        let signal = self.update_user(user_id, edit)?;
        if signal.is_success() {
            self.editing = None;
        }
        Ok(signal)
    }

    async fn rows_containing(&mut self, view: View, needle: &str) -> ProbeResult<Vec<TableRow>> {
        self.require_view(view)?;
        Ok(lock(&self.state)
            .rows(view)
            .into_iter()
            .filter(|row| row.contains(needle))
            .collect())
    }

    async fn find_row(&mut self, view: View, key: &str) -> ProbeResult<Option<TableRow>> {
        self.require_view(view)?;
        let rows = lock(&self.state).rows(view);
        Ok(row_by_key(rows, view, key))
    }

    async fn delete_row(&mut self, view: View, key: &str) -> ProbeResult<Signal> {
        self.require_view(view)?;
        self.remove(view, key)
    }

    async fn screenshot(&mut self) -> ProbeResult<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn close(&mut self) -> ProbeResult<()> {
        self.logged_in = false;
        self.navigate("/");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn panel() -> SimulatedPanel {
        SimulatedPanel::new(Arc::new(Environment::new(
            "https://panel.test",
            "admin@testsh.com",
            "secret",
            "7",
        )))
    }

    fn domain_form(name: &str) -> DomainForm {
        DomainForm {
            domain: name.to_string(),
            otp_email: "otp@testsh.com".to_string(),
            otp_url: "https://otp.example.com".to_string(),
            team_name: "Acme Inc".to_string(),
            homepage: "https://acme.example.com".to_string(),
        }
    }

    fn user_form(nickname: &str, domain_id: &str) -> UserForm {
        UserForm {
            nickname: nickname.to_string(),
            email: format!("{nickname}@testsh.com"),
            domain_id: domain_id.to_string(),
            full_name: "Ada Lovelace".to_string(),
            password: "Test1234!".to_string(),
            dynamic_fields: BTreeMap::new(),
        }
    }

    async fn logged_in(panel: &SimulatedPanel) -> SimulatedConsole {
        let mut console = panel.console();
        console
            .login("admin@testsh.com", "secret")
            .await
            .unwrap()
            .expect_success("login")
            .unwrap();
        console
    }

    async fn domain_id(console: &mut SimulatedConsole, name: &str) -> String {
        console.open(View::Domains).await.unwrap();
        console.create_domain(&domain_form(name)).await.unwrap();
        console
            .find_row(View::Domains, name)
            .await
            .unwrap()
            .unwrap()
            .cell(0)
            .to_string()
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn test_email_shapes() {
            assert!(is_valid_email("a.b@testsh.com"));
            assert!(!is_valid_email("invalid-email"));
            assert!(!is_valid_email("a@b"));
            assert!(!is_valid_email("@testsh.com"));
            assert!(!is_valid_email("a@@testsh.com"));
        }

        #[test]
        fn test_url_shapes() {
            assert!(is_valid_url("https://acme.example.com/path"));
            assert!(is_valid_url("http://localhost"));
            assert!(!is_valid_url("not-a-url"));
            assert!(!is_valid_url("https://"));
        }
    }

    mod session_tests {
        use super::*;

        #[tokio::test]
        async fn test_login_outcomes() {
            let panel = panel();
            let mut console = panel.console();
            assert_eq!(
                console.login("admin@testsh.com", "wrong").await.unwrap(),
                Signal::Error(text::LOGIN_FAILED.to_string())
            );
            assert_eq!(console.current_path().await.unwrap(), "/");
            assert_eq!(
                console.login("admin@testsh.com", "").await.unwrap(),
                Signal::Invalid("password".to_string())
            );
            let signal = console.login("admin@testsh.com", "secret").await.unwrap();
            assert_eq!(signal, Signal::Success("/dashboard/domains".to_string()));
        }

        #[tokio::test]
        async fn test_guarded_pages_redirect() {
            let panel = panel();
            let mut console = panel.console();
            console.visit("/dashboard/domains").await.unwrap();
            assert_eq!(console.current_path().await.unwrap(), "/");
            assert!(console.has_text(text::LOGIN_REQUIRED).await.unwrap());
            assert!(console.has_text(text::LOGIN_EMAIL).await.unwrap());
            let err = console.open(View::Users).await.unwrap_err();
            assert!(matches!(err, ProbeError::NotAuthenticated { .. }));
        }

        #[tokio::test]
        async fn test_logout() {
            let panel = panel();
            let mut console = logged_in(&panel).await;
            let signal = console.logout().await.unwrap();
            assert!(signal.is_success());
            assert_eq!(console.current_path().await.unwrap(), "/");
            assert!(console.has_text(text::LOGGED_OUT).await.unwrap());
        }

        #[tokio::test]
        async fn test_sessions_share_state() {
            let panel = panel();
            let mut first = logged_in(&panel).await;
            domain_id(&mut first, "shared1").await;
            let mut second = logged_in(&panel).await;
            second.open(View::Domains).await.unwrap();
            assert!(second.find_row(View::Domains, "shared1").await.unwrap().is_some());
            assert!(panel.has_row(View::Domains, "shared1"));
        }
    }

    mod domain_tests {
        use super::*;

        #[tokio::test]
        async fn test_required_fields() {
            let panel = panel();
            let mut console = logged_in(&panel).await;
            console.open(View::Domains).await.unwrap();

            let mut form = domain_form("acme1");
            form.team_name.clear();
            let signal = console.create_domain(&form).await.unwrap();
            signal.expect_alert("обязательные").unwrap();

            let mut form = domain_form("acme1");
            form.homepage.clear();
            let signal = console.create_domain(&form).await.unwrap();
            signal.expect_error(text::DOMAIN_CREATE_FAILED).unwrap();
            assert_eq!(panel.row_count(View::Domains), 0);
        }

        #[tokio::test]
        async fn test_duplicate_ignores_case() {
            let panel = panel();
            let mut console = logged_in(&panel).await;
            domain_id(&mut console, "acme1").await;
            let signal = console.create_domain(&domain_form("ACME1")).await.unwrap();
            signal.expect_error(text::DOMAIN_CREATE_FAILED).unwrap();
            assert_eq!(
                console.rows_containing(View::Domains, "acme1").await.unwrap().len(),
                1
            );
        }

        #[tokio::test]
        async fn test_row_layout() {
            let panel = panel();
            let mut console = logged_in(&panel).await;
            domain_id(&mut console, "acme1").await;
            let row = console.find_row(View::Domains, "acme1").await.unwrap().unwrap();
            assert_eq!(row.cell(1), "7");
            assert_eq!(row.cell(3), "Acme Inc");
            assert_eq!(row.cell(4), "otp@testsh.com");
            assert_eq!(row.cell(6), "https://acme.example.com");
        }

        #[tokio::test]
        async fn test_referenced_domain_cannot_be_deleted() {
            let panel = panel();
            let mut console = logged_in(&panel).await;
            let id = domain_id(&mut console, "acme1").await;
            console.open(View::ProfileParams).await.unwrap();
            console
                .create_param(&ParamForm::new("age", ParamType::Text, &id))
                .await
                .unwrap();
            console.open(View::Domains).await.unwrap();
            let signal = console.delete_row(View::Domains, "acme1").await.unwrap();
            signal.expect_error(text::DELETE_FAILED).unwrap();

            console.open(View::ProfileParams).await.unwrap();
            console.delete_row(View::ProfileParams, "age").await.unwrap();
            console.open(View::Domains).await.unwrap();
            assert!(console.delete_row(View::Domains, "acme1").await.unwrap().is_success());
            assert!(!panel.has_row(View::Domains, "acme1"));
        }

        #[tokio::test]
        async fn test_delete_missing_row() {
            let panel = panel();
            let mut console = logged_in(&panel).await;
            console.open(View::Domains).await.unwrap();
            let err = console.delete_row(View::Domains, "ghost").await.unwrap_err();
            assert!(matches!(err, ProbeError::RowNotFound { .. }));
        }

        #[tokio::test]
        async fn test_forms_need_their_view() {
            let panel = panel();
            let mut console = logged_in(&panel).await;
            console.open(View::Users).await.unwrap();
            let err = console.create_domain(&domain_form("x1")).await.unwrap_err();
            assert!(matches!(err, ProbeError::ElementNotFound { .. }));
        }
    }

    mod param_tests {
        use super::*;

        #[tokio::test]
        async fn test_missing_controls() {
            let panel = panel();
            let mut console = logged_in(&panel).await;
            let id = domain_id(&mut console, "acme1").await;
            console.open(View::ProfileParams).await.unwrap();

            let mut form = ParamForm::new("", ParamType::Number, &id);
            let signal = console.create_param(&form).await.unwrap();
            signal.expect_error(text::PARAM_NAME_MISSING).unwrap();

            form.name = "age".to_string();
            form.kind = None;
            let signal = console.create_param(&form).await.unwrap();
            signal.expect_error(text::PARAM_TYPE_MISSING).unwrap();

            form.kind = Some(ParamType::Date);
            form.domain_id = None;
            let signal = console.create_param(&form).await.unwrap();
            signal.expect_error(text::PARAM_DOMAIN_MISSING).unwrap();
            assert_eq!(panel.row_count(View::ProfileParams), 0);
        }

        #[tokio::test]
        async fn test_row_and_duplicates() {
            let panel = panel();
            let mut console = logged_in(&panel).await;
            let id = domain_id(&mut console, "acme1").await;
            console.open(View::ProfileParams).await.unwrap();
            let form = ParamForm::new("birthday", ParamType::Date, &id).required();
            console.create_param(&form).await.unwrap().expect_success("param").unwrap();
            let row = console
                .find_row(View::ProfileParams, "birthday")
                .await
                .unwrap()
                .unwrap();
            assert_eq!(row.cells, vec!["birthday", "Да", "дата", id.as_str(), "7"]);

            let signal = console.create_param(&form).await.unwrap();
            signal.expect_error(text::PARAM_CREATE_FAILED).unwrap();
            let unknown = ParamForm::new("other", ParamType::Text, "9999");
            let signal = console.create_param(&unknown).await.unwrap();
            signal.expect_error(text::PARAM_CREATE_FAILED).unwrap();
        }
    }

    mod user_tests {
        use super::*;

        #[tokio::test]
        async fn test_create_and_row() {
            let panel = panel();
            let mut console = logged_in(&panel).await;
            let id = domain_id(&mut console, "acme1").await;
            console.open(View::Users).await.unwrap();
            let signal = console.create_user(&user_form("bob", &id)).await.unwrap();
            assert_eq!(signal, Signal::Success(text::USER_CREATED.to_string()));
            let row = console.find_row(View::Users, "bob").await.unwrap().unwrap();
            assert!(row.cell(0).parse::<u64>().is_ok());
            assert_eq!(row.cell(2), "bob@testsh.com");
            assert_eq!(row.cell(3), id);

            let signal = console.create_user(&user_form("bob", &id)).await.unwrap();
            signal.expect_error(text::USER_CREATE_FAILED).unwrap();
            let signal = console.create_user(&UserForm::default()).await.unwrap();
            signal.expect_error(text::USER_CREATE_FAILED).unwrap();
        }

        #[tokio::test]
        async fn test_required_and_number_fields() {
            let panel = panel();
            let mut console = logged_in(&panel).await;
            let id = domain_id(&mut console, "acme1").await;
            console.open(View::ProfileParams).await.unwrap();
            console
                .create_param(&ParamForm::new("city", ParamType::Text, &id).required())
                .await
                .unwrap();
            console
                .create_param(&ParamForm::new("age", ParamType::Number, &id))
                .await
                .unwrap();

            console.open(View::Users).await.unwrap();
            let fields = console.dynamic_fields_for(&id).await.unwrap();
            assert_eq!(fields.len(), 2);
            assert!(fields[0].required);

            let signal = console.create_user(&user_form("bob", &id)).await.unwrap();
            assert_eq!(signal, Signal::Error(text::field_required("city")));

            let err = console
                .try_fill_dynamic_field(&id, "age", "abcdef")
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::InputRejected { .. }));
            console.try_fill_dynamic_field(&id, "age", "42").await.unwrap();
        }

        #[tokio::test]
        async fn test_edit_flow_and_param_removal() {
            let panel = panel();
            let mut console = logged_in(&panel).await;
            let id = domain_id(&mut console, "acme1").await;
            console.open(View::ProfileParams).await.unwrap();
            console
                .create_param(&ParamForm::new("city", ParamType::Text, &id))
                .await
                .unwrap();
            console.open(View::Users).await.unwrap();
            let mut form = user_form("bob", &id);
            form.dynamic_fields.insert("city".to_string(), "Riga".to_string());
            console.create_user(&form).await.unwrap();

            let snapshot = console.open_user_editor("bob").await.unwrap();
            assert_eq!(snapshot.email, "bob@testsh.com");
            assert!(snapshot.has_field("city"));
            let edit = UserEdit {
                nickname: Some("bob_upd".to_string()),
                full_name: Some("Updated Name".to_string()),
                dynamic_fields: BTreeMap::new(),
            };
            let signal = console.save_user_edit(&edit).await.unwrap();
            assert_eq!(signal, Signal::Success(text::USER_UPDATED.to_string()));
            assert!(console.find_row(View::Users, "bob_upd").await.unwrap().is_some());

            console.open(View::ProfileParams).await.unwrap();
            console.delete_row(View::ProfileParams, "city").await.unwrap();
            console.open(View::Users).await.unwrap();
            let snapshot = console.open_user_editor("bob_upd").await.unwrap();
            assert!(!snapshot.has_field("city"));
        }

        #[tokio::test]
        async fn test_new_required_param_blocks_edit() {
            let panel = panel();
            let mut console = logged_in(&panel).await;
            let id = domain_id(&mut console, "acme1").await;
            console.open(View::Users).await.unwrap();
            console.create_user(&user_form("bob", &id)).await.unwrap();
            console.open(View::ProfileParams).await.unwrap();
            console
                .create_param(&ParamForm::new("vat", ParamType::Text, &id).required())
                .await
                .unwrap();

            console.open(View::Users).await.unwrap();
            console.open_user_editor("bob").await.unwrap();
            let signal = console.save_user_edit(&UserEdit::default()).await.unwrap();
            assert_eq!(signal, Signal::Error(text::field_required("vat")));

            let mut edit = UserEdit::default();
            edit.dynamic_fields.insert("vat".to_string(), "some value".to_string());
            assert!(console.save_user_edit(&edit).await.unwrap().is_success());
        }
    }
}
