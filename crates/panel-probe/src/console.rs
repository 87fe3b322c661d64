//! The admin console boundary: what scenarios and cleanup may ask of the panel.
//!
//! [`AdminConsole`] is implemented by [`crate::BrowserConsole`] (page objects
//! over a real or mocked browser) and by [`crate::SimulatedConsole`] (an
//! in-memory model of the panel). Every submission reports the [`Signal`] the
//! user would have seen.

use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Dashboard views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Domains table and form
    Domains,
    /// Profile parameters table and form
    ProfileParams,
    /// Users table and form
    Users,
}

impl View {
    /// Dashboard path
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Domains => "/dashboard/domains",
            Self::ProfileParams => "/dashboard/profile-params",
            Self::Users => "/dashboard/users",
        }
    }

    /// Column holding the identifier the ledger records
    #[must_use]
    pub const fn key_column(self) -> usize {
        match self {
            Self::Domains => 2,
            Self::ProfileParams => 0,
            Self::Users => 1,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Domains => "domains",
            Self::ProfileParams => "profile-params",
            Self::Users => "users",
        })
    }
}

/// Observable result of a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// Success notification
    Success(String),
    /// Error notification rendered in the page
    Error(String),
    /// Blocking alert dialog
    Alert(String),
    /// Native form validation stopped submission at this field
    Invalid(String),
    /// Nothing observable happened
    Silent,
}

impl Signal {
    /// Whether this is a success notification
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Message text, if any
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success(m) | Self::Error(m) | Self::Alert(m) | Self::Invalid(m) => Some(m),
            Self::Silent => None,
        }
    }

    /// Require a success notification
    pub fn expect_success(&self, action: &str) -> ProbeResult<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(ProbeError::assertion(format!(
                "{action}: expected success, got {self:?}"
            )))
        }
    }

    /// Require an error notification containing `needle`
    pub fn expect_error(&self, needle: &str) -> ProbeResult<()> {
        match self {
            Self::Error(message) if message.contains(needle) => Ok(()),
            other => Err(ProbeError::assertion(format!(
                "expected error containing {needle:?}, got {other:?}"
            ))),
        }
    }

    /// Require an alert containing `needle`
    pub fn expect_alert(&self, needle: &str) -> ProbeResult<()> {
        match self {
            Self::Alert(message) if message.contains(needle) => Ok(()),
            other => Err(ProbeError::assertion(format!(
                "expected alert containing {needle:?}, got {other:?}"
            ))),
        }
    }
}

/// Type of a profile parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Free text
    Text,
    /// Numeric input
    Number,
    /// Checkbox
    Bool,
    /// Date picker
    Date,
}

impl ParamType {
    /// All types in dropdown order
    pub const ALL: [Self; 4] = [Self::Text, Self::Number, Self::Bool, Self::Date];

    /// Label shown in the type dropdown and table
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "строка",
            Self::Number => "число",
            Self::Bool => "bool",
            Self::Date => "дата",
        }
    }

    /// Parse a table or dropdown label
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(label.trim()))
    }

    /// Whether `value` is acceptable input for this type
    #[must_use]
    pub fn accepts(self, value: &str) -> bool {
        match self {
            Self::Number => value.trim().parse::<f64>().is_ok(),
            _ => true,
        }
    }
}

/// Domain creation form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainForm {
    /// Domain name
    pub domain: String,
    /// OTP sender email
    pub otp_email: String,
    /// OTP service URL
    pub otp_url: String,
    /// Team name
    pub team_name: String,
    /// Homepage URL
    pub homepage: String,
}

/// Profile parameter creation form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamForm {
    /// Field name
    pub name: String,
    /// Field type; `None` leaves the dropdown untouched
    pub kind: Option<ParamType>,
    /// Whether users must fill it
    pub required: bool,
    /// Owning domain id; `None` leaves the select untouched
    pub domain_id: Option<String>,
}

impl ParamForm {
    /// Fully specified form
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParamType, domain_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(kind),
            required: false,
            domain_id: Some(domain_id.into()),
        }
    }

    /// Mark as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// User creation form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserForm {
    /// Nickname (lowercase)
    pub nickname: String,
    /// Email
    pub email: String,
    /// Domain id
    pub domain_id: String,
    /// Full name
    pub full_name: String,
    /// Password
    pub password: String,
    /// Values for the domain's profile parameters, by parameter name
    pub dynamic_fields: BTreeMap<String, String>,
}

/// Changes applied in the user editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEdit {
    /// New nickname
    pub nickname: Option<String>,
    /// New full name
    pub full_name: Option<String>,
    /// Profile parameter values to set
    pub dynamic_fields: BTreeMap<String, String>,
}

/// Profile parameter field rendered in a user form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicField {
    /// Parameter name (field label)
    pub name: String,
    /// Input type
    pub kind: ParamType,
    /// Whether marked required
    pub required: bool,
}

/// What the user editor shows when opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSnapshot {
    /// Prefilled nickname
    pub nickname: String,
    /// Prefilled email
    pub email: String,
    /// Prefilled full name
    pub full_name: String,
    /// Profile parameter fields
    pub fields: Vec<DynamicField>,
}

impl EditorSnapshot {
    /// Whether a profile parameter field is shown
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.name == name)
    }
}

/// One rendered table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    /// Cell texts, left to right
    pub cells: Vec<String>,
}

impl TableRow {
    /// Row from cell texts
    #[must_use]
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Cell text, empty when out of range
    #[must_use]
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map_or("", String::as_str)
    }

    /// Whether any cell contains `needle`, ignoring case
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.cells
            .iter()
            .any(|cell| cell.to_lowercase().contains(&needle))
    }
}

/// Operations the suite performs against the panel
#[async_trait]
pub trait AdminConsole: Send + Sync {
    /// Open the login page and submit credentials
    async fn login(&mut self, email: &str, password: &str) -> ProbeResult<Signal>;

    /// Click the logout link
    async fn logout(&mut self) -> ProbeResult<Signal>;

    /// Navigate directly to a panel path
    async fn visit(&mut self, path: &str) -> ProbeResult<()>;

    /// Current path, starting with `/`
    async fn current_path(&self) -> ProbeResult<String>;

    /// Whether `text` is visible on the page
    async fn has_text(&mut self, text: &str) -> ProbeResult<bool>;

    /// Open a dashboard view through its navigation link
    async fn open(&mut self, view: View) -> ProbeResult<()>;

    /// Submit the domain form
    async fn create_domain(&mut self, form: &DomainForm) -> ProbeResult<Signal>;

    /// Submit the profile parameter form
    async fn create_param(&mut self, form: &ParamForm) -> ProbeResult<Signal>;

    /// Submit the user form
    async fn create_user(&mut self, form: &UserForm) -> ProbeResult<Signal>;

    /// Select a domain in the user form and list the fields that appear
    async fn dynamic_fields_for(&mut self, domain_id: &str) -> ProbeResult<Vec<DynamicField>>;

    /// Select a domain in the user form and type into one of its fields
    async fn try_fill_dynamic_field(
        &mut self,
        domain_id: &str,
        field: &str,
        value: &str,
    ) -> ProbeResult<()>;

    /// Open the editor for the user with this nickname
    async fn open_user_editor(&mut self, nickname: &str) -> ProbeResult<EditorSnapshot>;

    /// Apply changes in the open editor and save
    async fn save_user_edit(&mut self, edit: &UserEdit) -> ProbeResult<Signal>;

    /// Rows of a view whose text contains `needle`, ignoring case
    async fn rows_containing(&mut self, view: View, needle: &str) -> ProbeResult<Vec<TableRow>>;

    /// Row whose key column equals `key`
    async fn find_row(&mut self, view: View, key: &str) -> ProbeResult<Option<TableRow>>;

    /// Delete the row whose key column equals `key`
    ///
    /// Fails with [`ProbeError::RowNotFound`] when no such row is shown.
    async fn delete_row(&mut self, view: View, key: &str) -> ProbeResult<Signal>;

    /// PNG screenshot for failure artifacts; empty when unsupported
    async fn screenshot(&mut self) -> ProbeResult<Vec<u8>>;

    /// End the session
    async fn close(&mut self) -> ProbeResult<()>;
}

/// Opens one console session per scenario
#[async_trait]
pub trait ConsoleFactory: Send + Sync {
    /// Open a fresh, unauthenticated session
    async fn session(&self) -> ProbeResult<Box<dyn AdminConsole>>;

    /// Backend name for reports
    fn name(&self) -> &str;
}

/// Row whose key column equals `key`
#[must_use]
pub fn row_by_key(rows: Vec<TableRow>, view: View, key: &str) -> Option<TableRow> {
    rows.into_iter()
        .find(|row| row.cell(view.key_column()) == key)
}
