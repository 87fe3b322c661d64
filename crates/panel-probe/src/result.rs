//! Result and error types for panel-probe.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for panel-probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving the panel or maintaining the ledger
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Ledger file could not be read, written or locked
    #[error("Ledger I/O failed for {}: {source}", path.display())]
    LedgerIo {
        /// Ledger location
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Ledger file exists but does not hold a valid snapshot
    #[error("Ledger at {} is corrupt: {source}", path.display())]
    LedgerCorrupt {
        /// Ledger location
        path: PathBuf,
        /// Parse error
        #[source]
        source: serde_json::Error,
    },

    /// Missing or invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Browser launch or page error
    #[error("Browser error: {message}")]
    Browser {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms: {what}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// What was being waited for
        what: String,
    },

    /// No element matched a locator
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Selector display form
        selector: String,
    },

    /// The page refused a value typed into an input
    #[error("Input rejected by {field}: {value:?}")]
    InputRejected {
        /// Field label or selector
        field: String,
        /// Rejected value
        value: String,
    },

    /// No table row carries the requested key
    #[error("No row with key {key:?} in {view}")]
    RowNotFound {
        /// View name
        view: String,
        /// Row key
        key: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// A dashboard action was attempted without a session
    #[error("Not authenticated: {message}")]
    NotAuthenticated {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    /// Shorthand for an assertion failure
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Shorthand for a browser error
    pub fn browser(message: impl Into<String>) -> Self {
        Self::Browser {
            message: message.into(),
        }
    }

    /// Whether this error came from ledger persistence
    #[must_use]
    pub const fn is_ledger_error(&self) -> bool {
        matches!(self, Self::LedgerIo { .. } | Self::LedgerCorrupt { .. })
    }
}
