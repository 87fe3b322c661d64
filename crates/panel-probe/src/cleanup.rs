//! Cleanup phase: delete what the ledger still tracks.
//!
//! Kinds are processed in [`EntityKind::CLEANUP_ORDER`] so users and
//! parameters are gone before the domains they reference. An entry leaves the
//! ledger only after the panel confirms its deletion.

use crate::config::Environment;
use crate::console::{AdminConsole, Signal};
use crate::harness::view_of;
use crate::ledger::{EntityKind, EntityLedger};
use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Cleanup behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Untrack entries whose row no longer exists
    pub prune_missing: bool,
}

impl CleanupOptions {
    #[must_use]
    pub const fn with_prune_missing(mut self, prune: bool) -> Self {
        self.prune_missing = prune;
        self
    }
}

/// A tracked entity named in a cleanup report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupEntry {
    /// Entity kind
    pub kind: EntityKind,
    /// Ledger identifier
    pub id: String,
    /// Panel message for failed deletions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CleanupEntry {
    fn new(kind: EntityKind, id: &str) -> Self {
        Self {
            kind,
            id: id.to_string(),
            message: None,
        }
    }
}

/// Result of a cleanup pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Deleted and untracked
    pub deleted: Vec<CleanupEntry>,
    /// Tracked but not shown on the panel
    pub missing: Vec<CleanupEntry>,
    /// Deletion was refused; still tracked
    pub failed: Vec<CleanupEntry>,
}

impl CleanupReport {
    /// Whether every deletion that was attempted succeeded
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} deleted, {} missing, {} failed",
            self.deleted.len(),
            self.missing.len(),
            self.failed.len()
        )
    }
}

/// Delete every tracked entity through `console`
///
/// Logs in with the environment's credentials first. Persistence errors
/// abort the pass; panel refusals are collected in the report.
pub async fn run_cleanup(
    console: &mut dyn AdminConsole,
    ledger: &EntityLedger,
    env: &Environment,
    options: CleanupOptions,
) -> ProbeResult<CleanupReport> {
    let mut report = CleanupReport::default();
    if ledger.is_empty() {
        info!("ledger is empty, nothing to clean up");
        return Ok(report);
    }

    console
        .login(&env.login_email, &env.login_password)
        .await?
        .expect_success("cleanup login")?;

    for kind in EntityKind::CLEANUP_ORDER {
        let pending = ledger.snapshot(kind);
        if pending.is_empty() {
            continue;
        }
        let view = view_of(kind);
        info!(%kind, count = pending.len(), "cleaning up");
        console.open(view).await?;

        for id in &pending {
            if console.find_row(view, id).await?.is_none() {
                mark_missing(ledger, &mut report, kind, id, options)?;
                continue;
            }
            match console.delete_row(view, id).await {
                Ok(Signal::Success(_)) => {
                    ledger.untrack(kind, id)?;
                    info!(%kind, id = %id, "deleted");
                    report.deleted.push(CleanupEntry::new(kind, id));
                }
                Ok(signal) => {
                    warn!(%kind, id = %id, ?signal, "deletion refused");
                    report.failed.push(CleanupEntry {
                        message: signal.message().map(str::to_string),
                        ..CleanupEntry::new(kind, id)
                    });
                }
                Err(ProbeError::RowNotFound { .. }) => {
                    mark_missing(ledger, &mut report, kind, id, options)?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    info!(summary = %report.summary(), "cleanup finished");
    Ok(report)
}

fn mark_missing(
    ledger: &EntityLedger,
    report: &mut CleanupReport,
    kind: EntityKind,
    id: &str,
    options: CleanupOptions,
) -> ProbeResult<()> {
    warn!(%kind, id, pruned = options.prune_missing, "tracked entity not found");
    if options.prune_missing {
        ledger.untrack(kind, id)?;
    }
    report.missing.push(CleanupEntry::new(kind, id));
    Ok(())
}
