//! Entity ledger: durable record of entities created by test runs.
//!
//! Scenarios record every user, profile parameter and domain they create so a
//! later cleanup phase, possibly in another process, can delete them. The
//! ledger is a JSON file holding three ordered, duplicate-free collections:
//!
//! ```text
//! { "users": [..], "params": [..], "domains": [..] }
//! ```
//!
//! Every mutation rewrites the whole snapshot through a temporary file and an
//! atomic rename while holding an advisory lock on `<file>.lock`. The change is
//! applied on top of the file's current contents, so several workers sharing
//! one location never drop each other's entries.

use crate::result::{ProbeError, ProbeResult};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info};

/// Default ledger location, relative to the project root
pub const DEFAULT_LEDGER_PATH: &str = ".cache/created-entities.json";

/// Kind of entity tracked by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// User, keyed by nickname
    User,
    /// Profile parameter, keyed by name
    Param,
    /// Domain, keyed by domain name
    Domain,
}

impl EntityKind {
    /// All kinds in declaration order
    pub const ALL: [Self; 3] = [Self::User, Self::Param, Self::Domain];

    /// Deletion order: dependents before the domains they reference
    pub const CLEANUP_ORDER: [Self; 3] = [Self::User, Self::Param, Self::Domain];

    /// Singular name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Param => "param",
            Self::Domain => "domain",
        }
    }

    /// Field name in the persisted snapshot
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Param => "params",
            Self::Domain => "domains",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "users" => Ok(Self::User),
            "param" | "params" | "parameter" | "parameters" => Ok(Self::Param),
            "domain" | "domains" => Ok(Self::Domain),
            other => Err(ProbeError::config(format!(
                "unknown entity kind '{other}' (expected user, param or domain)"
            ))),
        }
    }
}

/// Persisted ledger snapshot
///
/// All three fields are required on read; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Nicknames of created users
    pub users: Vec<String>,
    /// Names of created profile parameters
    pub params: Vec<String>,
    /// Names of created domains
    pub domains: Vec<String>,
}

impl LedgerState {
    /// Collection for a kind
    #[must_use]
    pub fn collection(&self, kind: EntityKind) -> &[String] {
        match kind {
            EntityKind::User => &self.users,
            EntityKind::Param => &self.params,
            EntityKind::Domain => &self.domains,
        }
    }

    fn collection_mut(&mut self, kind: EntityKind) -> &mut Vec<String> {
        match kind {
            EntityKind::User => &mut self.users,
            EntityKind::Param => &mut self.params,
            EntityKind::Domain => &mut self.domains,
        }
    }

    /// Append `id` unless already present. Returns whether it was added.
    pub fn insert(&mut self, kind: EntityKind, id: &str) -> bool {
        let items = self.collection_mut(kind);
        if items.iter().any(|existing| existing == id) {
            return false;
        }
        items.push(id.to_string());
        true
    }

    /// Remove the first occurrence of `id`. Returns whether it was present.
    pub fn remove(&mut self, kind: EntityKind, id: &str) -> bool {
        let items = self.collection_mut(kind);
        match items.iter().position(|existing| existing == id) {
            Some(index) => {
                items.remove(index);
                true
            }
            None => false,
        }
    }

    /// Total number of tracked identifiers
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len() + self.params.len() + self.domains.len()
    }

    /// Whether nothing is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// File-backed ledger of created entities
///
/// Construct one per ledger location and share it by reference
/// (`Arc<EntityLedger>`) between workers.
#[derive(Debug)]
pub struct EntityLedger {
    path: PathBuf,
    state: Mutex<LedgerState>,
}

impl EntityLedger {
    /// Open the ledger at `path`
    ///
    /// A missing file yields an empty ledger and nothing is written until the
    /// first mutation. A file that cannot be parsed is an error.
    pub fn open(path: impl Into<PathBuf>) -> ProbeResult<Self> {
        let path = path.into();
        let state = read_snapshot(&path)?.unwrap_or_default();
        debug!(
            path = %path.display(),
            tracked = state.len(),
            "opened entity ledger"
        );
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Open the ledger at [`DEFAULT_LEDGER_PATH`] under `root`
    pub fn open_in(root: impl AsRef<Path>) -> ProbeResult<Self> {
        Self::open(root.as_ref().join(DEFAULT_LEDGER_PATH))
    }

    /// Ledger location
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record `id` as created. Persists even when already tracked.
    pub fn track(&self, kind: EntityKind, id: &str) -> ProbeResult<()> {
        let added = self.mutate(|state| state.insert(kind, id))?;
        debug!(%kind, id, added, "tracked entity");
        Ok(())
    }

    /// Forget `id`. Persists even when it was not tracked.
    pub fn untrack(&self, kind: EntityKind, id: &str) -> ProbeResult<()> {
        let removed = self.mutate(|state| state.remove(kind, id))?;
        debug!(%kind, id, removed, "untracked entity");
        Ok(())
    }

    /// Ordered copy of one collection as of the last successful persist
    #[must_use]
    pub fn snapshot(&self, kind: EntityKind) -> Vec<String> {
        self.lock_state().collection(kind).to_vec()
    }

    /// Copy of all three collections
    #[must_use]
    pub fn state(&self) -> LedgerState {
        self.lock_state().clone()
    }

    /// Total number of tracked identifiers
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_state().len()
    }

    /// Whether nothing is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_state().is_empty()
    }

    /// Clear every collection and persist the empty snapshot
    ///
    /// The current file is not read first, so this also recovers a corrupt
    /// ledger.
    pub fn reset_all(&self) -> ProbeResult<()> {
        let mut current = self.lock_state();
        let empty = LedgerState::default();
        self.with_file_lock(|dir| write_snapshot(dir, &self.path, &empty))
            .map_err(|err| {
                error!(path = %self.path.display(), %err, "ledger reset failed");
                err
            })?;
        *current = empty;
        info!(path = %self.path.display(), "entity ledger reset");
        Ok(())
    }

    /// Re-read the file, replacing the in-memory copy
    ///
    /// A file removed since the last persist empties the ledger.
    pub fn reload(&self) -> ProbeResult<()> {
        let mut current = self.lock_state();
        *current = read_snapshot(&self.path)?.unwrap_or_default();
        Ok(())
    }

    /// Record a created user
    pub fn track_user(&self, nickname: &str) -> ProbeResult<()> {
        self.track(EntityKind::User, nickname)
    }

    /// Record a created profile parameter
    pub fn track_param(&self, name: &str) -> ProbeResult<()> {
        self.track(EntityKind::Param, name)
    }

    /// Record a created domain
    pub fn track_domain(&self, domain: &str) -> ProbeResult<()> {
        self.track(EntityKind::Domain, domain)
    }

    /// Forget a user
    pub fn untrack_user(&self, nickname: &str) -> ProbeResult<()> {
        self.untrack(EntityKind::User, nickname)
    }

    /// Forget a profile parameter
    pub fn untrack_param(&self, name: &str) -> ProbeResult<()> {
        self.untrack(EntityKind::Param, name)
    }

    /// Forget a domain
    pub fn untrack_domain(&self, domain: &str) -> ProbeResult<()> {
        self.untrack(EntityKind::Domain, domain)
    }

    /// Tracked users
    #[must_use]
    pub fn users(&self) -> Vec<String> {
        self.snapshot(EntityKind::User)
    }

    /// Tracked profile parameters
    #[must_use]
    pub fn params(&self) -> Vec<String> {
        self.snapshot(EntityKind::Param)
    }

    /// Tracked domains
    #[must_use]
    pub fn domains(&self) -> Vec<String> {
        self.snapshot(EntityKind::Domain)
    }

    fn lock_state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load, apply and persist under the file lock.
    ///
    /// The in-memory copy changes only after the write succeeded.
    fn mutate<F>(&self, apply: F) -> ProbeResult<bool>
    where
        F: FnOnce(&mut LedgerState) -> bool,
    {
        let mut current = self.lock_state();
        let result = self.with_file_lock(|dir| {
            let mut next = match read_snapshot(&self.path)? {
                Some(on_disk) => on_disk,
                None => current.clone(),
            };
            let changed = apply(&mut next);
            write_snapshot(dir, &self.path, &next)?;
            Ok((next, changed))
        });
        match result {
            Ok((next, changed)) => {
                *current = next;
                Ok(changed)
            }
            Err(err) => {
                error!(path = %self.path.display(), %err, "ledger persist failed");
                Err(err)
            }
        }
    }

    fn with_file_lock<T>(&self, op: impl FnOnce(&Path) -> ProbeResult<T>) -> ProbeResult<T> {
        let dir = parent_dir(&self.path);
        fs::create_dir_all(dir).map_err(|source| ProbeError::LedgerIo {
            path: dir.to_path_buf(),
            source,
        })?;
        let lock_path = lock_path(&self.path);
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| ProbeError::LedgerIo {
                path: lock_path.clone(),
                source,
            })?;
        FileExt::lock_exclusive(&lock_file).map_err(|source| ProbeError::LedgerIo {
            path: lock_path,
            source,
        })?;
        let result = op(dir);
        drop(lock_file);
        result
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// Read the snapshot at `path`; `None` when the file does not exist.
fn read_snapshot(path: &Path) -> ProbeResult<Option<LedgerState>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ProbeError::LedgerIo {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| ProbeError::LedgerCorrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Whole-file replace: temp file in `dir`, fsync, rename over `path`.
fn write_snapshot(dir: &Path, path: &Path, state: &LedgerState) -> ProbeResult<()> {
    let io_err = |source: std::io::Error| ProbeError::LedgerIo {
        path: path.to_path_buf(),
        source,
    };
    let bytes = serde_json::to_vec_pretty(state)?;
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    temp.as_file_mut().write_all(&bytes).map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn ledger_in(dir: &TempDir) -> EntityLedger {
        EntityLedger::open(dir.path().join(".cache/created-entities.json")).unwrap()
    }

    fn on_disk(ledger: &EntityLedger) -> serde_json::Value {
        serde_json::from_slice(&fs::read(ledger.path()).unwrap()).unwrap()
    }

    mod kind_tests {
        use super::*;

        #[test]
        fn test_parse_aliases() {
            assert_eq!("users".parse::<EntityKind>().unwrap(), EntityKind::User);
            assert_eq!("Param".parse::<EntityKind>().unwrap(), EntityKind::Param);
            assert_eq!("domain".parse::<EntityKind>().unwrap(), EntityKind::Domain);
            assert!("widget".parse::<EntityKind>().is_err());
        }

        #[test]
        fn test_cleanup_order_puts_domains_last() {
            assert_eq!(EntityKind::CLEANUP_ORDER[2], EntityKind::Domain);
            assert_eq!(EntityKind::User.field_name(), "users");
        }
    }

    mod open_tests {
        use super::*;

        #[test]
        fn test_missing_file_is_empty_and_writes_nothing() {
            let dir = TempDir::new().unwrap();
            let ledger = ledger_in(&dir);
            assert!(ledger.is_empty());
            assert!(!dir.path().join(".cache").exists());
        }

        #[test]
        fn test_corrupt_file_fails() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("ledger.json");
            fs::write(&path, "{ not json").unwrap();
            let err = EntityLedger::open(&path).unwrap_err();
            assert!(matches!(err, ProbeError::LedgerCorrupt { .. }));
        }

        #[test]
        fn test_missing_field_is_corrupt() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("ledger.json");
            fs::write(&path, r#"{"users": [], "params": []}"#).unwrap();
            let err = EntityLedger::open(&path).unwrap_err();
            assert!(matches!(err, ProbeError::LedgerCorrupt { .. }));
        }

        #[test]
        fn test_wrong_type_is_corrupt() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("ledger.json");
            fs::write(&path, r#"{"users": "bob", "params": [], "domains": []}"#).unwrap();
            assert!(EntityLedger::open(&path).is_err());
        }

        #[test]
        fn test_unknown_fields_ignored() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("ledger.json");
            fs::write(
                &path,
                r#"{"users": ["bob"], "params": [], "domains": ["acme1"], "version": 2}"#,
            )
            .unwrap();
            let ledger = EntityLedger::open(&path).unwrap();
            assert_eq!(ledger.users(), vec!["bob"]);
            assert_eq!(ledger.domains(), vec!["acme1"]);
        }

        #[test]
        fn test_open_in_uses_default_location() {
            let dir = TempDir::new().unwrap();
            let ledger = EntityLedger::open_in(dir.path()).unwrap();
            assert_eq!(
                ledger.path(),
                dir.path().join(".cache").join("created-entities.json")
            );
        }
    }

    mod mutation_tests {
        use super::*;

        #[test]
        fn test_track_is_idempotent() {
            let dir = TempDir::new().unwrap();
            let ledger = ledger_in(&dir);
            ledger.track_domain("acme123").unwrap();
            ledger.track_domain("acme123").unwrap();
            assert_eq!(ledger.domains(), vec!["acme123"]);
        }

        #[test]
        fn test_untrack_removes_and_preserves_order() {
            let dir = TempDir::new().unwrap();
            let ledger = ledger_in(&dir);
            for id in ["a", "b", "c"] {
                ledger.track_user(id).unwrap();
            }
            ledger.untrack_user("b").unwrap();
            assert_eq!(ledger.users(), vec!["a", "c"]);
        }

        #[test]
        fn test_untrack_absent_is_noop_but_persists() {
            let dir = TempDir::new().unwrap();
            let ledger = ledger_in(&dir);
            ledger.untrack_param("never-tracked").unwrap();
            assert!(ledger.params().is_empty());
            assert!(ledger.path().exists());
            assert_eq!(
                on_disk(&ledger),
                serde_json::json!({"users": [], "params": [], "domains": []})
            );
        }

        #[test]
        fn test_empty_id_accepted() {
            let dir = TempDir::new().unwrap();
            let ledger = ledger_in(&dir);
            ledger.track_user("").unwrap();
            assert_eq!(ledger.users(), vec![""]);
        }

        #[test]
        fn test_track_creates_parent_directory() {
            let dir = TempDir::new().unwrap();
            let ledger = EntityLedger::open(dir.path().join("a/b/c/ledger.json")).unwrap();
            ledger.track_domain("deep").unwrap();
            assert!(dir.path().join("a/b/c/ledger.json").exists());
            assert!(dir.path().join("a/b/c/ledger.json.lock").exists());
        }

        #[test]
        fn test_documented_walkthrough() {
            let dir = TempDir::new().unwrap();
            let ledger = ledger_in(&dir);
            ledger.track_domain("acme123").unwrap();
            ledger.track_user("bob").unwrap();
            ledger.track_param("age").unwrap();
            assert_eq!(
                on_disk(&ledger),
                serde_json::json!({"users": ["bob"], "params": ["age"], "domains": ["acme123"]})
            );

            ledger.untrack_user("bob").unwrap();
            assert_eq!(
                on_disk(&ledger),
                serde_json::json!({"users": [], "params": ["age"], "domains": ["acme123"]})
            );

            let reopened = ledger_in(&dir);
            assert_eq!(reopened.params(), vec!["age"]);
            assert_eq!(reopened.domains(), vec!["acme123"]);
            assert!(reopened.users().is_empty());
        }

        #[test]
        fn test_untrack_domain_leaves_other_kinds() {
            let dir = TempDir::new().unwrap();
            let ledger = ledger_in(&dir);
            ledger.track_domain("acme123").unwrap();
            ledger.track_user("bob").unwrap();
            ledger.track_param("age").unwrap();

            ledger.untrack_domain("acme123").unwrap();
            assert!(ledger.domains().is_empty());
            assert_eq!(ledger.users(), vec!["bob"]);
            assert_eq!(ledger.params(), vec!["age"]);
            assert_eq!(
                on_disk(&ledger),
                serde_json::json!({"users": ["bob"], "params": ["age"], "domains": []})
            );
        }

        #[test]
        fn test_reload_after_file_removed_empties_ledger() {
            let dir = TempDir::new().unwrap();
            let ledger = ledger_in(&dir);
            ledger.track_domain("acme").unwrap();
            fs::remove_file(ledger.path()).unwrap();

            ledger.reload().unwrap();
            assert!(ledger.is_empty());
            ledger.track_user("bob").unwrap();
            assert_eq!(
                on_disk(&ledger),
                serde_json::json!({"users": ["bob"], "params": [], "domains": []})
            );
        }

        #[test]
        fn test_reset_all_clears_and_persists() {
            let dir = TempDir::new().unwrap();
            let ledger = ledger_in(&dir);
            ledger.track_user("bob").unwrap();
            ledger.track_param("age").unwrap();
            ledger.track_domain("acme123").unwrap();
            ledger.reset_all().unwrap();
            assert!(ledger.is_empty());
            assert!(ledger_in(&dir).is_empty());
            assert_eq!(
                on_disk(&ledger),
                serde_json::json!({"users": [], "params": [], "domains": []})
            );
        }

        #[test]
        fn test_reset_all_recovers_corrupt_file() {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("ledger.json");
            fs::write(&path, "garbage").unwrap();
            assert!(EntityLedger::open(&path).is_err());

            let ledger = EntityLedger {
                path: path.clone(),
                state: Mutex::new(LedgerState::default()),
            };
            ledger.reset_all().unwrap();
            assert!(EntityLedger::open(&path).unwrap().is_empty());
        }

        #[test]
        fn test_corrupt_file_blocks_mutation_and_keeps_memory() {
            let dir = TempDir::new().unwrap();
            let ledger = ledger_in(&dir);
            ledger.track_domain("acme1").unwrap();
            fs::write(ledger.path(), "[]").unwrap();
            let err = ledger.track_domain("acme2").unwrap_err();
            assert!(matches!(err, ProbeError::LedgerCorrupt { .. }));
            assert_eq!(ledger.domains(), vec!["acme1"]);
        }

        #[test]
        fn test_write_failure_leaves_state_unchanged() {
            let dir = TempDir::new().unwrap();
            let ledger = ledger_in(&dir);
            ledger.track_user("bob").unwrap();

            fs::remove_file(ledger.path()).unwrap();
            fs::create_dir(ledger.path()).unwrap();
            let err = ledger.track_user("alice").unwrap_err();
            assert!(matches!(err, ProbeError::LedgerIo { .. }), "{err}");
            assert_eq!(ledger.users(), vec!["bob"]);
        }

        #[test]
        fn test_unreadable_location_is_io_error() {
            let dir = TempDir::new().unwrap();
            let err = EntityLedger::open(dir.path()).unwrap_err();
            assert!(matches!(err, ProbeError::LedgerIo { .. }), "{err}");
        }

        #[test]
        fn test_directory_creation_failure_is_io_error() {
            let dir = TempDir::new().unwrap();
            let parent = dir.path().join("state");
            let ledger = EntityLedger::open(parent.join("ledger.json")).unwrap();
            fs::write(&parent, "").unwrap();

            let err = ledger.track_domain("acme123").unwrap_err();
            assert!(matches!(err, ProbeError::LedgerIo { .. }), "{err}");
            assert!(ledger.is_empty());
            assert!(EntityLedger::open(parent.join("ledger.json")).is_err());
        }
    }

    mod sharing_tests {
        use super::*;

        #[test]
        fn test_two_handles_merge_writes() {
            let dir = TempDir::new().unwrap();
            let first = ledger_in(&dir);
            let second = ledger_in(&dir);
            first.track_domain("alpha").unwrap();
            second.track_domain("beta").unwrap();
            assert_eq!(second.domains(), vec!["alpha", "beta"]);
            first.untrack_domain("beta").unwrap();
            assert_eq!(first.domains(), vec!["alpha"]);
            second.reload().unwrap();
            assert_eq!(second.domains(), vec!["alpha"]);
        }

        #[test]
        fn test_threads_lose_nothing() {
            let dir = TempDir::new().unwrap();
            let ledger = Arc::new(ledger_in(&dir));
            let handles: Vec<_> = (0..4)
                .map(|worker| {
                    let ledger = Arc::clone(&ledger);
                    std::thread::spawn(move || {
                        for i in 0..10 {
                            ledger.track_user(&format!("w{worker}-u{i}")).unwrap();
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
            assert_eq!(ledger.users().len(), 40);
            assert_eq!(ledger_in(&dir).users().len(), 40);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Track(EntityKind, String),
            Untrack(EntityKind, String),
        }

        fn kind() -> impl Strategy<Value = EntityKind> {
            prop_oneof![
                Just(EntityKind::User),
                Just(EntityKind::Param),
                Just(EntityKind::Domain)
            ]
        }

        fn op() -> impl Strategy<Value = Op> {
            let id = "[a-c]{1,2}";
            prop_oneof![
                (kind(), id).prop_map(|(k, s)| Op::Track(k, s)),
                (kind(), id).prop_map(|(k, s)| Op::Untrack(k, s)),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(24))]

            #[test]
            fn prop_ledger_matches_model_and_disk(ops in proptest::collection::vec(op(), 1..16)) {
                let dir = TempDir::new().unwrap();
                let ledger = ledger_in(&dir);
                let mut model = LedgerState::default();
                for op in &ops {
                    match op {
                        Op::Track(k, id) => {
                            ledger.track(*k, id).unwrap();
                            model.insert(*k, id);
                        }
                        Op::Untrack(k, id) => {
                            ledger.untrack(*k, id).unwrap();
                            model.remove(*k, id);
                        }
                    }
                }
                prop_assert_eq!(ledger.state(), model.clone());
                prop_assert_eq!(ledger_in(&dir).state(), model.clone());
                for k in EntityKind::ALL {
                    let items = model.collection(k);
                    let mut deduped = items.to_vec();
                    deduped.sort();
                    deduped.dedup();
                    prop_assert_eq!(deduped.len(), items.len());
                }
            }
        }
    }
}
