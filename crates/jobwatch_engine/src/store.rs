use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use jobwatch_core::{BoundedIdSet, StateLimits, WatchSnapshot};
use jobwatch_logging::{watch_debug, watch_info, watch_warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};
use crate::types::EndpointId;

pub const KEY_SEEN_JOB_IDS: &str = "seenJobIds";
pub const KEY_DELETED_JOB_IDS: &str = "deletedJobIds";
pub const KEY_COLLAPSED_JOB_IDS: &str = "collapsedJobIds";
pub const KEY_RECENT_FOUND_JOBS: &str = "recentFoundJobs";
pub const KEY_MONITOR_STATUS: &str = "monitorStatus";
pub const KEY_LAST_CHECK: &str = "lastCheckTimestamp";
pub const KEY_NEW_JOBS_IN_LAST_RUN: &str = "newJobsInLastRun";
pub const KEY_STICKY_TOKENS: &str = "stickyTokens";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file unreadable: {0}")]
    Read(#[from] io::Error),
    #[error("state value not encodable: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("state file not written: {0}")]
    Write(#[from] PersistError),
    #[error("state store lock poisoned")]
    Poisoned,
}

/// JSON key-value storage. No transactions: callers serialize access
/// through the run gate, not through the store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    fn set_many(&self, entries: Vec<(&str, Value)>) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// All keys in one JSON document, loaded lazily and rewritten atomically on
/// every `set`. The cache is reloaded whenever the file changes on disk, so
/// writes from another process are picked up before the next read or write.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    cache: Mutex<Option<CachedDocument>>,
}

#[derive(Debug)]
struct CachedDocument {
    entries: BTreeMap<String, Value>,
    stamp: Option<FileStamp>,
}

/// Modification time and length; a change in either means another writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn stamp(&self) -> Option<FileStamp> {
        let meta = fs::metadata(&self.path).ok()?;
        Some(FileStamp {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }

    /// A document that does not parse is moved aside and replaced by an empty
    /// one; the next write starts a fresh file.
    fn load(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                watch_info!("No state file at {:?}; starting fresh", self.path);
                return Ok(BTreeMap::new());
            }
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                let aside = self.corrupt_path();
                watch_warn!(
                    "State file {:?} is corrupt ({}); moving it to {:?} and starting fresh",
                    self.path,
                    err,
                    aside
                );
                if let Err(rename_err) = fs::rename(&self.path, &aside) {
                    watch_warn!("Could not move corrupt state file: {}", rename_err);
                }
                Ok(BTreeMap::new())
            }
        }
    }

    fn corrupt_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "jobwatch_state.json".to_string());
        self.path.with_file_name(format!("{name}.corrupt"))
    }

    fn write(&self, entries: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        let dir = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let filename = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "jobwatch_state.json".to_string());
        let content = serde_json::to_vec_pretty(entries)?;
        AtomicFileWriter::new(dir).write(&filename, &content)?;
        Ok(())
    }

    fn with_document<T>(
        &self,
        apply: impl FnOnce(&mut CachedDocument) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.cache.lock().map_err(|_| StoreError::Poisoned)?;
        let current = self.stamp();
        let stale = match guard.as_ref() {
            Some(cached) => cached.stamp != current,
            None => true,
        };
        if stale {
            if guard.is_some() {
                watch_debug!("State file {:?} changed on disk; reloading", self.path);
            }
            let entries = self.load()?;
            *guard = Some(CachedDocument {
                entries,
                stamp: self.stamp(),
            });
        }
        match guard.as_mut() {
            Some(cached) => apply(cached),
            None => Err(StoreError::Poisoned),
        }
    }

    /// Applies `change` to a copy of the document and swaps it into the cache
    /// only once the copy is on disk. `change` returns whether anything changed.
    fn modify(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, Value>) -> bool,
    ) -> Result<(), StoreError> {
        self.with_document(|cached| {
            let mut next = cached.entries.clone();
            if !change(&mut next) {
                return Ok(());
            }
            self.write(&next)?;
            cached.entries = next;
            cached.stamp = self.stamp();
            Ok(())
        })
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.with_document(|cached| Ok(cached.entries.get(key).cloned()))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value);
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.modify(|entries| entries.remove(key).is_some())
    }

    fn set_many(&self, updates: Vec<(&str, Value)>) -> Result<(), StoreError> {
        self.modify(|entries| {
            for (key, value) in updates {
                entries.insert(key.to_string(), value);
            }
            true
        })
    }
}

/// Typed, size-capped view over a [`KeyValueStore`]: the identifier sets,
/// recent jobs, status line and per-endpoint sticky tokens.
#[derive(Clone)]
pub struct BoundedStateStore {
    kv: Arc<dyn KeyValueStore>,
    limits: StateLimits,
}

impl BoundedStateStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, limits: StateLimits) -> Self {
        Self { kv, limits }
    }

    pub fn limits(&self) -> StateLimits {
        self.limits
    }

    /// Reads everything the state machine restores at startup. Unreadable
    /// keys fall back to empty values with a warning.
    pub fn load_snapshot(&self) -> WatchSnapshot {
        WatchSnapshot {
            seen_job_ids: self.read_or_default(KEY_SEEN_JOB_IDS),
            deleted_job_ids: self.read_or_default(KEY_DELETED_JOB_IDS),
            collapsed_job_ids: self.read_or_default(KEY_COLLAPSED_JOB_IDS),
            recent_found_jobs: self.read_or_default(KEY_RECENT_FOUND_JOBS),
            monitor_status: self.read_or_default(KEY_MONITOR_STATUS),
            last_check_timestamp: self.read_or_default(KEY_LAST_CHECK),
            new_jobs_in_last_run: self.read_or_default(KEY_NEW_JOBS_IN_LAST_RUN),
        }
    }

    /// Writes every key of the snapshot, trimming the id sets to capacity.
    pub fn save_snapshot(&self, snapshot: &WatchSnapshot) -> Result<(), StoreError> {
        let seen = BoundedIdSet::from_ids(
            self.limits.seen_capacity,
            snapshot.seen_job_ids.iter().cloned(),
        );
        let deleted = BoundedIdSet::from_ids(
            self.limits.deleted_capacity,
            snapshot.deleted_job_ids.iter().cloned(),
        );
        let recent: Vec<_> = snapshot
            .recent_found_jobs
            .iter()
            .filter(|job| !deleted.contains(job.id()))
            .take(self.limits.recent_limit)
            .collect();

        let mut entries = vec![
            (KEY_SEEN_JOB_IDS, serde_json::to_value(seen.to_vec())?),
            (KEY_DELETED_JOB_IDS, serde_json::to_value(deleted.to_vec())?),
            (
                KEY_COLLAPSED_JOB_IDS,
                serde_json::to_value(&snapshot.collapsed_job_ids)?,
            ),
            (KEY_RECENT_FOUND_JOBS, serde_json::to_value(&recent)?),
            (
                KEY_NEW_JOBS_IN_LAST_RUN,
                serde_json::to_value(snapshot.new_jobs_in_last_run)?,
            ),
        ];
        if let Some(status) = &snapshot.monitor_status {
            entries.push((KEY_MONITOR_STATUS, Value::String(status.clone())));
        }
        if let Some(last_check) = &snapshot.last_check_timestamp {
            entries.push((KEY_LAST_CHECK, Value::String(last_check.clone())));
        }
        self.kv.set_many(entries)?;
        watch_debug!(
            "Persisted {} seen, {} deleted, {} collapsed, {} recent",
            seen.len(),
            deleted.len(),
            snapshot.collapsed_job_ids.len(),
            recent.len()
        );
        Ok(())
    }

    pub fn save_status(
        &self,
        status: Option<&str>,
        last_check: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut entries = Vec::with_capacity(2);
        if let Some(status) = status {
            entries.push((KEY_MONITOR_STATUS, Value::String(status.to_string())));
        }
        if let Some(last_check) = last_check {
            entries.push((KEY_LAST_CHECK, Value::String(last_check.to_string())));
        }
        if entries.is_empty() {
            return Ok(());
        }
        self.kv.set_many(entries)
    }

    pub fn load_seen(&self) -> BoundedIdSet {
        let ids: Vec<String> = self.read_or_default(KEY_SEEN_JOB_IDS);
        BoundedIdSet::from_ids(self.limits.seen_capacity, ids)
    }

    pub fn sticky_token(&self, endpoint: EndpointId) -> Option<String> {
        self.sticky_tokens().remove(endpoint.as_str())
    }

    pub fn set_sticky_token(&self, endpoint: EndpointId, token: &str) -> Result<(), StoreError> {
        let mut tokens = self.sticky_tokens();
        tokens.insert(endpoint.as_str().to_string(), token.to_string());
        self.write(KEY_STICKY_TOKENS, &tokens)
    }

    pub fn clear_sticky_token(&self, endpoint: EndpointId) -> Result<(), StoreError> {
        let mut tokens = self.sticky_tokens();
        if tokens.remove(endpoint.as_str()).is_some() {
            self.write(KEY_STICKY_TOKENS, &tokens)?;
        }
        Ok(())
    }

    fn sticky_tokens(&self) -> BTreeMap<String, String> {
        self.read_or_default(KEY_STICKY_TOKENS)
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let value = match self.kv.get(key) {
            Ok(Some(value)) => value,
            Ok(None) => return T::default(),
            Err(err) => {
                watch_warn!("Failed to read {}: {}", key, err);
                return T::default();
            }
        };
        match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(err) => {
                watch_warn!("Ignoring malformed {}: {}", key, err);
                T::default()
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.kv.set(key, serde_json::to_value(value)?)
    }
}
