use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::view_model::{JobCardView, WatchViewModel};
use crate::{BoundedIdSet, JobId, ProcessedJob};

pub const DEFAULT_SEEN_CAPACITY: usize = 500;
pub const DEFAULT_DELETED_CAPACITY: usize = 200;
pub const DEFAULT_FETCH_COUNT: usize = 10;

/// Size caps for the persisted sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateLimits {
    pub seen_capacity: usize,
    pub deleted_capacity: usize,
    /// Upper bound of `recentFoundJobs`; matches the fetch batch size.
    pub recent_limit: usize,
}

impl Default for StateLimits {
    fn default() -> Self {
        Self {
            seen_capacity: DEFAULT_SEEN_CAPACITY,
            deleted_capacity: DEFAULT_DELETED_CAPACITY,
            recent_limit: DEFAULT_FETCH_COUNT,
        }
    }
}

/// Persisted form of [`WatchState`], as read from and written to storage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatchSnapshot {
    pub seen_job_ids: Vec<JobId>,
    pub deleted_job_ids: Vec<JobId>,
    pub collapsed_job_ids: Vec<JobId>,
    pub recent_found_jobs: Vec<ProcessedJob>,
    pub monitor_status: Option<String>,
    pub last_check_timestamp: Option<String>,
    pub new_jobs_in_last_run: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatchState {
    limits: StateLimits,
    pub(crate) seen: BoundedIdSet,
    pub(crate) deleted: BoundedIdSet,
    pub(crate) collapsed: BTreeSet<JobId>,
    pub(crate) recent: Vec<ProcessedJob>,
    pub(crate) status: String,
    pub(crate) last_check: Option<String>,
    pub(crate) new_jobs_in_last_run: usize,
    dirty: bool,
}

impl Default for WatchState {
    fn default() -> Self {
        Self::new(StateLimits::default())
    }
}

impl WatchState {
    pub fn new(limits: StateLimits) -> Self {
        Self {
            limits,
            seen: BoundedIdSet::new(limits.seen_capacity),
            deleted: BoundedIdSet::new(limits.deleted_capacity),
            collapsed: BTreeSet::new(),
            recent: Vec::new(),
            status: "Idle".to_string(),
            last_check: None,
            new_jobs_in_last_run: 0,
            dirty: false,
        }
    }

    pub fn limits(&self) -> StateLimits {
        self.limits
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn seen(&self) -> &BoundedIdSet {
        &self.seen
    }

    pub fn deleted(&self) -> &BoundedIdSet {
        &self.deleted
    }

    pub fn collapsed(&self) -> &BTreeSet<JobId> {
        &self.collapsed
    }

    pub fn recent(&self) -> &[ProcessedJob] {
        &self.recent
    }

    pub fn view(&self) -> WatchViewModel {
        WatchViewModel {
            status: self.status.clone(),
            last_check: self.last_check.clone(),
            new_jobs_in_last_run: self.new_jobs_in_last_run,
            jobs: self
                .recent
                .iter()
                .map(|job| JobCardView::new(job, self.collapsed.contains(job.id())))
                .collect(),
        }
    }

    pub fn snapshot(&self) -> WatchSnapshot {
        WatchSnapshot {
            seen_job_ids: self.seen.to_vec(),
            deleted_job_ids: self.deleted.to_vec(),
            collapsed_job_ids: self.collapsed.iter().cloned().collect(),
            recent_found_jobs: self.recent.clone(),
            monitor_status: Some(self.status.clone()),
            last_check_timestamp: self.last_check.clone(),
            new_jobs_in_last_run: self.new_jobs_in_last_run,
        }
    }

    pub(crate) fn restore(&mut self, snapshot: WatchSnapshot) {
        self.seen = BoundedIdSet::from_ids(self.limits.seen_capacity, snapshot.seen_job_ids);
        self.deleted =
            BoundedIdSet::from_ids(self.limits.deleted_capacity, snapshot.deleted_job_ids);
        self.collapsed = snapshot.collapsed_job_ids.into_iter().collect();
        let deleted = &self.deleted;
        self.recent = snapshot
            .recent_found_jobs
            .into_iter()
            .filter(|job| !deleted.contains(job.id()))
            .take(self.limits.recent_limit)
            .collect();
        if let Some(status) = snapshot.monitor_status {
            self.status = status;
        }
        self.last_check = snapshot.last_check_timestamp;
        self.new_jobs_in_last_run = snapshot.new_jobs_in_last_run;
        self.mark_dirty();
    }

    /// Folds in sets another process may have written. Marks the state dirty
    /// only when something changed.
    pub(crate) fn merge_stored(&mut self, snapshot: WatchSnapshot) {
        let mut changed = false;
        for id in snapshot.seen_job_ids {
            changed |= self.seen.insert(id);
        }
        for id in snapshot.deleted_job_ids {
            changed |= self.deleted.insert(id);
        }
        let collapsed: BTreeSet<JobId> = snapshot.collapsed_job_ids.into_iter().collect();
        if collapsed != self.collapsed {
            self.collapsed = collapsed;
            changed = true;
        }
        let deleted = &self.deleted;
        let before = self.recent.len();
        self.recent.retain(|job| !deleted.contains(job.id()));
        changed |= self.recent.len() != before;
        if changed {
            self.mark_dirty();
        }
    }

    pub(crate) fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.mark_dirty();
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
