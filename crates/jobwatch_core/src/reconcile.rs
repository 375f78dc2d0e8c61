use std::collections::{BTreeSet, HashSet};

use crate::{BoundedIdSet, JobId, ProcessedJob};

/// Result of diffing one fetched batch against the persisted id sets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciliation {
    /// Jobs neither seen before nor deleted by the user.
    pub new_count: usize,
    pub notifiable_count: usize,
    pub notifiable: Vec<ProcessedJob>,
    /// Ids inserted into the seen set by this pass, in batch order.
    pub newly_seen: Vec<JobId>,
    /// Ids inserted into the collapsed set by this pass, in batch order.
    pub newly_collapsed: Vec<JobId>,
}

/// Diffs `jobs` against `seen`/`deleted` and updates `seen` and `collapsed` in place.
///
/// Every id of the batch that was unseen at the start of the pass enters
/// `seen`, deleted or not; annotated ones also enter `collapsed`. Only
/// undeleted, unannotated, unapplied newcomers are notifiable. Ids repeated
/// within one batch are counted once.
pub fn reconcile(
    jobs: &[ProcessedJob],
    seen: &mut BoundedIdSet,
    deleted: &BoundedIdSet,
    collapsed: &mut BTreeSet<JobId>,
) -> Reconciliation {
    let unseen_at_start: HashSet<&str> = jobs
        .iter()
        .map(ProcessedJob::id)
        .filter(|id| !seen.contains(id))
        .collect();

    let mut outcome = Reconciliation::default();
    let mut visited: HashSet<&str> = HashSet::new();
    for job in jobs {
        let id = job.id();
        if !unseen_at_start.contains(id) || !visited.insert(id) {
            continue;
        }

        if !deleted.contains(id) {
            outcome.new_count += 1;
            if job.is_notifiable() {
                outcome.notifiable.push(job.clone());
            }
        }

        if seen.insert(id) {
            outcome.newly_seen.push(id.to_string());
        }
        if job.is_annotated() && collapsed.insert(id.to_string()) {
            outcome.newly_collapsed.push(id.to_string());
        }
    }
    outcome.notifiable_count = outcome.notifiable.len();
    outcome
}

/// The batch as persisted for UI restoration: deleted ids removed, at most `limit` jobs.
pub fn recent_snapshot(
    jobs: &[ProcessedJob],
    deleted: &BoundedIdSet,
    limit: usize,
) -> Vec<ProcessedJob> {
    jobs.iter()
        .filter(|job| !deleted.contains(job.id()))
        .take(limit)
        .cloned()
        .collect()
}
