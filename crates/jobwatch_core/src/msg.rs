use crate::{ApiError, FilterOutcome, JobId, RecoveryTarget, WatchSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Restore persisted sets and status at startup.
    RestoreState(WatchSnapshot),
    /// Sets as currently persisted, possibly edited by another process.
    /// Seen and deleted ids are merged; collapsed ids are taken as stored.
    StorageSynced(WatchSnapshot),
    /// Timer tick or manual refresh; `None` uses the configured default query.
    RunCheck { query: Option<String> },
    /// A check was requested while another cycle was still running.
    CheckRejectedBusy,
    /// A fetched and annotated batch is ready for reconciliation.
    CheckCompleted {
        outcome: FilterOutcome,
        checked_at: String,
    },
    /// The fetch failed; `recovery` is where the user can re-establish a session.
    CheckFailed {
        error: ApiError,
        recovery: RecoveryTarget,
        checked_at: String,
    },
    /// A details or profile lookup failed outside of a check cycle.
    LookupFailed {
        error: ApiError,
        recovery: RecoveryTarget,
    },
    /// User removed a job from the list.
    DeleteJob { id: JobId },
    /// User expanded or collapsed a job card.
    ToggleCollapsed { id: JobId },
    /// User reset every job card to expanded.
    ClearCollapsed,
}
