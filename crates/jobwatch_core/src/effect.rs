use crate::{ProcessedJob, RecoveryTarget};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartCheck { query: Option<String> },
    /// Fire one notification per job; delivery failures stay local to each job.
    Notify { jobs: Vec<ProcessedJob> },
    /// Write id sets, recent jobs and status.
    PersistState,
    /// Write only the status line.
    PersistStatus,
    OpenRecovery { target: RecoveryTarget },
    BroadcastStateChanged,
}
