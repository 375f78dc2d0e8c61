//! Jobwatch core: job model, filtering, reconciliation and the pure state machine.
mod bounded;
mod budget;
mod effect;
mod error;
mod filter;
mod job;
mod msg;
mod reconcile;
mod recovery;
mod state;
mod update;
mod view_model;

pub use bounded::BoundedIdSet;
pub use budget::{format_budget, format_total_spent};
pub use effect::Effect;
pub use error::{ApiError, ErrorKind, FailureClass};
pub use filter::{FilterOutcome, FilterRules};
pub use job::{Budget, BudgetKind, Client, Job, JobId, ProcessedJob, Skill};
pub use msg::Msg;
pub use reconcile::{recent_snapshot, reconcile, Reconciliation};
pub use recovery::RecoveryTarget;
pub use state::{
    StateLimits, WatchSnapshot, WatchState, DEFAULT_DELETED_CAPACITY, DEFAULT_FETCH_COUNT,
    DEFAULT_SEEN_CAPACITY,
};
pub use update::{update, BUSY_STATUS};
pub use view_model::{JobCardView, WatchViewModel};
