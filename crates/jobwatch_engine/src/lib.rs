//! Jobwatch engine: token rotation, GraphQL transport and effect execution.
mod cookies;
mod gate;
mod monitor;
mod notify;
mod operations;
mod persist;
mod poll;
mod reconcile;
mod recovery;
mod rotation;
mod sink;
mod store;
mod token;
mod transport;
mod types;

pub use cookies::{Cookie, CookieError, CookieJarFile, CookieStore, StaticCookieStore};
pub use gate::{GateState, RunGate, RunPermit};
pub use monitor::{Monitor, MonitorServices, MonitorSettings};
pub use notify::{DesktopNotifier, LogNotifier, Notification, Notifier, NotifyError, NotifyReport};
pub use operations::{
    GraphQlOperation, JobActivity, JobDetails, JobDetailsQuery, JobSearch, TalentProfile,
    TalentProfileQuery,
};
pub use persist::{AtomicFileWriter, PersistError};
pub use poll::poll_loop;
pub use reconcile::ReconciliationEngine;
pub use recovery::{recovery_url, BrowserOpener, LogOpener, OpenError, RecoveryOpener};
pub use rotation::TokenRotationExecutor;
pub use sink::{ChannelUiSink, NullUiSink, UiEvent, UiSink};
pub use store::{
    BoundedStateStore, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StoreError,
    KEY_COLLAPSED_JOB_IDS, KEY_DELETED_JOB_IDS, KEY_LAST_CHECK, KEY_MONITOR_STATUS,
    KEY_NEW_JOBS_IN_LAST_RUN, KEY_RECENT_FOUND_JOBS, KEY_SEEN_JOB_IDS, KEY_STICKY_TOKENS,
};
pub use token::{token_fingerprint, TokenHeuristics, TokenSource};
pub use transport::{
    classify_body, GraphQlTransport, ReqwestTransport, TransportSettings, ERROR_BODY_LIMIT,
};
pub use types::{CheckOutcome, EndpointId, Rotated};
