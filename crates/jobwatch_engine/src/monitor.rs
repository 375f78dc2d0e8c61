use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use jobwatch_core::{update, ApiError, Effect, FilterRules, Msg, WatchState, WatchViewModel};
use jobwatch_logging::{watch_debug, watch_error, watch_info, watch_warn};

use crate::gate::{GateState, RunGate};
use crate::operations::{
    GraphQlOperation, JobDetails, JobDetailsQuery, JobSearch, TalentProfile, TalentProfileQuery,
};
use crate::reconcile::ReconciliationEngine;
use crate::recovery::{recovery_url, RecoveryOpener};
use crate::rotation::TokenRotationExecutor;
use crate::sink::{UiEvent, UiSink};
use crate::store::BoundedStateStore;
use crate::types::CheckOutcome;

/// Per-run settings; fixed for the lifetime of a [`Monitor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub site_url: String,
    pub default_query: String,
    pub fetch_count: usize,
}

/// Collaborators a [`Monitor`] drives.
#[derive(Clone)]
pub struct MonitorServices {
    pub executor: TokenRotationExecutor,
    pub reconciler: ReconciliationEngine,
    pub store: BoundedStateStore,
    pub opener: Arc<dyn RecoveryOpener>,
    pub sink: Arc<dyn UiSink>,
}

/// Owns the watch state and executes the effects `update` asks for.
/// Timer and manual triggers share one instance, and so one run gate.
pub struct Monitor {
    settings: MonitorSettings,
    filters: FilterRules,
    services: MonitorServices,
    gate: RunGate,
    state: Mutex<WatchState>,
}

impl Monitor {
    pub fn new(settings: MonitorSettings, filters: FilterRules, services: MonitorServices) -> Self {
        let state = WatchState::new(services.store.limits());
        Self {
            settings,
            filters,
            services,
            gate: RunGate::new(),
            state: Mutex::new(state),
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    pub fn view(&self) -> WatchViewModel {
        self.lock_state().view()
    }

    /// Loads persisted sets and status into memory.
    pub async fn restore(&self) {
        let snapshot = self.services.store.load_snapshot();
        watch_info!(
            "Restored {} seen, {} deleted, {} recent jobs",
            snapshot.seen_job_ids.len(),
            snapshot.deleted_job_ids.len(),
            snapshot.recent_found_jobs.len()
        );
        self.dispatch(Msg::RestoreState(snapshot)).await;
    }

    /// Applies a message and runs its effects. Returns the outcome when the
    /// message started a check.
    pub async fn dispatch(&self, msg: Msg) -> Option<CheckOutcome> {
        if matches!(
            msg,
            Msg::DeleteJob { .. } | Msg::ToggleCollapsed { .. } | Msg::ClearCollapsed
        ) {
            self.sync_from_storage().await;
        }
        let mut outcome = None;
        for effect in self.apply(msg) {
            match effect {
                Effect::StartCheck { query } => outcome = Some(self.run_check(query).await),
                other => self.perform(other).await,
            }
        }
        outcome
    }

    /// One check cycle. Rejected with [`CheckOutcome::Busy`] while another
    /// cycle holds the gate.
    pub async fn run_check(&self, query: Option<String>) -> CheckOutcome {
        let Some(_permit) = self.gate.try_acquire() else {
            watch_info!("Check rejected: a cycle is already running");
            self.apply_and_perform(Msg::CheckRejectedBusy).await;
            return CheckOutcome::Busy;
        };
        self.sync_from_storage().await;

        let query = query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| self.settings.default_query.clone());
        let op = JobSearch {
            query,
            count: self.settings.fetch_count,
        };
        watch_info!("Checking for jobs matching {:?}", op.query);

        let result = self.services.executor.call_with_rotation(&op).await;
        let checked_at = Utc::now().to_rfc3339();
        match result {
            Ok(rotated) => {
                let outcome = self.filters.apply(&rotated.result);
                let fetched = outcome.processed_jobs.len();
                let effects = self.apply(Msg::CheckCompleted {
                    outcome,
                    checked_at,
                });
                let notifiable_count = effects
                    .iter()
                    .map(|effect| match effect {
                        Effect::Notify { jobs } => jobs.len(),
                        _ => 0,
                    })
                    .sum();
                let new_count = self.lock_state().view().new_jobs_in_last_run;
                self.perform_all(effects).await;
                watch_info!(
                    "Check finished: {} fetched, {} new, {} notified",
                    fetched,
                    new_count,
                    notifiable_count
                );
                CheckOutcome::Completed {
                    fetched,
                    new_count,
                    notifiable_count,
                }
            }
            Err(error) => {
                let kind = error.kind();
                watch_warn!("Check failed ({}): {}", kind, error);
                self.apply_and_perform(Msg::CheckFailed {
                    error,
                    recovery: op.recovery_target(),
                    checked_at,
                })
                .await;
                CheckOutcome::Failed { kind }
            }
        }
    }

    /// Picks up deletions and collapse changes another process (a one-shot
    /// CLI command) wrote, so the next persist does not overwrite them.
    async fn sync_from_storage(&self) {
        let snapshot = self.services.store.load_snapshot();
        self.apply_and_perform(Msg::StorageSynced(snapshot)).await;
    }

    pub async fn fetch_details(&self, ciphertext: &str) -> Result<JobDetails, ApiError> {
        self.lookup(&JobDetailsQuery {
            ciphertext: ciphertext.trim().to_string(),
        })
        .await
    }

    pub async fn fetch_profile(&self, profile_id: &str) -> Result<TalentProfile, ApiError> {
        self.lookup(&TalentProfileQuery {
            profile_id: profile_id.trim().to_string(),
        })
        .await
    }

    async fn lookup<Op: GraphQlOperation>(&self, op: &Op) -> Result<Op::Output, ApiError> {
        match self.services.executor.call_with_rotation(op).await {
            Ok(rotated) => Ok(rotated.result),
            Err(error) => {
                watch_warn!("{} lookup failed: {}", op.endpoint(), error);
                self.apply_and_perform(Msg::LookupFailed {
                    error: error.clone(),
                    recovery: op.recovery_target(),
                })
                .await;
                Err(error)
            }
        }
    }

    fn apply(&self, msg: Msg) -> Vec<Effect> {
        let mut guard = self.lock_state();
        let limits = guard.limits();
        let state = std::mem::replace(&mut *guard, WatchState::new(limits));
        let (mut state, mut effects) = update(state, msg);
        if state.consume_dirty() && effects.is_empty() {
            effects.push(Effect::BroadcastStateChanged);
        }
        *guard = state;
        effects
    }

    async fn apply_and_perform(&self, msg: Msg) {
        let effects = self.apply(msg);
        self.perform_all(effects).await;
    }

    async fn perform_all(&self, effects: Vec<Effect>) {
        for effect in effects {
            self.perform(effect).await;
        }
    }

    async fn perform(&self, effect: Effect) {
        match effect {
            Effect::StartCheck { query } => {
                watch_warn!("Ignoring nested check request for {:?}", query);
            }
            Effect::Notify { jobs } => {
                self.services.reconciler.notify_all(&jobs).await;
            }
            Effect::PersistState => {
                let result = self.services.reconciler.persist(&self.lock_state());
                if let Err(err) = result {
                    watch_error!("Failed to persist state: {}", err);
                }
            }
            Effect::PersistStatus => {
                let result = self.services.reconciler.persist_status(&self.lock_state());
                if let Err(err) = result {
                    watch_error!("Failed to persist status: {}", err);
                }
            }
            Effect::OpenRecovery { target } => {
                let opened = recovery_url(&self.settings.site_url, &target)
                    .and_then(|url| self.services.opener.open(&url));
                if let Err(err) = opened {
                    watch_error!("Failed to open recovery page: {}", err);
                }
            }
            Effect::BroadcastStateChanged => {
                watch_debug!("Broadcasting state change");
                self.services.sink.emit(UiEvent::StateChanged);
            }
        }
    }

    // A panic mid-update leaves the previous state in place; keep serving it.
    fn lock_state(&self) -> MutexGuard<'_, WatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
