use crate::reconcile::{recent_snapshot, reconcile};
use crate::{Effect, FailureClass, Msg, WatchState};

pub const BUSY_STATUS: &str = "Busy: a check is already running.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: WatchState, msg: Msg) -> (WatchState, Vec<Effect>) {
    let effects = match msg {
        Msg::RestoreState(snapshot) => {
            state.restore(snapshot);
            Vec::new()
        }
        Msg::StorageSynced(snapshot) => {
            state.merge_stored(snapshot);
            Vec::new()
        }
        Msg::RunCheck { query } => {
            let query = query
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty());
            vec![Effect::StartCheck { query }]
        }
        Msg::CheckRejectedBusy => {
            state.set_status(BUSY_STATUS);
            vec![Effect::PersistStatus]
        }
        Msg::CheckCompleted {
            outcome,
            checked_at,
        } => {
            let reconciliation = reconcile(
                &outcome.processed_jobs,
                &mut state.seen,
                &state.deleted,
                &mut state.collapsed,
            );
            state.recent = recent_snapshot(
                &outcome.processed_jobs,
                &state.deleted,
                state.limits().recent_limit,
            );
            state.new_jobs_in_last_run = reconciliation.new_count;
            state.last_check = Some(checked_at);
            let status = format!(
                "Found {} jobs: {} new, {} notified ({} title-excluded, {} low-priority skill, {} low-priority country).",
                outcome.processed_jobs.len(),
                reconciliation.new_count,
                reconciliation.notifiable_count,
                outcome.title_excluded_count,
                outcome.skill_low_priority_count,
                outcome.client_country_low_priority_count,
            );
            state.set_status(status);

            let mut effects = Vec::with_capacity(3);
            if !reconciliation.notifiable.is_empty() {
                effects.push(Effect::Notify {
                    jobs: reconciliation.notifiable,
                });
            }
            effects.push(Effect::PersistState);
            effects.push(Effect::BroadcastStateChanged);
            effects
        }
        Msg::CheckFailed {
            error,
            recovery,
            checked_at,
        } => {
            let class = FailureClass::of(&error);
            state.last_check = Some(checked_at);
            state.new_jobs_in_last_run = 0;
            state.set_status(class.status_message(&error));
            let mut effects = vec![Effect::PersistStatus];
            if class.opens_recovery() {
                effects.push(Effect::OpenRecovery { target: recovery });
            }
            effects.push(Effect::BroadcastStateChanged);
            effects
        }
        Msg::LookupFailed { error, recovery } => {
            let class = FailureClass::of(&error);
            state.set_status(class.status_message(&error));
            let mut effects = vec![Effect::PersistStatus];
            if class.opens_recovery() {
                effects.push(Effect::OpenRecovery { target: recovery });
            }
            effects.push(Effect::BroadcastStateChanged);
            effects
        }
        Msg::DeleteJob { id } => {
            let id = id.trim().to_string();
            if id.is_empty() {
                return (state, Vec::new());
            }
            state.deleted.insert(id.clone());
            state.recent.retain(|job| job.id() != id);
            state.mark_dirty();
            vec![Effect::PersistState, Effect::BroadcastStateChanged]
        }
        Msg::ToggleCollapsed { id } => {
            let id = id.trim().to_string();
            if id.is_empty() {
                return (state, Vec::new());
            }
            if !state.collapsed.remove(&id) {
                state.collapsed.insert(id);
            }
            state.mark_dirty();
            vec![Effect::PersistState, Effect::BroadcastStateChanged]
        }
        Msg::ClearCollapsed => {
            if state.collapsed.is_empty() {
                return (state, Vec::new());
            }
            state.collapsed.clear();
            state.mark_dirty();
            vec![Effect::PersistState, Effect::BroadcastStateChanged]
        }
    };

    (state, effects)
}
