use std::sync::Arc;

use futures_util::future::join_all;
use jobwatch_core::{format_budget, ProcessedJob, WatchState};
use jobwatch_logging::{watch_debug, watch_info};

use crate::notify::{Notification, Notifier, NotifyReport};
use crate::store::{BoundedStateStore, StoreError};

const TITLE_LIMIT: usize = 80;

/// Side effects of a reconciliation pass: notification fan-out and
/// persisting the bounded sets.
#[derive(Clone)]
pub struct ReconciliationEngine {
    notifier: Arc<dyn Notifier>,
    store: BoundedStateStore,
    site_url: String,
}

impl ReconciliationEngine {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        store: BoundedStateStore,
        site_url: impl Into<String>,
    ) -> Self {
        Self {
            notifier,
            store,
            site_url: site_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Notifies every job concurrently. One failed delivery never blocks
    /// or cancels the others.
    pub async fn notify_all(&self, jobs: &[ProcessedJob]) -> NotifyReport {
        let deliveries = jobs.iter().map(|job| {
            let id = self.job_url(job);
            let notification = self.notification_for(job);
            async move {
                let result = self.notifier.notify(&id, &notification).await;
                (id, result)
            }
        });

        let mut report = NotifyReport::default();
        for (id, result) in join_all(deliveries).await {
            report.record(id, result);
        }
        watch_info!(
            "Notifications: {} delivered, {} failed",
            report.delivered.len(),
            report.failed.len()
        );
        report
    }

    /// Writes id sets, recent jobs and status.
    pub fn persist(&self, state: &WatchState) -> Result<(), StoreError> {
        self.store.save_snapshot(&state.snapshot())
    }

    pub fn persist_status(&self, state: &WatchState) -> Result<(), StoreError> {
        let snapshot = state.snapshot();
        watch_debug!("Persisting status: {}", state.status());
        self.store.save_status(
            snapshot.monitor_status.as_deref(),
            snapshot.last_check_timestamp.as_deref(),
        )
    }

    /// Canonical public URL of a posting; doubles as the notification id.
    pub fn job_url(&self, job: &ProcessedJob) -> String {
        format!("{}{}", self.site_url, job.job.page_path())
    }

    pub fn notification_for(&self, job: &ProcessedJob) -> Notification {
        let client = &job.job.client;
        let verified = client.is_payment_verified();
        let country = client.country.as_deref().unwrap_or("Unknown country");
        let verification = if verified {
            "payment verified"
        } else {
            "payment unverified"
        };
        Notification {
            title: format!("New job: {}", truncate_title(&job.job.title)),
            message: format!(
                "{} | {} | {}",
                format_budget(job.job.budget.as_ref()),
                country,
                verification
            ),
            priority: if verified { 2 } else { 1 },
        }
    }
}

fn truncate_title(title: &str) -> String {
    let title = title.trim();
    if title.chars().count() <= TITLE_LIMIT {
        return title.to_string();
    }
    let mut short: String = title.chars().take(TITLE_LIMIT).collect();
    short.push_str("...");
    short
}
