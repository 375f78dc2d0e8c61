use jobwatch_logging::{watch_info, watch_warn};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// One desktop notification. `priority` follows the 0..=2 scale of browser
/// notification APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub priority: u8,
}

/// Notification surface; `id` doubles as the click-through target.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, id: &str, notification: &Notification) -> Result<(), NotifyError>;
}

/// Desktop notifications through notify-rust.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, id: &str, notification: &Notification) -> Result<(), NotifyError> {
        let summary = notification.title.clone();
        let body = format!("{}\n{}", notification.message, id);
        // `show()` blocks on some platforms; keep it off the async workers.
        tokio::task::spawn_blocking(move || {
            notify_rust::Notification::new()
                .summary(&summary)
                .body(&body)
                .appname("jobwatch")
                .show()
                .map(|_| ())
                .map_err(|err| err.to_string())
        })
        .await
        .map_err(|err| NotifyError::SendFailed(err.to_string()))?
        .map_err(NotifyError::SendFailed)
    }
}

/// Writes notifications to the log only; for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, id: &str, notification: &Notification) -> Result<(), NotifyError> {
        watch_info!(
            "[notify p{}] {} | {} | {}",
            notification.priority,
            notification.title,
            notification.message,
            id
        );
        Ok(())
    }
}

/// Per-job delivery results of one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub delivered: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl NotifyReport {
    pub(crate) fn record(&mut self, id: String, result: Result<(), NotifyError>) {
        match result {
            Ok(()) => self.delivered.push(id),
            Err(err) => {
                watch_warn!("Notification {} failed: {}", id, err);
                self.failed.push((id, err.to_string()));
            }
        }
    }
}
