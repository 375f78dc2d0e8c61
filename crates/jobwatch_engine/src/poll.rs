use std::sync::Arc;
use std::time::Duration;

use jobwatch_core::Msg;
use jobwatch_logging::{watch_debug, watch_info};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::monitor::Monitor;

/// Runs a check right away and then every `period` until `cancel` fires.
/// Cancellation is observed between cycles; a running cycle completes.
pub async fn poll_loop(monitor: Arc<Monitor>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    watch_info!("Polling every {}s", period.as_secs());

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let outcome = monitor.dispatch(Msg::RunCheck { query: None }).await;
                watch_debug!("Scheduled check: {:?}", outcome);
            }
        }
    }
    watch_info!("Poll loop stopped");
}
