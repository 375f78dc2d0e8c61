//! Builds a [`Monitor`] and its collaborators from the configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use jobwatch_engine::{
    BoundedStateStore, BrowserOpener, CookieJarFile, DesktopNotifier, FileKeyValueStore,
    LogNotifier, LogOpener, Monitor, MonitorServices, Notifier, ReconciliationEngine,
    RecoveryOpener, ReqwestTransport, TokenRotationExecutor, TokenSource, UiSink,
};
use jobwatch_logging::watch_info;

use crate::config::{AppConfig, NotifierKind};

pub fn build_monitor(config: &AppConfig, sink: Arc<dyn UiSink>) -> Result<Monitor> {
    let transport = ReqwestTransport::new(config.transport_settings())
        .context("failed to build the HTTP client")?;
    let kv = Arc::new(FileKeyValueStore::new(&config.state_file));
    let store = BoundedStateStore::new(kv, config.state_limits());
    let tokens = TokenSource::new(
        Arc::new(CookieJarFile::new(&config.cookie_jar)),
        config.cookie_domain.clone(),
        config.token_heuristics.clone(),
    );

    let notifier: Arc<dyn Notifier> = match config.notifier {
        NotifierKind::Desktop => Arc::new(DesktopNotifier::new()),
        NotifierKind::Log => Arc::new(LogNotifier),
    };
    let opener: Arc<dyn RecoveryOpener> = if config.open_recovery_in_browser {
        Arc::new(BrowserOpener)
    } else {
        Arc::new(LogOpener)
    };

    watch_info!(
        "Monitor: state {:?}, cookies {:?}, notifier {:?}",
        config.state_file,
        config.cookie_jar,
        config.notifier
    );

    let services = MonitorServices {
        executor: TokenRotationExecutor::new(tokens, Arc::new(transport), store.clone()),
        reconciler: ReconciliationEngine::new(notifier, store.clone(), config.site_url.clone()),
        store,
        opener,
        sink,
    };
    Ok(Monitor::new(
        config.monitor_settings(),
        config.filters.clone(),
        services,
    ))
}
