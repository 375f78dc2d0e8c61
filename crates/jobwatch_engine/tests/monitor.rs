mod common;

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use jobwatch_core::{ErrorKind, FilterRules, Msg, StateLimits, BUSY_STATUS};
use jobwatch_engine::{
    BoundedStateStore, ChannelUiSink, CheckOutcome, Cookie, GateState, GraphQlTransport,
    KeyValueStore, MemoryKeyValueStore, Monitor, MonitorServices, MonitorSettings,
    ReconciliationEngine, StaticCookieStore, TokenHeuristics, TokenRotationExecutor, TokenSource,
    UiEvent, KEY_COLLAPSED_JOB_IDS, KEY_DELETED_JOB_IDS, KEY_SEEN_JOB_IDS,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::sync::Notify;

use common::{
    http, init_logging, search_data, search_result, session_cookie, FakeNotifier, GatedTransport,
    RecordingOpener, ScriptedTransport,
};

const SITE: &str = "https://www.upwork.com";
const TOKEN: &str = "oauth2v2_session";

struct Fixture {
    monitor: Arc<Monitor>,
    kv: Arc<MemoryKeyValueStore>,
    notifier: Arc<FakeNotifier>,
    opener: Arc<RecordingOpener>,
    events: Receiver<UiEvent>,
}

fn fixture(transport: Arc<dyn GraphQlTransport>, filters: FilterRules) -> Fixture {
    init_logging();
    let kv = Arc::new(MemoryKeyValueStore::new());
    let store = BoundedStateStore::new(kv.clone(), StateLimits::default());
    let tokens = TokenSource::new(
        Arc::new(StaticCookieStore::new(vec![session_cookie(TOKEN)])),
        "upwork.com",
        TokenHeuristics::default(),
    );
    let notifier = Arc::new(FakeNotifier::default());
    let opener = Arc::new(RecordingOpener::default());
    let (tx, events) = mpsc::channel();
    let services = MonitorServices {
        executor: TokenRotationExecutor::new(tokens, transport, store.clone()),
        reconciler: ReconciliationEngine::new(notifier.clone(), store.clone(), SITE),
        store,
        opener: opener.clone(),
        sink: Arc::new(ChannelUiSink::new(tx)),
    };
    let settings = MonitorSettings {
        site_url: SITE.to_string(),
        default_query: "rust".to_string(),
        fetch_count: 10,
    };
    Fixture {
        monitor: Arc::new(Monitor::new(settings, filters, services)),
        kv,
        notifier,
        opener,
        events,
    }
}

fn three_jobs() -> Value {
    search_data(vec![
        search_result("A", "Rust API backend", true),
        search_result("B", "WordPress plugin fix", true),
        search_result("C", "Rust CLI tool", false),
    ])
}

fn stored_ids(kv: &MemoryKeyValueStore, key: &str) -> Vec<String> {
    serde_json::from_value(kv.get(key).unwrap().unwrap_or(json!([]))).unwrap()
}

#[tokio::test]
async fn check_notifies_new_jobs_and_collapses_filtered_ones() {
    let transport = ScriptedTransport::new().answer(TOKEN, Ok(three_jobs()));
    let f = fixture(
        Arc::new(transport),
        FilterRules {
            title_exclusions: vec!["wordpress".to_string()],
            ..FilterRules::default()
        },
    );
    f.kv.set(KEY_SEEN_JOB_IDS, json!(["C"])).unwrap();
    f.monitor.restore().await;

    let outcome = f.monitor.run_check(None).await;

    assert_eq!(
        outcome,
        CheckOutcome::Completed {
            fetched: 3,
            new_count: 2,
            notifiable_count: 1
        }
    );
    assert_eq!(f.notifier.sent_ids(), vec!["https://www.upwork.com/jobs/A"]);
    let mut seen = stored_ids(&f.kv, KEY_SEEN_JOB_IDS);
    seen.sort();
    assert_eq!(seen, vec!["A", "B", "C"]);
    assert_eq!(stored_ids(&f.kv, KEY_COLLAPSED_JOB_IDS), vec!["B"]);

    let view = f.monitor.view();
    assert_eq!(view.jobs.len(), 3);
    assert!(view.status.starts_with("Found 3 jobs: 2 new, 1 notified"));
    assert!(view.jobs.iter().any(|card| card.id == "B" && card.collapsed));
    assert!(f.events.try_iter().any(|event| event == UiEvent::StateChanged));
    assert_eq!(f.monitor.gate_state(), GateState::Idle);
}

#[tokio::test]
async fn repeated_batch_notifies_nothing() {
    let transport = ScriptedTransport::new().answer(TOKEN, Ok(three_jobs()));
    let f = fixture(Arc::new(transport), FilterRules::default());

    f.monitor.run_check(None).await;
    let second = f.monitor.run_check(Some("rust".to_string())).await;

    assert_eq!(
        second,
        CheckOutcome::Completed {
            fetched: 3,
            new_count: 0,
            notifiable_count: 0
        }
    );
    assert_eq!(f.notifier.sent_ids().len(), 3);
}

#[tokio::test]
async fn forbidden_opens_search_recovery_page() {
    let transport = ScriptedTransport::new().answer(TOKEN, Err(http(403)));
    let f = fixture(Arc::new(transport), FilterRules::default());

    let outcome = f.monitor.run_check(Some("  rust api ".to_string())).await;

    assert_eq!(outcome, CheckOutcome::Failed { kind: ErrorKind::Http });
    assert_eq!(
        f.opener.opened(),
        vec!["https://www.upwork.com/nx/search/jobs/?q=rust+api"]
    );
    assert!(f.monitor.view().status.starts_with("Authentication failed (http)"));
    assert!(f.notifier.sent_ids().is_empty());
    assert_eq!(f.monitor.gate_state(), GateState::Idle);
}

#[tokio::test]
async fn missing_tokens_open_recovery_as_auth_failure() {
    init_logging();
    let f = fixture(Arc::new(ScriptedTransport::new()), FilterRules::default());
    let tokens = TokenSource::new(
        Arc::new(StaticCookieStore::new(vec![Cookie::new("XSRF-TOKEN", "plain")])),
        "upwork.com",
        TokenHeuristics::default(),
    );
    let store = BoundedStateStore::new(f.kv.clone(), StateLimits::default());
    let services = MonitorServices {
        executor: TokenRotationExecutor::new(
            tokens,
            Arc::new(ScriptedTransport::new()),
            store.clone(),
        ),
        reconciler: ReconciliationEngine::new(f.notifier.clone(), store.clone(), SITE),
        store,
        opener: f.opener.clone(),
        sink: Arc::new(jobwatch_engine::NullUiSink),
    };
    let monitor = Monitor::new(f.monitor.settings().clone(), FilterRules::default(), services);

    let outcome = monitor.run_check(None).await;

    assert_eq!(outcome, CheckOutcome::Failed { kind: ErrorKind::Auth });
    assert_eq!(
        f.opener.opened(),
        vec!["https://www.upwork.com/nx/search/jobs/?q=rust"]
    );
}

#[tokio::test]
async fn rate_limit_sets_status_without_recovery() {
    let transport = ScriptedTransport::new().answer(TOKEN, Err(http(429)));
    let f = fixture(Arc::new(transport), FilterRules::default());

    f.monitor.run_check(None).await;

    assert!(f.opener.opened().is_empty());
    assert!(f.monitor.view().status.starts_with("Rate limited"));
}

#[tokio::test]
async fn transient_failure_only_updates_status() {
    let transport = ScriptedTransport::new().answer(TOKEN, Err(http(502)));
    let f = fixture(Arc::new(transport), FilterRules::default());

    let outcome = f.monitor.run_check(None).await;

    assert_eq!(outcome, CheckOutcome::Failed { kind: ErrorKind::Http });
    assert!(f.opener.opened().is_empty());
    assert_eq!(
        f.monitor.view().status,
        "Check failed: http error 502. Will retry next cycle."
    );
    assert!(f.events.try_iter().any(|event| event == UiEvent::StateChanged));
}

#[tokio::test]
async fn overlapping_check_is_rejected_as_busy() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let transport = GatedTransport {
        started: started.clone(),
        release: release.clone(),
        data: three_jobs(),
    };
    let f = fixture(Arc::new(transport), FilterRules::default());

    let first = tokio::spawn({
        let monitor = f.monitor.clone();
        async move { monitor.run_check(None).await }
    });
    started.notified().await;
    assert_eq!(f.monitor.gate_state(), GateState::Running);

    let second = f.monitor.run_check(None).await;
    assert_eq!(second, CheckOutcome::Busy);
    assert_eq!(f.monitor.view().status, BUSY_STATUS);
    assert!(f.notifier.sent_ids().is_empty());

    release.notify_one();
    let first = first.await.unwrap();
    assert!(matches!(first, CheckOutcome::Completed { fetched: 3, .. }));
    assert_eq!(f.monitor.gate_state(), GateState::Idle);
}

#[tokio::test]
async fn gate_is_released_after_a_failed_check() {
    let transport = ScriptedTransport::new()
        .answer(TOKEN, Err(http(500)))
        .answer(TOKEN, Ok(three_jobs()));
    let f = fixture(Arc::new(transport), FilterRules::default());

    let failed = f.monitor.run_check(None).await;
    let retried = f.monitor.run_check(None).await;

    assert_eq!(failed, CheckOutcome::Failed { kind: ErrorKind::Http });
    assert!(matches!(retried, CheckOutcome::Completed { .. }));
}

#[tokio::test]
async fn deleted_job_leaves_the_list_and_is_never_notified() {
    let transport = ScriptedTransport::new().answer(TOKEN, Ok(three_jobs()));
    let f = fixture(Arc::new(transport), FilterRules::default());
    f.monitor.run_check(None).await;

    f.monitor
        .dispatch(Msg::DeleteJob { id: "A".to_string() })
        .await;

    assert!(f.monitor.view().jobs.iter().all(|card| card.id != "A"));
    assert_eq!(stored_ids(&f.kv, KEY_DELETED_JOB_IDS), vec!["A"]);
}

#[tokio::test]
async fn deletion_written_by_another_process_survives_the_next_check() {
    let transport = ScriptedTransport::new().answer(TOKEN, Ok(three_jobs()));
    let f = fixture(Arc::new(transport), FilterRules::default());
    f.monitor.run_check(None).await;

    let cli = BoundedStateStore::new(f.kv.clone(), StateLimits::default());
    let mut snapshot = cli.load_snapshot();
    snapshot.deleted_job_ids.push("A".to_string());
    snapshot.collapsed_job_ids = vec!["C".to_string()];
    cli.save_snapshot(&snapshot).unwrap();

    f.monitor.run_check(None).await;

    assert_eq!(stored_ids(&f.kv, KEY_DELETED_JOB_IDS), vec!["A"]);
    assert_eq!(stored_ids(&f.kv, KEY_COLLAPSED_JOB_IDS), vec!["C"]);
    let view = f.monitor.view();
    assert!(view.jobs.iter().all(|card| card.id != "A"));
    assert!(view.jobs.iter().any(|card| card.id == "C" && card.collapsed));
}

#[tokio::test]
async fn toggle_ignores_surrounding_whitespace() {
    let transport = ScriptedTransport::new().answer(TOKEN, Ok(three_jobs()));
    let f = fixture(Arc::new(transport), FilterRules::default());
    f.monitor.run_check(None).await;

    f.monitor
        .dispatch(Msg::ToggleCollapsed { id: " C ".to_string() })
        .await;

    assert_eq!(stored_ids(&f.kv, KEY_COLLAPSED_JOB_IDS), vec!["C"]);
}

#[tokio::test]
async fn toggled_and_cleared_collapse_state_is_persisted() {
    let transport = ScriptedTransport::new().answer(TOKEN, Ok(three_jobs()));
    let f = fixture(Arc::new(transport), FilterRules::default());
    f.monitor.run_check(None).await;

    f.monitor
        .dispatch(Msg::ToggleCollapsed { id: "C".to_string() })
        .await;
    assert_eq!(stored_ids(&f.kv, KEY_COLLAPSED_JOB_IDS), vec!["C"]);

    f.monitor.dispatch(Msg::ClearCollapsed).await;
    assert!(stored_ids(&f.kv, KEY_COLLAPSED_JOB_IDS).is_empty());
}

#[tokio::test]
async fn dispatching_run_check_returns_the_outcome() {
    let transport = ScriptedTransport::new().answer(TOKEN, Ok(three_jobs()));
    let f = fixture(Arc::new(transport), FilterRules::default());

    let outcome = f.monitor.dispatch(Msg::RunCheck { query: None }).await;

    assert!(matches!(outcome, Some(CheckOutcome::Completed { .. })));
    let deleted = f.monitor.dispatch(Msg::DeleteJob { id: "A".to_string() }).await;
    assert_eq!(deleted, None);
}

#[tokio::test]
async fn failed_details_lookup_opens_the_job_page() {
    let transport = ScriptedTransport::new().answer(TOKEN, Err(http(401)));
    let f = fixture(Arc::new(transport), FilterRules::default());

    let err = f.monitor.fetch_details("~01abc").await.unwrap_err();

    assert_eq!(err.http_status(), Some(401));
    assert_eq!(f.opener.opened(), vec!["https://www.upwork.com/jobs/~01abc"]);
}

#[tokio::test]
async fn failed_profile_lookup_opens_the_profile_page() {
    let transport = ScriptedTransport::new().answer(
        TOKEN,
        Err(jobwatch_core::ApiError::GraphQl {
            messages: vec!["permission denied".to_string()],
        }),
    );
    let f = fixture(Arc::new(transport), FilterRules::default());

    f.monitor.fetch_profile("~01dev").await.unwrap_err();

    assert_eq!(
        f.opener.opened(),
        vec!["https://www.upwork.com/freelancers/~01dev"]
    );
}
