#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Once};

use jobwatch_core::ApiError;
use jobwatch_engine::{
    Cookie, GraphQlTransport, Notification, Notifier, NotifyError, OpenError, RecoveryOpener,
};
use serde_json::{json, Value};
use tokio::sync::Notify;
use url::Url;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(jobwatch_logging::initialize_for_tests);
}

pub const SESSION_COOKIE: &str = "oauth2_gsb";

pub fn session_cookie(value: &str) -> Cookie {
    Cookie::new(SESSION_COOKIE, value)
}

/// Answers per token from a queue; the last answer repeats. Unknown tokens get 401.
#[derive(Default)]
pub struct ScriptedTransport {
    answers: Mutex<HashMap<String, VecDeque<Result<Value, ApiError>>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(self, token: &str, answer: Result<Value, ApiError>) -> Self {
        self.answers
            .lock()
            .unwrap()
            .entry(token.to_string())
            .or_default()
            .push_back(answer);
        self
    }

    /// Tokens in the order they were tried.
    pub fn tokens_tried(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(token, _)| token.clone())
            .collect()
    }

    pub fn aliases(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, alias)| alias.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl GraphQlTransport for ScriptedTransport {
    async fn execute(
        &self,
        token: &str,
        alias: &str,
        _query: &str,
        _variables: &Value,
    ) -> Result<Value, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((token.to_string(), alias.to_string()));
        let mut answers = self.answers.lock().unwrap();
        match answers.get_mut(token) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Err(http(401)),
        }
    }
}

/// Signals `started`, then holds every call until `release` is notified.
pub struct GatedTransport {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
    pub data: Value,
}

#[async_trait::async_trait]
impl GraphQlTransport for GatedTransport {
    async fn execute(
        &self,
        _token: &str,
        _alias: &str,
        _query: &str,
        _variables: &Value,
    ) -> Result<Value, ApiError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(self.data.clone())
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    pub sent: Mutex<Vec<(String, Notification)>>,
    pub fail_ids: Vec<String>,
}

impl FakeNotifier {
    pub fn failing_for(ids: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_ids: ids.iter().map(|id| id.to_string()).collect(),
        }
    }

    pub fn sent_ids(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, id: &str, notification: &Notification) -> Result<(), NotifyError> {
        if self.fail_ids.iter().any(|failing| failing == id) {
            return Err(NotifyError::SendFailed("surface unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((id.to_string(), notification.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingOpener {
    pub opened: Mutex<Vec<String>>,
}

impl RecordingOpener {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl RecoveryOpener for RecordingOpener {
    fn open(&self, url: &Url) -> Result<(), OpenError> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

pub fn http(status: u16) -> ApiError {
    ApiError::Http {
        status,
        body: String::new(),
    }
}

/// One search result as the job search endpoint returns it.
pub fn search_result(ciphertext: &str, title: &str, verified: bool) -> Value {
    json!({
        "id": format!("{ciphertext}-uid"),
        "title": title,
        "description": "",
        "applied": false,
        "ontologySkills": [{ "prettyName": "Rust" }],
        "upworkHistoryData": {
            "client": {
                "paymentVerificationStatus": if verified { "VERIFIED" } else { "UNVERIFIED" },
                "country": "Germany",
                "totalSpent": { "amount": "1500", "isoCurrencyCode": "USD" },
                "totalFeedback": 4.9
            }
        },
        "jobTile": {
            "job": {
                "id": format!("{ciphertext}-uid"),
                "ciphertext": ciphertext,
                "jobType": "HOURLY",
                "hourlyBudgetMin": "25.0",
                "hourlyBudgetMax": null,
                "fixedPriceAmount": null,
                "publishTime": "2026-10-18T08:00:00Z"
            }
        }
    })
}

/// `data` object of a job search answer.
pub fn search_data(results: Vec<Value>) -> Value {
    json!({
        "search": {
            "universalSearchNuxt": {
                "userJobSearchV1": {
                    "paging": { "total": results.len(), "offset": 0, "count": results.len() },
                    "results": results
                }
            }
        }
    })
}
