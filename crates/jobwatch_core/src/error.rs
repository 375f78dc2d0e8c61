use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed taxonomy of API call failures.
///
/// Serialized as `{ "type": "<kind>", "details": { .. } }` for UI payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "details", rename_all = "lowercase")]
pub enum ApiError {
    #[error("http status {status}")]
    Http { status: u16, body: String },
    #[error("network error: {message}")]
    Network { message: String },
    #[error("unexpected response: {message}")]
    Parsing { message: String },
    #[error("graphql errors: {}", .messages.join("; "))]
    GraphQl { messages: Vec<String> },
    #[error("authentication unavailable: {message}")]
    Auth { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Http,
    Network,
    Parsing,
    GraphQl,
    Auth,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Http => "http",
            ErrorKind::Network => "network",
            ErrorKind::Parsing => "parsing",
            ErrorKind::GraphQl => "graphql",
            ErrorKind::Auth => "auth",
        };
        f.write_str(name)
    }
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Http { .. } => ErrorKind::Http,
            ApiError::Network { .. } => ErrorKind::Network,
            ApiError::Parsing { .. } => ErrorKind::Parsing,
            ApiError::GraphQl { .. } => ErrorKind::GraphQl,
            ApiError::Auth { .. } => ErrorKind::Auth,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn parsing(message: impl Into<String>) -> Self {
        ApiError::Parsing {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        ApiError::Network {
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        ApiError::Auth {
            message: message.into(),
        }
    }
}

/// How a failed cycle is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Session is unusable: status message plus a recovery page.
    Authentication,
    /// Upstream throttling: status message only.
    RateLimited,
    /// Retried naturally by the next cycle: status message only.
    Transient,
}

impl FailureClass {
    /// GraphQL errors on a 200 are treated as permission problems.
    pub fn of(error: &ApiError) -> Self {
        match error {
            ApiError::Http { status: 401 | 403, .. }
            | ApiError::GraphQl { .. }
            | ApiError::Auth { .. } => FailureClass::Authentication,
            ApiError::Http { status: 429, .. } => FailureClass::RateLimited,
            ApiError::Http { .. } | ApiError::Network { .. } | ApiError::Parsing { .. } => {
                FailureClass::Transient
            }
        }
    }

    pub fn opens_recovery(self) -> bool {
        self == FailureClass::Authentication
    }

    /// Status line text; names the error kind, never raw details.
    pub fn status_message(self, error: &ApiError) -> String {
        match self {
            FailureClass::Authentication => format!(
                "Authentication failed ({}). Please log in to the marketplace and retry.",
                error.kind()
            ),
            FailureClass::RateLimited => {
                "Rate limited by the API (HTTP 429). Will retry next cycle.".to_string()
            }
            FailureClass::Transient => match error.http_status() {
                Some(status) => format!("Check failed: http error {status}. Will retry next cycle."),
                None => format!("Check failed: {} error. Will retry next cycle.", error.kind()),
            },
        }
    }
}
