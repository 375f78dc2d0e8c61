use std::io;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Empty when the export carries no domain; such cookies match any domain.
    #[serde(default)]
    pub domain: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
        }
    }

    /// Same rule as a browser's `getAll({ domain })`: exact host or any subdomain.
    pub fn matches_domain(&self, domain: &str) -> bool {
        let own = self.domain.trim().trim_start_matches('.');
        let wanted = domain.trim().trim_start_matches('.');
        if own.is_empty() {
            return true;
        }
        own.eq_ignore_ascii_case(wanted)
            || own
                .to_ascii_lowercase()
                .ends_with(&format!(".{}", wanted.to_ascii_lowercase()))
    }
}

#[derive(Debug, Error)]
pub enum CookieError {
    #[error("cookie store unreadable: {0}")]
    Io(#[from] io::Error),
    #[error("cookie store malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Read access to the browser's cookie jar.
#[async_trait::async_trait]
pub trait CookieStore: Send + Sync {
    /// Lists cookies for `domain`. No cookies is `Ok(vec![])`, not an error.
    async fn list_cookies(&self, domain: &str) -> Result<Vec<Cookie>, CookieError>;
}

/// Cookie jar exported from the browser as a JSON array of
/// `{ "name", "value", "domain" }` objects. Re-read on every call so a
/// refreshed export is picked up without a restart.
#[derive(Debug, Clone)]
pub struct CookieJarFile {
    path: PathBuf,
}

impl CookieJarFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl CookieStore for CookieJarFile {
    async fn list_cookies(&self, domain: &str) -> Result<Vec<Cookie>, CookieError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let cookies: Vec<Cookie> = serde_json::from_str(&content)?;
        Ok(cookies
            .into_iter()
            .filter(|cookie| cookie.matches_domain(domain))
            .collect())
    }
}

/// Fixed cookie list, for tests and for tokens passed on the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticCookieStore {
    cookies: Vec<Cookie>,
}

impl StaticCookieStore {
    pub fn new(cookies: Vec<Cookie>) -> Self {
        Self { cookies }
    }
}

#[async_trait::async_trait]
impl CookieStore for StaticCookieStore {
    async fn list_cookies(&self, domain: &str) -> Result<Vec<Cookie>, CookieError> {
        Ok(self
            .cookies
            .iter()
            .filter(|cookie| cookie.matches_domain(domain))
            .cloned()
            .collect())
    }
}
