use std::collections::HashSet;
use std::sync::Arc;

use jobwatch_logging::{watch_debug, watch_warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::cookies::{Cookie, CookieStore};

/// Cookie-name rules for picking bearer tokens out of the jar.
///
/// These mirror the marketplace's observed cookie naming and carry no
/// upstream guarantee; keep them configurable rather than inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenHeuristics {
    /// Every API bearer token value starts with this.
    pub value_prefix: String,
    /// Active-session cookies have names of exactly this length...
    pub session_name_len: usize,
    /// ...ending with this suffix.
    pub session_name_suffix: String,
    /// Matches the session shape but holds a visitor token.
    pub decoy_name: String,
    /// Name fragments of cookies whose tokens are not valid for the API.
    pub denied_name_fragments: Vec<String>,
}

impl Default for TokenHeuristics {
    fn default() -> Self {
        Self {
            value_prefix: "oauth2v2_".to_string(),
            session_name_len: 10,
            session_name_suffix: "sb".to_string(),
            decoy_name: "visitor_sb".to_string(),
            denied_name_fragments: vec![
                "visitor".to_string(),
                "master_access_token".to_string(),
                "_vt".to_string(),
            ],
        }
    }
}

impl TokenHeuristics {
    fn is_session_cookie(&self, cookie: &Cookie) -> bool {
        cookie.name.len() == self.session_name_len
            && cookie.name.ends_with(&self.session_name_suffix)
            && cookie.name != self.decoy_name
    }

    fn is_denied(&self, cookie: &Cookie) -> bool {
        self.denied_name_fragments
            .iter()
            .any(|fragment| cookie.name.contains(fragment.as_str()))
    }

    /// Orders candidate tokens: active-session cookies first, then every
    /// other non-denied prefixed token. Duplicate values keep their first slot.
    pub fn rank(&self, cookies: &[Cookie]) -> Vec<String> {
        let prefixed: Vec<&Cookie> = cookies
            .iter()
            .filter(|cookie| cookie.value.starts_with(&self.value_prefix))
            .collect();

        let (session, others): (Vec<&Cookie>, Vec<&Cookie>) = prefixed
            .into_iter()
            .partition(|cookie| self.is_session_cookie(cookie));

        let mut seen = HashSet::new();
        session
            .into_iter()
            .chain(others.into_iter().filter(|cookie| !self.is_denied(cookie)))
            .filter(|cookie| seen.insert(cookie.value.as_str()))
            .map(|cookie| cookie.value.clone())
            .collect()
    }
}

/// Reads candidate bearer tokens for one domain, best guess first.
#[derive(Clone)]
pub struct TokenSource {
    store: Arc<dyn CookieStore>,
    domain: String,
    heuristics: TokenHeuristics,
}

impl TokenSource {
    pub fn new(
        store: Arc<dyn CookieStore>,
        domain: impl Into<String>,
        heuristics: TokenHeuristics,
    ) -> Self {
        Self {
            store,
            domain: domain.into(),
            heuristics,
        }
    }

    /// Never fails: an unreadable or empty jar yields no candidates.
    pub async fn list_candidates(&self) -> Vec<String> {
        let cookies = match self.store.list_cookies(&self.domain).await {
            Ok(cookies) => cookies,
            Err(err) => {
                watch_warn!("Cookie store for {} not accessible: {}", self.domain, err);
                return Vec::new();
            }
        };
        if cookies.is_empty() {
            watch_warn!("No cookies found for {}", self.domain);
            return Vec::new();
        }

        let candidates = self.heuristics.rank(&cookies);
        if candidates.is_empty() {
            watch_warn!(
                "None of {} cookies for {} carry an API token",
                cookies.len(),
                self.domain
            );
        } else {
            watch_debug!(
                "Token candidates for {}: [{}]",
                self.domain,
                candidates
                    .iter()
                    .map(|token| token_fingerprint(token))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        candidates
    }
}

/// Short stable digest for logs; raw tokens are never logged.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
