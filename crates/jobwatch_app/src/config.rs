//! RON configuration for the `jobwatch` binary.
//!
//! Every field has a default, so a missing file or a partial file is valid.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use jobwatch_core::{
    FilterRules, StateLimits, DEFAULT_DELETED_CAPACITY, DEFAULT_FETCH_COUNT, DEFAULT_SEEN_CAPACITY,
};
use jobwatch_engine::{MonitorSettings, TokenHeuristics, TransportSettings};
use jobwatch_logging::watch_info;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "jobwatch.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file unreadable: {0}")]
    Read(#[from] io::Error),
    #[error("config file malformed: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("config not serializable: {0}")]
    Serialize(#[from] ron::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NotifierKind {
    #[default]
    Desktop,
    /// Log lines only; for headless hosts.
    Log,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_url: String,
    pub site_url: String,
    pub cookie_domain: String,
    /// JSON cookie export, `[{ "name", "value", "domain" }]`.
    pub cookie_jar: PathBuf,
    pub state_file: PathBuf,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
    pub notifier: NotifierKind,
    pub open_recovery_in_browser: bool,
    pub default_query: String,
    pub fetch_count: usize,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub seen_capacity: usize,
    pub deleted_capacity: usize,
    pub filters: FilterRules,
    pub token_heuristics: TokenHeuristics,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: TransportSettings::default().api_url,
            site_url: "https://www.upwork.com".to_string(),
            cookie_domain: "upwork.com".to_string(),
            cookie_jar: PathBuf::from("cookies.json"),
            state_file: PathBuf::from("jobwatch_state.json"),
            log_file: None,
            log_level: "info".to_string(),
            notifier: NotifierKind::Desktop,
            open_recovery_in_browser: true,
            default_query: "rust".to_string(),
            fetch_count: DEFAULT_FETCH_COUNT,
            poll_interval_secs: 300,
            request_timeout_secs: 30,
            seen_capacity: DEFAULT_SEEN_CAPACITY,
            deleted_capacity: DEFAULT_DELETED_CAPACITY,
            filters: FilterRules::default(),
            token_heuristics: TokenHeuristics::default(),
        }
    }
}

impl AppConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                watch_info!("No config at {:?}; using defaults", path);
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        Self::from_ron(&content)
    }

    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new())?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_count == 0 {
            return Err(ConfigError::Invalid("fetch_count must be at least 1".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_secs must be at least 1".into(),
            ));
        }
        if self.default_query.trim().is_empty() {
            return Err(ConfigError::Invalid("default_query is empty".into()));
        }
        url_of(&self.site_url, "site_url")?;
        url_of(&self.api_url, "api_url")?;
        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(self.log_level.trim())
            .map_err(|_| ConfigError::Invalid(format!("unknown log_level {:?}", self.log_level)))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn state_limits(&self) -> StateLimits {
        StateLimits {
            seen_capacity: self.seen_capacity,
            deleted_capacity: self.deleted_capacity,
            recent_limit: self.fetch_count,
        }
    }

    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            api_url: self.api_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            ..TransportSettings::default()
        }
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            site_url: self.site_url.clone(),
            default_query: self.default_query.trim().to_string(),
            fetch_count: self.fetch_count,
        }
    }
}

fn url_of(value: &str, field: &str) -> Result<(), ConfigError> {
    match url::Url::parse(value) {
        Ok(_) => Ok(()),
        Err(err) => Err(ConfigError::Invalid(format!("{field}: {err}"))),
    }
}
