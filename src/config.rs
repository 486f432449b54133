//! Monitor configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub poll_interval_secs: u64,
    pub timeouts: Timeouts,
}

impl MonitorConfig {
    /// Build typed config from environment variables.
    ///
    /// - `LPR_API_BASE_URL`: default `http://127.0.0.1:3000`
    /// - `LPR_API_TOKEN`: bearer token obtained at login
    /// - `LPR_POLL_INTERVAL_SECS`: default 3, never below 1
    /// - `LPR_REQUEST_TIMEOUT_SECS`: default 15
    /// - `LPR_CONNECT_TIMEOUT_SECS`: default 5
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("LPR_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let token = std::env::var("LPR_API_TOKEN").ok().filter(|t| !t.trim().is_empty());
        Self {
            base_url: normalize_base_url(&base_url),
            token,
            poll_interval_secs: env_parse("LPR_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS).max(1),
            timeouts: Timeouts {
                request_secs: env_parse("LPR_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: env_parse("LPR_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            },
        }
    }

    /// Apply command-line overrides on top of the environment values.
    #[must_use]
    pub fn with_overrides(mut self, base_url: Option<String>, token: Option<String>) -> Self {
        if let Some(base_url) = base_url {
            self.base_url = normalize_base_url(&base_url);
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }
        self
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            token: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
        }
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
