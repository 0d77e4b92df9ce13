//! Sync configuration shared by the engine, the HTTP client, and the CLI.

use std::time::Duration;

use crate::util::normalize_text_option;

/// Environment variable holding the record service base URL
pub const API_URL_ENV: &str = "TALLY_API_URL";
/// Environment variable holding the optional bearer token
pub const API_TOKEN_ENV: &str = "TALLY_API_TOKEN";
/// Environment variable overriding the auto sync interval, in seconds
pub const SYNC_INTERVAL_ENV: &str = "TALLY_SYNC_INTERVAL_SECS";

const DEFAULT_SYNC_INTERVAL_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PROBE_INTERVAL_SECS: u64 = 15;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Settings for talking to the record service and scheduling sync cycles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Record service base URL (e.g., `https://api.tally.app`)
    pub api_base_url: Option<String>,
    /// Bearer token sent with every request
    pub auth_token: Option<String>,
    /// Period of the auto sync timer (default: 30 seconds)
    pub sync_interval: Duration,
    /// Failed attempts after which a queue entry is dropped
    pub max_retries: u32,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Period of the reachability probe
    pub probe_interval: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            api_base_url: None,
            auth_token: None,
            sync_interval: Duration::from_secs(DEFAULT_SYNC_INTERVAL_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            probe_interval: Duration::from_secs(DEFAULT_PROBE_INTERVAL_SECS),
        }
    }
}

impl SyncSettings {
    /// Create settings pointing at the given record service
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: normalize_text_option(Some(api_base_url.into())),
            ..Self::default()
        }
    }

    /// Read settings from the process environment.
    ///
    /// Unset or blank variables fall back to defaults; an unparsable interval
    /// is ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self {
            api_base_url: normalize_text_option(lookup(API_URL_ENV)),
            auth_token: normalize_text_option(lookup(API_TOKEN_ENV)),
            ..Self::default()
        };

        if let Some(raw) = normalize_text_option(lookup(SYNC_INTERVAL_ENV)) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => settings.sync_interval = Duration::from_secs(secs),
                _ => tracing::warn!("Ignoring invalid {SYNC_INTERVAL_ENV} value '{raw}'"),
            }
        }

        settings
    }

    /// Set the record service base URL
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = normalize_text_option(Some(url.into()));
        self
    }

    /// Set the bearer token
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = normalize_text_option(Some(token.into()));
        self
    }

    /// Set the automatic sync interval
    #[must_use]
    pub const fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Check if a record service is configured
    pub const fn is_configured(&self) -> bool {
        self.api_base_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let settings = SyncSettings::default();
        assert_eq!(settings.sync_interval, Duration::from_secs(30));
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert!(!settings.is_configured());
    }

    #[test]
    fn from_lookup_reads_all_variables() {
        let settings = SyncSettings::from_lookup(lookup(&[
            (API_URL_ENV, " https://api.example.com "),
            (API_TOKEN_ENV, "secret"),
            (SYNC_INTERVAL_ENV, "5"),
        ]));

        assert_eq!(
            settings.api_base_url.as_deref(),
            Some("https://api.example.com")
        );
        assert_eq!(settings.auth_token.as_deref(), Some("secret"));
        assert_eq!(settings.sync_interval, Duration::from_secs(5));
        assert!(settings.is_configured());
    }

    #[test]
    fn from_lookup_ignores_invalid_interval_and_blank_token() {
        let settings = SyncSettings::from_lookup(lookup(&[
            (API_TOKEN_ENV, "   "),
            (SYNC_INTERVAL_ENV, "soon"),
        ]));

        assert_eq!(settings.auth_token, None);
        assert_eq!(settings.sync_interval, Duration::from_secs(30));

        let zero = SyncSettings::from_lookup(lookup(&[(SYNC_INTERVAL_ENV, "0")]));
        assert_eq!(zero.sync_interval, Duration::from_secs(30));
    }

    #[test]
    fn builders_override_fields() {
        let settings = SyncSettings::new("https://api.example.com")
            .with_auth_token("t")
            .with_sync_interval(Duration::from_secs(1))
            .with_max_retries(5);

        assert_eq!(settings.auth_token.as_deref(), Some("t"));
        assert_eq!(settings.sync_interval, Duration::from_secs(1));
        assert_eq!(settings.max_retries, 5);
    }
}
