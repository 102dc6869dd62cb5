use std::env;
use std::fmt::Display;
use std::str::FromStr;

use tracing::info;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Scraping provider
    pub brightdata_api_key: String,
    pub brightdata_base_url: Option<String>,
    pub profile_dataset_id: Option<String>,
    pub detail_dataset_id: Option<String>,
    pub enrichment_enabled: bool,

    // Completion service
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub openai_model: String,
    pub openai_temperature: f32,
    pub openai_max_tokens: u32,

    // Polling
    pub poll: PollSettings,

    // Web server
    pub web_host: String,
    pub web_port: u16,
    pub sse_keepalive_secs: u64,
}

/// Snapshot polling thresholds, in plain numbers so this crate stays free of
/// provider types.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    pub interval_secs: u64,
    pub max_wait_secs: u64,
    pub extended_after_attempts: u32,
    pub extended_interval_secs: u64,
    pub accept_partial_after: u32,
    pub error_backoff_secs: u64,
    pub accept_bare_objects: bool,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: 20,
            max_wait_secs: 60 * 60,
            extended_after_attempts: 100,
            extended_interval_secs: 30,
            accept_partial_after: 150,
            error_backoff_secs: 30,
            accept_bare_objects: true,
        }
    }
}

impl PollSettings {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            interval_secs: parsed_env("POLL_INTERVAL_SECS", defaults.interval_secs),
            max_wait_secs: parsed_env("POLL_MAX_WAIT_SECS", defaults.max_wait_secs),
            extended_after_attempts: parsed_env(
                "POLL_EXTENDED_AFTER_ATTEMPTS",
                defaults.extended_after_attempts,
            ),
            extended_interval_secs: parsed_env(
                "POLL_EXTENDED_INTERVAL_SECS",
                defaults.extended_interval_secs,
            ),
            accept_partial_after: parsed_env(
                "POLL_ACCEPT_PARTIAL_AFTER",
                defaults.accept_partial_after,
            ),
            error_backoff_secs: parsed_env("POLL_ERROR_BACKOFF_SECS", defaults.error_backoff_secs),
            accept_bare_objects: parsed_env(
                "POLL_ACCEPT_BARE_OBJECTS",
                defaults.accept_bare_objects,
            ),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            brightdata_api_key: required_env("BRIGHTDATA_API_KEY"),
            brightdata_base_url: optional_env("BRIGHTDATA_BASE_URL"),
            profile_dataset_id: optional_env("BRIGHTDATA_PROFILE_DATASET_ID"),
            detail_dataset_id: optional_env("BRIGHTDATA_DETAIL_DATASET_ID"),
            // Set but empty turns enrichment off; unset keeps the built-in dataset.
            enrichment_enabled: env::var("BRIGHTDATA_DETAIL_DATASET_ID")
                .map(|v| !v.trim().is_empty())
                .unwrap_or(true),
            openai_api_key: required_env("OPENAI_API_KEY"),
            openai_base_url: optional_env("OPENAI_BASE_URL"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4.1".to_string()),
            openai_temperature: parsed_env("OPENAI_TEMPERATURE", 0.8),
            openai_max_tokens: parsed_env("OPENAI_MAX_TOKENS", 4000),
            poll: PollSettings::from_env(),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: parsed_env("WEB_PORT", 3000),
            sse_keepalive_secs: parsed_env("SSE_KEEPALIVE_SECS", 15),
        }
    }

    /// Log the loaded configuration with secrets left out.
    pub fn log_redacted(&self) {
        info!(
            brightdata_base_url = self.brightdata_base_url.as_deref().unwrap_or("default"),
            enrichment_enabled = self.enrichment_enabled,
            openai_model = %self.openai_model,
            openai_base_url = self.openai_base_url.as_deref().unwrap_or("default"),
            poll_interval_secs = self.poll.interval_secs,
            poll_max_wait_secs = self.poll.max_wait_secs,
            web_host = %self.web_host,
            web_port = self.web_port,
            "Configuration loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value {raw:?}: {e}")),
        Err(_) => default,
    }
}
