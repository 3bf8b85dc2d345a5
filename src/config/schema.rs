use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::providers::{OpenAiConfig, SamplingOptions};
use crate::store::{DEFAULT_CLEANUP_INTERVAL_MS, DEFAULT_TTL_MS, StoreConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<OpenAiConfig>,
}

impl Config {
    /// Loggable view of the configuration with secrets reduced to flags
    pub fn get_safe_summary(&self) -> SafeConfigSummary {
        SafeConfigSummary {
            api_key_configured: self
                .provider
                .as_ref()
                .map(|p| !p.api_key.is_empty())
                .unwrap_or(false),
            base_url: self.provider.as_ref().map(|p| p.base_url.clone()),
            model: self.provider.as_ref().map(|p| p.default_model.clone()),
            cleanup_interval_ms: self.store.cleanup_interval_ms,
            request_timeout_ms: self.generation.request_timeout_ms,
        }
    }

    /// Copies `generation.request_timeout_ms` into the provider's HTTP client
    /// timeout, so the controller deadline is the only one that matters
    pub fn align_provider_timeout(&mut self) {
        let millis = self.generation.request_timeout_ms;
        if let Some(provider) = self.provider.as_mut() {
            provider.timeout_ms = millis;
        }
    }

    /// Copy of the configuration with the API key masked, for display
    pub fn redacted(&self) -> Config {
        let mut config = self.clone();
        if let Some(provider) = config.provider.as_mut() {
            if !provider.api_key.is_empty() {
                provider.api_key = "********".to_string();
            }
        }
        config
    }
}

#[derive(Debug, Clone)]
pub struct SafeConfigSummary {
    pub api_key_configured: bool,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub cleanup_interval_ms: u64,
    pub request_timeout_ms: u64,
}

/// Session store timing, in milliseconds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreSettings {
    #[serde(default = "default_cleanup_interval_ms")]
    pub cleanup_interval_ms: u64,
    /// TTL for topic sets and turn counters; 0 disables expiry
    #[serde(default = "default_ttl_ms")]
    pub default_ttl_ms: u64,
}

fn default_cleanup_interval_ms() -> u64 {
    DEFAULT_CLEANUP_INTERVAL_MS
}

fn default_ttl_ms() -> u64 {
    DEFAULT_TTL_MS
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            cleanup_interval_ms: default_cleanup_interval_ms(),
            default_ttl_ms: default_ttl_ms(),
        }
    }
}

impl StoreSettings {
    pub fn to_store_config(&self) -> StoreConfig {
        StoreConfig::default()
            .with_cleanup_interval(Duration::from_millis(self.cleanup_interval_ms.max(1)))
            .with_default_ttl(Duration::from_millis(self.default_ttl_ms))
    }
}

/// Question generation behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    /// Hard deadline for one upstream call
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Extra attempts allowed after a duplicate question
    #[serde(default = "default_duplicate_retry_limit")]
    pub duplicate_retry_limit: u32,
    /// How many of the latest questions a new one is compared against
    #[serde(default = "default_recent_question_window")]
    pub recent_question_window: usize,
    /// Question/answer pairs replayed to the model
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
    /// Distinct topics after which the session ends; 0 disables the cutoff
    #[serde(default = "default_max_unique_topics")]
    pub max_unique_topics: usize,
    #[serde(default)]
    pub sampling: SamplingOptions,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_duplicate_retry_limit() -> u32 {
    1
}

fn default_recent_question_window() -> usize {
    5
}

fn default_history_turns() -> usize {
    10
}

fn default_max_unique_topics() -> usize {
    20
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            duplicate_retry_limit: default_duplicate_retry_limit(),
            recent_question_window: default_recent_question_window(),
            history_turns: default_history_turns(),
            max_unique_topics: default_max_unique_topics(),
            sampling: SamplingOptions::default(),
        }
    }
}

impl GenerationConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
