//! Generic OpenAI-compatible provider implementation
//!
//! Talks to any `/chat/completions` endpoint (OpenAI, OpenRouter, local
//! gateways). Each call is a single attempt: status codes and transport
//! failures are mapped onto [`ProviderError`] and returned as-is.
//!
//! # Example
//!
//! ```rust
//! use interview_engine::providers::{GenericOpenAiProvider, OpenAiConfig};
//!
//! let config = OpenAiConfig::new("your-api-key").with_model("gpt-4o-mini");
//! let provider = GenericOpenAiProvider::try_from_config(&config).unwrap();
//! ```

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::providers::{LlmMessage, LlmProvider, LlmResponse, ProviderError, SamplingOptions};

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenAiConfig {
    /// API key sent as a bearer token
    pub api_key: String,
    /// Base URL, without the trailing `/chat/completions`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model used when the caller does not pick one
    #[serde(default = "default_model")]
    pub default_model: String,
    /// HTTP client timeout in milliseconds. `load_config` overwrites it with
    /// `generation.request_timeout_ms` so both deadlines agree.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl OpenAiConfig {
    /// Creates a configuration with the required API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            default_model: default_model(),
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Sets a custom base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the default model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Sets the HTTP timeout
    pub fn with_timeout_ms(mut self, millis: u64) -> Self {
        self.timeout_ms = millis;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::config("API key is required"));
        }

        if self.base_url.is_empty() {
            return Err(ProviderError::config("Base URL cannot be empty"));
        }

        if self.default_model.is_empty() {
            return Err(ProviderError::config("Default model cannot be empty"));
        }

        Ok(())
    }
}

/// OpenAI API request body format
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

/// OpenAI message format
#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI API response envelope
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    error: Option<OpenAiError>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
}

/// Provider for any OpenAI-compatible chat-completions API
#[derive(Debug, Clone)]
pub struct GenericOpenAiProvider {
    api_key: String,
    base_url: String,
    default_model: String,
    timeout_ms: u64,
    client: Client,
}

impl GenericOpenAiProvider {
    /// Creates a provider, returning an error if the HTTP client fails to build
    pub fn try_from_config(config: &OpenAiConfig) -> Result<Self, ProviderError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_model: config.default_model.clone(),
            timeout_ms: config.timeout_ms,
            client,
        })
    }

    fn build_request(
        &self,
        messages: Vec<LlmMessage>,
        options: &SamplingOptions,
        model: &str,
    ) -> OpenAiRequest {
        let messages = messages
            .into_iter()
            .map(|msg| OpenAiMessage {
                role: msg.role.as_str().to_string(),
                content: Some(msg.content),
            })
            .collect();

        OpenAiRequest {
            model: model.to_string(),
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
        }
    }

    fn parse_response(&self, response: OpenAiResponse) -> Result<LlmResponse, ProviderError> {
        if let Some(error) = response.error {
            return Err(ProviderError::provider(
                error.message,
                error.code.or(error.error_type),
            ));
        }

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            ProviderError::provider("No response choices returned", None::<&str>)
        })?;

        let mut llm_response = LlmResponse::new(choice.message.content.unwrap_or_default());
        if let Some(usage) = response.usage {
            llm_response = llm_response.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }

        Ok(llm_response)
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::timeout(self.timeout_ms)
        } else if e.is_connect() {
            ProviderError::network(format!("Connection failed: {}", e))
        } else {
            ProviderError::network(format!("Request failed: {}", e))
        }
    }

    async fn send_request(&self, request: &OpenAiRequest) -> Result<OpenAiResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, "Making chat completion request");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request).send().await.map_err(|e| {
            error!(error = %e, "Request failed");
            self.map_transport_error(e)
        })?;

        let status = resp.status();
        debug!(status = %status, "Received response");

        if status.is_success() {
            return resp.json::<OpenAiResponse>().await.map_err(|e| {
                if e.is_timeout() {
                    ProviderError::timeout(self.timeout_ms)
                } else {
                    ProviderError::serialization(format!("Failed to parse response: {}", e))
                }
            });
        }

        let retry_after_secs = parse_retry_after(resp.headers());
        let error_text = resp.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::auth(format!(
                "Authentication failed ({}): {}",
                status, error_text
            )),
            StatusCode::TOO_MANY_REQUESTS => {
                ProviderError::rate_limit(error_text, retry_after_secs)
            }
            status if status.is_client_error() => ProviderError::invalid_request(format!(
                "Client error ({}): {}",
                status, error_text
            )),
            status if status.is_server_error() => ProviderError::provider(
                format!("Server error ({}): {}", status, error_text),
                Some(status.as_u16().to_string()),
            ),
            _ => ProviderError::provider(
                format!("Unexpected status ({}): {}", status, error_text),
                Some(status.as_u16().to_string()),
            ),
        })
    }
}

/// `Retry-After` in its delay-seconds form; HTTP-date values are ignored
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[async_trait::async_trait]
impl LlmProvider for GenericOpenAiProvider {
    async fn chat(
        &self,
        messages: Vec<LlmMessage>,
        options: &SamplingOptions,
        model: &str,
    ) -> Result<LlmResponse, ProviderError> {
        info!(
            model = model,
            message_count = messages.len(),
            "Sending chat request"
        );

        let request = self.build_request(messages, options, model);
        let response = self.send_request(&request).await?;
        let llm_response = self.parse_response(response)?;

        info!(
            content_length = llm_response.content.len(),
            prompt_tokens = ?llm_response.prompt_tokens,
            completion_tokens = ?llm_response.completion_tokens,
            "Received chat response"
        );

        Ok(llm_response)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn provider_name(&self) -> &'static str {
        "openai-compatible"
    }
}
