//! Failures talking to the text-generation endpoint
//!
//! Every variant is terminal for the turn that produced it. Nothing at this
//! layer retries; callers decide whether to offer the user another attempt.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Connection refused, DNS failure, reset mid-request
    #[error("Network error: {message}")]
    Network { message: String },

    /// 401/403 from the endpoint
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// 429 from the endpoint, with the `Retry-After` delay in seconds when sent
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// Any other 4xx
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// The request did not complete before the deadline and was cancelled
    #[error("Request timeout after {millis} ms")]
    Timeout { millis: u64 },

    /// 5xx, or an error object inside a 2xx body
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        code: Option<String>,
    },

    /// The body was not the expected JSON envelope
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Unusable provider settings
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ProviderError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn rate_limit(message: impl Into<String>, retry_after_secs: Option<u64>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after_secs,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn timeout(millis: u64) -> Self {
        Self::Timeout { millis }
    }

    pub fn provider(message: impl Into<String>, code: Option<impl Into<String>>) -> Self {
        Self::Provider {
            message: message.into(),
            code: code.map(Into::into),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, ProviderError::Auth { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout { .. })
    }

    /// Delay the endpoint asked for before the next request, if it sent one
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimit {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
