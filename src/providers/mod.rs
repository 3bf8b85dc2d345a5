//! LLM provider layer
//!
//! The question generator reaches the external text-generation endpoint only
//! through the [`LlmProvider`] trait, so tests can substitute a scripted mock
//! and deployments can point at any OpenAI-compatible API.
//!
//! # Example
//!
//! ```rust
//! use interview_engine::providers::{LlmMessage, LlmProvider, LlmRole, SamplingOptions};
//!
//! async fn example(provider: &dyn LlmProvider) {
//!     let messages = vec![
//!         LlmMessage::new(LlmRole::System, "You are a technical interviewer"),
//!         LlmMessage::new(LlmRole::User, "Ask the first question."),
//!     ];
//!
//!     let options = SamplingOptions::default();
//!     let model = provider.default_model();
//!     let response = provider.chat(messages, &options, &model).await.unwrap();
//!     println!("Response: {}", response.content);
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod error;
#[cfg(test)]
pub mod mock;
pub mod openai;

pub use error::ProviderError;
pub use openai::{GenericOpenAiProvider, OpenAiConfig};

/// A message in the conversation sent to the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmMessage {
    /// Role of the message sender
    pub role: LlmRole,
    /// Content of the message
    pub content: String,
}

impl LlmMessage {
    /// Creates a new message with the specified role and content
    pub fn new(role: LlmRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(LlmRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(LlmRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(LlmRole::Assistant, content)
    }

    /// Returns true if this message is from the system
    pub fn is_system(&self) -> bool {
        matches!(self.role, LlmRole::System)
    }

    /// Returns true if this message is from the user
    pub fn is_user(&self) -> bool {
        matches!(self.role, LlmRole::User)
    }

    /// Returns true if this message is from the assistant
    pub fn is_assistant(&self) -> bool {
        matches!(self.role, LlmRole::Assistant)
    }
}

/// Role of a message sender in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    /// System prompt/instructions
    System,
    /// Candidate side of the conversation
    User,
    /// Interviewer (model) side of the conversation
    Assistant,
}

impl LlmRole {
    /// Returns the string representation of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmRole::System => "system",
            LlmRole::User => "user",
            LlmRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for LlmRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sampling parameters forwarded with every request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 512,
            top_p: None,
        }
    }
}

/// Response from the LLM provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmResponse {
    /// Raw text content of the assistant's reply
    pub content: String,
    /// Number of tokens in the prompt (if provided by provider)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    /// Number of tokens in the completion (if provided by provider)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
}

impl LlmResponse {
    /// Creates a new response with just content
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            prompt_tokens: None,
            completion_tokens: None,
        }
    }

    /// Adds token usage information
    pub fn with_tokens(mut self, prompt: u32, completion: u32) -> Self {
        self.prompt_tokens = Some(prompt);
        self.completion_tokens = Some(completion);
        self
    }

    /// Returns the total token count if available
    pub fn total_tokens(&self) -> Option<u32> {
        match (self.prompt_tokens, self.completion_tokens) {
            (Some(p), Some(c)) => Some(p + c),
            _ => None,
        }
    }
}

/// Trait for text-generation providers
///
/// All implementations must be Send + Sync so one provider can serve many
/// interview sessions concurrently.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends one chat request and returns the raw reply.
    ///
    /// Implementations make exactly one upstream attempt.
    async fn chat(
        &self,
        messages: Vec<LlmMessage>,
        options: &SamplingOptions,
        model: &str,
    ) -> Result<LlmResponse, ProviderError>;

    /// Returns the default model for this provider
    fn default_model(&self) -> String;

    /// Returns the provider name, used for logging
    fn provider_name(&self) -> &'static str;
}
