//! Errors surfaced by a generation turn
//!
//! Both variants are terminal: the turn fails and the caller decides whether
//! to offer the candidate another attempt. Duplicate questions are not errors;
//! they resolve to a flagged successful result.

use thiserror::Error;

use crate::providers::ProviderError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// Timeout, non-2xx status, or network failure talking to the model
    #[error("Transport error: {0}")]
    Transport(#[from] ProviderError),

    /// The model replied, but not with a usable question
    #[error("Invalid model output: {message}")]
    Validation {
        message: String,
        /// Raw reply text, kept for diagnostics
        raw: String,
    },
}

impl GenerationError {
    pub fn validation(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            raw: raw.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, GenerationError::Transport(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, GenerationError::Validation { .. })
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_converts_to_transport() {
        let err: GenerationError = ProviderError::timeout(10_000).into();
        assert!(err.is_transport());
        assert!(err.to_string().contains("Request timeout after 10000 ms"));
    }

    #[test]
    fn test_validation_error_keeps_raw_reply() {
        let err = GenerationError::validation("missing question", "sure! here you go");
        assert!(err.is_validation());
        assert!(matches!(err, GenerationError::Validation { ref raw, .. } if raw.contains("sure")));
    }
}
