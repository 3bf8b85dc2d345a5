//! Per-turn question generation
//!
//! One call to [`QuestionGenerationController::generate_interview_question`]
//! walks this state machine:
//!
//! ```text
//! GENERATING ──unique──────────────────────────────► ACCEPTED
//!     │
//!     └─duplicate─► RETRYING ──unique──────────────► ACCEPTED (after retry)
//!                      │
//!                      └─duplicate, budget spent──► FORCED_TERMINATION (isLast)
//! ```
//!
//! Transport and validation failures end the turn with an error at any state.
//! The controller never touches the session store: the caller supplies the
//! visited topics and records the accepted tags.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::GenerationConfig;
use crate::interview::duplicate::DuplicateDetector;
use crate::interview::error::{GenerationError, Result};
use crate::interview::parser::parse_question;
use crate::interview::prompt::{PromptBuilder, PromptMode};
use crate::interview::types::{GeneratedQuestion, QuestionOutcome, QuestionPayload, TurnContext};
use crate::providers::{LlmProvider, ProviderError};

pub struct QuestionGenerationController {
    provider: Arc<dyn LlmProvider>,
    model: String,
    config: GenerationConfig,
    prompts: PromptBuilder,
    detector: DuplicateDetector,
}

impl QuestionGenerationController {
    /// Creates a controller using the provider's default model
    pub fn new(provider: Arc<dyn LlmProvider>, config: GenerationConfig) -> Self {
        let model = provider.default_model();
        Self::with_model(provider, config, model)
    }

    pub fn with_model(
        provider: Arc<dyn LlmProvider>,
        config: GenerationConfig,
        model: impl Into<String>,
    ) -> Self {
        let prompts = PromptBuilder::new(config.history_turns, config.max_unique_topics);
        let detector = DuplicateDetector::new(config.recent_question_window);
        Self {
            provider,
            model: model.into(),
            config,
            prompts,
            detector,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Produces the next question for a session.
    ///
    /// Duplicates are retried up to `duplicate_retry_limit` times with a
    /// termination-mode prompt. If every retry repeats a recent question the
    /// last reply is returned with `is_last` forced on.
    pub async fn generate_interview_question(&self, ctx: &TurnContext) -> Result<GeneratedQuestion> {
        let mut attempts: u32 = 0;
        let mut mode = PromptMode::Standard;

        loop {
            attempts += 1;
            let payload = self.request_question(ctx, &mode, attempts).await?;

            if !self.detector.is_duplicate(&payload.question, &ctx.prior_questions) {
                let outcome = if attempts == 1 {
                    QuestionOutcome::Accepted
                } else {
                    QuestionOutcome::AcceptedAfterRetry
                };
                return Ok(self.accept(ctx, payload, outcome, attempts));
            }

            let retries_used = attempts - 1;
            if retries_used >= self.config.duplicate_retry_limit {
                warn!(
                    attempts = attempts,
                    question = %payload.question,
                    "Duplicate question after retries, forcing session termination"
                );
                return Ok(GeneratedQuestion {
                    question: payload.question,
                    tags: payload.tags,
                    is_last: true,
                    outcome: QuestionOutcome::ForcedTermination,
                    attempts,
                });
            }

            warn!(
                attempt = attempts,
                retry_limit = self.config.duplicate_retry_limit,
                question = %payload.question,
                "Duplicate question detected, retrying in termination mode"
            );
            mode = PromptMode::Termination {
                rejected_question: payload.question,
            };
        }
    }

    /// One upstream call bounded by the request timeout, parsed and validated
    async fn request_question(
        &self,
        ctx: &TurnContext,
        mode: &PromptMode,
        attempt: u32,
    ) -> Result<QuestionPayload> {
        let messages = self.prompts.build(ctx, mode);
        debug!(
            attempt = attempt,
            message_count = messages.len(),
            visited_topics = ctx.visited_topics.len(),
            "Requesting interview question"
        );

        let timeout = self.config.request_timeout();
        let call = self
            .provider
            .chat(messages, &self.config.sampling, &self.model);

        // Dropping the future on timeout cancels the in-flight request
        let response = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                error!(
                    provider = self.provider.provider_name(),
                    error = %e,
                    "Question generation request failed"
                );
                return Err(GenerationError::Transport(e));
            }
            Err(_) => {
                error!(
                    provider = self.provider.provider_name(),
                    timeout_ms = self.config.request_timeout_ms,
                    "Question generation request timed out"
                );
                return Err(ProviderError::timeout(self.config.request_timeout_ms).into());
            }
        };

        parse_question(&response.content).inspect_err(|e| {
            error!(error = %e, "Model reply could not be used as a question");
        })
    }

    fn accept(
        &self,
        ctx: &TurnContext,
        payload: QuestionPayload,
        outcome: QuestionOutcome,
        attempts: u32,
    ) -> GeneratedQuestion {
        let mut is_last = payload.is_last;

        let limit = self.config.max_unique_topics;
        if limit > 0 && !is_last {
            let covered: HashSet<&str> = ctx
                .visited_topics
                .iter()
                .chain(payload.tags.iter())
                .map(String::as_str)
                .collect();
            if covered.len() >= limit {
                info!(
                    covered = covered.len(),
                    limit = limit,
                    "Topic limit reached, marking question as last"
                );
                is_last = true;
            }
        }

        info!(
            outcome = %outcome,
            attempts = attempts,
            tags = payload.tags.len(),
            is_last = is_last,
            "Interview question accepted"
        );

        GeneratedQuestion {
            question: payload.question,
            tags: payload.tags,
            is_last,
            outcome,
            attempts,
        }
    }
}
