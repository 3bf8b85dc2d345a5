use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything the generator needs to produce the next question of a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnContext {
    /// Questions already asked, oldest first
    pub prior_questions: Vec<String>,
    /// Candidate answers, aligned with `prior_questions`
    pub prior_answers: Vec<String>,
    /// Free-form candidate profile (CV text, role, seniority)
    pub candidate_profile: String,
    /// Topic tags already covered in this session
    pub visited_topics: Vec<String>,
}

impl TurnContext {
    pub fn new(candidate_profile: impl Into<String>) -> Self {
        Self {
            candidate_profile: candidate_profile.into(),
            ..Self::default()
        }
    }

    pub fn with_history(mut self, questions: Vec<String>, answers: Vec<String>) -> Self {
        self.prior_questions = questions;
        self.prior_answers = answers;
        self
    }

    pub fn with_visited_topics(mut self, topics: Vec<String>) -> Self {
        self.visited_topics = topics;
        self
    }

    /// Number of completed question/answer exchanges
    pub fn turns_completed(&self) -> usize {
        self.prior_questions.len().min(self.prior_answers.len())
    }
}

/// JSON object the model is asked to emit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPayload {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "isLast")]
    pub is_last: bool,
}

/// How a turn was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionOutcome {
    /// First reply was unique
    Accepted,
    /// A retry produced a unique question
    AcceptedAfterRetry,
    /// Retries were exhausted on duplicates; the session must end
    ForcedTermination,
}

impl fmt::Display for QuestionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuestionOutcome::Accepted => "accepted",
            QuestionOutcome::AcceptedAfterRetry => "accepted_after_retry",
            QuestionOutcome::ForcedTermination => "forced_termination",
        };
        f.write_str(label)
    }
}

/// Result of one generation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub tags: Vec<String>,
    #[serde(rename = "isLast")]
    pub is_last: bool,
    pub outcome: QuestionOutcome,
    /// Upstream calls spent on this turn
    pub attempts: u32,
}

impl GeneratedQuestion {
    pub fn is_forced_termination(&self) -> bool {
        self.outcome == QuestionOutcome::ForcedTermination
    }
}
