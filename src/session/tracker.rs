//! Session bookkeeping over the TTL store
//!
//! Each interview session owns two keys:
//! - `interview:{id}:topics`: set of topic tags already covered
//! - `interview:{id}:turn`: number of accepted questions so far
//!
//! Both keys are renewed on every write, so an abandoned session disappears
//! once the store's default TTL elapses without activity.

use tracing::{debug, info};

use crate::interview::{GeneratedQuestion, TurnContext};
use crate::store::TtlKeySetStore;

const KEY_PREFIX: &str = "interview";

/// Reads and writes session state on behalf of the interview loop
#[derive(Debug, Clone)]
pub struct SessionTracker {
    store: TtlKeySetStore,
}

impl SessionTracker {
    pub fn new(store: TtlKeySetStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &TtlKeySetStore {
        &self.store
    }

    pub fn topics_key(session_id: &str) -> String {
        format!("{}:{}:topics", KEY_PREFIX, session_id)
    }

    pub fn turn_key(session_id: &str) -> String {
        format!("{}:{}:turn", KEY_PREFIX, session_id)
    }

    /// Topic tags covered so far, sorted
    pub fn visited_topics(&self, session_id: &str) -> Vec<String> {
        self.store.get_set(&Self::topics_key(session_id))
    }

    /// Accepted questions so far; 0 for an unknown or expired session
    pub fn turn_index(&self, session_id: &str) -> i64 {
        self.store
            .get_number(&Self::turn_key(session_id))
            .unwrap_or(0)
    }

    /// Stores the tags of an accepted question and advances the turn counter.
    ///
    /// Returns the new turn index.
    pub fn record_accepted(&self, session_id: &str, question: &GeneratedQuestion) -> i64 {
        let topics_key = Self::topics_key(session_id);
        for tag in &question.tags {
            self.store.add_to_set(&topics_key, tag.as_str());
        }
        let turn = self.store.add_to_number(&Self::turn_key(session_id), 1);

        debug!(
            session_id = %session_id,
            turn = turn,
            tags = question.tags.len(),
            "Recorded accepted question"
        );
        turn
    }

    /// Drops all state for a finished session
    pub fn end_session(&self, session_id: &str) {
        self.store.clear(&Self::topics_key(session_id));
        self.store.clear(&Self::turn_key(session_id));
        info!(session_id = %session_id, "Interview session ended");
    }

    /// Builds the generation context for the next turn of `session_id`
    pub fn context_for(
        &self,
        session_id: &str,
        prior_questions: Vec<String>,
        prior_answers: Vec<String>,
        candidate_profile: impl Into<String>,
    ) -> TurnContext {
        TurnContext::new(candidate_profile)
            .with_history(prior_questions, prior_answers)
            .with_visited_topics(self.visited_topics(session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::QuestionOutcome;
    use crate::store::StoreConfig;
    use std::time::Duration;

    fn question(tags: &[&str]) -> GeneratedQuestion {
        GeneratedQuestion {
            question: "Q?".to_string(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            is_last: false,
            outcome: QuestionOutcome::Accepted,
            attempts: 1,
        }
    }

    #[test]
    fn test_keys_are_namespaced_per_session() {
        assert_eq!(SessionTracker::topics_key("abc"), "interview:abc:topics");
        assert_eq!(SessionTracker::turn_key("abc"), "interview:abc:turn");
    }

    #[tokio::test]
    async fn test_record_accepted_accumulates_topics_and_turns() {
        let tracker = SessionTracker::new(TtlKeySetStore::new());

        assert_eq!(tracker.record_accepted("s1", &question(&["di", "ioc"])), 1);
        assert_eq!(tracker.record_accepted("s1", &question(&["di", "testing"])), 2);

        assert_eq!(tracker.visited_topics("s1"), vec!["di", "ioc", "testing"]);
        assert_eq!(tracker.turn_index("s1"), 2);
        assert!(tracker.visited_topics("s2").is_empty());
        assert_eq!(tracker.turn_index("s2"), 0);
    }

    #[tokio::test]
    async fn test_question_without_tags_still_advances_turn() {
        let tracker = SessionTracker::new(TtlKeySetStore::new());
        assert_eq!(tracker.record_accepted("s1", &question(&[])), 1);
        assert!(tracker.visited_topics("s1").is_empty());
    }

    #[tokio::test]
    async fn test_end_session_clears_state() {
        let store = TtlKeySetStore::new();
        let tracker = SessionTracker::new(store.clone());
        tracker.record_accepted("s1", &question(&["di"]));
        tracker.record_accepted("s2", &question(&["rust"]));

        tracker.end_session("s1");

        assert!(tracker.visited_topics("s1").is_empty());
        assert_eq!(tracker.turn_index("s1"), 0);
        assert_eq!(tracker.turn_index("s2"), 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_context_for_includes_visited_topics() {
        let tracker = SessionTracker::new(TtlKeySetStore::new());
        tracker.record_accepted("s1", &question(&["ownership"]));

        let ctx = tracker.context_for(
            "s1",
            vec!["What is ownership?".to_string()],
            vec!["Each value has one owner".to_string()],
            "Rust developer",
        );

        assert_eq!(ctx.visited_topics, vec!["ownership"]);
        assert_eq!(ctx.candidate_profile, "Rust developer");
        assert_eq!(ctx.turns_completed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_session_expires() {
        let store = TtlKeySetStore::with_config(
            StoreConfig::default().with_default_ttl(Duration::from_secs(60)),
        );
        let tracker = SessionTracker::new(store);
        tracker.record_accepted("s1", &question(&["di"]));

        tokio::time::advance(Duration::from_secs(61)).await;

        assert!(tracker.visited_topics("s1").is_empty());
        assert_eq!(tracker.turn_index("s1"), 0);
    }
}
