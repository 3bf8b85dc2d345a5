//! Prompt assembly for question generation
//!
//! Layout sent to the model:
//! 1. system: interviewer rules, reply format, candidate profile
//! 2. the last `history_turns` exchanges as assistant/user pairs
//! 3. user: instruction for the next question, with topics to avoid

use crate::interview::types::TurnContext;
use crate::providers::LlmMessage;

/// Which instruction closes the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptMode {
    /// Normal turn
    Standard,
    /// Retry after the model repeated itself; asks it to move on or wrap up
    Termination { rejected_question: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBuilder {
    history_turns: usize,
    topic_limit: usize,
}

impl PromptBuilder {
    pub fn new(history_turns: usize, topic_limit: usize) -> Self {
        Self {
            history_turns,
            topic_limit,
        }
    }

    pub fn build(&self, ctx: &TurnContext, mode: &PromptMode) -> Vec<LlmMessage> {
        let mut messages = vec![LlmMessage::system(self.system_prompt(ctx))];

        let answered = ctx.turns_completed();
        let first = answered.saturating_sub(self.history_turns);
        for index in first..answered {
            messages.push(LlmMessage::assistant(ctx.prior_questions[index].clone()));
            messages.push(LlmMessage::user(ctx.prior_answers[index].clone()));
        }
        // A question the candidate has not answered yet still counts as asked
        if let Some(pending) = ctx.prior_questions.get(answered) {
            messages.push(LlmMessage::assistant(pending.clone()));
        }

        messages.push(LlmMessage::user(self.instruction(ctx, mode)));
        messages
    }

    fn system_prompt(&self, ctx: &TurnContext) -> String {
        let mut prompt = String::from(
            "You are a technical interviewer running a mock interview. \
             Ask exactly one question per turn, building on the candidate's previous answers. \
             Never repeat a question that was already asked.\n\n\
             Reply with a single JSON object and nothing else:\n\
             {\"question\": string, \"tags\": string[], \"isLast\": boolean}\n\
             - \"tags\" lists short lowercase topic labels covered by the question.\n\
             - \"isLast\" is true only when this should be the final question.\n",
        );

        if self.topic_limit > 0 {
            prompt.push_str(&format!(
                "- Once {} or more distinct topic tags have been covered in total, set \"isLast\" to true.\n",
                self.topic_limit
            ));
        }

        let profile = ctx.candidate_profile.trim();
        if !profile.is_empty() {
            prompt.push_str("\nCandidate profile:\n");
            prompt.push_str(profile);
            prompt.push('\n');
        }

        prompt
    }

    fn instruction(&self, ctx: &TurnContext, mode: &PromptMode) -> String {
        let mut instruction = if ctx.prior_questions.is_empty() {
            String::from("Ask the opening question of the interview.")
        } else {
            String::from("Ask the next interview question.")
        };

        if !ctx.visited_topics.is_empty() {
            instruction.push_str(&format!(
                " Avoid these topics, they were already covered: {}.",
                ctx.visited_topics.join(", ")
            ));
        }

        if let PromptMode::Termination { rejected_question } = mode {
            instruction.push_str(&format!(
                " Your previous reply repeated an earlier question (\"{}\"). \
                 Ask about a topic that has not been covered yet. \
                 If no new topic is worth asking about, give a closing question and set \"isLast\" to true.",
                rejected_question
            ));
        }

        instruction
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(10, 20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::LlmRole;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_opening_prompt() {
        let ctx = TurnContext::new("Senior Rust developer, 6 years");
        let messages = PromptBuilder::default().build(&ctx, &PromptMode::Standard);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, LlmRole::System);
        assert!(messages[0].content.contains("Senior Rust developer"));
        assert!(messages[0].content.contains("20 or more distinct topic tags"));
        assert!(messages[1].content.contains("opening question"));
    }

    #[test]
    fn test_history_is_bounded() {
        let ctx = TurnContext::new("p").with_history(
            strings(&["q1", "q2", "q3"]),
            strings(&["a1", "a2", "a3"]),
        );
        let messages = PromptBuilder::new(2, 20).build(&ctx, &PromptMode::Standard);

        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(&contents[1..5], &["q2", "a2", "q3", "a3"]);
        assert_eq!(messages[1].role, LlmRole::Assistant);
        assert_eq!(messages[2].role, LlmRole::User);
        assert_eq!(messages.len(), 6);
    }

    #[test]
    fn test_pending_question_included() {
        let ctx = TurnContext::new("p").with_history(strings(&["q1", "q2"]), strings(&["a1"]));
        let messages = PromptBuilder::default().build(&ctx, &PromptMode::Standard);

        assert_eq!(messages[3].content, "q2");
        assert!(messages[3].is_assistant());
    }

    #[test]
    fn test_visited_topics_listed() {
        let ctx = TurnContext::new("p").with_visited_topics(strings(&["di", "ownership"]));
        let messages = PromptBuilder::default().build(&ctx, &PromptMode::Standard);

        let last = messages.last().unwrap();
        assert!(last.content.contains("Avoid these topics"));
        assert!(last.content.contains("di, ownership"));
    }

    #[test]
    fn test_termination_mode_amends_instruction() {
        let ctx = TurnContext::new("p").with_history(strings(&["What is DI?"]), strings(&["a"]));
        let mode = PromptMode::Termination {
            rejected_question: "What is DI?".to_string(),
        };
        let messages = PromptBuilder::default().build(&ctx, &mode);

        let last = messages.last().unwrap();
        assert!(last.content.contains("repeated an earlier question"));
        assert!(last.content.contains("set \"isLast\" to true"));
    }

    #[test]
    fn test_topic_limit_zero_omits_rule() {
        let messages =
            PromptBuilder::new(10, 0).build(&TurnContext::new("p"), &PromptMode::Standard);
        assert!(!messages[0].content.contains("distinct topic tags"));
    }
}
