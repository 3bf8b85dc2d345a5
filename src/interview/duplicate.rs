//! Near-exact duplicate detection over a short lookback window

/// Canonical form used for comparison: trimmed, internal whitespace folded to
/// single spaces, lowercased
pub fn normalize_question(question: &str) -> String {
    question
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Compares a candidate question against the most recent prior questions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateDetector {
    window: usize,
}

impl DuplicateDetector {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// True if `candidate` matches one of the last `window` entries of `prior`
    pub fn is_duplicate(&self, candidate: &str, prior: &[String]) -> bool {
        let candidate = normalize_question(candidate);
        if candidate.is_empty() {
            return false;
        }
        let start = prior.len().saturating_sub(self.window);
        prior[start..]
            .iter()
            .any(|previous| normalize_question(previous) == candidate)
    }
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new(5)
    }
}
