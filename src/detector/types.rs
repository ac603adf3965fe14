//! Value types returned by the error detector.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Fuzzy vocabulary suggestion attached to a detection when a pattern
/// declares `fuzzy` matching and the mistyped word resolves to a close
/// vocabulary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyMatch {
    /// The word the learner actually typed.
    pub typed_word: String,
    /// The closest known-good word in the pattern's vocabulary scope.
    pub suggested_word: String,
    /// Normalized Damerau-Levenshtein similarity in `[0.0, 1.0]`.
    pub similarity: f64,
}

/// The outcome of running the detector against one `(command, output)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Whether any pattern matched.
    pub matched: bool,
    /// The matched pattern's `error_type`, empty when `matched` is false.
    pub error_type: String,
    /// The matched pattern's id, empty when `matched` is false.
    pub pattern_id: String,
    /// The command that was classified.
    pub command: String,
    /// Rendered diagnosis text, empty when `matched` is false.
    pub diagnosis: String,
    /// Rendered fix text, empty when `matched` is false.
    pub fix: String,
    /// Extracted template variables, keyed by name.
    pub variables: HashMap<String, String>,
    /// Fuzzy vocabulary suggestion, present only when the matched pattern
    /// declared fuzzy matching and a close word was found.
    pub fuzzy_match: Option<FuzzyMatch>,
}

impl DetectionResult {
    /// The canonical "nothing matched" result for a command.
    #[must_use]
    pub fn no_match(command: impl Into<String>) -> Self {
        Self {
            matched: false,
            error_type: String::new(),
            pattern_id: String::new(),
            command: command.into(),
            diagnosis: String::new(),
            fix: String::new(),
            variables: HashMap::new(),
            fuzzy_match: None,
        }
    }
}
