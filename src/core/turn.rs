//! Turn state: the single structured record that flows through every agent
//! graph node for one question/answer exchange.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::lab::LabContext;
use super::mastery::MasteryLevel;
use super::message::{CliEntry, ConversationMessage};
use crate::detector::DetectionResult;

/// The router's classification of a student question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// A concept question; served by the teaching path.
    Teaching,
    /// A "something is broken" question; served by the troubleshooting path.
    Troubleshooting,
    /// Tied teach/trouble keyword counts; routed like `Teaching`.
    Ambiguous,
}

impl Intent {
    /// The label used in `metadata.intent` and `info` phase strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Teaching => "teaching",
            Self::Troubleshooting => "troubleshooting",
            Self::Ambiguous => "ambiguous",
        }
    }
}

/// The retrieval document class, which drives prioritization order.
///
/// Declared in priority order: earlier variants sort before later ones when
/// `retrieved_docs` is ordered, per the §3 invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocClass {
    /// Known error signatures and their fixes.
    ErrorPatterns,
    /// Cisco IOS command syntax reference.
    CommandReference,
    /// Content scoped to the current lab.
    LabSpecific,
}

impl DocClass {
    /// All doc classes, in priority order.
    pub const ALL: [Self; 3] = [Self::ErrorPatterns, Self::CommandReference, Self::LabSpecific];
}

/// One retrieved document presented to a feedback node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDoc {
    /// Chunk text.
    pub content: String,
    /// Combined similarity/fusion score (higher is better).
    pub score: f64,
    /// The document class this chunk belongs to.
    pub doc_class: DocClass,
    /// Free-form provenance (source file, lab id, chunk id as strings).
    pub metadata: HashMap<String, String>,
}

/// The single structured record that flows through every agent graph node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnState {
    /// The learner's question for this turn.
    pub student_question: String,
    /// Conversation history, already trimmed to the configured window when
    /// assembled for prompting (the full untrimmed history lives in
    /// [`crate::core::session::SessionState`]).
    pub conversation_history: Vec<ConversationMessage>,
    /// CLI history, already trimmed to the last 5 entries.
    pub cli_history: Vec<CliEntry>,
    /// The lab this session is bound to.
    pub lab_context: LabContext,
    /// The learner's mastery level (tone only).
    pub mastery_level: MasteryLevel,
    /// Set by the router; `None` until the router has run.
    pub intent: Option<Intent>,
    /// The rewritten query actually sent to the retrieval index.
    pub retrieval_query: Option<String>,
    /// Documents returned by the retriever, already capped and prioritized.
    pub retrieved_docs: Vec<RetrievedDoc>,
    /// Detector results for `cli_history`, same index window: `cli_diagnoses[i]`
    /// corresponds to `cli_history[i]`; absent (not `None` in the vec, simply
    /// missing) when detection found nothing for that command.
    pub cli_diagnoses: HashMap<usize, DetectionResult>,
    /// True if the retrieval index was unavailable this turn.
    pub retrieval_unavailable: bool,
    /// The draft response, which may still contain reasoning markers.
    pub feedback_message: Option<String>,
    /// The cleaned, user-visible response.
    pub final_message: Option<String>,
}

impl TurnState {
    /// Starts a new turn from session state and an incoming question.
    ///
    /// `conversation_history` and `cli_history` are expected to already be
    /// trimmed to their configured windows by the caller.
    #[must_use]
    pub fn new(
        student_question: impl Into<String>,
        conversation_history: Vec<ConversationMessage>,
        cli_history: Vec<CliEntry>,
        lab_context: LabContext,
        mastery_level: MasteryLevel,
    ) -> Self {
        Self {
            student_question: student_question.into(),
            conversation_history,
            cli_history,
            lab_context,
            mastery_level,
            intent: None,
            retrieval_query: None,
            retrieved_docs: Vec::new(),
            cli_diagnoses: HashMap::new(),
            retrieval_unavailable: false,
            feedback_message: None,
            final_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_class_priority_order() {
        assert!(DocClass::ErrorPatterns < DocClass::CommandReference);
        assert!(DocClass::CommandReference < DocClass::LabSpecific);
    }

    #[test]
    fn intent_labels() {
        assert_eq!(Intent::Teaching.as_str(), "teaching");
        assert_eq!(Intent::Troubleshooting.as_str(), "troubleshooting");
        assert_eq!(Intent::Ambiguous.as_str(), "ambiguous");
    }

    #[test]
    fn new_turn_has_no_intent_yet() {
        let turn = TurnState::new(
            "why is this broken?",
            Vec::new(),
            Vec::new(),
            LabContext::new("lab-1", "VLANs"),
            MasteryLevel::Novice,
        );
        assert!(turn.intent.is_none());
        assert!(turn.retrieved_docs.is_empty());
    }
}
