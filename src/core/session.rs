//! Session state: the part of turn state that persists across turns.
//!
//! Owned exclusively by a single in-flight turn at a time (§5); callers are
//! expected to serialize access per session (e.g. behind a
//! `tokio::sync::Mutex`).

use super::lab::LabContext;
use super::mastery::MasteryLevel;
use super::message::{CliEntry, ConversationMessage};
use super::turn::TurnState;

/// Full, untrimmed session state. `TurnState` is constructed from a window
/// over this on each turn and its two history fields are appended back here
/// after the turn completes.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Opaque session identifier assigned by `start_session`.
    pub session_id: String,
    /// The lab this session is bound to; read-only after creation.
    pub lab_context: LabContext,
    /// The learner's mastery level for this session.
    pub mastery_level: MasteryLevel,
    /// Full conversation history, append-only.
    pub conversation_history: Vec<ConversationMessage>,
    /// Full CLI history, append-only.
    pub cli_history: Vec<CliEntry>,
}

impl SessionState {
    /// Creates a new, empty session.
    #[must_use]
    pub fn new(session_id: impl Into<String>, lab_context: LabContext, mastery_level: MasteryLevel) -> Self {
        Self {
            session_id: session_id.into(),
            lab_context,
            mastery_level,
            conversation_history: Vec::new(),
            cli_history: Vec::new(),
        }
    }

    /// Builds a `TurnState` for `student_question`, trimming history to the
    /// configured windows (`history_window` messages, last 5 CLI entries).
    ///
    /// Any `new_cli_entries` observed since the last turn are appended to
    /// session state before trimming, so they are visible to this turn's
    /// detector and retriever.
    #[must_use]
    pub fn begin_turn(
        &mut self,
        student_question: impl Into<String>,
        new_cli_entries: Vec<CliEntry>,
        history_window: usize,
    ) -> TurnState {
        self.cli_history.extend(new_cli_entries);

        let trimmed_history = tail(&self.conversation_history, history_window);
        let trimmed_cli = tail(&self.cli_history, 5);

        TurnState::new(
            student_question,
            trimmed_history,
            trimmed_cli,
            self.lab_context.clone(),
            self.mastery_level,
        )
    }

    /// Appends the user question and the final assistant message for a
    /// completed turn. Per the §8 **History append** invariant, this grows
    /// `conversation_history` by exactly 2 entries.
    pub fn record_turn(&mut self, student_question: impl Into<String>, final_message: impl Into<String>) {
        self.conversation_history
            .push(ConversationMessage::user(student_question));
        self.conversation_history
            .push(ConversationMessage::assistant(final_message));
    }
}

fn tail<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    let start = items.len().saturating_sub(n);
    items[start..].to_vec()
}
