//! Lab context: the structured exercise a session is bound to.

use serde::{Deserialize, Serialize};

/// A structured lab exercise: instructions, objectives, and topology.
///
/// Set once at session start and read-only for every turn in that session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabContext {
    /// Stable identifier for the lab (used to scope `lab_specific` retrieval).
    pub lab_id: String,
    /// Display title.
    pub title: String,
    /// Prose description of the scenario.
    pub description: String,
    /// Full exercise instructions shown to the learner.
    pub instructions: String,
    /// Discrete learning objectives.
    pub objectives: Vec<String>,
    /// Optional free-form topology description (device names, links).
    pub topology: Option<String>,
}

impl LabContext {
    /// Creates a minimal lab context with no objectives or topology.
    #[must_use]
    pub fn new(lab_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            lab_id: lab_id.into(),
            title: title.into(),
            description: String::new(),
            instructions: String::new(),
            objectives: Vec::new(),
            topology: None,
        }
    }
}
