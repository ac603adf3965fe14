//! Value types for error patterns, loaded verbatim from JSON.

use serde::{Deserialize, Serialize};

/// Where the caret (`^`) marker line is expected to point, relative to the
/// command string, for a pattern's `marker_check` to be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerPosition {
    /// The caret column falls before a `/` character in the command.
    BeforeSlash,
    /// The caret column falls at a specific character (see `at_char`).
    AtChar,
    /// The caret column falls at or past the end of the command string.
    EndOfCommand,
}

/// Caret-column validation for a pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerCheck {
    /// The position class the caret column must satisfy.
    pub expected_position: MarkerPosition,
    /// The exact 0-based column required when `expected_position` is
    /// `AtChar`; ignored otherwise.
    #[serde(default)]
    pub at_char: Option<usize>,
}

/// Fuzzy-match configuration for a pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzyConfig {
    /// Whether fuzzy vocabulary lookup is enabled for this pattern.
    pub enabled: bool,
    /// Name of the vocabulary scope to search (e.g. `global_config`).
    pub vocabulary_scope: String,
}

/// Per-pattern regex flags, parsed from the JSON document's `regex_flags`
/// array (e.g. `["case_insensitive"]`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RegexFlags {
    /// Whether `command_regex` should be compiled case-insensitively.
    #[serde(default)]
    pub case_insensitive: bool,
    /// Whether `signatures` substring matching ignores case.
    #[serde(default)]
    pub signatures_case_insensitive: bool,
}

/// A single error pattern, as loaded from a pattern JSON document.
///
/// `command_regex` is stored as source text here; [`super::registry::CompiledPattern`]
/// holds the compiled form used at match time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPattern {
    /// Stable identifier, unique within a registry.
    pub pattern_id: String,
    /// Human-readable description.
    pub description: String,
    /// Total-ordered priority; higher wins. Ties broken by load order.
    pub priority: i32,
    /// Substrings that must all appear in the terminal output.
    pub signatures: Vec<String>,
    /// Regex source matched against the command string.
    pub command_regex: String,
    /// Flags controlling how `command_regex` and `signatures` are matched.
    #[serde(default)]
    pub regex_flags: RegexFlags,
    /// Optional caret-column validation.
    #[serde(default)]
    pub marker_check: Option<MarkerCheck>,
    /// Machine-readable error classification (all-caps snake case).
    pub error_type: String,
    /// Brace-placeholder template rendered into the diagnosis text.
    pub diagnosis_template: String,
    /// Names of variables the diagnosis template may reference.
    #[serde(default)]
    pub diagnosis_variables: Vec<String>,
    /// Brace-placeholder template rendered into the fix text.
    pub fix_template: String,
    /// Example fixed commands shown to the learner.
    #[serde(default)]
    pub fix_examples: Vec<String>,
    /// CLI modes this pattern applies to (informational; not enforced here).
    #[serde(default)]
    pub affected_modes: Vec<String>,
    /// Optional fuzzy vocabulary lookup.
    #[serde(default)]
    pub fuzzy: Option<FuzzyConfig>,
}

/// The top-level shape of a pattern JSON document.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternDocument {
    /// Schema version; the registry rejects unsupported versions.
    pub version: u32,
    /// The patterns defined by this document.
    pub patterns: Vec<ErrorPattern>,
}

/// The top-level shape of a Cisco vocabulary JSON document: scope name to
/// word list.
#[derive(Debug, Clone, Deserialize)]
pub struct VocabularyDocument {
    /// Schema version.
    pub version: u32,
    /// Scope name (e.g. `global_config`) to its word list.
    pub scopes: std::collections::HashMap<String, Vec<String>>,
}
