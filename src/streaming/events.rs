//! The driver's event schema (SPEC_FULL §4.7).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::Intent;

/// One event in a turn's event stream.
///
/// Ordering guarantee: for any turn the emitted sequence is
/// `info* (content|info)* metadata done` or `info* error`. `Metadata` is
/// emitted exactly once, only on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A lifecycle milestone, e.g. `"routed:troubleshooting"` or
    /// `"tool:get_device_running_config"`.
    Info {
        /// The milestone label.
        phase: String,
    },
    /// A user-visible text delta, already passed through the content filter.
    Content {
        /// The delta text.
        text: String,
    },
    /// Terminal metadata, emitted exactly once on success.
    Metadata {
        /// The final, user-visible message (same text as the concatenation
        /// of all `Content` deltas).
        final_message: String,
        /// The router's classification for this turn.
        intent: Intent,
        /// Identifiers of documents consulted, taken from `retrieved_docs`'
        /// metadata (e.g. chunk id or source file).
        doc_ids: Vec<String>,
        /// Free-form suggested follow-up questions (currently always empty;
        /// reserved for a future feedback-node enhancement).
        suggested_follow_ups: Vec<String>,
    },
    /// A recoverable failure. Terminates the stream with no `Done`.
    Error {
        /// A human-readable description of the failure.
        message: String,
    },
    /// Successful end of stream.
    Done,
}

impl StreamEvent {
    /// Builds an `Info` event.
    #[must_use]
    pub fn info(phase: impl Into<String>) -> Self {
        Self::Info { phase: phase.into() }
    }

    /// Builds a `Content` event.
    #[must_use]
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content { text: text.into() }
    }

    /// Builds an `Error` event.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }
}

/// Extracts `doc_ids` for the `Metadata` event from retrieved-document
/// metadata maps, preferring a `chunk_id` key and falling back to
/// `source_file`.
#[must_use]
pub(super) fn doc_ids_from_metadata(docs: &[crate::core::RetrievedDoc]) -> Vec<String> {
    docs.iter()
        .filter_map(|doc| doc_id(&doc.metadata))
        .collect()
}

fn doc_id(metadata: &HashMap<String, String>) -> Option<String> {
    metadata
        .get("chunk_id")
        .or_else(|| metadata.get("source_file"))
        .cloned()
}
