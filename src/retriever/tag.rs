//! Provenance tagging for indexed chunks, stored in [`ChunkMetadata::custom`]
//! as JSON so the retrieval index needs no schema migration beyond the
//! indexer's existing `custom_metadata` column.
//!
//! [`ChunkMetadata::custom`]: crate::core::ChunkMetadata::custom

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::DocClass;

/// Provenance recorded for one indexed chunk at build time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkTag {
    /// Which retrieval bucket this chunk belongs to.
    pub doc_class: DocClass,
    /// The lab this chunk is scoped to, if any (`None` for cross-lab
    /// reference material such as command syntax docs).
    pub lab_id: Option<String>,
    /// The source document path this chunk was extracted from, relative to
    /// `paths.labs_dir`.
    pub source_file: String,
}

impl ChunkTag {
    /// Serializes this tag for storage in `ChunkMetadata.custom`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (never expected to in
    /// practice: every field is a plain string/enum).
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Flattens this tag into the free-form provenance map carried on
    /// [`crate::core::RetrievedDoc::metadata`].
    #[must_use]
    pub fn into_metadata(self, chunk_id: Option<i64>) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert("source_file".to_string(), self.source_file);
        if let Some(lab_id) = self.lab_id {
            metadata.insert("lab_id".to_string(), lab_id);
        }
        if let Some(id) = chunk_id {
            metadata.insert("chunk_id".to_string(), id.to_string());
        }
        metadata
    }
}

/// Metadata for a chunk with no parseable tag (pre-tagging data, or a
/// corrupted `custom` column). Assumed lab-specific since that is the most
/// conservative bucket: it never displaces error-pattern or
/// command-reference content ahead of it in priority order.
pub(super) fn default_metadata(chunk_id: Option<i64>) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    if let Some(id) = chunk_id {
        metadata.insert("chunk_id".to_string(), id.to_string());
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let tag = ChunkTag {
            doc_class: DocClass::ErrorPatterns,
            lab_id: Some("lab-1".to_string()),
            source_file: "errors/typo.md".to_string(),
        };
        let json = tag.to_json().unwrap();
        let parsed: ChunkTag = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.doc_class, DocClass::ErrorPatterns);
        assert_eq!(parsed.lab_id.as_deref(), Some("lab-1"));
    }

    #[test]
    fn metadata_omits_absent_lab_id() {
        let tag = ChunkTag {
            doc_class: DocClass::CommandReference,
            lab_id: None,
            source_file: "reference/interfaces.md".to_string(),
        };
        let metadata = tag.into_metadata(Some(7));
        assert_eq!(metadata.get("source_file").unwrap(), "reference/interfaces.md");
        assert!(!metadata.contains_key("lab_id"));
        assert_eq!(metadata.get("chunk_id").unwrap(), "7");
    }
}
