//! Fuzzy-match vocabulary: scoped word lists consulted when no regex pattern
//! signature matches an invalid command outright.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, IoError, Result, StorageError};
use crate::patterns::types::VocabularyDocument;

const SUPPORTED_VERSION: u32 = 1;

/// Scoped Cisco IOS command vocabularies used for fuzzy suggestion lookup.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    scopes: HashMap<String, Vec<String>>,
}

impl Vocabulary {
    /// Loads a vocabulary document from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, fails to parse, or
    /// declares an unsupported `version`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(IoError::ReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        })?;
        let document: VocabularyDocument = serde_json::from_str(&text)
            .map_err(|e| Error::Storage(StorageError::Serialization(e.to_string())))?;

        if document.version != SUPPORTED_VERSION {
            return Err(Error::Config {
                message: format!("unsupported vocabulary schema version {}", document.version),
            });
        }

        Ok(Self {
            scopes: document.scopes,
        })
    }

    /// Builds a vocabulary directly from scoped word lists (used by tests).
    #[must_use]
    pub fn from_scopes(scopes: HashMap<String, Vec<String>>) -> Self {
        Self { scopes }
    }

    /// Returns the word list for `scope`, or an empty slice if the scope is
    /// unknown.
    #[must_use]
    pub fn words(&self, scope: &str) -> &[String] {
        self.scopes.get(scope).map_or(&[], Vec::as_slice)
    }

    /// Whether `word` (case-insensitive) appears in any loaded scope.
    ///
    /// Used by the Retriever's query rewriter (SPEC_FULL §4.3) to filter a
    /// failed command's tokens down to recognized Cisco vocabulary before
    /// folding them into a retrieval query.
    #[must_use]
    pub fn contains_word(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        self.scopes
            .values()
            .any(|words| words.iter().any(|candidate| candidate.to_lowercase() == word))
    }

    /// Finds the closest word in `scope` to `token` by normalized edit
    /// distance (via `strsim::normalized_damerau_levenshtein`), returning it
    /// along with its similarity score in `[0.0, 1.0]` if it clears
    /// `min_similarity`.
    #[must_use]
    pub fn closest_match(&self, scope: &str, token: &str, min_similarity: f64) -> Option<(String, f64)> {
        let token = token.to_lowercase();
        self.words(scope)
            .iter()
            .map(|candidate| {
                let score = strsim::normalized_damerau_levenshtein(&token, &candidate.to_lowercase());
                (candidate.clone(), score)
            })
            .filter(|(_, score)| *score >= min_similarity)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
    }
}
