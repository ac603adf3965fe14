//! The Pattern Registry: an immutable, priority-ordered snapshot of error
//! patterns backed by an atomically-swappable `Arc`.
//!
//! Readers (the detector, one per turn) take a cheap `Arc` clone and never
//! block; `reload` builds a brand-new snapshot off to the side and swaps it
//! in once, so a reload racing with in-flight detection never produces a
//! torn read.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use regex::{Regex, RegexBuilder};

use crate::error::{Error, PatternError, Result};
use crate::patterns::types::{ErrorPattern, PatternDocument};

const SUPPORTED_VERSION: u32 = 1;

/// A pattern with its `command_regex` pre-compiled.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// The source pattern definition.
    pub pattern: ErrorPattern,
    /// Compiled form of `pattern.command_regex`.
    pub command_regex: Regex,
}

/// An immutable set of compiled patterns, sorted by descending priority
/// (ties broken by load order).
struct Snapshot {
    patterns: Vec<CompiledPattern>,
}

impl Snapshot {
    fn build(document: PatternDocument) -> Result<Self> {
        if document.version != SUPPORTED_VERSION {
            return Err(Error::Pattern(PatternError::UnsupportedVersion {
                version: document.version,
            }));
        }

        let mut patterns = Vec::with_capacity(document.patterns.len());
        for (index, pattern) in document.patterns.into_iter().enumerate() {
            let command_regex = RegexBuilder::new(&pattern.command_regex)
                .case_insensitive(pattern.regex_flags.case_insensitive)
                .build()
                .map_err(|source| {
                    Error::Pattern(PatternError::CompileRegex {
                        pattern_id: pattern.pattern_id.clone(),
                        source,
                    })
                })?;
            patterns.push((index, CompiledPattern { pattern, command_regex }));
        }

        patterns.sort_by(|(a_index, a), (b_index, b)| {
            b.pattern
                .priority
                .cmp(&a.pattern.priority)
                .then_with(|| a_index.cmp(b_index))
        });

        Ok(Self {
            patterns: patterns.into_iter().map(|(_, p)| p).collect(),
        })
    }
}

/// A live, reloadable set of compiled error patterns.
///
/// Readers take the `RwLock` only long enough to clone the `Arc`; the
/// pattern matching itself runs against the clone, outside the lock.
pub struct PatternRegistry {
    source_path: PathBuf,
    snapshot: RwLock<Arc<Snapshot>>,
    generation: AtomicUsize,
}

impl PatternRegistry {
    /// Loads patterns from a JSON file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, has an
    /// unsupported `version`, or contains a pattern whose `command_regex`
    /// fails to compile.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = Self::read_snapshot(&path)?;
        Ok(Self {
            source_path: path,
            snapshot: RwLock::new(Arc::new(snapshot)),
            generation: AtomicUsize::new(0),
        })
    }

    /// Builds a registry directly from in-memory patterns (used by tests and
    /// by callers embedding a default pattern set).
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern's `command_regex` fails to compile.
    pub fn from_patterns(patterns: Vec<ErrorPattern>) -> Result<Self> {
        let snapshot = Snapshot::build(PatternDocument {
            version: SUPPORTED_VERSION,
            patterns,
        })?;
        Ok(Self {
            source_path: PathBuf::new(),
            snapshot: RwLock::new(Arc::new(snapshot)),
            generation: AtomicUsize::new(0),
        })
    }

    /// Loads every `*.json` pattern document directly under `dir` (not
    /// recursive), merging their `patterns` arrays into one registry in
    /// filename order. This is `load(sources)` from §4.1: a source set, not
    /// a single file.
    ///
    /// Patterns are merged in the order their source files sort
    /// lexicographically, so priority ties across files still resolve by a
    /// deterministic load order.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read, any file fails to
    /// parse, declares an unsupported `version`, or contains a pattern whose
    /// `command_regex` fails to compile.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| {
                Error::Io(crate::error::IoError::ReadFailed {
                    path: dir.display().to_string(),
                    reason: e.to_string(),
                })
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
            .collect();
        files.sort();

        let mut merged = Vec::new();
        for file in &files {
            let document = Self::read_document(file)?;
            merged.extend(document.patterns);
        }

        Self::from_patterns(merged)
    }

    fn read_document(path: &Path) -> Result<PatternDocument> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(crate::error::IoError::ReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        })?;
        let document: PatternDocument = serde_json::from_str(&text)
            .map_err(|e| Error::Storage(crate::error::StorageError::Serialization(e.to_string())))?;
        if document.version != SUPPORTED_VERSION {
            return Err(Error::Pattern(PatternError::UnsupportedVersion {
                version: document.version,
            }));
        }
        Ok(document)
    }

    fn read_snapshot(path: &Path) -> Result<Snapshot> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(crate::error::IoError::ReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        })?;
        let document: PatternDocument = serde_json::from_str(&text)
            .map_err(|e| Error::Storage(crate::error::StorageError::Serialization(e.to_string())))?;
        Snapshot::build(document)
    }

    /// Re-reads the source file and atomically swaps in the new pattern set.
    /// In-flight readers holding the previous `Arc` are unaffected.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as `load`, and leaves the
    /// current snapshot in place if the reload fails.
    pub fn reload(&self) -> Result<()> {
        let snapshot = Self::read_snapshot(&self.source_path)?;
        *write_lock(&self.snapshot) = Arc::new(snapshot);
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Returns the number of successful reloads since construction.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation.load(Ordering::SeqCst)
    }

    /// Returns every pattern, highest priority first.
    #[must_use]
    pub fn iter_by_priority(&self) -> Vec<CompiledPattern> {
        read_lock(&self.snapshot).patterns.clone()
    }

    /// Looks up a single pattern by id.
    ///
    /// # Errors
    ///
    /// Returns `PatternError::NotFound` if no loaded pattern has this id.
    pub fn find(&self, pattern_id: &str) -> Result<CompiledPattern> {
        read_lock(&self.snapshot)
            .patterns
            .iter()
            .find(|p| p.pattern.pattern_id == pattern_id)
            .cloned()
            .ok_or_else(|| {
                Error::Pattern(PatternError::NotFound {
                    pattern_id: pattern_id.to_string(),
                })
            })
    }

    /// Number of patterns currently loaded.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock(&self.snapshot).patterns.len()
    }

    /// Whether the registry currently holds no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn read_lock(lock: &RwLock<Arc<Snapshot>>) -> Arc<Snapshot> {
    lock.read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone()
}

fn write_lock(lock: &RwLock<Arc<Snapshot>>) -> std::sync::RwLockWriteGuard<'_, Arc<Snapshot>> {
    lock.write().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::types::{FuzzyConfig, MarkerCheck, MarkerPosition, RegexFlags};

    fn sample(id: &str, priority: i32) -> ErrorPattern {
        ErrorPattern {
            pattern_id: id.to_string(),
            description: "sample".to_string(),
            priority,
            signatures: vec!["% Invalid input detected".to_string()],
            command_regex: r"^conf\s".to_string(),
            regex_flags: RegexFlags::default(),
            marker_check: Some(MarkerCheck {
                expected_position: MarkerPosition::EndOfCommand,
                at_char: None,
            }),
            error_type: "INVALID_INPUT".to_string(),
            diagnosis_template: "You typed `{command}`.".to_string(),
            diagnosis_variables: vec!["command".to_string()],
            fix_template: "Try `{fix}`.".to_string(),
            fix_examples: vec!["configure terminal".to_string()],
            affected_modes: vec!["user_exec".to_string()],
            fuzzy: Some(FuzzyConfig {
                enabled: true,
                vocabulary_scope: "global_config".to_string(),
            }),
        }
    }

    #[test]
    fn sorts_by_descending_priority() {
        let registry = PatternRegistry::from_patterns(vec![sample("low", 1), sample("high", 10)]).unwrap();
        let ordered = registry.iter_by_priority();
        assert_eq!(ordered[0].pattern.pattern_id, "high");
        assert_eq!(ordered[1].pattern.pattern_id, "low");
    }

    #[test]
    fn ties_keep_load_order() {
        let registry = PatternRegistry::from_patterns(vec![sample("first", 5), sample("second", 5)]).unwrap();
        let ordered = registry.iter_by_priority();
        assert_eq!(ordered[0].pattern.pattern_id, "first");
        assert_eq!(ordered[1].pattern.pattern_id, "second");
    }

    #[test]
    fn find_returns_not_found_for_unknown_id() {
        let registry = PatternRegistry::from_patterns(vec![sample("only", 1)]).unwrap();
        let err = registry.find("missing").unwrap_err();
        assert!(matches!(err, Error::Pattern(PatternError::NotFound { .. })));
    }

    #[test]
    fn rejects_unsupported_version() {
        let document = PatternDocument {
            version: 99,
            patterns: vec![sample("a", 1)],
        };
        let err = Snapshot::build(document).unwrap_err();
        assert!(matches!(
            err,
            Error::Pattern(PatternError::UnsupportedVersion { version: 99 })
        ));
    }

    #[test]
    fn rejects_bad_regex() {
        let mut pattern = sample("bad", 1);
        pattern.command_regex = "(unclosed".to_string();
        let err = PatternRegistry::from_patterns(vec![pattern]).unwrap_err();
        assert!(matches!(err, Error::Pattern(PatternError::CompileRegex { .. })));
    }

    #[test]
    fn reload_bumps_generation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");
        let document = serde_json::json!({
            "version": 1,
            "patterns": [sample_json("a", 1)],
        });
        std::fs::write(&path, document.to_string()).unwrap();

        let registry = PatternRegistry::load(&path).unwrap();
        assert_eq!(registry.generation(), 0);
        assert_eq!(registry.len(), 1);

        let document = serde_json::json!({
            "version": 1,
            "patterns": [sample_json("a", 1), sample_json("b", 2)],
        });
        std::fs::write(&path, document.to_string()).unwrap();
        registry.reload().unwrap();

        assert_eq!(registry.generation(), 1);
        assert_eq!(registry.len(), 2);
    }

    fn sample_json(id: &str, priority: i32) -> serde_json::Value {
        serde_json::to_value(sample(id, priority)).unwrap()
    }
}
