//! The Pattern Registry (SPEC_FULL §4.1): loads and owns regex/fuzzy error
//! patterns, reloadable without disrupting in-flight readers.

pub mod registry;
pub mod types;
pub mod vocabulary;

pub use registry::{CompiledPattern, PatternRegistry};
pub use types::{ErrorPattern, FuzzyConfig, MarkerCheck, MarkerPosition, PatternDocument, RegexFlags};
pub use vocabulary::Vocabulary;
