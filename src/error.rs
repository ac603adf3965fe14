//! Error types for the IOS lab tutor core.
//!
//! Mirrors the layered-enum approach used throughout this codebase: a single
//! top-level [`Error`] wraps one `thiserror`-derived enum per subsystem, each
//! convertible via `#[from]`. Only [`Error::Llm`], [`Error::Pattern`] (load
//! failures), and [`Error::Config`] are meant to surface to a caller as a
//! terminal failure; the rest are handled locally by their owning node.

use thiserror::Error;

/// Result type alias for tutor-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the tutor core.
#[derive(Error, Debug)]
pub enum Error {
    /// Pattern registry load/lookup errors.
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Error-detector errors (template rendering, etc).
    #[error("detection error: {0}")]
    Detection(#[from] DetectionError),

    /// Retriever / retrieval-index errors.
    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// LLM Gateway errors.
    #[error("llm error: {0}")]
    Llm(#[from] LlmError),

    /// Tool Executor errors.
    #[error("tool error: {0}")]
    Tool(#[from] ToolError),

    /// Storage-related errors (retrieval index database operations).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Chunking-related errors (indexer text processing).
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Invalid state errors.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of the invalid state.
        message: String,
    },

    /// Configuration errors. Fatal at startup.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// The transport closed mid-turn; the driver stopped cleanly.
    #[error("turn cancelled")]
    Cancelled,
}

/// Pattern registry errors.
#[derive(Error, Debug)]
pub enum PatternError {
    /// A pattern document failed validation while loading.
    #[error("pattern {pattern_id}: invalid field `{field}`: {reason}")]
    InvalidField {
        /// The offending pattern's id.
        pattern_id: String,
        /// The field that failed validation.
        field: String,
        /// Human-readable reason.
        reason: String,
    },

    /// `command_regex` failed to compile.
    #[error("pattern {pattern_id}: failed to compile command_regex: {source}")]
    CompileRegex {
        /// The offending pattern's id.
        pattern_id: String,
        /// Underlying regex compile error.
        #[source]
        source: regex::Error,
    },

    /// Pattern document version is unsupported.
    #[error("unsupported pattern document version: {version}")]
    UnsupportedVersion {
        /// The version found in the document.
        version: u32,
    },

    /// `find(pattern_id)` had no match.
    #[error("pattern not found: {pattern_id}")]
    NotFound {
        /// The requested pattern id.
        pattern_id: String,
    },

    /// A pattern references a fuzzy vocabulary scope with no matching word list.
    #[error("no vocabulary loaded for scope: {scope}")]
    MissingVocabulary {
        /// The missing scope name.
        scope: String,
    },
}

/// Error detector errors.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// A template referenced a variable absent from the extracted group map.
    ///
    /// Per spec, the pattern is disabled for the turn and detection returns
    /// `matched=false` rather than propagating — callers that need to log
    /// this should match on the variant before discarding it.
    #[error("pattern {pattern_id}: template references unknown variable `{variable}`")]
    MissingVariable {
        /// The pattern whose template is malformed.
        pattern_id: String,
        /// The unknown variable name.
        variable: String,
    },
}

/// Retriever errors.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The persisted retrieval index could not be opened or read.
    ///
    /// Non-fatal: the retriever returns an empty document list and the
    /// feedback node still produces an answer from prompt context alone.
    #[error("retrieval index unavailable: {reason}")]
    IndexUnavailable {
        /// Human-readable reason.
        reason: String,
    },
}

/// LLM Gateway errors.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The provider failed after exhausting retries, or timed out.
    #[error("llm provider unavailable: {reason}")]
    Unavailable {
        /// Human-readable reason (e.g. "503 after 2 retries", "timeout after 30s").
        reason: String,
    },

    /// The provider returned a response this gateway could not parse.
    #[error("invalid llm response: {0}")]
    InvalidResponse(String),
}

/// Tool Executor errors. Never bubbled to the transport: always turned into
/// a `tool_error: <reason>` string handed back to the model.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Arguments did not match the tool's declared schema.
    #[error("tool {tool}: schema mismatch: {reason}")]
    SchemaMismatch {
        /// The tool name.
        tool: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The tool call exceeded its timeout.
    #[error("tool {tool}: timed out after {timeout_s}s")]
    Timeout {
        /// The tool name.
        tool: String,
        /// The configured timeout, in seconds.
        timeout_s: u64,
    },

    /// The tool call failed (network error, 5xx, etc).
    #[error("tool {tool}: {reason}")]
    Failed {
        /// The tool name.
        tool: String,
        /// Human-readable reason.
        reason: String,
    },
}

/// Storage-specific errors for the retrieval index database.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(String),

    /// Index database not initialized (build step not run).
    #[error("retrieval index not initialized. Run: ioslab-tutor build-index")]
    NotInitialized,

    /// Chunk not found by ID.
    #[error("chunk not found: {id}")]
    ChunkNotFound {
        /// Chunk ID that was not found.
        id: i64,
    },

    /// Buffer not found by ID or name.
    #[error("buffer not found: {identifier}")]
    BufferNotFound {
        /// The ID or name that was looked up.
        identifier: String,
    },

    /// Schema migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Transaction error.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Embedding error (feature-gated).
    #[cfg(feature = "fastembed-embeddings")]
    #[error("embedding error: {0}")]
    Embedding(String),
}

/// Chunking-specific errors (used by the offline indexer).
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// Invalid UTF-8 encountered at specific byte offset.
    #[error("invalid UTF-8 at byte offset {offset}")]
    InvalidUtf8 {
        /// Byte offset where invalid UTF-8 was found.
        offset: usize,
    },

    /// Chunk size exceeds maximum allowed.
    #[error("chunk size {size} exceeds maximum {max}")]
    ChunkTooLarge {
        /// Actual chunk size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Invalid chunk configuration.
    #[error("invalid chunk configuration: {reason}")]
    InvalidConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },

    /// Overlap exceeds chunk size.
    #[error("overlap {overlap} must be less than chunk size {size}")]
    OverlapTooLarge {
        /// Overlap size.
        overlap: usize,
        /// Chunk size.
        size: usize,
    },

    /// Parallel processing error.
    #[error("parallel processing failed: {reason}")]
    ParallelFailed {
        /// Reason for failure.
        reason: String,
    },

    /// Regex compilation error.
    #[error("regex error: {0}")]
    Regex(String),

    /// Unknown chunking strategy.
    #[error("unknown chunking strategy: {name}")]
    UnknownStrategy {
        /// Name of the unknown strategy.
        name: String,
    },
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Memory mapping error.
    #[error("memory mapping failed: {path}: {reason}")]
    MmapFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Directory creation error.
    #[error("failed to create directory: {path}: {reason}")]
    DirectoryFailed {
        /// Path to the directory.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Unknown command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing required argument.
    #[error("missing required argument: {0}")]
    MissingArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),

    /// Output format error.
    #[error("output format error: {0}")]
    OutputFormat(String),
}

// Implement From traits for standard library / third-party errors.

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<regex::Error> for ChunkingError {
    fn from(err: regex::Error) -> Self {
        Self::Regex(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
