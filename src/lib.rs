//! # ioslab-tutor
//!
//! The orchestration core for an interactive tutor that guides students
//! through Cisco IOS lab exercises.
//!
//! A student's question is routed to one of two paths: a teaching path that
//! answers concept questions directly from retrieved lab material, or a
//! troubleshooting path that grounds its answer in a deterministic read of
//! the student's own terminal activity (falling back to a bounded
//! tool-calling loop only when no deterministic diagnosis applies). Neither
//! path ever contradicts what the device actually did.
//!
//! This crate owns intent routing, error detection, retrieval, prompt
//! assembly, the LLM gateway, and the streaming event driver. It does not
//! own the transport (HTTP/WebSocket), the browser UI, authentication, the
//! network simulator, or persistent multi-user session storage — those are
//! other collaborators' responsibility.
//!
//! ## Modules
//!
//! - [`agent`]: the dual-path agent graph (router, retrieval glue, teaching/
//!   troubleshooting/paraphraser feedback nodes).
//! - [`detector`]: deterministic CLI error classification with fuzzy-match
//!   fallback.
//! - [`retriever`]: hybrid (vector + FTS5) document retrieval over the lab
//!   corpus index.
//! - [`llm`]: the OpenAI-compatible gateway (`complete`/`stream`).
//! - [`streaming`]: the turn-level event driver and content filter.
//! - [`tools`]: the bounded tool-calling surface (`get_device_running_config`).
//! - [`indexer`]: the offline pipeline that builds the retrieval index.
//! - [`config`]: the typed, `serde`-deserializable configuration surface.
//! - [`chunking`]/[`io`]/[`search`]/[`storage`]/[`embedding`]: shared
//!   text-processing primitives used by both the indexer and the retriever.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
// Note: unsafe is needed for memory-mapped I/O (memmap2)
#![warn(unsafe_code)]

pub mod agent;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod core;
pub mod detector;
pub mod embedding;
pub mod error;
pub mod indexer;
pub mod io;
pub mod llm;
pub mod patterns;
pub mod retriever;
pub mod search;
pub mod storage;
pub mod streaming;
pub mod tools;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use core::{
    Buffer, BufferMetadata, CliEntry, Chunk, ChunkMetadata, ConversationMessage, DocClass, Intent,
    LabContext, MasteryLevel, RetrievedDoc, Role, SessionState, TurnState,
};

// Re-export detector types
pub use detector::{DetectionResult, FuzzyMatch, detect};

// Re-export pattern registry types
pub use patterns::{CompiledPattern, ErrorPattern, PatternRegistry, Vocabulary};

// Re-export storage types
pub use storage::{SqliteStorage, Storage};

// Re-export chunking types
pub use chunking::{Chunker, FixedChunker, SemanticChunker, create_chunker};

// Re-export embedding types
#[cfg(feature = "fastembed-embeddings")]
pub use embedding::FastEmbedEmbedder;
pub use embedding::{DEFAULT_DIMENSIONS, Embedder, FallbackEmbedder, cosine_similarity};

// Re-export search types
pub use search::{SearchConfig, SearchResult, hybrid_search};

// Re-export configuration
pub use config::Config;

// Re-export the agent graph entry points
pub use agent::{FeedbackStream, GraphContext, run_turn};

// Re-export the LLM gateway
pub use llm::{CompletionParams, LlmGateway, OpenAiGateway};

// Re-export the retriever
pub use retriever::Retriever;

// Re-export the streaming driver
pub use streaming::{CancelFlag, StreamEvent, TurnHandle, drive_turn};

// Re-export the tool executor
pub use tools::ToolExecutor;
