//! Core domain models for the IOS lab tutor.
//!
//! `buffer`/`chunk` are generic text-processing primitives shared with the
//! offline indexer (§4.8); `lab`/`mastery`/`message`/`turn`/`session` are the
//! tutor's own turn/session domain model (§3).

pub mod buffer;
pub mod chunk;
pub mod lab;
pub mod mastery;
pub mod message;
pub mod session;
pub mod turn;

pub use buffer::{Buffer, BufferMetadata};
pub use chunk::{Chunk, ChunkMetadata};
pub use lab::LabContext;
pub use mastery::MasteryLevel;
pub use message::{CliEntry, ConversationMessage, Role};
pub use session::SessionState;
pub use turn::{DocClass, Intent, RetrievedDoc, TurnState};
