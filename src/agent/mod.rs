//! The dual-path agent graph (SPEC_FULL §4.4): intent routing, retrieval,
//! and the teaching/troubleshooting/paraphraser feedback nodes.

mod graph;
mod paraphraser;
mod prompt;
mod router;
mod teaching;
mod troubleshooting;

pub use graph::{run_turn, FeedbackStream, GraphContext};
pub use router::classify;
