//! The LLM Gateway (SPEC_FULL §4.6).
//!
//! Two operations against an OpenAI-compatible chat-completions endpoint:
//! [`gateway::LlmGateway::complete`] (non-streaming, retried on transient
//! failure) and [`gateway::LlmGateway::stream`] (streaming, never retried
//! mid-stream). The concrete [`gateway::OpenAiGateway`] is `async-openai`-backed;
//! the trait exists so the agent graph can run against a deterministic mock
//! without a network dependency.

pub mod gateway;
pub mod types;

pub use gateway::{ChunkStream, LlmGateway, OpenAiGateway};
pub use types::{CompletionParams, CompletionResult, Message, Role, StreamChunk, ToolCall, ToolDefinition};
