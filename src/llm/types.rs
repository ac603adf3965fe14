//! Wire-agnostic message and tool types for the LLM Gateway (SPEC_FULL §4.6).
//!
//! These mirror the OpenAI-compatible chat-completions shape (§6.2) without
//! tying callers to `async-openai`'s request/response types directly, so the
//! agent graph can be unit-tested against a mock gateway.

use serde::{Deserialize, Serialize};

/// The speaker of a gateway message. A superset of [`crate::core::Role`]: the
/// gateway additionally needs to distinguish an assistant message that
/// itself requested tool calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System/instruction message.
    System,
    /// The learner.
    User,
    /// The model.
    Assistant,
    /// A tool-result message.
    Tool,
}

/// A single message in a chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// The speaker.
    pub role: Role,
    /// Message text. `None` for an assistant message that only carries
    /// tool calls.
    pub content: Option<String>,
    /// Present on assistant messages that requested tool calls.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Present on `tool` messages: which call this responds to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Builds a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Builds a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Builds an assistant message with plain text.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Builds a tool-result message tied to `tool_call_id`.
    #[must_use]
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque id the provider assigned to this call; echoed back on the
    /// corresponding tool-result message.
    pub id: String,
    /// The tool's declared name.
    pub name: String,
    /// Raw JSON-encoded arguments, as the provider sent them.
    pub arguments: String,
}

/// A tool declaration offered to the model, as a JSON-schema function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool's name, referenced in [`ToolCall::name`].
    pub name: String,
    /// Human-readable description shown to the model.
    pub description: String,
    /// JSON Schema for the tool's parameters object.
    pub parameters: serde_json::Value,
}

/// Sampling/length parameters for a completion call.
#[derive(Debug, Clone, Copy)]
pub struct CompletionParams {
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Maximum new tokens to generate.
    pub max_tokens: u32,
}

impl CompletionParams {
    /// Params for the teaching feedback node: temperature 0.7, ~400 tokens.
    #[must_use]
    pub const fn teaching() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: 400,
        }
    }

    /// Params for the troubleshooting feedback node's tool-loop and final
    /// streamed answer: temperature 0.3 (more grounded than teaching, less
    /// rigid than the paraphraser), ~600 tokens.
    #[must_use]
    pub const fn troubleshooting() -> Self {
        Self {
            temperature: 0.3,
            top_p: 1.0,
            max_tokens: 600,
        }
    }

    /// Params for the paraphraser: temperature 0.1, 500 tokens.
    #[must_use]
    pub const fn paraphraser() -> Self {
        Self {
            temperature: 0.1,
            top_p: 1.0,
            max_tokens: 500,
        }
    }
}

/// Result of a non-streaming `complete()` call.
#[derive(Debug, Clone, Default)]
pub struct CompletionResult {
    /// Assistant text, if the model produced any.
    pub text: Option<String>,
    /// Tool calls requested by the model, if any.
    pub tool_calls: Vec<ToolCall>,
}

impl CompletionResult {
    /// Whether the model asked to call at least one tool.
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// One chunk of a streamed completion.
#[derive(Debug, Clone)]
pub enum StreamChunk {
    /// A text delta.
    Text(String),
    /// Tool calls accumulated from this chunk (providers may stream tool
    /// call argument fragments across several chunks; the gateway
    /// reassembles them before yielding this variant).
    ToolCalls(Vec<ToolCall>),
}
