//! Conversation and CLI history entries carried in session state.

use serde::{Deserialize, Serialize};

/// The speaker of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The learner.
    User,
    /// The tutor.
    Assistant,
    /// A system/instruction message.
    System,
    /// A tool-result message.
    Tool,
}

/// One entry in `conversation_history`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Who sent this message.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Present on `tool` messages: the id of the tool call this responds to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ConversationMessage {
    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_call_id: None,
        }
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_call_id: None,
        }
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_call_id: None,
        }
    }

    /// Creates a tool-result message tied to a specific tool call.
    #[must_use]
    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// One observed `(command, output)` pair from the simulated CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliEntry {
    /// The command the learner typed.
    pub command: String,
    /// The terminal output the simulator produced.
    pub output: String,
    /// Unix timestamp when the command was observed.
    pub timestamp: i64,
    /// Identifier of the device the command ran against.
    pub device_id: String,
}

impl CliEntry {
    /// Creates a CLI history entry.
    #[must_use]
    pub fn new(
        command: impl Into<String>,
        output: impl Into<String>,
        timestamp: i64,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            timestamp,
            device_id: device_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_message_carries_call_id() {
        let msg = ConversationMessage::tool("42", "call_1");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn user_message_has_no_call_id() {
        let msg = ConversationMessage::user("hello");
        assert!(msg.tool_call_id.is_none());
    }
}
