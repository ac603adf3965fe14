//! The Teaching Feedback Node (SPEC_FULL §4.4.2).
//!
//! Single streaming LLM call at `CompletionParams::teaching()`, no tools, no
//! reasoning preamble. The Streaming Driver consumes the returned
//! [`ChunkStream`] directly and sets [`TurnState::final_message`] once it
//! drains, since this path has no paraphrase stage.

use crate::agent::prompt::teaching_system_prompt;
use crate::core::TurnState;
use crate::error::Result;
use crate::llm::{ChunkStream, CompletionParams, LlmGateway, Message};

/// Runs the teaching feedback node and returns the raw LLM token stream.
///
/// # Errors
///
/// Returns `Error::Llm` if the gateway cannot establish the stream.
pub async fn run(gateway: &dyn LlmGateway, turn: &TurnState) -> Result<ChunkStream> {
    let messages = vec![
        Message::system(teaching_system_prompt(turn)),
        Message::user(turn.student_question.clone()),
    ];
    gateway.stream(&messages, None, CompletionParams::teaching()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LabContext, MasteryLevel};
    use crate::llm::{CompletionResult, StreamChunk, ToolDefinition};
    use async_trait::async_trait;
    use futures_util::stream;

    struct StubGateway;

    #[async_trait]
    impl LlmGateway for StubGateway {
        async fn complete(
            &self,
            _messages: &[Message],
            _tools: Option<&[ToolDefinition]>,
            _params: CompletionParams,
        ) -> Result<CompletionResult> {
            unreachable!("teaching node never calls complete()")
        }

        async fn stream(
            &self,
            _messages: &[Message],
            tools: Option<&[ToolDefinition]>,
            _params: CompletionParams,
        ) -> Result<ChunkStream> {
            assert!(tools.is_none(), "teaching path never offers tools");
            Ok(Box::pin(stream::iter(vec![Ok(StreamChunk::Text("VLANs separate broadcast domains.".to_string()))])))
        }
    }

    #[tokio::test]
    async fn streams_with_no_tools() {
        use futures_util::StreamExt;

        let turn = TurnState::new(
            "why do we use VLANs?",
            Vec::new(),
            Vec::new(),
            LabContext::new("lab-1", "VLANs"),
            MasteryLevel::Novice,
        );
        let mut chunks = run(&StubGateway, &turn).await.unwrap();
        let first = chunks.next().await.unwrap().unwrap();
        match first {
            StreamChunk::Text(text) => assert!(text.contains("broadcast")),
            StreamChunk::ToolCalls(_) => panic!("expected text"),
        }
    }
}
