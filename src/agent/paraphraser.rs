//! The Paraphraser Node (SPEC_FULL §4.4.4).
//!
//! Single LLM call at `CompletionParams::paraphraser()` applying a
//! deterministic cleanup instruction set to `feedback_message`. On any LLM
//! error or empty response, falls back to the input unchanged — the answer
//! is never lost to a paraphrase failure.

use crate::agent::prompt::PARAPHRASER_SYSTEM_PROMPT;
use crate::llm::{CompletionParams, LlmGateway, Message};

/// Paraphrases `feedback_message`, falling back to it unchanged on failure.
pub async fn run(gateway: &dyn LlmGateway, feedback_message: &str) -> String {
    let messages = vec![
        Message::system(PARAPHRASER_SYSTEM_PROMPT),
        Message::user(feedback_message.to_string()),
    ];

    match gateway.complete(&messages, None, CompletionParams::paraphraser()).await {
        Ok(result) => match result.text {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                tracing::debug!("paraphraser returned an empty response, falling back to raw feedback");
                feedback_message.to_string()
            }
        },
        Err(err) => {
            tracing::warn!(error = %err, "paraphraser call failed, falling back to raw feedback");
            feedback_message.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, LlmError, Result};
    use crate::llm::{ChunkStream, CompletionResult, ToolDefinition};
    use async_trait::async_trait;

    struct StubGateway {
        response: Result<CompletionResult>,
    }

    #[async_trait]
    impl LlmGateway for StubGateway {
        async fn complete(
            &self,
            _messages: &[Message],
            _tools: Option<&[ToolDefinition]>,
            _params: CompletionParams,
        ) -> Result<CompletionResult> {
            match &self.response {
                Ok(result) => Ok(result.clone()),
                Err(_) => Err(Error::Llm(LlmError::Unavailable {
                    reason: "stub failure".to_string(),
                })),
            }
        }

        async fn stream(
            &self,
            _messages: &[Message],
            _tools: Option<&[ToolDefinition]>,
            _params: CompletionParams,
        ) -> Result<ChunkStream> {
            unreachable!("paraphraser never streams")
        }
    }

    #[tokio::test]
    async fn returns_paraphrased_text_on_success() {
        let gateway = StubGateway {
            response: Ok(CompletionResult {
                text: Some("Hostname is misspelled.".to_string()),
                tool_calls: Vec::new(),
            }),
        };
        let result = run(&gateway, "Based on the output, HOSTNAME_TYPO occurred.").await;
        assert_eq!(result, "Hostname is misspelled.");
    }

    #[tokio::test]
    async fn falls_back_to_input_on_llm_error() {
        let gateway = StubGateway {
            response: Err(Error::Llm(LlmError::Unavailable {
                reason: "down".to_string(),
            })),
        };
        let result = run(&gateway, "original feedback").await;
        assert_eq!(result, "original feedback");
    }

    #[tokio::test]
    async fn falls_back_to_input_on_empty_response() {
        let gateway = StubGateway {
            response: Ok(CompletionResult {
                text: Some("   ".to_string()),
                tool_calls: Vec::new(),
            }),
        };
        let result = run(&gateway, "original feedback").await;
        assert_eq!(result, "original feedback");
    }
}
