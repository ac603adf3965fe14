//! The LLM Gateway (SPEC_FULL §4.6): an `async-openai`-backed client against
//! an OpenAI-compatible base URL, selecting between a hosted and a
//! self-hosted endpoint by configuration only.
//!
//! `complete()` wraps transient failures (429/5xx/timeout) in a bounded
//! retry with jittered exponential backoff; `stream()` never retries
//! mid-stream, per §5.

use std::pin::Pin;
use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionStreamOptions, ChatCompletionTool, ChatCompletionToolArgs,
    ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionObjectArgs,
};
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use rand::Rng;

use crate::config::{LlmConfig, LlmMode};
use crate::error::{Error, LlmError, Result};
use crate::llm::types::{CompletionParams, CompletionResult, Message, Role, StreamChunk, ToolCall, ToolDefinition};

/// A boxed, owned stream of gateway stream chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// The two LLM Gateway operations (§4.6), abstracted behind a trait so the
/// agent graph can be exercised against a deterministic mock in tests.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Non-streaming completion. Returns text and/or tool calls.
    ///
    /// # Errors
    ///
    /// Returns `Error::Llm` after exhausting retries on a transient failure,
    /// or immediately on a non-retryable failure.
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        params: CompletionParams,
    ) -> Result<CompletionResult>;

    /// Streaming completion. Never retried mid-stream.
    ///
    /// # Errors
    ///
    /// Returns `Error::Llm` if the initial request fails to establish.
    async fn stream(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        params: CompletionParams,
    ) -> Result<ChunkStream>;
}

/// Bounded retry policy for the non-streaming path (§5: at most 2 retries,
/// baseline 250ms, jitter ±50ms).
const MAX_RETRIES: u32 = 2;
const RETRY_BASELINE_MS: u64 = 250;
const RETRY_JITTER_MS: u64 = 50;

/// `async-openai`-backed gateway against an OpenAI-compatible endpoint.
pub struct OpenAiGateway {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiGateway {
    /// Builds a gateway from `[llm]` configuration. Works identically for
    /// `llm.mode = hosted` and `llm.mode = self_hosted`: both speak the same
    /// OpenAI-compatible wire protocol, only the base URL and key differ.
    #[must_use]
    pub fn new(config: &LlmConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_base(config.endpoint_url.clone());
        if let Some(api_key) = &config.api_key {
            openai_config = openai_config.with_api_key(api_key.clone());
        } else if config.mode == LlmMode::SelfHosted {
            // Self-hosted endpoints commonly accept any non-empty bearer token.
            openai_config = openai_config.with_api_key("unused");
        }
        Self {
            client: Client::with_config(openai_config),
            model: config.model_name.clone(),
            timeout: Duration::from_secs(config.timeout_s),
        }
    }

    fn build_tools(tools: Option<&[ToolDefinition]>) -> Result<Option<Vec<ChatCompletionTool>>> {
        let Some(tools) = tools else { return Ok(None) };
        if tools.is_empty() {
            return Ok(None);
        }
        let mut built = Vec::with_capacity(tools.len());
        for tool in tools {
            let function = FunctionObjectArgs::default()
                .name(tool.name.clone())
                .description(tool.description.clone())
                .parameters(tool.parameters.clone())
                .build()
                .map_err(build_error)?;
            built.push(
                ChatCompletionToolArgs::default()
                    .r#type(ChatCompletionToolType::Function)
                    .function(function)
                    .build()
                    .map_err(build_error)?,
            );
        }
        Ok(Some(built))
    }

    fn build_messages(messages: &[Message]) -> Result<Vec<ChatCompletionRequestMessage>> {
        messages.iter().map(Self::build_message).collect()
    }

    fn build_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
        let content = message.content.clone().unwrap_or_default();
        let built = match message.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(content)
                .build()
                .map_err(build_error)?
                .into(),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()
                .map_err(build_error)?
                .into(),
            Role::Assistant => {
                let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                if message.content.is_some() {
                    builder.content(content);
                }
                ChatCompletionRequestMessage::from(builder.build().map_err(build_error)?)
            }
            Role::Tool => {
                let tool_call_id = message.tool_call_id.clone().ok_or_else(|| {
                    Error::Llm(LlmError::InvalidResponse(
                        "tool message missing tool_call_id".to_string(),
                    ))
                })?;
                ChatCompletionRequestToolMessageArgs::default()
                    .content(content)
                    .tool_call_id(tool_call_id)
                    .build()
                    .map_err(build_error)?
                    .into()
            }
        };
        Ok(built)
    }

    fn extract_tool_calls(raw: Option<&Vec<ChatCompletionMessageToolCall>>) -> Vec<ToolCall> {
        raw.map(|calls| {
            calls
                .iter()
                .map(|call| ToolCall {
                    id: call.id.clone(),
                    name: call.function.name.clone(),
                    arguments: call.function.arguments.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
    }

    async fn complete_once(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        params: CompletionParams,
    ) -> Result<CompletionResult> {
        let request_messages = Self::build_messages(messages)?;
        let request_tools = Self::build_tools(tools)?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(self.model.clone())
            .messages(request_messages)
            .temperature(params.temperature)
            .top_p(params.top_p)
            .max_tokens(params.max_tokens);
        if let Some(request_tools) = request_tools {
            builder.tools(request_tools);
        }
        let request = builder.build().map_err(build_error)?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                Error::Llm(LlmError::Unavailable {
                    reason: format!("timeout after {}s", self.timeout.as_secs()),
                })
            })?
            .map_err(request_error)?;

        let choice = response.choices.into_iter().next();
        let (text, tool_calls) = choice.map_or((None, Vec::new()), |choice| {
            let tool_calls = Self::extract_tool_calls(choice.message.tool_calls.as_ref());
            (choice.message.content, tool_calls)
        });

        Ok(CompletionResult { text, tool_calls })
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        params: CompletionParams,
    ) -> Result<CompletionResult> {
        let mut attempt = 0;
        loop {
            match self.complete_once(messages, tools, params).await {
                Ok(result) => return Ok(result),
                Err(err) if attempt < MAX_RETRIES && is_retryable(&err) => {
                    attempt += 1;
                    let jitter = rand::thread_rng().gen_range(-(RETRY_JITTER_MS as i64)..=(RETRY_JITTER_MS as i64));
                    let base = (RETRY_BASELINE_MS * 2u64.pow(attempt - 1)) as i64;
                    let backoff = (base + jitter).max(0) as u64;
                    tracing::debug!(attempt, backoff_ms = backoff, "retrying llm completion after transient failure");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn stream(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
        params: CompletionParams,
    ) -> Result<ChunkStream> {
        let request_messages = Self::build_messages(messages)?;
        let request_tools = Self::build_tools(tools)?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(self.model.clone())
            .messages(request_messages)
            .temperature(params.temperature)
            .top_p(params.top_p)
            .max_tokens(params.max_tokens)
            .stream(true)
            .stream_options(ChatCompletionStreamOptions {
                include_usage: false,
            });
        if let Some(request_tools) = request_tools {
            builder.tools(request_tools);
        }
        let request = builder.build().map_err(build_error)?;

        let upstream = self.client.chat().create_stream(request).await.map_err(request_error)?;

        let mapped = upstream.map(|item| match item {
            Ok(response) => {
                let Some(choice) = response.choices.into_iter().next() else {
                    return Ok(StreamChunk::Text(String::new()));
                };
                if let Some(tool_calls) = choice.delta.tool_calls {
                    let calls = tool_calls
                        .into_iter()
                        .filter_map(|chunk| {
                            let function = chunk.function?;
                            Some(ToolCall {
                                id: chunk.id.unwrap_or_default(),
                                name: function.name.unwrap_or_default(),
                                arguments: function.arguments.unwrap_or_default(),
                            })
                        })
                        .collect();
                    Ok(StreamChunk::ToolCalls(calls))
                } else {
                    Ok(StreamChunk::Text(choice.delta.content.unwrap_or_default()))
                }
            }
            Err(err) => Err(request_error(err)),
        });

        Ok(Box::pin(mapped))
    }
}

fn build_error(err: OpenAIError) -> Error {
    Error::Llm(LlmError::InvalidResponse(err.to_string()))
}

fn request_error(err: OpenAIError) -> Error {
    Error::Llm(LlmError::Unavailable { reason: err.to_string() })
}

/// Only 429/5xx/timeout failures are retried; other `OpenAIError` variants
/// (bad request, invalid argument, serialization) are not transient and are
/// returned immediately.
fn is_retryable(err: &Error) -> bool {
    match err {
        Error::Llm(LlmError::Unavailable { reason }) => {
            reason.contains("timeout")
                || reason.contains("429")
                || reason.contains("500")
                || reason.contains("502")
                || reason.contains("503")
                || reason.contains("504")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(is_retryable(&Error::Llm(LlmError::Unavailable {
            reason: "503 Service Unavailable".to_string()
        })));
        assert!(is_retryable(&Error::Llm(LlmError::Unavailable {
            reason: "timeout after 30s".to_string()
        })));
        assert!(!is_retryable(&Error::Llm(LlmError::InvalidResponse("bad json".to_string()))));
        assert!(!is_retryable(&Error::Llm(LlmError::Unavailable {
            reason: "400 Bad Request".to_string()
        })));
    }

    #[test]
    fn gateway_builds_from_config() {
        let config = LlmConfig {
            mode: LlmMode::SelfHosted,
            endpoint_url: "http://localhost:11434/v1".to_string(),
            api_key: None,
            model_name: "local-model".to_string(),
            timeout_s: 5,
        };
        let gateway = OpenAiGateway::new(&config);
        assert_eq!(gateway.model, "local-model");
        assert_eq!(gateway.timeout, Duration::from_secs(5));
    }
}
