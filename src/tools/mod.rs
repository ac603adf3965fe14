//! The Tool Executor (SPEC_FULL §4.5): a typed tool dispatcher.
//!
//! Today there is exactly one tool, `get_device_running_config`, which calls
//! the Simulator collaborator (§6.3) over HTTP/JSON. Tool failures are never
//! bubbled as a hard error: a schema mismatch, timeout, or 5xx all become a
//! `"tool_error: <reason>"` string handed back to the model so the
//! troubleshooting tool loop can continue.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::config::SimulatorConfig;
use crate::llm::{ToolCall, ToolDefinition};

/// The name of the one tool this crate offers today.
pub const GET_DEVICE_RUNNING_CONFIG: &str = "get_device_running_config";

/// Returns the JSON-schema declaration for `get_device_running_config`,
/// suitable for inclusion in a chat-completion request's `tools` array.
#[must_use]
pub fn get_device_running_config_schema() -> ToolDefinition {
    ToolDefinition {
        name: GET_DEVICE_RUNNING_CONFIG.to_string(),
        description: "Fetches the current running configuration of a simulated network device."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "device_name": {
                    "type": "string",
                    "description": "The device identifier, e.g. \"R1\" or \"SW1\".",
                }
            },
            "required": ["device_name"],
            "additionalProperties": false,
        }),
    }
}

/// Returns every tool declaration the troubleshooting feedback node may
/// offer. A single-element list today; a dispatcher over more than one tool
/// is the natural extension point if the simulator grows more endpoints.
#[must_use]
pub fn available_tools() -> Vec<ToolDefinition> {
    vec![get_device_running_config_schema()]
}

#[derive(Debug, Deserialize)]
struct GetDeviceRunningConfigArgs {
    device_name: String,
}

#[derive(Debug, Deserialize)]
struct SimulatorConfigResponse {
    config: String,
}

/// Executes tool calls against the Simulator collaborator.
///
/// Calls within a single turn are executed sequentially by the caller (the
/// troubleshooting feedback node awaits each `execute` before issuing the
/// next), matching the at-most-one-in-flight-per-session concurrency rule.
pub struct ToolExecutor {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ToolExecutor {
    /// Builds a tool executor from `[simulator]` configuration.
    #[must_use]
    pub fn new(config: &SimulatorConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_s),
        }
    }

    /// Dispatches a single tool call by name and returns the text to feed
    /// back to the model as a `tool` message. Never returns `Err`: failures
    /// are encoded as `"tool_error: <reason>"` strings per §4.5/§7.
    pub async fn execute(&self, call: &ToolCall) -> String {
        match call.name.as_str() {
            GET_DEVICE_RUNNING_CONFIG => self.get_device_running_config(call).await,
            other => format!("tool_error: unknown tool `{other}`"),
        }
    }

    async fn get_device_running_config(&self, call: &ToolCall) -> String {
        let args: GetDeviceRunningConfigArgs = match serde_json::from_str(&call.arguments) {
            Ok(args) => args,
            Err(err) => {
                tracing::warn!(tool = %call.name, error = %err, "tool argument schema mismatch");
                return format!("tool_error: invalid arguments: {err}");
            }
        };

        let url = format!("{}/devices/{}/running-config", self.base_url, args.device_name);
        let request = self.http.get(&url).timeout(self.timeout).send();

        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) if response.status().is_success() => match response.json::<SimulatorConfigResponse>().await {
                Ok(body) => body.config,
                Err(err) => {
                    tracing::warn!(tool = %call.name, error = %err, "malformed simulator response");
                    format!("tool_error: malformed simulator response: {err}")
                }
            },
            Ok(Ok(response)) => {
                let status = response.status();
                tracing::warn!(tool = %call.name, %status, "simulator returned an error status");
                format!("tool_error: simulator returned {status}")
            }
            Ok(Err(err)) => {
                tracing::warn!(tool = %call.name, error = %err, "simulator call failed");
                format!("tool_error: {err}")
            }
            Err(_) => {
                tracing::warn!(tool = %call.name, timeout_s = self.timeout.as_secs(), "simulator call timed out");
                format!("tool_error: timed out after {}s", self.timeout.as_secs())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_requires_device_name() {
        let schema = get_device_running_config_schema();
        assert_eq!(schema.name, GET_DEVICE_RUNNING_CONFIG);
        assert_eq!(schema.parameters["required"][0], "device_name");
    }

    #[test]
    fn available_tools_has_one_entry() {
        assert_eq!(available_tools().len(), 1);
    }

    #[tokio::test]
    async fn unknown_tool_name_is_a_tool_error() {
        let executor = ToolExecutor::new(&SimulatorConfig {
            base_url: "http://localhost:0".to_string(),
            timeout_s: 1,
        });
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "not_a_real_tool".to_string(),
            arguments: "{}".to_string(),
        };
        let result = executor.execute(&call).await;
        assert!(result.starts_with("tool_error:"));
        assert!(result.contains("unknown tool"));
    }

    #[tokio::test]
    async fn malformed_arguments_are_a_tool_error() {
        let executor = ToolExecutor::new(&SimulatorConfig {
            base_url: "http://localhost:0".to_string(),
            timeout_s: 1,
        });
        let call = ToolCall {
            id: "call_1".to_string(),
            name: GET_DEVICE_RUNNING_CONFIG.to_string(),
            arguments: "not json".to_string(),
        };
        let result = executor.execute(&call).await;
        assert!(result.starts_with("tool_error: invalid arguments"));
    }

    #[tokio::test]
    async fn unreachable_simulator_is_a_tool_error() {
        let executor = ToolExecutor::new(&SimulatorConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_s: 1,
        });
        let call = ToolCall {
            id: "call_1".to_string(),
            name: GET_DEVICE_RUNNING_CONFIG.to_string(),
            arguments: serde_json::json!({"device_name": "R1"}).to_string(),
        };
        let result = executor.execute(&call).await;
        assert!(result.starts_with("tool_error:"));
    }
}
