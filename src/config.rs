//! Typed configuration surface (SPEC_FULL §6.4).
//!
//! Loaded from TOML (or JSON) with environment-variable overrides using
//! double-underscore nesting (e.g. `ILT_LLM__MODE=self_hosted`). Every
//! sub-table has a `Default` impl so a bare `[llm]` section still produces
//! sensible defaults; validation happens eagerly in [`Config::validate`] so
//! a missing required value (e.g. `llm.api_key` when `llm.mode = hosted`) is
//! a startup-time `Config` error, never a panic at call time.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Whether the LLM Gateway talks to an externally hosted provider or a
/// self-hosted endpoint speaking the same OpenAI-compatible wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmMode {
    /// An externally hosted provider (e.g. the OpenAI API itself).
    #[default]
    Hosted,
    /// A self-hosted endpoint speaking the same wire protocol.
    SelfHosted,
}

/// `[llm]` configuration table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Hosted vs. self-hosted endpoint selection.
    pub mode: LlmMode,
    /// Base URL of the OpenAI-compatible endpoint.
    pub endpoint_url: String,
    /// API key. Required when `mode = hosted`.
    pub api_key: Option<String>,
    /// Model identifier; configuration, not code.
    pub model_name: String,
    /// Per-call timeout, in seconds.
    pub timeout_s: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            mode: LlmMode::default(),
            endpoint_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model_name: "gpt-4o-mini".to_string(),
            timeout_s: 30,
        }
    }
}

/// `[embeddings]` configuration table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingsConfig {
    /// Base URL of the embeddings endpoint (used only when the
    /// `fastembed-embeddings` feature is disabled and a remote embedder is
    /// substituted; the in-process `FastEmbedEmbedder` ignores this).
    pub endpoint_url: String,
    /// Embedding model identifier.
    pub model_name: String,
    /// Embedding vector dimensionality.
    pub dim: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            model_name: "bge-m3".to_string(),
            dim: crate::embedding::DEFAULT_DIMENSIONS,
        }
    }
}

/// `[retriever]` configuration table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    /// Path to the persisted retrieval index (SQLite database).
    pub index_path: PathBuf,
    /// Path to the chunk metadata (unused as a separate file: the same
    /// SQLite database carries chunk metadata; kept for config-surface
    /// fidelity with §6.4 and to allow a future split).
    pub metadata_path: Option<PathBuf>,
    /// Candidate pool size for teaching-mode retrieval.
    pub k_teaching: usize,
    /// Candidate pool size for troubleshooting-mode retrieval.
    pub k_troubleshooting: usize,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from(".ioslab-tutor/index.db"),
            metadata_path: None,
            k_teaching: 3,
            k_troubleshooting: 12,
        }
    }
}

/// `[simulator]` configuration table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Base URL of the Simulator collaborator's HTTP/JSON endpoint.
    pub base_url: String,
    /// Per-call timeout, in seconds.
    pub timeout_s: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8088".to_string(),
            timeout_s: 10,
        }
    }
}

/// `[paths]` configuration table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory containing error pattern JSON files.
    pub patterns_dir: PathBuf,
    /// Path to the Cisco fuzzy-match vocabulary JSON.
    pub cisco_vocabulary: PathBuf,
    /// Directory containing lab corpus documents, consumed by the Indexer.
    pub labs_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            patterns_dir: PathBuf::from("data/patterns"),
            cisco_vocabulary: PathBuf::from("data/vocabulary.json"),
            labs_dir: PathBuf::from("data/labs"),
        }
    }
}

/// `[limits]` configuration table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum tool-call iterations per troubleshooting turn.
    pub max_tool_iterations: usize,
    /// Conversation-history window trimmed into prompts.
    pub conversation_history_messages: usize,
    /// CLI-history window consumed by the detector/retriever.
    pub cli_history_entries: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_tool_iterations: 3,
            conversation_history_messages: 4,
            cli_history_entries: 5,
        }
    }
}

/// The full, `serde`-deserializable configuration tree (SPEC_FULL §6.4),
/// loaded from TOML or JSON with environment-variable overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM Gateway settings.
    pub llm: LlmConfig,
    /// Embedding provider settings.
    pub embeddings: EmbeddingsConfig,
    /// Retriever settings.
    pub retriever: RetrieverConfig,
    /// Simulator collaborator settings.
    pub simulator: SimulatorConfig,
    /// Filesystem paths for patterns, vocabulary, and lab corpus.
    pub paths: PathsConfig,
    /// Bounded-resource limits.
    pub limits: LimitsConfig,
}

impl Config {
    /// Loads configuration from a TOML file at `path`, applies environment
    /// overrides, and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be read or parsed, if an
    /// environment override is malformed, or if validation fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read config file {}: {e}", path.display()),
        })?;
        let mut config: Self = toml::from_str(&text).map_err(|e| Error::Config {
            message: format!("failed to parse config file {}: {e}", path.display()),
        })?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Builds configuration from defaults plus environment overrides only
    /// (no file). Used by the CLI harness when no config file is given.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if an environment override is malformed or
    /// validation fails.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `ILT_<TABLE>__<FIELD>`-style environment overrides.
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("ILT_LLM__MODE") {
            self.llm.mode = match value.as_str() {
                "hosted" => LlmMode::Hosted,
                "self_hosted" => LlmMode::SelfHosted,
                other => {
                    return Err(Error::Config {
                        message: format!("invalid ILT_LLM__MODE value: {other}"),
                    });
                }
            };
        }
        if let Ok(value) = std::env::var("ILT_LLM__ENDPOINT_URL") {
            self.llm.endpoint_url = value;
        }
        if let Ok(value) = std::env::var("ILT_LLM__API_KEY") {
            self.llm.api_key = Some(value);
        }
        if let Ok(value) = std::env::var("ILT_LLM__MODEL_NAME") {
            self.llm.model_name = value;
        }
        if let Ok(value) = std::env::var("ILT_SIMULATOR__BASE_URL") {
            self.simulator.base_url = value;
        }
        if let Ok(value) = std::env::var("ILT_PATHS__LABS_DIR") {
            self.paths.labs_dir = PathBuf::from(value);
        }
        if let Ok(value) = std::env::var("ILT_RETRIEVER__INDEX_PATH") {
            self.retriever.index_path = PathBuf::from(value);
        }
        Ok(())
    }

    /// Validates required combinations (e.g. `llm.api_key` when
    /// `llm.mode = hosted`).
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.llm.mode == LlmMode::Hosted && self.llm.api_key.as_deref().unwrap_or("").is_empty() {
            return Err(Error::Config {
                message: "llm.api_key is required when llm.mode = hosted".to_string(),
            });
        }
        if self.embeddings.dim == 0 {
            return Err(Error::Config {
                message: "embeddings.dim must be nonzero".to_string(),
            });
        }
        if self.limits.max_tool_iterations == 0 {
            return Err(Error::Config {
                message: "limits.max_tool_iterations must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_when_self_hosted() {
        let mut config = Config::default();
        config.llm.mode = LlmMode::SelfHosted;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn hosted_without_api_key_fails_validation() {
        let config = Config::default();
        assert_eq!(config.llm.mode, LlmMode::Hosted);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn hosted_with_api_key_validates() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-test".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_tool_iterations_fails_validation() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-test".to_string());
        config.limits.max_tool_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = Config::load("/nonexistent/ioslab-tutor.toml").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
