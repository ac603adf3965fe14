//! CLI command implementations.
//!
//! Each command is a thin shim over the library's own public API: the
//! indexer, the pattern registry, and the agent graph's streaming driver.
//! None of this logic is reimplemented here — the CLI exists so the core
//! can be exercised from a terminal without standing up the transport/UI
//! collaborators (§1, §6.1).

use std::path::Path;
use std::sync::Arc;

use crate::cli::output::{
    AskOutcome, OutputFormat, PatternFileReport, StatusReport, format_ask_outcome, format_index_stats,
    format_pattern_report, format_status,
};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::core::{CliEntry, Intent, LabContext, MasteryLevel, SessionState};
use crate::embedding::create_embedder;
use crate::error::{CommandError, Error, Result};
use crate::indexer::{build_index, verify_index};
use crate::llm::OpenAiGateway;
use crate::patterns::{PatternRegistry, Vocabulary};
use crate::retriever::Retriever;
use crate::streaming::{StreamEvent, drive_turn};
use crate::tools::ToolExecutor;
use crate::GraphContext;

/// Executes the parsed CLI command and returns the text to print to stdout.
///
/// # Errors
///
/// Returns an error if configuration cannot be resolved or the invoked
/// command fails.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let config = resolve_config(cli)?;

    match &cli.command {
        Commands::BuildIndex { labs_dir, index_path } => cmd_build_index(&config, labs_dir.as_deref(), index_path.as_deref(), format),
        Commands::VerifyIndex { index_path } => cmd_verify_index(&config, index_path.as_deref(), format),
        Commands::ValidatePatterns { patterns_dir } => cmd_validate_patterns(&config, patterns_dir.as_deref(), format),
        Commands::Ask {
            question,
            lab_id,
            lab_title,
            mastery,
            cli_commands,
            cli_outputs,
            device_id,
        } => cmd_ask(
            &config,
            question,
            lab_id,
            lab_title,
            mastery,
            cli_commands,
            cli_outputs,
            device_id,
            format,
        ),
        Commands::Status => cmd_status(&config, format),
    }
}

/// Loads configuration from `--config` if given, else from defaults plus
/// `ILT_*` environment overrides.
fn resolve_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load(path),
        None => Config::from_env(),
    }
}

fn cmd_build_index(config: &Config, labs_dir: Option<&Path>, index_path: Option<&Path>, format: OutputFormat) -> Result<String> {
    let labs_dir = labs_dir.unwrap_or(&config.paths.labs_dir);
    let index_path = index_path.unwrap_or(&config.retriever.index_path);
    if let Some(parent) = index_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let embedder = create_embedder()?;
    let stats = build_index(labs_dir, index_path, config.retriever.metadata_path.as_deref(), embedder.as_ref())?;
    Ok(format_index_stats(&stats, format))
}

fn cmd_verify_index(config: &Config, index_path: Option<&Path>, format: OutputFormat) -> Result<String> {
    let index_path = index_path.unwrap_or(&config.retriever.index_path);
    let stats = verify_index(index_path, config.embeddings.dim)?;
    Ok(format_index_stats(&stats, format))
}

fn cmd_validate_patterns(config: &Config, patterns_dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let patterns_dir = patterns_dir.unwrap_or(&config.paths.patterns_dir);
    let files_loaded = std::fs::read_dir(patterns_dir)
        .map_err(Error::from)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .count();
    let registry = PatternRegistry::load_dir(patterns_dir)?;
    let report = PatternFileReport {
        files_loaded,
        patterns_loaded: registry.len(),
    };
    Ok(format_pattern_report(&report, format))
}

#[allow(clippy::too_many_arguments)]
fn cmd_ask(
    config: &Config,
    question: &str,
    lab_id: &str,
    lab_title: &str,
    mastery: &str,
    cli_commands: &[String],
    cli_outputs: &[String],
    device_id: &str,
    format: OutputFormat,
) -> Result<String> {
    if cli_commands.len() != cli_outputs.len() {
        return Err(Error::Command(CommandError::InvalidArgument(format!(
            "--cli-command was given {} time(s) but --cli-output {} time(s); they must pair up",
            cli_commands.len(),
            cli_outputs.len()
        ))));
    }

    let mastery_level: MasteryLevel = mastery
        .parse()
        .map_err(|_| Error::Command(CommandError::InvalidArgument(format!("invalid --mastery value: {mastery}"))))?;

    let cli_entries: Vec<CliEntry> = cli_commands
        .iter()
        .zip(cli_outputs.iter())
        .enumerate()
        .map(|(i, (command, output))| CliEntry::new(command.clone(), output.clone(), i64::try_from(i).unwrap_or(i64::MAX), device_id))
        .collect();

    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Command(CommandError::ExecutionFailed(e.to_string())))?;

    runtime.block_on(async {
        let ctx = build_graph_context(config)?;
        let lab_context = LabContext::new(lab_id, lab_title);
        let mut session = SessionState::new("cli-session", lab_context, mastery_level);
        let turn = session.begin_turn(question, cli_entries, config.limits.conversation_history_messages);

        let mut handle = drive_turn(Arc::new(ctx), turn);
        let mut final_message = String::new();
        let mut intent = Intent::Teaching;
        let mut doc_ids = Vec::new();

        while let Some(event) = handle.events.recv().await {
            match event {
                StreamEvent::Metadata {
                    final_message: message,
                    intent: turn_intent,
                    doc_ids: ids,
                    ..
                } => {
                    final_message = message;
                    intent = turn_intent;
                    doc_ids = ids;
                }
                StreamEvent::Error { message } => {
                    return Err(Error::Command(CommandError::ExecutionFailed(message)));
                }
                StreamEvent::Content { .. } | StreamEvent::Info { .. } | StreamEvent::Done => {}
            }
        }

        let outcome = AskOutcome {
            intent: intent.as_str(),
            doc_ids,
            final_message,
        };
        Ok(format_ask_outcome(&outcome, format))
    })
}

fn cmd_status(config: &Config, format: OutputFormat) -> Result<String> {
    let index_reachable = Retriever::open(
        config.retriever.clone(),
        Arc::from(create_embedder()?),
        load_vocabulary(config).ok().flatten(),
    )
    .index_available();

    let pattern_count = PatternRegistry::load_dir(&config.paths.patterns_dir).map(|r| r.len());

    let report = StatusReport {
        index_reachable,
        index_path: config.retriever.index_path.display().to_string(),
        patterns_reachable: pattern_count.is_ok(),
        patterns_dir: config.paths.patterns_dir.display().to_string(),
        pattern_count: pattern_count.unwrap_or(0),
        llm_mode: format!("{:?}", config.llm.mode).to_lowercase(),
    };
    Ok(format_status(&report, format))
}

/// Builds the shared collaborators needed to run a turn through the agent
/// graph, matching §4.4's `GraphContext`.
fn build_graph_context(config: &Config) -> Result<GraphContext> {
    let embedder: Arc<dyn crate::embedding::Embedder> = Arc::from(create_embedder()?);
    let vocabulary = load_vocabulary(config)?;
    let retriever = Retriever::open(config.retriever.clone(), embedder, vocabulary.clone());
    let registry = PatternRegistry::load_dir(&config.paths.patterns_dir)?;

    Ok(GraphContext {
        gateway: Arc::new(OpenAiGateway::new(&config.llm)),
        tool_executor: Arc::new(ToolExecutor::new(&config.simulator)),
        retriever: Arc::new(retriever),
        registry: Arc::new(registry),
        vocabulary,
        limits: config.limits,
    })
}

fn load_vocabulary(config: &Config) -> Result<Option<Arc<Vocabulary>>> {
    match Vocabulary::load(&config.paths.cisco_vocabulary) {
        Ok(vocabulary) => Ok(Some(Arc::new(vocabulary))),
        Err(err) => {
            tracing::warn!(path = %config.paths.cisco_vocabulary.display(), error = %err, "fuzzy vocabulary unavailable");
            Ok(None)
        }
    }
}
