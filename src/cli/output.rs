//! Output formatting for CLI commands.
//!
//! Supports text and JSON output, matching the transport boundary's own
//! event/metadata shapes (§4.7, §6.1) so a learner driving `ask` from a
//! terminal sees the same structure a real transport would forward.

use serde::Serialize;
use std::fmt::Write;

use crate::error::Error;
use crate::indexer::IndexStats;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
    /// Newline-delimited JSON (NDJSON), one event per line.
    Ndjson,
}

impl OutputFormat {
    /// Parses format from string, defaulting to `text` for anything
    /// unrecognized.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "ndjson" | "jsonl" | "stream" => Self::Ndjson,
            _ => Self::Text,
        }
    }
}

/// Formats a terminal error for display, honoring `format`.
#[must_use]
pub fn format_error(err: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => err.to_string(),
        OutputFormat::Json | OutputFormat::Ndjson => {
            #[derive(Serialize)]
            struct ErrorBody {
                error: String,
            }
            serde_json::to_string(&ErrorBody { error: err.to_string() }).unwrap_or_else(|_| err.to_string())
        }
    }
}

/// Formats `build-index`/`verify-index` results.
#[must_use]
pub fn format_index_stats(stats: &IndexStats, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            let _ = writeln!(out, "documents: {}", stats.documents);
            let _ = writeln!(out, "chunks:    {}", stats.chunks);
            out
        }
        OutputFormat::Json | OutputFormat::Ndjson => {
            #[derive(Serialize)]
            struct Body {
                documents: usize,
                chunks: usize,
            }
            serde_json::to_string(&Body {
                documents: stats.documents,
                chunks: stats.chunks,
            })
            .unwrap_or_default()
        }
    }
}

/// One pattern-file validation outcome for `validate-patterns`.
#[derive(Debug, Serialize)]
pub struct PatternFileReport {
    /// Number of pattern files examined.
    pub files_loaded: usize,
    /// Total patterns merged across all files.
    pub patterns_loaded: usize,
}

/// Formats a `validate-patterns` report.
#[must_use]
pub fn format_pattern_report(report: &PatternFileReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!(
            "validated {} pattern file(s), {} pattern(s) total\n",
            report.files_loaded, report.patterns_loaded
        ),
        OutputFormat::Json | OutputFormat::Ndjson => serde_json::to_string(report).unwrap_or_default(),
    }
}

/// The observable result of one `ask` turn, mirroring the transport
/// boundary's `metadata` event (§4.7).
#[derive(Debug, Serialize)]
pub struct AskOutcome {
    /// The router's classification for this turn.
    pub intent: &'static str,
    /// Identifiers of the documents consulted (from `metadata.doc_ids`).
    pub doc_ids: Vec<String>,
    /// The final, user-visible message.
    pub final_message: String,
}

/// Formats an `ask` outcome.
#[must_use]
pub fn format_ask_outcome(outcome: &AskOutcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            let _ = writeln!(out, "intent: {}", outcome.intent);
            if !outcome.doc_ids.is_empty() {
                let _ = writeln!(out, "docs consulted: {}", outcome.doc_ids.join(", "));
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", outcome.final_message);
            out
        }
        OutputFormat::Json | OutputFormat::Ndjson => serde_json::to_string(outcome).unwrap_or_default(),
    }
}

/// A `status` report summarizing resolved configuration reachability.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// Whether the retrieval index at `retriever.index_path` could be opened.
    pub index_reachable: bool,
    /// Path the retriever was configured to open.
    pub index_path: String,
    /// Whether `paths.patterns_dir` loaded without error.
    pub patterns_reachable: bool,
    /// Path the pattern registry was configured to load.
    pub patterns_dir: String,
    /// Number of patterns loaded, when `patterns_reachable`.
    pub pattern_count: usize,
    /// The resolved LLM mode (`hosted` or `self_hosted`).
    pub llm_mode: String,
}

/// Formats a `status` report.
#[must_use]
pub fn format_status(report: &StatusReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            let _ = writeln!(out, "llm.mode:        {}", report.llm_mode);
            let _ = writeln!(
                out,
                "retrieval index: {} ({})",
                if report.index_reachable { "reachable" } else { "unreachable" },
                report.index_path
            );
            let _ = writeln!(
                out,
                "pattern registry: {} ({} pattern(s) from {})",
                if report.patterns_reachable { "reachable" } else { "unreachable" },
                report.pattern_count,
                report.patterns_dir
            );
            out
        }
        OutputFormat::Json | OutputFormat::Ndjson => serde_json::to_string(report).unwrap_or_default(),
    }
}
