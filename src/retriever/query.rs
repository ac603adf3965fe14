//! Query rewriting (SPEC_FULL §4.3): turns the raw student question plus the
//! recent CLI window into the query actually sent to the retrieval index.

use std::collections::BTreeSet;

use crate::core::{CliEntry, Intent};
use crate::detector::IOS_ERROR_FRAGMENTS;
use crate::patterns::Vocabulary;

/// Generic English stopwords filtered out of command tokens before the
/// Cisco-vocabulary check, so a command like `no shutdown` contributes
/// `shutdown` as a keyword without `no` needing a vocabulary entry.
const STOPWORDS: &[&str] = &["no", "do", "the", "a", "an", "to", "on", "in", "at"];

/// Rewrites `question`/`cli_history` into the retrieval query for `mode`.
///
/// Returns the query string. `cli_history` is expected to already be
/// trimmed to the last 5 entries by the caller (§3 invariant).
#[must_use]
pub fn rewrite(mode: Intent, question: &str, cli_history: &[CliEntry], vocabulary: Option<&Vocabulary>) -> String {
    match mode {
        Intent::Teaching | Intent::Ambiguous => format!("Explain the concept: {question}"),
        Intent::Troubleshooting => rewrite_troubleshooting(question, cli_history, vocabulary),
    }
}

fn rewrite_troubleshooting(question: &str, cli_history: &[CliEntry], vocabulary: Option<&Vocabulary>) -> String {
    let Some(last_failed) = cli_history.iter().rev().find(|entry| is_error_output(&entry.output)) else {
        return format!("Cisco IOS {question}");
    };

    let keywords = command_keywords(&last_failed.command, vocabulary);
    let has_marker = last_failed.output.contains('^');

    if has_marker && is_error_output(&last_failed.output) {
        return format!("Invalid input detected {keywords} error pattern");
    }

    if has_other_error_keywords(&last_failed.output) {
        let error_tokens = error_type_tokens(&last_failed.output);
        return format!("{error_tokens} {keywords} Cisco IOS");
    }

    if !keywords.is_empty() {
        return format!("Cisco IOS {keywords} command syntax");
    }

    format!("Cisco IOS {question}")
}

fn is_error_output(output: &str) -> bool {
    IOS_ERROR_FRAGMENTS.iter().any(|fragment| output.contains(fragment))
}

/// IOS error keywords beyond the caret-marker family (timeouts, refusals,
/// permission failures) that still indicate "something is broken" without a
/// `^` marker line.
const OTHER_ERROR_KEYWORDS: &[&str] = &["denied", "timed out", "refused", "failed", "error"];

fn has_other_error_keywords(output: &str) -> bool {
    let lower = output.to_lowercase();
    OTHER_ERROR_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

fn error_type_tokens(output: &str) -> String {
    let lower = output.to_lowercase();
    OTHER_ERROR_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(*kw))
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Deduplicated, stopword- and vocabulary-filtered tokens from `command`.
fn command_keywords(command: &str, vocabulary: Option<&Vocabulary>) -> String {
    let mut seen = BTreeSet::new();
    let mut ordered = Vec::new();

    for token in command.split_whitespace() {
        let lower = token.to_lowercase();
        if STOPWORDS.contains(&lower.as_str()) {
            continue;
        }
        if let Some(vocabulary) = vocabulary
            && !vocabulary.contains_word(&lower)
        {
            continue;
        }
        if seen.insert(lower.clone()) {
            ordered.push(lower);
        }
    }

    // No vocabulary loaded, or nothing matched: fall back to the raw tokens
    // (minus stopwords) so the query never ends up empty on the first turn
    // before a vocabulary file is wired in.
    if ordered.is_empty() && vocabulary.is_none() {
        return command
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|t| !STOPWORDS.contains(&t.as_str()))
            .collect::<Vec<_>>()
            .join(" ");
    }

    ordered.join(" ")
}
