//! The Intent Router (SPEC_FULL §4.4.1): a pure heuristic classifier, no LLM.
//!
//! Latency budget: under 10ms. The whole function is set intersection over a
//! handful of fixed keyword lists plus a string scan over at most 5 CLI
//! entries — no I/O, no allocation beyond the token sets.

use std::collections::HashSet;

use crate::core::{CliEntry, Intent};
use crate::detector::IOS_ERROR_FRAGMENTS;

/// Fixed keyword set recognized as "the learner wants a concept explained"
/// (SPEC_FULL §6.6).
const TEACH_KEYWORDS: &[&str] = &[
    "why", "what", "explain", "how", "describe", "tell", "when", "difference", "concept",
];

/// Fixed keyword set recognized as "something is broken" (SPEC_FULL §6.6).
/// `doesn't` and `won't` are matched as substrings since tokenizing strips
/// the trailing apostrophe+letter; `not working` is matched as a phrase.
const TROUBLE_KEYWORDS: &[&str] = &[
    "wrong", "error", "fix", "broken", "failed", "stuck", "doesn't", "won't", "invalid",
];

/// Classifies `question`/`cli_history` into a routing [`Intent`].
///
/// Deterministic: identical inputs always return the same label.
#[must_use]
pub fn classify(question: &str, cli_history: &[CliEntry]) -> Intent {
    let tokens = tokenize(question);
    let teach_kw = count_matches(&tokens, TEACH_KEYWORDS);
    let trouble_kw = count_matches(&tokens, TROUBLE_KEYWORDS) + phrase_match(question, "not working");
    let has_cli_error = has_cli_error(cli_history);

    if has_cli_error && teach_kw > 0 && trouble_kw == 0 {
        return Intent::Teaching;
    }
    if has_cli_error {
        return Intent::Troubleshooting;
    }
    if trouble_kw > teach_kw {
        return Intent::Troubleshooting;
    }
    if teach_kw > trouble_kw {
        return Intent::Teaching;
    }
    if teach_kw == trouble_kw && teach_kw > 0 {
        return Intent::Ambiguous;
    }
    Intent::Teaching
}

/// Whether any of `cli_history`'s outputs looks like an IOS error: contains
/// `%` and a recognized error fragment (the same notion the detector's
/// fast-reject uses).
fn has_cli_error(cli_history: &[CliEntry]) -> bool {
    cli_history
        .iter()
        .any(|entry| entry.output.contains('%') && IOS_ERROR_FRAGMENTS.iter().any(|f| entry.output.contains(f)))
}

fn tokenize(question: &str) -> HashSet<String> {
    question
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn count_matches(tokens: &HashSet<String>, keywords: &[&str]) -> usize {
    keywords.iter().filter(|kw| tokens.contains(**kw)).count()
}

fn phrase_match(question: &str, phrase: &str) -> usize {
    usize::from(question.to_lowercase().contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_teaching_question_with_no_history() {
        let intent = classify("why do we use VLANs?", &[]);
        assert_eq!(intent, Intent::Teaching);
    }

    #[test]
    fn pure_trouble_question_with_no_history() {
        let intent = classify("this is broken and won't connect", &[]);
        assert_eq!(intent, Intent::Troubleshooting);
    }

    #[test]
    fn cli_error_forces_troubleshooting_even_with_neutral_question() {
        let history = vec![CliEntry::new("hotname R1", "% Invalid input detected\n^", 0, "R1")];
        let intent = classify("ok now what", &history);
        assert_eq!(intent, Intent::Troubleshooting);
    }

    #[test]
    fn cli_error_with_pure_teach_keywords_and_no_trouble_keywords_stays_teaching() {
        let history = vec![CliEntry::new("hotname R1", "% Invalid input detected\n^", 0, "R1")];
        let intent = classify("why do routers use a hostname at all?", &history);
        assert_eq!(intent, Intent::Teaching);
    }

    #[test]
    fn tied_keyword_counts_are_ambiguous() {
        let intent = classify("why is this wrong?", &[]);
        assert_eq!(intent, Intent::Ambiguous);
    }

    #[test]
    fn no_keywords_and_no_errors_defaults_to_teaching() {
        let intent = classify("hello there", &[]);
        assert_eq!(intent, Intent::Teaching);
    }

    #[test]
    fn a_bare_percent_sign_in_clean_output_is_not_a_cli_error() {
        let history = vec![CliEntry::new("copy running-config startup-config", "100% done\nR1#", 0, "R1")];
        let intent = classify("ok now what", &history);
        assert_eq!(intent, Intent::Teaching);
    }

    #[test]
    fn classification_is_deterministic() {
        let history = vec![CliEntry::new("no shut", "Router1(config-if)#", 0, "R1")];
        let a = classify("why does this command matter?", &history);
        let b = classify("why does this command matter?", &history);
        assert_eq!(a, b);
    }
}
