//! The Error Detector (SPEC_FULL §4.2): deterministic classification of a
//! single `(command, output)` pair against the Pattern Registry.
//!
//! `detect` is a pure function of its inputs and the registry snapshot: no
//! I/O, no clock, no randomness. A reload racing with a call sees either the
//! old or the new snapshot, never a mix, because `iter_by_priority` clones
//! an `Arc` up front.

mod fuzzy;
mod template;
mod types;

pub use types::{DetectionResult, FuzzyMatch};

use std::collections::HashMap;

use crate::patterns::{PatternRegistry, Vocabulary};

/// The normative IOS error fragments (§6.6). Consulted by the intent router
/// (§4.4.1: `has_cli_error`) and the retriever's query rewriter (§4.3) for
/// "this output looks like an IOS error" — deliberately narrower than the
/// detector's own fast-reject set below, since a bare `%` (e.g. "100%
/// done") is not one of the five recognized error fragments and must not
/// force those callers into treating ordinary output as a CLI error.
pub(crate) const IOS_ERROR_FRAGMENTS: &[&str] = &[
    "% Invalid input",
    "% Incomplete command",
    "% Ambiguous command",
    "% Unknown command",
    "% Unrecognized",
];

/// The detector's own fast-reject set (§4.2 step 1): the five fragments
/// above plus a bare `%`, since step 1 explicitly lists `%` as its own
/// catch-all member and is only a cheap pre-filter, not a classification.
const FAST_REJECT_FRAGMENTS: &[&str] = &[
    "% Invalid input",
    "% Incomplete command",
    "% Ambiguous command",
    "% Unknown command",
    "% Unrecognized",
    "%",
];

/// Classifies one `(command, output)` pair against `registry`, consulting
/// `vocabulary` for fuzzy suggestions when a matched pattern declares them.
#[must_use]
pub fn detect(registry: &PatternRegistry, vocabulary: Option<&Vocabulary>, command: &str, output: &str) -> DetectionResult {
    if !FAST_REJECT_FRAGMENTS.iter().any(|fragment| output.contains(fragment)) {
        return DetectionResult::no_match(command);
    }

    for compiled in registry.iter_by_priority() {
        let pattern = &compiled.pattern;

        let signatures_match = pattern.signatures.iter().all(|signature| {
            if pattern.regex_flags.signatures_case_insensitive {
                output.to_lowercase().contains(&signature.to_lowercase())
            } else {
                output.contains(signature.as_str())
            }
        });
        if !signatures_match {
            continue;
        }

        let Some(captures) = compiled.command_regex.captures(command) else {
            continue;
        };

        let marker_column = if let Some(marker_check) = &pattern.marker_check {
            let Some(column) = fuzzy::find_marker_column(output) else {
                continue;
            };
            if !fuzzy::column_satisfies(marker_check, command, column) {
                continue;
            }
            Some(column)
        } else {
            None
        };

        let mut variables: HashMap<String, String> = HashMap::new();
        variables.insert("command".to_string(), command.to_string());
        variables.insert("output".to_string(), output.to_string());
        for name in compiled.command_regex.capture_names().flatten() {
            if let Some(value) = captures.name(name) {
                variables.insert(name.to_string(), value.as_str().to_string());
            }
        }

        let diagnosis = match template::render(&pattern.pattern_id, &pattern.diagnosis_template, &variables) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(pattern_id = %pattern.pattern_id, error = %err, "disabling pattern for this turn: diagnosis template error");
                continue;
            }
        };
        let fix = match template::render(&pattern.pattern_id, &pattern.fix_template, &variables) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(pattern_id = %pattern.pattern_id, error = %err, "disabling pattern for this turn: fix template error");
                continue;
            }
        };

        let fuzzy_match = pattern.fuzzy.as_ref().filter(|fuzzy| fuzzy.enabled).and_then(|fuzzy_config| {
            let vocabulary = vocabulary?;
            let column = marker_column.or_else(|| fuzzy::find_marker_column(output))?;
            let typed_word = fuzzy::word_at_column(command, column)?;
            let (suggested_word, similarity) = fuzzy::suggest(vocabulary, &fuzzy_config.vocabulary_scope, &typed_word)?;
            Some(FuzzyMatch {
                typed_word,
                suggested_word,
                similarity,
            })
        });

        return DetectionResult {
            matched: true,
            error_type: pattern.error_type.clone(),
            pattern_id: pattern.pattern_id.clone(),
            command: command.to_string(),
            diagnosis,
            fix,
            variables,
            fuzzy_match,
        };
    }

    DetectionResult::no_match(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::types::{ErrorPattern, FuzzyConfig, MarkerCheck, MarkerPosition, RegexFlags};
    use std::collections::HashMap as Map;

    fn typo_pattern() -> ErrorPattern {
        ErrorPattern {
            pattern_id: "typo-hostname".to_string(),
            description: "mistyped hostname command".to_string(),
            priority: 10,
            signatures: vec!["% Invalid input detected".to_string()],
            command_regex: r"^(?P<cmd>\S+)\s".to_string(),
            regex_flags: RegexFlags::default(),
            marker_check: Some(MarkerCheck {
                expected_position: MarkerPosition::AtChar,
                at_char: Some(0),
            }),
            error_type: "TYPO_IN_COMMAND".to_string(),
            diagnosis_template: "`{cmd}` is not a recognized command.".to_string(),
            diagnosis_variables: vec!["cmd".to_string()],
            fix_template: "Did you mean `{cmd}`?".to_string(),
            fix_examples: vec!["hostname R1".to_string()],
            affected_modes: vec!["global_config".to_string()],
            fuzzy: Some(FuzzyConfig {
                enabled: true,
                vocabulary_scope: "global_config".to_string(),
            }),
        }
    }

    fn vocabulary() -> Vocabulary {
        let mut scopes = Map::new();
        scopes.insert("global_config".to_string(), vec!["hostname".to_string()]);
        Vocabulary::from_scopes(scopes)
    }

    fn cidr_pattern() -> ErrorPattern {
        ErrorPattern {
            pattern_id: "cidr-not-supported-24".to_string(),
            description: "CIDR slash notation used with ip address".to_string(),
            priority: 25,
            signatures: vec!["% Invalid input detected".to_string()],
            command_regex: r"^ip address \S+/24\s*$".to_string(),
            regex_flags: RegexFlags::default(),
            marker_check: Some(MarkerCheck {
                expected_position: MarkerPosition::BeforeSlash,
                at_char: None,
            }),
            error_type: "CIDR_NOT_SUPPORTED".to_string(),
            diagnosis_template: "`ip address` does not accept CIDR slash notation.".to_string(),
            diagnosis_variables: Vec::new(),
            fix_template: "Replace `/24` with `255.255.255.0`.".to_string(),
            fix_examples: vec!["ip address 192.168.1.1 255.255.255.0".to_string()],
            affected_modes: vec!["interface_config".to_string()],
            fuzzy: None,
        }
    }

    #[test]
    fn fast_rejects_clean_output() {
        let registry = PatternRegistry::from_patterns(vec![typo_pattern()]).unwrap();
        let result = detect(&registry, None, "hostname R1", "R1(config)#");
        assert!(!result.matched);
    }

    #[test]
    fn detects_typo_with_fuzzy_suggestion() {
        let registry = PatternRegistry::from_patterns(vec![typo_pattern()]).unwrap();
        let vocabulary = vocabulary();
        let output = "hotname R1\n^\n% Invalid input detected at '^' marker.";
        let result = detect(&registry, Some(&vocabulary), "hotname R1", output);
        assert!(result.matched);
        assert_eq!(result.error_type, "TYPO_IN_COMMAND");
        let fuzzy_match = result.fuzzy_match.expect("expected fuzzy suggestion");
        assert_eq!(fuzzy_match.suggested_word, "hostname");
    }

    #[test]
    fn detects_cidr_with_caret_directly_under_the_slash() {
        let registry = PatternRegistry::from_patterns(vec![cidr_pattern()]).unwrap();
        let command = "ip address 192.168.1.1/24";
        let slash_column = command.find('/').expect("command has a slash");
        let marker_line = " ".repeat(slash_column) + "^";
        let output = format!("{command}\n{marker_line}\n% Invalid input detected at '^' marker.");

        let result = detect(&registry, None, command, &output);

        assert!(result.matched);
        assert_eq!(result.error_type, "CIDR_NOT_SUPPORTED");
    }

    #[test]
    fn cidr_pattern_does_not_match_when_caret_is_past_the_slash() {
        let registry = PatternRegistry::from_patterns(vec![cidr_pattern()]).unwrap();
        let command = "ip address 192.168.1.1/24";
        let slash_column = command.find('/').expect("command has a slash");
        let marker_line = " ".repeat(slash_column + 1) + "^";
        let output = format!("{command}\n{marker_line}\n% Invalid input detected at '^' marker.");

        let result = detect(&registry, None, command, &output);

        assert!(!result.matched);
    }

    #[test]
    fn no_pattern_registered_returns_no_match() {
        let registry = PatternRegistry::from_patterns(Vec::new()).unwrap();
        let result = detect(&registry, None, "hotname R1", "% Invalid input detected");
        assert!(!result.matched);
        assert_eq!(result.command, "hotname R1");
    }
}
