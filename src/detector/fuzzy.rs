//! Caret-column extraction and fuzzy vocabulary lookup for mistyped tokens.

use crate::patterns::Vocabulary;
use crate::patterns::types::{MarkerCheck, MarkerPosition};

/// Minimum normalized similarity for a fuzzy suggestion.
const MIN_SIMILARITY: f64 = 0.7;
/// Maximum edit distance for a fuzzy suggestion, used when it is the looser
/// of the two bounds (e.g. short words where a similarity ratio is harsh).
const MAX_EDIT_DISTANCE: usize = 2;

/// Finds the 0-based column of the `^` marker on the last marker line in
/// `output`. A marker line is one whose trimmed content is composed only of
/// whitespace followed by a single `^`.
#[must_use]
pub fn find_marker_column(output: &str) -> Option<usize> {
    output.lines().rev().find_map(|line| {
        let caret_pos = line.find('^')?;
        if line[..caret_pos].chars().all(char::is_whitespace) && line[caret_pos + 1..].trim().is_empty() {
            Some(line[..caret_pos].chars().count())
        } else {
            None
        }
    })
}

/// Verifies that a marker column satisfies `check` relative to `command`.
#[must_use]
pub fn column_satisfies(check: &MarkerCheck, command: &str, column: usize) -> bool {
    match check.expected_position {
        MarkerPosition::EndOfCommand => column >= command.chars().count(),
        MarkerPosition::AtChar => check.at_char == Some(column),
        MarkerPosition::BeforeSlash => command
            .char_indices()
            .find(|(_, c)| *c == '/')
            .is_some_and(|(byte_idx, _)| column <= command[..byte_idx].chars().count()),
    }
}

/// Returns the whitespace-delimited word in `command` that contains
/// `column`, or the nearest preceding word if `column` lands past the end.
#[must_use]
pub fn word_at_column(command: &str, column: usize) -> Option<String> {
    let mut current_start = 0usize;
    let mut best: Option<&str> = None;

    for word in command.split_whitespace() {
        let start = command[current_start..].find(word)? + current_start;
        let end = start + word.chars().count();
        if column >= start && column < end {
            return Some(word.to_string());
        }
        if start <= column {
            best = Some(word);
        }
        current_start = end;
    }

    best.map(ToString::to_string)
}

/// Looks up the closest vocabulary word to `token` in `scope`, accepting the
/// match if it clears normalized similarity `0.7` OR edit distance `<= 2`,
/// whichever bound is looser for this pair.
#[must_use]
pub fn suggest(vocabulary: &Vocabulary, scope: &str, token: &str) -> Option<(String, f64)> {
    let token_lower = token.to_lowercase();
    vocabulary
        .words(scope)
        .iter()
        .map(|candidate| {
            let candidate_lower = candidate.to_lowercase();
            let similarity = strsim::normalized_damerau_levenshtein(&token_lower, &candidate_lower);
            let distance = strsim::damerau_levenshtein(&token_lower, &candidate_lower);
            (candidate.clone(), similarity, distance)
        })
        .filter(|(_, similarity, distance)| *similarity >= MIN_SIMILARITY || *distance <= MAX_EDIT_DISTANCE)
        .max_by(|(_, a, _), (_, b, _)| a.total_cmp(b))
        .map(|(word, similarity, _)| (word, similarity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn finds_caret_on_last_marker_line() {
        let output = "Router# hotname R1\n        ^\n% Invalid input detected at '^' marker.";
        assert_eq!(find_marker_column(output), Some(8));
    }

    #[test]
    fn no_marker_line_returns_none() {
        assert_eq!(find_marker_column("no caret here"), None);
    }

    #[test]
    fn end_of_command_check() {
        let check = MarkerCheck {
            expected_position: MarkerPosition::EndOfCommand,
            at_char: None,
        };
        assert!(column_satisfies(&check, "show run", 8));
        assert!(!column_satisfies(&check, "show run", 2));
    }

    #[test]
    fn before_slash_check_is_satisfied_by_a_caret_directly_under_the_slash() {
        let check = MarkerCheck {
            expected_position: MarkerPosition::BeforeSlash,
            at_char: None,
        };
        let command = "ip address 192.168.1.1/24";
        let slash_column = command.chars().count() - "24".len() - 1;
        assert!(column_satisfies(&check, command, slash_column));
        assert!(column_satisfies(&check, command, slash_column - 1));
        assert!(!column_satisfies(&check, command, slash_column + 1));
    }

    #[test]
    fn word_at_column_picks_containing_word() {
        assert_eq!(word_at_column("hotname R1", 0), Some("hotname".to_string()));
        assert_eq!(word_at_column("hotname R1", 8), Some("R1".to_string()));
    }

    #[test]
    fn suggest_prefers_closest_word() {
        let mut scopes = HashMap::new();
        scopes.insert("global_config".to_string(), vec!["hostname".to_string()]);
        let vocabulary = Vocabulary::from_scopes(scopes);
        let (word, similarity) = suggest(&vocabulary, "global_config", "hotname").unwrap();
        assert_eq!(word, "hostname");
        assert!(similarity >= MIN_SIMILARITY);
    }

    #[test]
    fn suggest_rejects_unrelated_token() {
        let mut scopes = HashMap::new();
        scopes.insert("global_config".to_string(), vec!["hostname".to_string()]);
        let vocabulary = Vocabulary::from_scopes(scopes);
        assert!(suggest(&vocabulary, "global_config", "zzzzzzzzzz").is_none());
    }
}
