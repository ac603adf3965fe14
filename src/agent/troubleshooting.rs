//! The Troubleshooting Feedback Node (SPEC_FULL §4.4.3).
//!
//! Pre-processes the CLI window through the Error Detector, assembles a
//! system prompt naming the terminal activity as ground truth, then runs a
//! bounded tool-calling loop (at most `limits.max_tool_iterations` complete()
//! calls) before issuing one final streaming call whose full text becomes
//! `feedback_message`.

use futures_util::StreamExt;

use crate::agent::prompt::troubleshooting_system_prompt;
use crate::core::TurnState;
use crate::detector::{self, DetectionResult};
use crate::error::Result;
use crate::llm::{CompletionParams, LlmGateway, Message, Role, StreamChunk, ToolDefinition};
use crate::patterns::{PatternRegistry, Vocabulary};
use crate::tools::{ToolExecutor, available_tools};

/// Runs the full detector pass over `turn.cli_history`, populating
/// `turn.cli_diagnoses`. Returns whether tools should be offered this turn
/// (true when no command in the window produced a diagnosis).
pub fn precompute_diagnoses(turn: &mut TurnState, registry: &PatternRegistry, vocabulary: Option<&Vocabulary>) -> bool {
    turn.cli_diagnoses.clear();
    for (i, entry) in turn.cli_history.iter().enumerate() {
        let result = detector::detect(registry, vocabulary, &entry.command, &entry.output);
        if result.matched {
            turn.cli_diagnoses.insert(i, result);
        }
    }
    turn.cli_diagnoses.is_empty()
}

/// Runs the troubleshooting feedback node end to end, returning the raw
/// `feedback_message` text (not yet paraphrased).
///
/// # Errors
///
/// Returns `Error::Llm` if every completion attempt fails.
pub async fn run(
    gateway: &dyn LlmGateway,
    tool_executor: &ToolExecutor,
    turn: &TurnState,
    tools_enabled: bool,
    max_iterations: usize,
) -> Result<String> {
    let system_prompt = troubleshooting_system_prompt(turn, tools_enabled);
    let mut messages = vec![Message::system(system_prompt), Message::user(turn.student_question.clone())];

    let tool_defs = available_tools();
    let mut iterations = 0usize;

    loop {
        if iterations >= max_iterations {
            return finalize(gateway, &messages).await;
        }

        let tools_for_call: Option<&[ToolDefinition]> = if tools_enabled { Some(&tool_defs) } else { None };
        let result = gateway
            .complete(&messages, tools_for_call, CompletionParams::troubleshooting())
            .await?;
        iterations += 1;

        if result.has_tool_calls() {
            messages.push(Message {
                role: Role::Assistant,
                content: result.text.clone(),
                tool_calls: result.tool_calls.clone(),
                tool_call_id: None,
            });
            for call in &result.tool_calls {
                let tool_text = tool_executor.execute(call).await;
                messages.push(Message::tool_result(call.id.clone(), tool_text));
            }
            continue;
        }

        return finalize(gateway, &messages).await;
    }
}

/// Issues one final, non-tool streaming call and collects its full text.
async fn finalize(gateway: &dyn LlmGateway, messages: &[Message]) -> Result<String> {
    let mut stream = gateway.stream(messages, None, CompletionParams::troubleshooting()).await?;
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        if let StreamChunk::Text(delta) = chunk? {
            text.push_str(&delta);
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CliEntry, LabContext, MasteryLevel};
    use crate::patterns::types::{ErrorPattern, FuzzyConfig, MarkerCheck, MarkerPosition, RegexFlags};

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

    fn turn_with_history(history: Vec<CliEntry>) -> TurnState {
        TurnState::new(
            "what did I do wrong?",
            Vec::new(),
            history,
            LabContext::new("lab-1", "Hostnames"),
            MasteryLevel::Novice,
        )
    }

    #[test]
    fn diagnosed_command_suppresses_tools() {
        let registry = PatternRegistry::from_patterns(vec![typo_pattern()]).unwrap();
        let mut turn = turn_with_history(vec![CliEntry::new(
            "hotname R1",
            "hotname R1\n^\n% Invalid input detected at '^' marker.",
            0,
            "R1",
        )]);
        let tools_enabled = precompute_diagnoses(&mut turn, &registry, None);
        assert!(!tools_enabled);
        assert_eq!(turn.cli_diagnoses.len(), 1);
    }

    #[test]
    fn clean_history_enables_tools() {
        let registry = PatternRegistry::from_patterns(vec![typo_pattern()]).unwrap();
        let mut turn = turn_with_history(vec![CliEntry::new("hostname R1", "R1(config)#", 0, "R1")]);
        let tools_enabled = precompute_diagnoses(&mut turn, &registry, None);
        assert!(tools_enabled);
        assert!(turn.cli_diagnoses.is_empty());
    }

}
