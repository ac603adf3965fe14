//! System-prompt assembly for the teaching and troubleshooting feedback
//! nodes (SPEC_FULL §4.4.2, §4.4.3) and the paraphraser (§4.4.4).

use crate::core::{DocClass, TurnState};
use crate::detector::DetectionResult;

/// Builds the teaching feedback node's system prompt: concept-focused, tone
/// matched to `mastery_level`, retrieved documents inlined as `[DOC i]`.
#[must_use]
pub fn teaching_system_prompt(turn: &TurnState) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are an interactive tutor helping a student work through a Cisco IOS lab exercise. \
         Answer the student's conceptual question directly and clearly.\n\n",
    );
    prompt.push_str(turn.mastery_level.tone_hint());
    prompt.push_str("\n\n");
    prompt.push_str(&format!(
        "Lab: {} — {}\n",
        turn.lab_context.title, turn.lab_context.description
    ));
    if !turn.lab_context.objectives.is_empty() {
        prompt.push_str("Objectives:\n");
        for objective in &turn.lab_context.objectives {
            prompt.push_str(&format!("- {objective}\n"));
        }
    }
    prompt.push('\n');
    prompt.push_str(&inline_docs(&turn.retrieved_docs.iter().collect::<Vec<_>>()));
    prompt
}

/// Builds the troubleshooting feedback node's system prompt: names the CLI
/// block as ground truth, forbids CIDR-notation suggestions, instructs the
/// model to paraphrase a pre-computed diagnosis rather than re-derive one,
/// and documents whether tools are available this turn.
#[must_use]
pub fn troubleshooting_system_prompt(turn: &TurnState, tools_enabled: bool) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are an interactive tutor helping a student debug a Cisco IOS lab exercise. \
         The terminal activity block below is ground truth: it reflects exactly what the \
         student's device actually did. Never contradict it or invent different output.\n\n",
    );
    prompt.push_str(
        "Do not suggest CIDR notation (e.g. `/24`) for interface or routing configuration; \
         this lab uses classic Cisco IOS subnet-mask syntax throughout.\n\n",
    );
    prompt.push_str(
        "When a command below already has a computed diagnosis (error_type/diagnosis/fix), \
         paraphrase that diagnosis in your own words. Do not re-derive the cause from the raw \
         output — the diagnosis is authoritative.\n\n",
    );
    prompt.push_str(turn.mastery_level.tone_hint());
    prompt.push_str("\n\n");
    prompt.push_str("Terminal activity:\n");
    prompt.push_str(&terminal_activity_block(turn));
    prompt.push('\n');

    if tools_enabled {
        prompt.push_str(
            "No deterministic diagnosis was found for the recent commands. You may call \
             `get_device_running_config` to inspect the device's current configuration before \
             answering.\n\n",
        );
    } else {
        prompt.push_str(
            "A deterministic diagnosis is already available above; do not call any tools this \
             turn.\n\n",
        );
    }

    for class in DocClass::ALL {
        let docs: Vec<_> = turn.retrieved_docs.iter().filter(|d| d.doc_class == class).collect();
        if docs.is_empty() {
            continue;
        }
        prompt.push_str(&format!("{}:\n", section_title(class)));
        prompt.push_str(&inline_docs(&docs));
        prompt.push('\n');
    }

    prompt
}

fn section_title(class: DocClass) -> &'static str {
    match class {
        DocClass::ErrorPatterns => "Known error patterns",
        DocClass::CommandReference => "Command reference",
        DocClass::LabSpecific => "Lab-specific material",
    }
}

fn inline_docs(docs: &[&crate::core::RetrievedDoc]) -> String {
    let mut out = String::new();
    for (i, doc) in docs.iter().enumerate() {
        out.push_str(&format!("[DOC {}] {}\n", i + 1, doc.content));
    }
    out
}

/// Renders the "terminal activity" block: for each CLI entry, the command,
/// the output, and — when a diagnosis exists — three labeled lines.
#[must_use]
pub fn terminal_activity_block(turn: &TurnState) -> String {
    let mut out = String::new();
    for (i, entry) in turn.cli_history.iter().enumerate() {
        out.push_str(&format!("> {}\n{}\n", entry.command, entry.output));
        if let Some(diagnosis) = turn.cli_diagnoses.get(&i) {
            out.push_str(&diagnosis_lines(diagnosis));
        }
        out.push('\n');
    }
    out
}

fn diagnosis_lines(diagnosis: &DetectionResult) -> String {
    format!(
        "error_type: {}\ndiagnosis: {}\nfix: {}\n",
        diagnosis.error_type, diagnosis.diagnosis, diagnosis.fix
    )
}

/// Static system prompt for the paraphraser node (SPEC_FULL §4.4.4): a
/// deterministic cleanup instruction set applied to `feedback_message`.
pub const PARAPHRASER_SYSTEM_PROMPT: &str = "\
Rewrite the following tutor response for direct display to a student. Apply these rules exactly:
- Strip any preamble such as \"Based on...\", \"Looking at...\", or \"According to the documentation...\".
- Remove internal identifiers: any ALL_CAPS_SNAKE_CASE error-type token, and any mention of tool or function names.
- If the entire message is wrapped in quotation marks, remove the wrapping quotes.
- Preserve code blocks, CLI command examples, bullet structure, and numeric or address content exactly as written.
- Do not add new information, and do not shorten the technical content.
Return only the rewritten message, nothing else.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LabContext, MasteryLevel, TurnState};

    fn turn() -> TurnState {
        TurnState::new(
            "why is this broken?",
            Vec::new(),
            Vec::new(),
            LabContext::new("lab-1", "VLANs"),
            MasteryLevel::Novice,
        )
    }

    #[test]
    fn teaching_prompt_includes_lab_title() {
        let prompt = teaching_system_prompt(&turn());
        assert!(prompt.contains("VLANs"));
    }

    #[test]
    fn troubleshooting_prompt_forbids_cidr() {
        let prompt = troubleshooting_system_prompt(&turn(), true);
        assert!(prompt.contains("CIDR"));
    }

    #[test]
    fn troubleshooting_prompt_mentions_tool_when_enabled() {
        let prompt = troubleshooting_system_prompt(&turn(), true);
        assert!(prompt.contains("get_device_running_config"));
    }

    #[test]
    fn troubleshooting_prompt_suppresses_tool_mention_when_disabled() {
        let prompt = troubleshooting_system_prompt(&turn(), false);
        assert!(!prompt.contains("may call"));
    }
}
