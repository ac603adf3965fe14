//! The Agent Graph (SPEC_FULL §4.4): wires the Intent Router to the
//! teaching and troubleshooting paths.
//!
//! ```text
//! [router] --teaching--------> [retrieval] --> [teaching feedback] --END
//! [router] --troubleshooting-> [retrieval] --> [troubleshooting feedback] --> [paraphraser] --END
//! [router] --ambiguous-------> (same as teaching)
//! ```
//!
//! Modeled as an explicit match over [`Intent`] rather than a generic graph
//! library: the branching is fixed and known at compile time.

use std::sync::Arc;

use crate::agent::{paraphraser, router, teaching, troubleshooting};
use crate::config::LimitsConfig;
use crate::core::{Intent, TurnState};
use crate::error::Result;
use crate::llm::{ChunkStream, LlmGateway};
use crate::patterns::{PatternRegistry, Vocabulary};
use crate::retriever::Retriever;
use crate::tools::ToolExecutor;

/// Shared collaborators every graph node needs, grouped so `run_turn` takes
/// one argument instead of five.
pub struct GraphContext {
    /// The LLM Gateway used by every feedback/paraphraser node.
    pub gateway: Arc<dyn LlmGateway>,
    /// The tool dispatcher used by the troubleshooting feedback node.
    pub tool_executor: Arc<ToolExecutor>,
    /// The retriever used by both paths.
    pub retriever: Arc<Retriever>,
    /// The pattern registry consulted by the troubleshooting pre-processing step.
    pub registry: Arc<PatternRegistry>,
    /// The fuzzy-match vocabulary, if loaded.
    pub vocabulary: Option<Arc<Vocabulary>>,
    /// Bounded-resource limits (tool iterations, history windows).
    pub limits: LimitsConfig,
}

/// The feedback produced by a graph run: either a live token stream (the
/// teaching path, which has no paraphrase stage) or an already-complete
/// string (the troubleshooting path, whose paraphraser output is the
/// user-visible text).
///
/// Callers (the Streaming Driver) are responsible for setting
/// [`TurnState::final_message`] once a `Live` stream finishes draining; a
/// `Complete` variant's text is already the final message.
pub enum FeedbackStream {
    /// Token-by-token output from the teaching feedback node.
    Live(ChunkStream),
    /// The troubleshooting path's paraphrased answer, already fully formed.
    Complete(String),
}

/// Routes `turn`, runs retrieval, and dispatches to the matched path.
///
/// Mutates `turn` in place: `intent`, `retrieval_query`, `retrieved_docs`,
/// `retrieval_unavailable`, and (troubleshooting only) `cli_diagnoses` and
/// `feedback_message`/`final_message`.
///
/// # Errors
///
/// Returns `Error::Llm` if a feedback node's completion call fails.
pub async fn run_turn(ctx: &GraphContext, turn: &mut TurnState) -> Result<FeedbackStream> {
    let intent = router::classify(&turn.student_question, &turn.cli_history);
    turn.intent = Some(intent);

    match intent {
        Intent::Teaching | Intent::Ambiguous => run_teaching_path(ctx, turn).await,
        Intent::Troubleshooting => run_troubleshooting_path(ctx, turn).await,
    }
}

async fn run_teaching_path(ctx: &GraphContext, turn: &mut TurnState) -> Result<FeedbackStream> {
    let (docs, query, unavailable) = ctx
        .retriever
        .retrieve(Intent::Teaching, &turn.student_question, &turn.cli_history)
        .await;
    turn.retrieved_docs = docs;
    turn.retrieval_query = Some(query);
    turn.retrieval_unavailable = unavailable;

    let stream = teaching::run(ctx.gateway.as_ref(), turn).await?;
    Ok(FeedbackStream::Live(stream))
}

async fn run_troubleshooting_path(ctx: &GraphContext, turn: &mut TurnState) -> Result<FeedbackStream> {
    let (docs, query, unavailable) = ctx
        .retriever
        .retrieve(Intent::Troubleshooting, &turn.student_question, &turn.cli_history)
        .await;
    turn.retrieved_docs = docs;
    turn.retrieval_query = Some(query);
    turn.retrieval_unavailable = unavailable;

    let tools_enabled = troubleshooting::precompute_diagnoses(turn, &ctx.registry, ctx.vocabulary.as_deref());

    let feedback_message = troubleshooting::run(
        ctx.gateway.as_ref(),
        &ctx.tool_executor,
        turn,
        tools_enabled,
        ctx.limits.max_tool_iterations,
    )
    .await?;
    turn.feedback_message = Some(feedback_message.clone());

    let final_message = paraphraser::run(ctx.gateway.as_ref(), &feedback_message).await;
    turn.final_message = Some(final_message.clone());

    Ok(FeedbackStream::Complete(final_message))
}
