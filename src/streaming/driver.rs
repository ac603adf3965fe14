//! The Streaming Driver (SPEC_FULL §4.7): runs one turn end to end and
//! yields a typed event stream over a bounded channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{abortable, AbortHandle};
use futures_util::StreamExt;
use tokio::sync::mpsc;

use crate::agent::{run_turn, FeedbackStream, GraphContext};
use crate::core::{Intent, TurnState};
use crate::llm::StreamChunk;
use crate::streaming::events::{doc_ids_from_metadata, StreamEvent};
use crate::streaming::filter::ContentFilter;

/// Soft end-to-end deadline for the teaching path.
const TEACHING_DEADLINE: Duration = Duration::from_secs(8);
/// Soft end-to-end deadline for the troubleshooting path.
const TROUBLESHOOTING_DEADLINE: Duration = Duration::from_secs(20);
/// Bounded channel capacity between the producer task and the transport.
const CHANNEL_CAPACITY: usize = 32;

/// A cooperative cancellation flag, checked between event emissions and
/// before I/O awaits. Cloning shares the same underlying flag.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a flag in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the flag cancelled. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether `cancel` has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A running turn's handle: the event receiver and a means to cancel it.
pub struct TurnHandle {
    /// The receiving end of the event channel. Yields events in the order
    /// the producer task emits them.
    pub events: mpsc::Receiver<StreamEvent>,
    cancel: CancelFlag,
    abort: AbortHandle,
}

impl TurnHandle {
    /// Requests cancellation: sets the cooperative flag and aborts the
    /// producer task outright, in case it is parked on an uncooperative
    /// await (e.g. a hung HTTP call).
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.abort.abort();
    }
}

/// Runs `turn` through the agent graph, spawning a producer task that emits
/// [`StreamEvent`]s on a bounded channel.
///
/// The caller owns `turn`'s lifetime; this function mutates it via the
/// agent graph and, on success, the caller is expected to fold
/// `final_message` back into session state (`SessionState::record_turn`).
#[must_use]
pub fn drive_turn(ctx: Arc<GraphContext>, mut turn: TurnState) -> TurnHandle {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let cancel = CancelFlag::new();
    let task_cancel = cancel.clone();

    let producer = async move {
        run_producer(ctx, &mut turn, tx, &task_cancel).await;
    };
    let (abortable_producer, abort) = abortable(producer);
    tokio::spawn(async move {
        let _ = abortable_producer.await;
    });

    TurnHandle {
        events: rx,
        cancel,
        abort,
    }
}

async fn run_producer(
    ctx: Arc<GraphContext>,
    turn: &mut TurnState,
    tx: mpsc::Sender<StreamEvent>,
    cancel: &CancelFlag,
) {
    if send(&tx, cancel, StreamEvent::info("routing")).await.is_err() {
        return;
    }

    let deadline_hint_intent = pre_classify(turn);
    let deadline = match deadline_hint_intent {
        Intent::Troubleshooting => TROUBLESHOOTING_DEADLINE,
        Intent::Teaching | Intent::Ambiguous => TEACHING_DEADLINE,
    };

    let outcome = tokio::time::timeout(deadline, run_turn(&ctx, turn)).await;

    let feedback = match outcome {
        Ok(Ok(feedback)) => feedback,
        Ok(Err(err)) => {
            let _ = send(&tx, cancel, StreamEvent::error(err.to_string())).await;
            return;
        }
        Err(_) => {
            let _ = send(
                &tx,
                cancel,
                StreamEvent::error("turn exceeded its soft deadline"),
            )
            .await;
            return;
        }
    };

    let phase = format!("routed:{}", turn.intent.map(Intent::as_str).unwrap_or("unknown"));
    if send(&tx, cancel, StreamEvent::info(phase)).await.is_err() {
        return;
    }

    match feedback {
        FeedbackStream::Live(stream) => {
            if let Err(()) = stream_live(stream, &tx, cancel, turn).await {
                return;
            }
        }
        FeedbackStream::Complete(text) => {
            let mut filter = ContentFilter::new();
            let mut filtered = filter.push(&text);
            filtered.push_str(&filter.finish());
            turn.final_message = Some(filtered.clone());
            if send(&tx, cancel, StreamEvent::content(filtered)).await.is_err() {
                return;
            }
        }
    }

    let metadata = StreamEvent::Metadata {
        final_message: turn.final_message.clone().unwrap_or_default(),
        intent: turn.intent.unwrap_or(Intent::Teaching),
        doc_ids: doc_ids_from_metadata(&turn.retrieved_docs),
        suggested_follow_ups: Vec::new(),
    };
    if send(&tx, cancel, metadata).await.is_err() {
        return;
    }
    let _ = send(&tx, cancel, StreamEvent::Done).await;
}

/// A cheap, read-only peek at the intent that will be chosen, used only to
/// pick the right soft deadline before the real `run_turn` call (which also
/// classifies, redundantly but harmlessly since classification is pure and
/// side-effect free).
fn pre_classify(turn: &TurnState) -> Intent {
    crate::agent::classify(&turn.student_question, &turn.cli_history)
}

/// Drains `stream` through the content filter, forwarding `content` events
/// and accumulating the filtered text into `turn.final_message`.
async fn stream_live(
    mut stream: crate::llm::ChunkStream,
    tx: &mpsc::Sender<StreamEvent>,
    cancel: &CancelFlag,
    turn: &mut TurnState,
) -> Result<(), ()> {
    let mut filter = ContentFilter::new();
    let mut collected = String::new();

    while let Some(chunk) = stream.next().await {
        if cancel.is_cancelled() {
            return Err(());
        }
        match chunk {
            Ok(StreamChunk::Text(delta)) => {
                let filtered = filter.push(&delta);
                if filtered.is_empty() {
                    continue;
                }
                collected.push_str(&filtered);
                if send(tx, cancel, StreamEvent::content(filtered)).await.is_err() {
                    return Err(());
                }
            }
            Ok(StreamChunk::ToolCalls(_)) => {
                // Teaching path never offers tools; ignore defensively.
            }
            Err(err) => {
                let _ = send(tx, cancel, StreamEvent::error(err.to_string())).await;
                return Err(());
            }
        }
    }

    let tail = filter.finish();
    if !tail.is_empty() {
        collected.push_str(&tail);
        if send(tx, cancel, StreamEvent::content(tail)).await.is_err() {
            return Err(());
        }
    }

    turn.final_message = Some(collected);
    Ok(())
}

/// Sends `event` unless cancellation has been requested or the receiver has
/// gone away.
async fn send(tx: &mpsc::Sender<StreamEvent>, cancel: &CancelFlag, event: StreamEvent) -> Result<(), ()> {
    if cancel.is_cancelled() {
        return Err(());
    }
    tx.send(event).await.map_err(|_| ())
}
