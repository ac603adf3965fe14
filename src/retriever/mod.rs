//! The Retriever (SPEC_FULL §4.3): query rewriting, hybrid search over the
//! persisted lab corpus index, and doc-class-bucketed prioritization.
//!
//! Retrieval failure is non-fatal: when the index cannot be opened, callers
//! get an empty document list and [`TurnState::retrieval_unavailable`] set,
//! never a propagated error (§7: the feedback nodes still answer from
//! conversation/CLI context alone).
//!
//! [`TurnState::retrieval_unavailable`]: crate::core::TurnState::retrieval_unavailable

mod query;
mod tag;

pub use tag::ChunkTag;

use std::path::Path;
use std::sync::Arc;

use crate::config::RetrieverConfig;
use crate::core::{CliEntry, DocClass, Intent, RetrievedDoc};
use crate::embedding::Embedder;
use crate::patterns::Vocabulary;
use crate::search::{self, SearchConfig};
use crate::storage::{SqliteStorage, Storage};

/// Maximum documents handed to a feedback node regardless of mode.
const MAX_DOCS: usize = 5;

/// Wraps hybrid search with query rewriting and doc-class prioritization.
pub struct Retriever {
    storage: Option<Arc<SqliteStorage>>,
    embedder: Arc<dyn Embedder>,
    vocabulary: Option<Arc<Vocabulary>>,
    config: RetrieverConfig,
}

impl Retriever {
    /// Opens the retrieval index at `config.index_path`.
    ///
    /// A missing or unopenable index is not an error here: `storage` is
    /// simply `None`, and [`Retriever::retrieve`] reports
    /// `retrieval_unavailable` for every call instead of failing the turn.
    #[must_use]
    pub fn open(config: RetrieverConfig, embedder: Arc<dyn Embedder>, vocabulary: Option<Arc<Vocabulary>>) -> Self {
        let storage = Self::try_open(&config.index_path);
        Self {
            storage,
            embedder,
            vocabulary,
            config,
        }
    }

    fn try_open(path: &Path) -> Option<Arc<SqliteStorage>> {
        match SqliteStorage::open(path) {
            Ok(storage) => Some(Arc::new(storage)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "retrieval index unavailable");
                None
            }
        }
    }

    /// Rewrites the query for `mode`, runs hybrid search, and returns the
    /// prioritized, capped document list alongside the query actually used.
    ///
    /// Never returns `Err`: an unreachable index yields `(Vec::new(), query,
    /// true)`.
    pub async fn retrieve(
        &self,
        mode: Intent,
        question: &str,
        cli_history: &[CliEntry],
    ) -> (Vec<RetrievedDoc>, String, bool) {
        let rewritten = query::rewrite(mode, question, cli_history, self.vocabulary.as_deref());

        let Some(storage) = self.storage.clone() else {
            return (Vec::new(), rewritten, true);
        };

        let embedder = self.embedder.clone();
        let top_k = match mode {
            Intent::Teaching | Intent::Ambiguous => self.config.k_teaching,
            Intent::Troubleshooting => self.config.k_troubleshooting,
        };
        let search_query = rewritten.clone();

        let search_result = tokio::task::spawn_blocking(move || {
            let config = SearchConfig::new().with_top_k(top_k);
            search::hybrid_search(&storage, embedder.as_ref(), &search_query, &config).map(|results| {
                results
                    .into_iter()
                    .filter_map(|result| {
                        storage
                            .get_chunk(result.chunk_id)
                            .ok()
                            .flatten()
                            .map(|chunk| (chunk, result.score))
                    })
                    .collect::<Vec<_>>()
            })
        })
        .await;

        let chunks = match search_result {
            Ok(Ok(chunks)) => chunks,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "retrieval search failed");
                return (Vec::new(), rewritten, true);
            }
            Err(err) => {
                tracing::warn!(error = %err, "retrieval search task panicked");
                return (
                    Vec::new(),
                    rewritten,
                    true,
                );
            }
        };

        let docs: Vec<RetrievedDoc> = chunks
            .into_iter()
            .map(|(chunk, score)| {
                let tag = chunk
                    .metadata
                    .custom
                    .as_deref()
                    .and_then(|json| serde_json::from_str::<ChunkTag>(json).ok());
                let (doc_class, metadata) = match tag {
                    Some(tag) => (tag.doc_class, tag.into_metadata(chunk.id)),
                    None => (DocClass::LabSpecific, tag::default_metadata(chunk.id)),
                };
                RetrievedDoc {
                    content: chunk.content,
                    score,
                    doc_class,
                    metadata,
                }
            })
            .collect();

        let prioritized = match mode {
            Intent::Teaching | Intent::Ambiguous => top_n(docs, MAX_DOCS.min(self.config.k_teaching)),
            Intent::Troubleshooting => prioritize_troubleshooting(docs, cli_history),
        };

        (prioritized, rewritten, false)
    }

    /// Reports whether the retrieval index could be opened. Exposed for the
    /// CLI's `build-index`/`validate-patterns` harness to surface a clear
    /// "no index yet" message instead of a silent empty-result turn.
    #[must_use]
    pub fn index_available(&self) -> bool {
        self.storage.is_some()
    }
}

/// Whether the entry's output looks like a CLI error, for prioritization
/// branch selection (bucketed vs. flat top-N).
fn has_any_cli_error(cli_history: &[CliEntry]) -> bool {
    cli_history
        .iter()
        .any(|entry| crate::detector::IOS_ERROR_FRAGMENTS.iter().any(|f| entry.output.contains(f)))
}

fn prioritize_troubleshooting(mut docs: Vec<RetrievedDoc>, cli_history: &[CliEntry]) -> Vec<RetrievedDoc> {
    docs.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let (error_cap, command_cap, lab_cap) = if has_any_cli_error(cli_history) {
        (2usize, 2usize, 1usize)
    } else {
        (0usize, 3usize, 2usize)
    };

    let mut by_class = |class: DocClass, cap: usize, taken: &mut std::collections::HashSet<usize>| -> Vec<RetrievedDoc> {
        docs.iter()
            .enumerate()
            .filter(|(idx, doc)| doc.doc_class == class && !taken.contains(idx))
            .take(cap)
            .map(|(idx, doc)| {
                taken.insert(idx);
                doc.clone()
            })
            .collect()
    };

    let mut taken = std::collections::HashSet::new();
    let mut result = Vec::new();
    result.extend(by_class(DocClass::ErrorPatterns, error_cap, &mut taken));
    result.extend(by_class(DocClass::CommandReference, command_cap, &mut taken));
    result.extend(by_class(DocClass::LabSpecific, lab_cap, &mut taken));

    if result.len() < MAX_DOCS {
        let remaining = docs
            .iter()
            .enumerate()
            .filter(|(idx, _)| !taken.contains(idx))
            .take(MAX_DOCS - result.len())
            .map(|(_, doc)| doc.clone());
        result.extend(remaining);
    }

    result.truncate(MAX_DOCS);
    result
}

fn top_n(mut docs: Vec<RetrievedDoc>, n: usize) -> Vec<RetrievedDoc> {
    docs.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    docs.truncate(n.min(MAX_DOCS));
    docs
}
