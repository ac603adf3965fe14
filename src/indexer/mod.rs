//! The Indexer (SPEC_FULL §4.8, ambient): builds the persisted retrieval
//! index offline from `paths.labs_dir` content.
//!
//! Not one of the core runtime components and carries no latency budget; it
//! exists so the crate is runnable end to end without an external indexer
//! binary. The Retriever never calls into this module at serve time — it
//! only opens the resulting `SqliteStorage` read-only.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::chunking::create_chunker;
use crate::core::{Buffer, Chunk, DocClass};
use crate::embedding::Embedder;
use crate::error::{Error, Result, StorageError};
use crate::io::read_file;
use crate::retriever::ChunkTag;
use crate::storage::{SqliteStorage, Storage};

/// Directory-name conventions mapping a lab corpus source path to a
/// [`DocClass`] (SPEC_FULL §4.8).
fn classify_source(labs_dir: &Path, file_path: &Path) -> (DocClass, Option<String>) {
    let relative = file_path.strip_prefix(labs_dir).unwrap_or(file_path);
    let mut components = relative.components().map(|c| c.as_os_str().to_string_lossy().to_string());

    match components.next().as_deref() {
        Some("error_patterns") => (DocClass::ErrorPatterns, None),
        Some("command_reference") => (DocClass::CommandReference, None),
        Some("labs") => {
            let lab_id = components.next();
            (DocClass::LabSpecific, lab_id)
        }
        _ => (DocClass::LabSpecific, None),
    }
}

/// Lab corpus file extensions the indexer walks.
const INDEXABLE_EXTENSIONS: &[&str] = &["md", "markdown", "json", "txt"];

fn is_indexable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| INDEXABLE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Recursively collects every indexable file under `dir`, depth-first.
fn walk_indexable_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let entries = std::fs::read_dir(dir).map_err(Error::from)?;
    for entry in entries {
        let entry = entry.map_err(Error::from)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(Error::from)?;
        if file_type.is_dir() {
            out.extend(walk_indexable_files(&path)?);
        } else if file_type.is_file() && is_indexable(&path) {
            out.push(path);
        }
    }
    Ok(out)
}

/// Walks `labs_dir`, chunks every indexable document, tags each chunk with
/// its inferred `doc_class`, embeds chunks in parallel via `embedder`, and
/// writes the result to a fresh `SqliteStorage` at `index_path`.
///
/// `metadata_path` is accepted for configuration-surface fidelity with
/// §6.4/§6.5 but unused: chunk metadata lives in the same SQLite database as
/// the chunks themselves (see [`ChunkTag`]).
///
/// # Errors
///
/// Returns `Error::Io` if `labs_dir` cannot be walked or a document cannot
/// be read, `Error::Chunking` if chunking fails, and `Error::Storage` if the
/// index cannot be written.
pub fn build_index(
    labs_dir: impl AsRef<Path>,
    index_path: impl AsRef<Path>,
    _metadata_path: Option<&Path>,
    embedder: &dyn Embedder,
) -> Result<IndexStats> {
    let labs_dir = labs_dir.as_ref();
    let index_path = index_path.as_ref();

    if index_path.exists() {
        std::fs::remove_file(index_path).map_err(Error::from)?;
    }
    let mut storage = SqliteStorage::open(index_path)?;
    storage.init()?;

    let chunker = create_chunker("semantic")?;
    let mut total_chunks = 0usize;
    let mut total_documents = 0usize;

    let files = walk_indexable_files(labs_dir)?;

    for file_path in &files {
        let content = read_file(file_path)?;
        let (doc_class, lab_id) = classify_source(labs_dir, file_path);
        let source_file = file_path.strip_prefix(labs_dir).unwrap_or(file_path).display().to_string();

        let mut buffer = Buffer::from_content(content.clone());
        buffer.source = Some(file_path.clone());
        let buffer_id = storage.add_buffer(&buffer)?;
        total_documents += 1;

        let raw_chunks: Vec<Chunk> = chunker.chunk(buffer_id, &content, None)?;
        if raw_chunks.is_empty() {
            continue;
        }

        let tagged_chunks: Vec<Chunk> = raw_chunks
            .into_iter()
            .map(|mut chunk| {
                let tag = ChunkTag {
                    doc_class,
                    lab_id: lab_id.clone(),
                    source_file: source_file.clone(),
                };
                chunk.metadata.custom = tag.to_json().ok();
                chunk
            })
            .collect();

        storage.add_chunks(buffer_id, &tagged_chunks)?;
        let stored_chunks = storage.get_chunks(buffer_id)?;

        let embeddings: Vec<(i64, Vec<f32>)> = stored_chunks
            .par_iter()
            .filter_map(|chunk| {
                let id = chunk.id?;
                let embedding = embedder.embed(&chunk.content).ok()?;
                Some((id, embedding))
            })
            .collect();

        storage.store_embeddings_batch(&embeddings)?;
        total_chunks += stored_chunks.len();
    }

    Ok(IndexStats {
        documents: total_documents,
        chunks: total_chunks,
    })
}

/// Row/document counts produced by [`build_index`].
#[derive(Debug, Clone, Copy)]
pub struct IndexStats {
    /// Number of source documents indexed.
    pub documents: usize,
    /// Total chunks written across all documents.
    pub chunks: usize,
}

/// Opens `index_path` read-only and checks schema version, row counts, and
/// embedding dimensionality against `expected_dim`.
///
/// # Errors
///
/// Returns `Error::Storage` if the index is missing, not initialized, empty,
/// or if any stored embedding's dimensionality does not match `expected_dim`.
pub fn verify_index(index_path: impl AsRef<Path>, expected_dim: usize) -> Result<IndexStats> {
    let storage = SqliteStorage::open(index_path.as_ref())?;
    if !storage.is_initialized()? {
        return Err(Error::Storage(StorageError::Database(
            "index database has no schema".to_string(),
        )));
    }

    let all_embeddings = storage.get_all_embeddings()?;
    if all_embeddings.is_empty() {
        return Err(Error::Storage(StorageError::Database(
            "index database contains no embeddings".to_string(),
        )));
    }
    for (chunk_id, embedding) in &all_embeddings {
        if embedding.len() != expected_dim {
            return Err(Error::Storage(StorageError::Database(format!(
                "chunk {chunk_id} has embedding dimension {} (expected {expected_dim})",
                embedding.len()
            ))));
        }
    }

    Ok(IndexStats {
        documents: 0,
        chunks: all_embeddings.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::FallbackEmbedder;
    use tempfile::tempdir;

    #[test]
    fn classify_source_reads_directory_convention() {
        let labs_dir = Path::new("/labs");
        assert_eq!(
            classify_source(labs_dir, Path::new("/labs/error_patterns/typo.md")).0,
            DocClass::ErrorPatterns
        );
        assert_eq!(
            classify_source(labs_dir, Path::new("/labs/command_reference/show.md")).0,
            DocClass::CommandReference
        );
        let (class, lab_id) = classify_source(labs_dir, Path::new("/labs/labs/vlan-101/intro.md"));
        assert_eq!(class, DocClass::LabSpecific);
        assert_eq!(lab_id.as_deref(), Some("vlan-101"));
    }

    #[test]
    fn build_index_then_verify_round_trips() {
        let dir = tempdir().unwrap();
        let labs_dir = dir.path().join("labs");
        std::fs::create_dir_all(labs_dir.join("error_patterns")).unwrap();
        std::fs::write(
            labs_dir.join("error_patterns").join("typo.md"),
            "A hostname typo produces `% Invalid input detected`.",
        )
        .unwrap();

        let index_path = dir.path().join("index.db");
        let embedder = FallbackEmbedder::new(16);
        let stats = build_index(&labs_dir, &index_path, None, &embedder).unwrap();
        assert_eq!(stats.documents, 1);
        assert!(stats.chunks >= 1);

        let verified = verify_index(&index_path, 16).unwrap();
        assert_eq!(verified.chunks, stats.chunks);
    }

    #[test]
    fn verify_index_rejects_dimension_mismatch() {
        let dir = tempdir().unwrap();
        let labs_dir = dir.path().join("labs");
        std::fs::create_dir_all(&labs_dir).unwrap();
        std::fs::write(labs_dir.join("intro.md"), "Some lab content about VLANs.").unwrap();

        let index_path = dir.path().join("index.db");
        let embedder = FallbackEmbedder::new(16);
        build_index(&labs_dir, &index_path, None, &embedder).unwrap();

        let err = verify_index(&index_path, 1024).unwrap_err();
        assert!(err.to_string().contains("dimension"));
    }
}
