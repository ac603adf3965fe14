//! Buffer management for the offline indexer.
//!
//! Buffers represent text content loaded from the lab corpus, typically
//! from files under `paths.labs_dir`. Each buffer can be chunked for
//! embedding and retrieval.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Represents a text buffer loaded from the lab corpus.
///
/// Buffers are the primary unit of content storage, containing text
/// that can be chunked and embedded for retrieval.
///
/// # Examples
///
/// ```
/// use ioslab_tutor::core::Buffer;
///
/// let buffer = Buffer::from_content("Hello, world!".to_string());
/// assert_eq!(buffer.size(), 13);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buffer {
    /// Unique identifier (assigned by storage layer).
    pub id: Option<i64>,

    /// Optional name for the buffer.
    pub name: Option<String>,

    /// Source file path (if loaded from file).
    pub source: Option<PathBuf>,

    /// Buffer content.
    pub content: String,

    /// Buffer metadata.
    pub metadata: BufferMetadata,
}

/// Metadata associated with a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BufferMetadata {
    /// Content type or file extension (e.g., "txt", "md", "json").
    pub content_type: Option<String>,

    /// Unix timestamp when buffer was created.
    pub created_at: i64,

    /// Unix timestamp when buffer was last modified.
    pub updated_at: i64,

    /// Total size in bytes.
    pub size: usize,

    /// Line count (computed on demand).
    pub line_count: Option<usize>,

    /// Number of chunks (set after chunking).
    pub chunk_count: Option<usize>,

    /// SHA-256 hash of content (for deduplication).
    pub content_hash: Option<String>,
}

impl Buffer {
    /// Creates a new buffer from content string.
    ///
    /// # Arguments
    ///
    /// * `content` - The text content for the buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use ioslab_tutor::core::Buffer;
    ///
    /// let buffer = Buffer::from_content("Some text content".to_string());
    /// assert!(buffer.id.is_none());
    /// assert!(buffer.source.is_none());
    /// ```
    #[must_use]
    pub fn from_content(content: String) -> Self {
        let size = content.len();
        let now = current_timestamp();
        Self {
            id: None,
            name: None,
            source: None,
            content,
            metadata: BufferMetadata {
                size,
                created_at: now,
                updated_at: now,
                ..Default::default()
            },
        }
    }

    /// Creates a new buffer from a file path and content.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the source file.
    /// * `content` - The text content read from the file.
    ///
    /// # Examples
    ///
    /// ```
    /// use ioslab_tutor::core::Buffer;
    /// use std::path::PathBuf;
    ///
    /// let buffer = Buffer::from_file(
    ///     PathBuf::from("example.txt"),
    ///     "File content".to_string(),
    /// );
    /// assert!(buffer.source.is_some());
    /// ```
    #[must_use]
    pub fn from_file(path: PathBuf, content: String) -> Self {
        let size = content.len();
        let content_type = infer_content_type(&path);
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(ToString::to_string);
        let now = current_timestamp();

        Self {
            id: None,
            name,
            source: Some(path),
            content,
            metadata: BufferMetadata {
                content_type,
                size,
                created_at: now,
                updated_at: now,
                ..Default::default()
            },
        }
    }

    /// Creates a new named buffer from content.
    ///
    /// # Arguments
    ///
    /// * `name` - Name for the buffer.
    /// * `content` - The text content for the buffer.
    #[must_use]
    pub fn from_named(name: String, content: String) -> Self {
        let mut buffer = Self::from_content(content);
        buffer.name = Some(name);
        buffer
    }

    /// Returns the size of the buffer in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Returns the line count of the buffer.
    ///
    /// This is computed on first call and cached.
    pub fn line_count(&mut self) -> usize {
        if let Some(count) = self.metadata.line_count {
            return count;
        }
        let count = self.content.lines().count();
        self.metadata.line_count = Some(count);
        count
    }

    /// Returns a slice of the buffer content.
    ///
    /// # Arguments
    ///
    /// * `start` - Start byte offset.
    /// * `end` - End byte offset.
    ///
    /// # Returns
    ///
    /// The content slice, or `None` if offsets are invalid.
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> Option<&str> {
        if start <= end && end <= self.content.len() {
            self.content.get(start..end)
        } else {
            None
        }
    }

    /// Returns a peek of the buffer content from the beginning.
    ///
    /// # Arguments
    ///
    /// * `len` - Maximum number of bytes to return.
    #[must_use]
    pub fn peek(&self, len: usize) -> &str {
        let end = len.min(self.content.len());
        // Find valid UTF-8 boundary
        let end = find_char_boundary(&self.content, end);
        &self.content[..end]
    }

    /// Returns a peek of the buffer content from the end.
    ///
    /// # Arguments
    ///
    /// * `len` - Maximum number of bytes to return.
    #[must_use]
    pub fn peek_end(&self, len: usize) -> &str {
        let start = self.content.len().saturating_sub(len);
        // Find valid UTF-8 boundary
        let start = find_char_boundary(&self.content, start);
        &self.content[start..]
    }

    /// Checks if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns the display name for this buffer.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(ref name) = self.name {
            return name.clone();
        }
        if let Some(ref path) = self.source {
            if let Some(name) = path.file_name() {
                if let Some(s) = name.to_str() {
                    return s.to_string();
                }
            }
        }
        if let Some(id) = self.id {
            return format!("buffer-{id}");
        }
        "unnamed".to_string()
    }

    /// Sets the chunk count after chunking.
    pub fn set_chunk_count(&mut self, count: usize) {
        self.metadata.chunk_count = Some(count);
        self.metadata.updated_at = current_timestamp();
    }

    /// Computes and sets the content hash.
    pub fn compute_hash(&mut self) {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.content.hash(&mut hasher);
        self.metadata.content_hash = Some(format!("{:016x}", hasher.finish()));
    }
}

/// Infers content type from file extension.
fn infer_content_type(path: &std::path::Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

/// Finds a valid UTF-8 character boundary at or before the given position.
fn find_char_boundary(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        return s.len();
    }
    // Walk backwards to find a valid char boundary
    let mut boundary = pos;
    while !s.is_char_boundary(boundary) && boundary > 0 {
        boundary -= 1;
    }
    boundary
}

/// Returns the current Unix timestamp in seconds.
#[allow(clippy::cast_possible_wrap)]
fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
