//! Knowledge index type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// A supported file discovered in the source folder.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Full path to the file
    pub path: PathBuf,

    /// File name without directories
    pub basename: String,

    /// Modification time as seconds since the Unix epoch
    pub modified: f64,
}

/// Text of one successfully loaded source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Basename of the file the text came from
    pub source: String,

    /// Raw file contents
    pub text: String,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// A window of a document's text; the unit that gets embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Basename of the owning document
    pub source: Arc<str>,

    /// Position of this chunk within its document
    pub sequence: u32,

    /// Chunk text
    pub text: String,
}

/// An embedded chunk stored in the index.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorEntry {
    /// Basename of the owning document
    pub source: Arc<str>,

    /// Position of the chunk within its document
    pub sequence: u32,

    /// Chunk text
    pub text: String,

    /// Embedding vector
    pub embedding: Vec<f32>,
}

/// Metadata record written next to the vector store.
///
/// Its presence on disk is the signal that a complete index is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Latest modification time (seconds since epoch) over the source
    /// files at build time. Not the wall-clock time of the build.
    pub last_build_time: f64,

    /// Number of documents the index was built from
    pub file_count: u32,

    /// Number of embedded chunks
    #[serde(default)]
    pub chunk_count: u32,

    /// Model that produced the stored vectors
    #[serde(default)]
    pub embedding_model: String,

    /// Length of the stored vectors
    #[serde(default)]
    pub dimensions: usize,

    /// Basenames of the documents the index was built from
    #[serde(default)]
    pub files: Vec<String>,
}

impl IndexMetadata {
    /// Build time as a UTC timestamp, for display.
    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.last_build_time.floor();
        let nanos = ((self.last_build_time - secs) * 1e9) as u32;
        DateTime::from_timestamp(secs as i64, nanos)
    }
}

/// Externally visible state of the knowledge index manager.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum IndexStatus {
    /// Not initialized yet
    Uninitialized,

    /// The embedding provider could not be loaded
    Unavailable { reason: String },

    /// No documents were found at the last rebuild
    Empty,

    /// An index is active
    Ready {
        chunks: usize,
        files: Vec<String>,
        last_build_time: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_at_round_trips_seconds() {
        let metadata = IndexMetadata {
            last_build_time: 1_700_000_000.5,
            file_count: 1,
            chunk_count: 1,
            embedding_model: "trigram-v1".to_string(),
            dimensions: 8,
            files: vec!["faq.md".to_string()],
        };

        let built_at = metadata.built_at().unwrap();
        assert_eq!(built_at.timestamp(), 1_700_000_000);
        assert_eq!(built_at.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_metadata_tolerates_minimal_record() {
        let metadata: IndexMetadata =
            serde_json::from_str(r#"{"last_build_time": 12.0, "file_count": 2}"#).unwrap();
        assert_eq!(metadata.file_count, 2);
        assert!(metadata.files.is_empty());
    }

    #[test]
    fn test_status_serializes_with_tag() {
        let json = serde_json::to_value(IndexStatus::Empty).unwrap();
        assert_eq!(json["state"], "empty");
    }
}
