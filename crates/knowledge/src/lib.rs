//! Knowledge index for grounded answers.
//!
//! Turns a folder of operator documents (`.txt`, `.md`) into a
//! similarity-searchable index, persists it, and reuses it across
//! restarts until a source file changes.
//!
//! The entry point is [`KnowledgeIndexManager`]:
//!
//! ```no_run
//! use docent_knowledge::{KnowledgeConfig, KnowledgeIndexManager};
//! use std::path::Path;
//!
//! # async fn run() {
//! let config = KnowledgeConfig::for_workspace(Path::new("."));
//! let manager = KnowledgeIndexManager::open(config).await;
//! println!("{}", manager.search("baggage allowance", 3).await);
//! # }
//! ```

pub mod chunker;
pub mod collector;
pub mod config;
pub mod embeddings;
pub mod manager;
pub mod progress;
pub mod staleness;
pub mod store;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::{load_config, KnowledgeConfig};
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use manager::{KnowledgeIndexManager, NOT_INITIALIZED_MESSAGE};
pub use staleness::{should_rebuild, RebuildDecision, RebuildReason};
pub use types::{Chunk, Document, IndexMetadata, IndexStatus, SourceFile, VectorEntry};
pub use vector_index::KnowledgeIndex;
