//! In-memory vector index over embedded chunks.
//!
//! Scoring is cosine similarity. Results are ordered by descending score
//! with a stable sort, so entries with exactly equal scores keep their
//! insertion order. A zero vector scores 0.0 against everything.

use crate::embeddings::EmbeddingProvider;
use crate::types::{Chunk, IndexMetadata, VectorEntry};
use docent_core::{AppError, AppResult};
use std::cmp::Ordering;

/// An immutable set of embedded chunks plus the metadata they were built
/// with. A rebuild produces a new value; entries are never changed in place.
#[derive(Debug, Clone)]
pub struct KnowledgeIndex {
    entries: Vec<VectorEntry>,
    metadata: IndexMetadata,
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry<'a> {
    pub entry: &'a VectorEntry,
    pub score: f32,
}

impl KnowledgeIndex {
    /// Embed every chunk exactly once and assemble an index.
    ///
    /// All embeddings are computed before anything is returned, so a
    /// provider failure yields an error and no partial index.
    /// `chunk_count`, `embedding_model` and `dimensions` in `metadata` are
    /// filled in from the chunks and provider.
    pub async fn build(
        chunks: Vec<Chunk>,
        provider: &dyn EmbeddingProvider,
        mut metadata: IndexMetadata,
    ) -> AppResult<Self> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            provider.embed_batch(&texts).await?
        };

        if embeddings.len() != chunks.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let entries: Vec<VectorEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| VectorEntry {
                source: chunk.source,
                sequence: chunk.sequence,
                text: chunk.text,
                embedding,
            })
            .collect();

        metadata.chunk_count = entries.len() as u32;
        metadata.embedding_model = provider.model_name().to_string();
        metadata.dimensions = provider.dimensions();

        tracing::debug!(
            "Built index with {} entries using model '{}'",
            entries.len(),
            metadata.embedding_model
        );

        Self::from_parts(entries, metadata)
    }

    /// Assemble an index from already-embedded entries.
    ///
    /// Every vector must have the dimension recorded in `metadata`.
    pub fn from_parts(entries: Vec<VectorEntry>, metadata: IndexMetadata) -> AppResult<Self> {
        if let Some(bad) = entries
            .iter()
            .find(|e| e.embedding.len() != metadata.dimensions)
        {
            return Err(AppError::Knowledge(format!(
                "Entry {}#{} has {} dimensions, index expects {}",
                bad.source,
                bad.sequence,
                bad.embedding.len(),
                metadata.dimensions
            )));
        }
        Ok(Self { entries, metadata })
    }

    pub fn entries(&self) -> &[VectorEntry] {
        &self.entries
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embed `query_text` and return the texts of the `k` most similar
    /// entries, most similar first. `k` larger than the index returns
    /// every entry; an empty index returns an empty list.
    pub async fn query(
        &self,
        query_text: &str,
        k: usize,
        provider: &dyn EmbeddingProvider,
    ) -> AppResult<Vec<String>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = provider.embed(query_text).await?;
        Ok(self
            .search_embedding(&query_embedding, k)
            .into_iter()
            .map(|hit| hit.entry.text.clone())
            .collect())
    }

    /// Rank entries against an already-computed query vector.
    pub fn search_embedding(&self, query_embedding: &[f32], k: usize) -> Vec<ScoredEntry<'_>> {
        let mut scored: Vec<ScoredEntry<'_>> = self
            .entries
            .iter()
            .map(|entry| ScoredEntry {
                entry,
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        // Stable: ties keep insertion order
        scored.sort_by(|a, b| compare_scores(b.score, a.score));
        scored.truncate(k.min(self.entries.len()));

        tracing::debug!(
            "Retrieved {} entries (requested top-{})",
            scored.len(),
            k
        );

        scored
    }
}

/// Total order over scores; NaN sorts below every real score.
fn compare_scores(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Cosine similarity between two vectors.
///
/// Mismatched lengths or a zero-length vector score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
