//! Mock embedding provider for tests.

use crate::embeddings::provider::EmbeddingProvider;
use docent_core::{AppError, AppResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Bag-of-words provider that records how often it is called.
///
/// Each lowercase word is hashed into one bucket, so texts sharing words
/// score higher. `set_failing(true)` makes every later call fail, which
/// lets tests drive the error paths of a rebuild or a query.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
    texts_embedded: AtomicUsize,
    failing: AtomicBool,
}

impl MockProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            texts_embedded: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Total number of texts embedded so far.
    pub fn texts_embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text.split_whitespace() {
            let word = word.to_lowercase();
            let hash = word
                .bytes()
                .fold(7u64, |acc, b| acc.wrapping_mul(131).wrapping_add(b as u64));
            vector[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-bow"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Embedding("mock provider set to fail".to_string()));
        }
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_embedded_texts() {
        let provider = MockProvider::new(16);
        provider
            .embed_batch(&["one".to_string(), "two".to_string()])
            .await
            .unwrap();
        provider.embed("three").await.unwrap();

        assert_eq!(provider.texts_embedded(), 3);
    }

    #[tokio::test]
    async fn test_failing_switch() {
        let provider = MockProvider::new(16);
        provider.set_failing(true);
        assert!(matches!(
            provider.embed("anything").await,
            Err(AppError::Embedding(_))
        ));

        provider.set_failing(false);
        assert!(provider.embed("anything").await.is_ok());
    }

    #[tokio::test]
    async fn test_same_words_same_vector() {
        let provider = MockProvider::new(32);
        let a = provider.embed("Pets Allowed").await.unwrap();
        let b = provider.embed("pets allowed").await.unwrap();
        assert_eq!(a, b);
    }
}
