//! Knowledge index manager: the facade callers talk to.
//!
//! The manager owns the single active index behind an `Arc` that is
//! swapped wholesale under a short write lock. Searches clone the current
//! `Arc` and query it without holding any lock, so they always see either
//! the complete old index or the complete new one. Rebuilds are
//! serialised by an async mutex.

use crate::chunker;
use crate::collector;
use crate::config::KnowledgeConfig;
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::progress::ProgressReporter;
use crate::staleness;
use crate::store;
use crate::types::{IndexMetadata, IndexStatus};
use crate::vector_index::KnowledgeIndex;
use docent_core::{AppError, AppResult};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

/// Returned by `search` whenever no index is active.
pub const NOT_INITIALIZED_MESSAGE: &str =
    "Knowledge base not initialized. Add documents to the 'knowledge/' folder.";

/// Separator placed between chunk texts in a search result.
pub const RESULT_SEPARATOR: &str = "\n\n";

/// Lifecycle of the manager.
///
/// `Unavailable` and `Empty` look the same to `search`, but only
/// `Unavailable` without a provider is terminal; everything else can be
/// retried with `reload`.
#[derive(Debug)]
enum IndexState {
    Uninitialized,
    Unavailable {
        reason: String,
    },
    Empty,
    Ready {
        index: Arc<KnowledgeIndex>,
        /// Files read by the rebuild that produced `index`; empty after a
        /// cache reuse, which does not read documents.
        files: Vec<String>,
    },
}

/// Facade over collection, chunking, indexing and persistence.
#[derive(Debug)]
pub struct KnowledgeIndexManager {
    config: KnowledgeConfig,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    state: RwLock<Arc<IndexState>>,
    rebuild_lock: Mutex<()>,
    progress: ProgressReporter,
}

impl KnowledgeIndexManager {
    /// Load the configured embedding provider and bring the index up.
    pub async fn open(config: KnowledgeConfig) -> Self {
        let provider = create_provider(&config.embedding).await;
        let manager = Self::new(config, provider);
        manager.initialize().await;
        manager
    }

    /// Create an uninitialized manager around an already-loaded provider.
    ///
    /// A provider error puts the manager in the terminal unavailable state.
    pub fn new(
        config: KnowledgeConfig,
        provider: AppResult<Arc<dyn EmbeddingProvider>>,
    ) -> Self {
        let (provider, state) = match provider {
            Ok(provider) => {
                tracing::info!(
                    "Embedding provider '{}' loaded (model: {}, {} dims)",
                    provider.provider_name(),
                    provider.model_name(),
                    provider.dimensions()
                );
                (Some(provider), IndexState::Uninitialized)
            }
            Err(e) => {
                tracing::error!("Failed to load embedding provider: {}", e);
                (
                    None,
                    IndexState::Unavailable {
                        reason: e.to_string(),
                    },
                )
            }
        };

        Self {
            config,
            provider,
            state: RwLock::new(Arc::new(state)),
            rebuild_lock: Mutex::new(()),
            progress: ProgressReporter::noop(),
        }
    }

    /// Report rebuild progress to `progress`.
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &KnowledgeConfig {
        &self.config
    }

    /// Reuse the persisted index if it is current, otherwise rebuild.
    pub async fn initialize(&self) {
        let _guard = self.rebuild_lock.lock().await;
        let Some(provider) = self.provider.clone() else {
            return;
        };

        tracing::info!(
            "Initializing knowledge base from {:?}",
            self.config.source_dir
        );

        let decision = staleness::should_rebuild(&self.config.source_dir, &self.config.index_dir);
        tracing::info!(
            "Persisted index is {} ({})",
            decision.reason,
            if decision.rebuild { "rebuilding" } else { "reusing" }
        );

        if !decision.rebuild {
            match store::load(&self.config.index_dir, provider.as_ref()) {
                Ok(index) => {
                    self.install(IndexState::Ready {
                        index: Arc::new(index),
                        files: Vec::new(),
                    });
                    return;
                }
                Err(e) => tracing::warn!("Cached index unusable, rebuilding: {}", e),
            }
        }

        self.rebuild_and_install(provider.as_ref()).await;
    }

    /// Discard the persisted index and rebuild from the source folder.
    ///
    /// Errors are logged; on failure the previously active index stays
    /// in place.
    pub async fn reload(&self) {
        let _guard = self.rebuild_lock.lock().await;
        let Some(provider) = self.provider.clone() else {
            tracing::warn!("Reload skipped: embedding provider unavailable");
            return;
        };

        tracing::info!("Reloading knowledge base");
        if let Err(e) = store::remove(&self.config.index_dir) {
            tracing::warn!("Failed to remove persisted index: {}", e);
        }

        self.rebuild_and_install(provider.as_ref()).await;
    }

    /// Top `k` chunk texts for `query`, joined by a blank line.
    ///
    /// Never fails: without an active index the result is
    /// [`NOT_INITIALIZED_MESSAGE`]; a query-time embedding error is
    /// logged and yields an empty string.
    pub async fn search(&self, query: &str, k: usize) -> String {
        tracing::debug!("Knowledge search: '{}' (k={})", query, k);

        let state = self.snapshot();
        let (IndexState::Ready { index, .. }, Some(provider)) = (&*state, &self.provider) else {
            return NOT_INITIALIZED_MESSAGE.to_string();
        };

        match index.query(query, k, provider.as_ref()).await {
            Ok(texts) => texts.join(RESULT_SEPARATOR),
            Err(e) => {
                tracing::error!("Knowledge search failed: {}", e);
                String::new()
            }
        }
    }

    /// Files loaded by the most recent rebuild.
    pub fn list_files(&self) -> Vec<String> {
        match &*self.snapshot() {
            IndexState::Ready { files, .. } => files.clone(),
            _ => Vec::new(),
        }
    }

    pub fn status(&self) -> IndexStatus {
        match &*self.snapshot() {
            IndexState::Uninitialized => IndexStatus::Uninitialized,
            IndexState::Unavailable { reason } => IndexStatus::Unavailable {
                reason: reason.clone(),
            },
            IndexState::Empty => IndexStatus::Empty,
            IndexState::Ready { index, files } => IndexStatus::Ready {
                chunks: index.len(),
                files: files.clone(),
                last_build_time: index.metadata().last_build_time,
            },
        }
    }

    /// Metadata of the active index, if any.
    pub fn metadata(&self) -> Option<IndexMetadata> {
        match &*self.snapshot() {
            IndexState::Ready { index, .. } => Some(index.metadata().clone()),
            _ => None,
        }
    }

    fn snapshot(&self) -> Arc<IndexState> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&state)
    }

    fn install(&self, next: IndexState) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = Arc::new(next);
    }

    async fn rebuild_and_install(&self, provider: &dyn EmbeddingProvider) {
        match self.rebuild(provider).await {
            Ok(next) => self.install(next),
            Err(e) => {
                tracing::error!("Knowledge base rebuild failed: {}", e);
                if matches!(*self.snapshot(), IndexState::Uninitialized) {
                    self.install(IndexState::Unavailable {
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    /// Collect, chunk, embed and persist. Produces the next state without
    /// touching the active one.
    async fn rebuild(&self, provider: &dyn EmbeddingProvider) -> AppResult<IndexState> {
        let source_dir = self.config.source_dir.clone();
        let collection = run_blocking(move || collector::collect(&source_dir)).await?;
        self.progress.discovered(collection.documents.len());

        if collection.documents.is_empty() {
            tracing::warn!(
                "No documents found in {:?}; knowledge base is empty",
                self.config.source_dir
            );
            // A cache left behind here could be judged current once the
            // unreadable files are gone
            let index_dir = self.config.index_dir.clone();
            if let Err(e) = run_blocking(move || store::remove(&index_dir)).await {
                tracing::warn!("Failed to remove outdated index: {}", e);
            }
            return Ok(IndexState::Empty);
        }

        let chunks = chunker::split(
            &collection.documents,
            self.config.chunk_size,
            self.config.chunk_overlap,
        )?;
        self.progress.chunked(chunks.len());

        let metadata = IndexMetadata {
            last_build_time: collection.latest_modified,
            file_count: collection.documents.len() as u32,
            chunk_count: 0,
            embedding_model: String::new(),
            dimensions: 0,
            files: collection.loaded_files.clone(),
        };
        let index = Arc::new(KnowledgeIndex::build(chunks, provider, metadata).await?);
        self.progress.embedded(index.len(), provider.model_name());

        // The in-memory index stays usable even when it cannot be cached
        let to_save = Arc::clone(&index);
        let index_dir = self.config.index_dir.clone();
        let saved = match run_blocking(move || store::save(&to_save, &index_dir)).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to persist index, next start will rebuild: {}", e);
                false
            }
        };
        self.progress.persisted(index.len(), saved);

        tracing::info!(
            "Knowledge base ready: {} file(s), {} chunks",
            collection.loaded_files.len(),
            index.len()
        );

        Ok(IndexState::Ready {
            index,
            files: collection.loaded_files,
        })
    }
}

/// Run filesystem and SQLite work off the async workers.
async fn run_blocking<T, F>(task: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| AppError::Knowledge(format!("Background task failed: {}", e)))?
}
