//! Persistence of the knowledge index.
//!
//! An index folder holds two files:
//! - `vectors.sqlite`: one row per entry, embeddings as little-endian f32 blobs
//! - `metadata.json`: the [`IndexMetadata`] record
//!
//! Metadata is the "ready" marker. `save` removes it first, writes the
//! vector store, then writes metadata last, each through a temporary file
//! renamed into place, so a reader never pairs metadata with vectors from
//! a different build.

use crate::config::{get_metadata_path, get_vectors_path};
use crate::embeddings::EmbeddingProvider;
use crate::types::{IndexMetadata, VectorEntry};
use crate::vector_index::KnowledgeIndex;
use docent_core::{AppError, AppResult};
use rusqlite::{params, Connection, OpenFlags};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A temporary file removed on drop unless it was renamed into place.
struct PendingFile {
    path: PathBuf,
    committed: bool,
}

impl PendingFile {
    fn new(target: &Path) -> AppResult<Self> {
        let mut name = target.as_os_str().to_os_string();
        name.push(".tmp");
        let path = PathBuf::from(name);
        remove_if_exists(&path)?;
        Ok(Self {
            path,
            committed: false,
        })
    }

    fn commit(mut self, target: &Path) -> AppResult<()> {
        fs::rename(&self.path, target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn remove_if_exists(path: &Path) -> AppResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Write an index and its metadata to `index_dir`.
pub fn save(index: &KnowledgeIndex, index_dir: &Path) -> AppResult<()> {
    fs::create_dir_all(index_dir).map_err(|e| {
        AppError::Persistence(format!("Failed to create index directory {:?}: {}", index_dir, e))
    })?;

    let metadata_path = get_metadata_path(index_dir);
    let vectors_path = get_vectors_path(index_dir);

    // Not ready while the vector store is being replaced
    remove_if_exists(&metadata_path)?;

    let pending = PendingFile::new(&vectors_path)?;
    write_vectors(&pending.path, index.entries())?;
    pending.commit(&vectors_path)?;

    let pending = PendingFile::new(&metadata_path)?;
    {
        let mut file = fs::File::create(&pending.path)?;
        file.write_all(serde_json::to_string_pretty(index.metadata())?.as_bytes())?;
        file.sync_all()?;
    }
    pending.commit(&metadata_path)?;

    tracing::info!(
        "Saved index with {} entries to {:?}",
        index.len(),
        index_dir
    );
    Ok(())
}

fn write_vectors(path: &Path, entries: &[VectorEntry]) -> AppResult<()> {
    let mut conn = Connection::open(path)?;

    conn.execute_batch(
        r#"
        CREATE TABLE entries (
            position INTEGER PRIMARY KEY,
            source TEXT NOT NULL,
            sequence INTEGER NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL
        );
        "#,
    )?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO entries (position, source, sequence, text, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (position, entry) in entries.iter().enumerate() {
            stmt.execute(params![
                position as i64,
                &*entry.source,
                entry.sequence as i64,
                entry.text,
                embedding_to_bytes(&entry.embedding),
            ])?;
        }
    }
    tx.commit()?;

    conn.close().map_err(|(_, e)| AppError::from(e))?;
    Ok(())
}

/// Read the metadata record of an index folder.
pub fn read_metadata(index_dir: &Path) -> AppResult<IndexMetadata> {
    let path = get_metadata_path(index_dir);
    let content = fs::read_to_string(&path)
        .map_err(|e| AppError::Persistence(format!("Failed to read {:?}: {}", path, e)))?;
    serde_json::from_str(&content)
        .map_err(|e| AppError::Persistence(format!("Corrupt metadata {:?}: {}", path, e)))
}

/// Whether both halves of a persisted index are present.
pub fn exists(index_dir: &Path) -> bool {
    get_metadata_path(index_dir).is_file() && get_vectors_path(index_dir).is_file()
}

/// Restore an index from `index_dir`.
///
/// Fails with `AppError::Persistence` when files are missing or corrupt,
/// or when the stored vectors came from a different model than
/// `provider`. Callers treat any error as "no usable cache".
pub fn load(index_dir: &Path, provider: &dyn EmbeddingProvider) -> AppResult<KnowledgeIndex> {
    let metadata = read_metadata(index_dir)?;

    if metadata.embedding_model != provider.model_name()
        || metadata.dimensions != provider.dimensions()
    {
        return Err(AppError::Persistence(format!(
            "Index was built with '{}' ({} dims), active provider is '{}' ({} dims)",
            metadata.embedding_model,
            metadata.dimensions,
            provider.model_name(),
            provider.dimensions()
        )));
    }

    let vectors_path = get_vectors_path(index_dir);
    if !vectors_path.is_file() {
        return Err(AppError::Persistence(format!(
            "Vector store missing at {:?}",
            vectors_path
        )));
    }

    let entries = read_vectors(&vectors_path)?;
    if entries.len() != metadata.chunk_count as usize {
        return Err(AppError::Persistence(format!(
            "Vector store holds {} entries, metadata expects {}",
            entries.len(),
            metadata.chunk_count
        )));
    }

    let index = KnowledgeIndex::from_parts(entries, metadata)
        .map_err(|e| AppError::Persistence(e.to_string()))?;

    tracing::info!("Loaded index with {} entries from {:?}", index.len(), index_dir);
    Ok(index)
}

fn read_vectors(path: &Path) -> AppResult<Vec<VectorEntry>> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

    let mut stmt =
        conn.prepare("SELECT source, sequence, text, embedding FROM entries ORDER BY position")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    // Chunks of one document share a single source allocation
    let mut current: Option<Arc<str>> = None;
    rows.into_iter()
        .map(|(source, sequence, text, blob)| {
            let source: Arc<str> = match current.take() {
                Some(shared) if *shared == *source => shared,
                _ => Arc::from(source),
            };
            current = Some(Arc::clone(&source));
            Ok(VectorEntry {
                source,
                sequence: sequence as u32,
                text,
                embedding: bytes_to_embedding(&blob)?,
            })
        })
        .collect()
}

/// Delete a persisted index. Metadata goes first so an interrupted
/// delete reads as "missing", never as a ready index without vectors.
pub fn remove(index_dir: &Path) -> AppResult<()> {
    remove_if_exists(&get_metadata_path(index_dir))?;
    remove_if_exists(&get_vectors_path(index_dir))?;
    tracing::debug!("Removed persisted index at {:?}", index_dir);
    Ok(())
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Persistence(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::mock::MockProvider;
    use crate::types::Chunk;
    use tempfile::TempDir;

    fn chunk(source: &str, sequence: u32, text: &str) -> Chunk {
        Chunk {
            source: Arc::from(source),
            sequence,
            text: text.to_string(),
        }
    }

    fn metadata() -> IndexMetadata {
        IndexMetadata {
            last_build_time: 1_700_000_123.25,
            file_count: 2,
            chunk_count: 0,
            embedding_model: String::new(),
            dimensions: 0,
            files: vec!["faq.md".to_string(), "pets.md".to_string()],
        }
    }

    async fn sample_index(provider: &MockProvider) -> KnowledgeIndex {
        let chunks = vec![
            chunk("faq.md", 0, "Checked bags up to 23kg are free"),
            chunk("faq.md", 1, "Lounge access with premium fares"),
            chunk("pets.md", 0, "Small pets travel in the cabin"),
        ];
        KnowledgeIndex::build(chunks, provider, metadata()).await.unwrap()
    }

    #[test]
    fn test_embedding_bytes_round_trip() {
        let values = vec![0.5, -1.25, f32::MIN_POSITIVE, 3.0e7];
        let restored = bytes_to_embedding(&embedding_to_bytes(&values)).unwrap();
        assert_eq!(restored, values);
        assert!(bytes_to_embedding(&[0, 1, 2]).is_err());
    }

    #[tokio::test]
    async fn test_save_and_load_preserves_query_results() {
        let temp = TempDir::new().unwrap();
        let provider = MockProvider::new(32);
        let index = sample_index(&provider).await;

        save(&index, temp.path()).unwrap();
        let loaded = load(temp.path(), &provider).unwrap();

        assert_eq!(loaded.metadata(), index.metadata());
        assert_eq!(loaded.entries(), index.entries());
        for query in ["bags", "pets cabin", "lounge premium"] {
            assert_eq!(
                index.query(query, 2, &provider).await.unwrap(),
                loaded.query(query, 2, &provider).await.unwrap()
            );
        }
    }

    #[tokio::test]
    async fn test_save_leaves_no_temporary_files() {
        let temp = TempDir::new().unwrap();
        let provider = MockProvider::new(16);
        save(&sample_index(&provider).await, temp.path()).unwrap();

        let mut names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["metadata.json", "vectors.sqlite"]);
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_index() {
        let temp = TempDir::new().unwrap();
        let provider = MockProvider::new(16);
        save(&sample_index(&provider).await, temp.path()).unwrap();

        let smaller =
            KnowledgeIndex::build(vec![chunk("new.md", 0, "Only entry")], &provider, metadata())
                .await
                .unwrap();
        save(&smaller, temp.path()).unwrap();

        let loaded = load(temp.path(), &provider).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.entries()[0].text, "Only entry");
    }

    #[tokio::test]
    async fn test_empty_index_round_trips() {
        let temp = TempDir::new().unwrap();
        let provider = MockProvider::new(8);
        let index = KnowledgeIndex::build(Vec::new(), &provider, metadata())
            .await
            .unwrap();

        save(&index, temp.path()).unwrap();
        assert!(load(temp.path(), &provider).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_index_fails() {
        let temp = TempDir::new().unwrap();
        let provider = MockProvider::new(8);
        assert!(matches!(
            load(temp.path(), &provider),
            Err(AppError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn test_load_corrupt_metadata_fails() {
        let temp = TempDir::new().unwrap();
        let provider = MockProvider::new(16);
        save(&sample_index(&provider).await, temp.path()).unwrap();
        fs::write(get_metadata_path(temp.path()), "{ not json").unwrap();

        assert!(matches!(
            load(temp.path(), &provider),
            Err(AppError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn test_load_corrupt_vector_store_fails() {
        let temp = TempDir::new().unwrap();
        let provider = MockProvider::new(16);
        save(&sample_index(&provider).await, temp.path()).unwrap();
        fs::write(get_vectors_path(temp.path()), b"definitely not sqlite").unwrap();

        assert!(matches!(
            load(temp.path(), &provider),
            Err(AppError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn test_load_with_different_model_fails() {
        let temp = TempDir::new().unwrap();
        save(&sample_index(&MockProvider::new(16)).await, temp.path()).unwrap();

        let result = load(temp.path(), &MockProvider::new(32));
        assert!(result.unwrap_err().to_string().contains("16 dims"));
    }

    #[tokio::test]
    async fn test_remove_deletes_both_files() {
        let temp = TempDir::new().unwrap();
        let provider = MockProvider::new(16);
        save(&sample_index(&provider).await, temp.path()).unwrap();
        assert!(exists(temp.path()));

        remove(temp.path()).unwrap();
        assert!(!exists(temp.path()));
        assert!(!get_metadata_path(temp.path()).exists());
        assert!(!get_vectors_path(temp.path()).exists());

        // Removing again is a no-op
        remove(temp.path()).unwrap();
    }
}
