//! Knowledge index configuration management.

use crate::embeddings::EmbeddingConfig;
use docent_core::config::STATE_DIR;
use docent_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for the knowledge index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Folder holding the operator documents
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Folder holding the persisted index
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,

    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Default number of chunks returned by a search
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Embedding provider settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("knowledge")
}

fn default_index_dir() -> PathBuf {
    PathBuf::from(STATE_DIR).join("index")
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_top_k() -> usize {
    3
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            index_dir: default_index_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl KnowledgeConfig {
    /// Config rooted at `workspace`: source and index folders inside it.
    pub fn for_workspace(workspace: &Path) -> Self {
        Self::default().resolve(workspace)
    }

    /// Resolve relative folders against `workspace`.
    pub fn resolve(mut self, workspace: &Path) -> Self {
        self.source_dir = workspace.join(&self.source_dir);
        self.index_dir = workspace.join(&self.index_dir);
        self
    }

    /// Reject chunking parameters that cannot make progress.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Load the knowledge configuration for a workspace.
///
/// Reads `.docent/knowledge.yaml` if present, otherwise uses defaults.
/// Relative folders are resolved against the workspace.
pub fn load_config(workspace: &Path) -> AppResult<KnowledgeConfig> {
    let config_path = get_config_path(workspace);

    let config = if config_path.exists() {
        let content = fs::read_to_string(&config_path).map_err(|e| {
            AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
        })?;

        let config: KnowledgeConfig = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
        })?;

        tracing::debug!("Loaded knowledge config from {:?}", config_path);
        config
    } else {
        tracing::debug!("No knowledge config at {:?}, using defaults", config_path);
        KnowledgeConfig::default()
    };

    config.validate()?;
    Ok(config.resolve(workspace))
}

/// Get the path to the knowledge config file.
pub fn get_config_path(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR).join("knowledge.yaml")
}

/// Get the vector store path inside an index folder.
pub fn get_vectors_path(index_dir: &Path) -> PathBuf {
    index_dir.join("vectors.sqlite")
}

/// Get the metadata record path inside an index folder.
pub fn get_metadata_path(index_dir: &Path) -> PathBuf {
    index_dir.join("metadata.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path()).unwrap();

        assert_eq!(config.source_dir, temp.path().join("knowledge"));
        assert_eq!(config.index_dir, temp.path().join(".docent").join("index"));
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.embedding.provider, "trigram");
    }

    #[test]
    fn test_load_config_from_yaml() {
        let temp = TempDir::new().unwrap();
        let path = get_config_path(temp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            "source_dir: docs\nchunk_size: 400\nchunk_overlap: 40\n",
        )
        .unwrap();

        let loaded = load_config(temp.path()).unwrap();
        assert_eq!(loaded.source_dir, temp.path().join("docs"));
        assert_eq!(loaded.chunk_size, 400);
        assert_eq!(loaded.chunk_overlap, 40);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = get_config_path(temp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "chunk_size: 200\n").unwrap();

        let loaded = load_config(temp.path()).unwrap();
        assert_eq!(loaded.chunk_size, 200);
        assert_eq!(loaded.chunk_overlap, 100);
        assert_eq!(loaded.top_k, 3);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let config = KnowledgeConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let zero = KnowledgeConfig {
            chunk_size: 0,
            chunk_overlap: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_absolute_dirs_are_kept() {
        let temp = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let config = KnowledgeConfig {
            source_dir: elsewhere.path().to_path_buf(),
            ..Default::default()
        }
        .resolve(temp.path());

        assert_eq!(config.source_dir, elsewhere.path());
    }
}
