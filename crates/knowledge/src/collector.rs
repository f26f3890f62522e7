//! Source document discovery and loading.
//!
//! Only the top level of the source folder is scanned. A file that cannot
//! be read as UTF-8 text is logged and skipped; it never stops the rest
//! of the collection.

use crate::types::{Document, SourceFile};
use docent_core::AppResult;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

/// File extensions loaded into the knowledge index.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

/// Result of collecting a source folder.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Successfully loaded documents
    pub documents: Vec<Document>,

    /// Basenames of the loaded documents, in discovery order
    pub loaded_files: Vec<String>,

    /// Latest modification time over every supported file seen,
    /// including those that failed to load
    pub latest_modified: f64,
}

/// Whether a path has one of the supported extensions.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Seconds since the epoch for a filesystem timestamp.
pub fn to_epoch_secs(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// List the supported files directly inside `folder`.
///
/// A missing folder yields an empty list. Entries whose metadata cannot
/// be read are skipped with a warning.
pub fn discover(folder: &Path) -> Vec<SourceFile> {
    if !folder.is_dir() {
        return Vec::new();
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry in {:?}: {}", folder, e);
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || !is_supported(path) {
            continue;
        }

        let modified = match entry
            .metadata()
            .map_err(std::io::Error::from)
            .and_then(|m| m.modified())
        {
            Ok(time) => to_epoch_secs(time),
            Err(e) => {
                tracing::warn!("Skipping {:?}: cannot read modification time: {}", path, e);
                continue;
            }
        };

        files.push(SourceFile {
            path: path.to_path_buf(),
            basename: entry.file_name().to_string_lossy().to_string(),
            modified,
        });
    }

    files
}

/// Latest modification time over the supported files in `folder`.
///
/// An empty or missing folder reports the epoch (0.0).
pub fn latest_modified(folder: &Path) -> f64 {
    discover(folder)
        .iter()
        .map(|f| f.modified)
        .fold(0.0, f64::max)
}

/// Load every supported document in `folder`.
///
/// Creates the folder when it does not exist and returns an empty
/// collection; an empty knowledge base is a valid state.
pub fn collect(folder: &Path) -> AppResult<Collection> {
    if !folder.exists() {
        fs::create_dir_all(folder)?;
        tracing::info!(
            "Created knowledge folder {:?}; add .txt or .md files to it",
            folder
        );
        return Ok(Collection::default());
    }

    let mut collection = Collection::default();
    for file in discover(folder) {
        collection.latest_modified = collection.latest_modified.max(file.modified);

        match fs::read_to_string(&file.path) {
            Ok(text) => {
                tracing::debug!("Loaded {} ({} bytes)", file.basename, text.len());
                collection.loaded_files.push(file.basename.clone());
                collection.documents.push(Document::new(file.basename, text));
            }
            Err(e) => {
                tracing::warn!("Error loading {:?}: {}", file.path, e);
            }
        }
    }

    tracing::info!(
        "Collected {} document(s) from {:?}",
        collection.documents.len(),
        folder
    );
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("faq.md")));
        assert!(is_supported(Path::new("notes.TXT")));
        assert!(!is_supported(Path::new("logo.png")));
        assert!(!is_supported(Path::new("README")));
    }

    #[test]
    fn test_missing_folder_is_created() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("knowledge");

        let collection = collect(&folder).unwrap();

        assert!(folder.is_dir());
        assert!(collection.documents.is_empty());
        assert!(collection.loaded_files.is_empty());
    }

    #[test]
    fn test_collects_supported_files_only() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("faq.md"), "Frequently asked").unwrap();
        fs::write(temp.path().join("pets.txt"), "Pets policy").unwrap();
        fs::write(temp.path().join("logo.png"), [0u8, 1, 2]).unwrap();

        let collection = collect(temp.path()).unwrap();

        assert_eq!(collection.loaded_files, vec!["faq.md", "pets.txt"]);
        assert_eq!(collection.documents[1].text, "Pets policy");
    }

    #[test]
    fn test_invalid_utf8_is_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("broken.txt"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();
        fs::write(temp.path().join("good.md"), "Readable").unwrap();

        let collection = collect(temp.path()).unwrap();

        assert_eq!(collection.loaded_files, vec!["good.md"]);
        assert_eq!(collection.documents.len(), 1);
    }

    #[test]
    fn test_subdirectories_are_not_scanned() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("archive")).unwrap();
        fs::write(temp.path().join("archive").join("old.md"), "Old").unwrap();

        assert!(discover(temp.path()).is_empty());
    }

    #[test]
    fn test_latest_modified_of_empty_folder_is_epoch() {
        let temp = TempDir::new().unwrap();
        assert_eq!(latest_modified(temp.path()), 0.0);
        assert_eq!(latest_modified(&temp.path().join("absent")), 0.0);
    }
}
