//! Decides whether a persisted index can be reused.
//!
//! Staleness is judged on modification times only: an edit that keeps a
//! file's mtime, or a deletion that lowers the newest mtime, goes
//! unnoticed. Touching a file without changing it forces a rebuild.

use crate::collector;
use crate::store;
use std::fmt;
use std::path::Path;

/// Why an index is rebuilt or reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildReason {
    /// Vector store or metadata absent
    Missing,
    /// Metadata unreadable
    Corrupt,
    /// A source file is newer than the index
    Stale,
    /// The index reflects the current sources
    Current,
}

impl RebuildReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RebuildReason::Missing => "missing",
            RebuildReason::Corrupt => "corrupt",
            RebuildReason::Stale => "stale",
            RebuildReason::Current => "current",
        }
    }
}

impl fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a staleness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildDecision {
    pub rebuild: bool,
    pub reason: RebuildReason,
}

impl RebuildDecision {
    fn rebuild(reason: RebuildReason) -> Self {
        Self {
            rebuild: true,
            reason,
        }
    }

    fn reuse() -> Self {
        Self {
            rebuild: false,
            reason: RebuildReason::Current,
        }
    }
}

/// Compare source modification times with the persisted index.
///
/// | Condition                                  | Decision          |
/// |--------------------------------------------|-------------------|
/// | vector store or metadata absent            | rebuild (missing) |
/// | metadata unreadable                        | rebuild (corrupt) |
/// | newest source mtime > `last_build_time`    | rebuild (stale)   |
/// | otherwise                                  | reuse (current)   |
///
/// An empty source folder counts as the epoch.
pub fn should_rebuild(source_dir: &Path, index_dir: &Path) -> RebuildDecision {
    if !store::exists(index_dir) {
        return RebuildDecision::rebuild(RebuildReason::Missing);
    }

    let metadata = match store::read_metadata(index_dir) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!("Index metadata unreadable: {}", e);
            return RebuildDecision::rebuild(RebuildReason::Corrupt);
        }
    };

    let latest = collector::latest_modified(source_dir);
    if latest > metadata.last_build_time {
        tracing::debug!(
            "Sources modified at {:.6}, index built from sources at {:.6}",
            latest,
            metadata.last_build_time
        );
        return RebuildDecision::rebuild(RebuildReason::Stale);
    }

    RebuildDecision::reuse()
}
