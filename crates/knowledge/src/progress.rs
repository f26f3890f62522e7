//! Progress reporting for index rebuilds.
//!
//! A rebuild walks through `discover`, `chunk`, `embed` and `persist`.
//! Each step emits a [`ProgressEvent`] to an optional callback and to
//! `tracing` at debug level.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Step of a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildPhase {
    Discover,
    Chunk,
    Embed,
    Persist,
}

impl fmt::Display for RebuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RebuildPhase::Discover => "discover",
            RebuildPhase::Chunk => "chunk",
            RebuildPhase::Embed => "embed",
            RebuildPhase::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// Progress event emitted during a rebuild.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: RebuildPhase,

    /// Items handled in this phase (files, chunks, entries)
    pub count: u64,

    /// Human-readable message
    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: f64,
}

impl ProgressEvent {
    /// Format as a single user-facing line.
    pub fn format_simple(&self) -> String {
        format!(
            "[{}] {} - {} ({:.2}s)",
            self.phase, self.count, self.message, self.elapsed_secs
        )
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Emits rebuild progress through an optional callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Instant,
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::noop()
    }
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Instant::now(),
        }
    }

    /// Reporter that only logs.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Instant::now(),
        }
    }

    pub fn emit(&self, phase: RebuildPhase, count: u64, message: impl Into<String>) {
        let event = ProgressEvent {
            phase,
            count,
            message: message.into(),
            elapsed_secs: self.start_time.elapsed().as_secs_f64(),
        };

        tracing::debug!(
            phase = %event.phase,
            count = event.count,
            elapsed_secs = event.elapsed_secs,
            "{}",
            event.message
        );

        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    pub fn discovered(&self, files: usize) {
        self.emit(RebuildPhase::Discover, files as u64, "documents loaded");
    }

    pub fn chunked(&self, chunks: usize) {
        self.emit(RebuildPhase::Chunk, chunks as u64, "chunks created");
    }

    pub fn embedded(&self, chunks: usize, model: &str) {
        self.emit(
            RebuildPhase::Embed,
            chunks as u64,
            format!("chunks embedded with {}", model),
        );
    }

    pub fn persisted(&self, entries: usize, saved: bool) {
        let message = if saved {
            "entries written to disk"
        } else {
            "entries kept in memory only"
        };
        self.emit(RebuildPhase::Persist, entries as u64, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_event_format() {
        let event = ProgressEvent {
            phase: RebuildPhase::Chunk,
            count: 12,
            message: "chunks created".to_string(),
            elapsed_secs: 0.5,
        };
        assert_eq!(event.format_simple(), "[chunk] 12 - chunks created (0.50s)");
    }

    #[test]
    fn test_reporter_forwards_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let reporter = ProgressReporter::new(Arc::new(move |event: ProgressEvent| {
            sink.lock().unwrap().push(event.phase);
        }));

        reporter.discovered(2);
        reporter.chunked(5);
        reporter.embedded(5, "trigram-v1");
        reporter.persisted(5, true);

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                RebuildPhase::Discover,
                RebuildPhase::Chunk,
                RebuildPhase::Embed,
                RebuildPhase::Persist
            ]
        );
    }

    #[test]
    fn test_noop_reporter() {
        ProgressReporter::noop().discovered(1);
    }
}
