//! Text chunking with configurable size and overlap.
//!
//! Windows are measured in characters (Unicode scalar values), so a chunk
//! never splits a code point. Consecutive windows start `size - overlap`
//! characters apart, and chunking stops at the first window that reaches
//! the end of the text: no window starts past the end, and none is wholly
//! contained in its predecessor. The last window may be shorter than `size`.

use crate::types::{Chunk, Document};
use docent_core::{AppError, AppResult};
use std::sync::Arc;

/// Check that chunking parameters make forward progress.
pub fn validate(size: usize, overlap: usize) -> AppResult<()> {
    if size == 0 {
        return Err(AppError::Chunking("chunk size must be positive".to_string()));
    }
    if overlap >= size {
        return Err(AppError::Chunking(format!(
            "overlap ({}) must be smaller than chunk size ({})",
            overlap, size
        )));
    }
    Ok(())
}

/// Split every document into chunks, preserving document order.
///
/// Pure and deterministic: the same documents and parameters always
/// produce the same sequence.
pub fn split(documents: &[Document], size: usize, overlap: usize) -> AppResult<Vec<Chunk>> {
    validate(size, overlap)?;

    let chunks: Vec<Chunk> = documents
        .iter()
        .flat_map(|doc| chunk_text(&doc.source, &doc.text, size, overlap))
        .collect();

    tracing::debug!(
        "Chunked {} document(s) into {} chunks (size: {}, overlap: {})",
        documents.len(),
        chunks.len(),
        size,
        overlap
    );

    Ok(chunks)
}

/// Chunk a single text. Callers must have validated `size` and `overlap`.
fn chunk_text(source: &str, text: &str, size: usize, overlap: usize) -> Vec<Chunk> {
    // Byte offset of every character boundary, including the end
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = bounds.len() - 1;

    if char_count == 0 {
        return Vec::new();
    }

    let source: Arc<str> = Arc::from(source);
    let step = size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + size).min(char_count);
        chunks.push(Chunk {
            source: Arc::clone(&source),
            sequence: chunks.len() as u32,
            text: text[bounds[start]..bounds[end]].to_string(),
        });

        if end == char_count {
            break;
        }
        start += step;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::new("doc.md", text)
    }

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_short_document_is_single_chunk() {
        let text = "Checked bags up to 23kg are free on Economy.";
        let chunks = split(&[doc(text)], 1000, 100).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].sequence, 0);
        assert_eq!(&*chunks[0].source, "doc.md");
    }

    #[test]
    fn test_overlapping_windows() {
        let chunks = split(&[doc("abcdefghij")], 4, 1).unwrap();
        assert_eq!(texts(&chunks), vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn test_last_window_may_be_short() {
        let chunks = split(&[doc("abcdefgh")], 5, 2).unwrap();
        assert_eq!(texts(&chunks), vec!["abcde", "defgh"]);

        let chunks = split(&[doc("abcdefghi")], 5, 2).unwrap();
        assert_eq!(texts(&chunks), vec!["abcde", "defgh", "ghi"]);
    }

    #[test]
    fn test_no_overlap() {
        let text = "a".repeat(300);
        let chunks = split(&[doc(&text)], 100, 0).unwrap();
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.text.len() == 100));
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_fragment() {
        // The window ending exactly at the text end stops chunking
        let chunks = split(&[doc("abcdefgh")], 4, 2).unwrap();
        assert_eq!(texts(&chunks), vec!["abcd", "cdef", "efgh"]);
    }

    #[test]
    fn test_multibyte_characters_are_not_split() {
        let chunks = split(&[doc("äöüßéè")], 4, 1).unwrap();
        assert_eq!(texts(&chunks), vec!["äöüß", "ßéè"]);
    }

    #[test]
    fn test_empty_document_yields_nothing() {
        let chunks = split(&[doc("")], 10, 2).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_sequence_restarts_per_document() {
        let docs = vec![
            Document::new("faq.md", "aaaaaa"),
            Document::new("pets.md", "bbbbbb"),
        ];
        let chunks = split(&docs, 4, 1).unwrap();

        let labels: Vec<(&str, u32)> = chunks.iter().map(|c| (&*c.source, c.sequence)).collect();
        assert_eq!(
            labels,
            vec![("faq.md", 0), ("faq.md", 1), ("pets.md", 0), ("pets.md", 1)]
        );
    }

    #[test]
    fn test_deterministic() {
        let docs = vec![doc(&"Baggage rules and fees. ".repeat(50))];
        let first = split(&docs, 120, 30).unwrap();
        let second = split(&docs, 120, 30).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_overlap_not_smaller_than_size_is_rejected() {
        assert!(matches!(
            split(&[doc("abc")], 10, 10),
            Err(AppError::Chunking(_))
        ));
        assert!(split(&[doc("abc")], 10, 20).is_err());
        assert!(split(&[doc("abc")], 0, 0).is_err());
    }
}
