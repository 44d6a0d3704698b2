//! Fixed-size word windows with overlap

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::Chunk;

/// Splits text into overlapping windows of whitespace-separated words
#[derive(Debug, Clone, Copy)]
pub struct WordChunker {
    /// Words per window
    window: usize,
    /// Words shared by consecutive windows
    overlap: usize,
}

impl WordChunker {
    /// Create a chunker; `overlap` must be smaller than `window`
    pub fn new(window: usize, overlap: usize) -> Result<Self> {
        if window == 0 || overlap >= window {
            return Err(Error::config(format!(
                "chunk overlap ({}) must be smaller than the window ({})",
                overlap, window
            )));
        }
        Ok(Self { window, overlap })
    }

    /// Create a chunker from configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.window_words, config.overlap_words)
    }

    /// Words per window
    pub fn window(&self) -> usize {
        self.window
    }

    /// Words shared by consecutive windows
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between window starts
    pub fn stride(&self) -> usize {
        self.window - self.overlap
    }

    /// Lazily split `text` into word windows
    pub fn windows<'a>(&self, text: &'a str) -> WordChunks<'a> {
        WordChunks {
            words: text.split_whitespace().collect(),
            window: self.window,
            stride: self.stride(),
            start: 0,
        }
    }

    /// Chunk a document's text, numbering positions from zero
    pub fn chunk(&self, source: &str, text: &str) -> Vec<Chunk> {
        self.windows(text)
            .enumerate()
            .map(|(position, window)| Chunk::new(window, source, position))
            .collect()
    }

    /// Number of windows for a text of `words` words
    pub fn expected_count(&self, words: usize) -> usize {
        words.div_ceil(self.stride())
    }
}

impl Default for WordChunker {
    fn default() -> Self {
        Self {
            window: 1000,
            overlap: 200,
        }
    }
}

/// Iterator over the windows of one text
pub struct WordChunks<'a> {
    words: Vec<&'a str>,
    window: usize,
    stride: usize,
    start: usize,
}

impl Iterator for WordChunks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if self.start >= self.words.len() {
            return None;
        }
        let end = (self.start + self.window).min(self.words.len());
        let text = self.words[self.start..end].join(" ");
        self.start += self.stride;
        Some(text)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.words.len().saturating_sub(self.start).div_ceil(self.stride);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WordChunks<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_rejects_invalid_overlap() {
        assert!(matches!(WordChunker::new(100, 100), Err(Error::Config(_))));
        assert!(matches!(WordChunker::new(100, 150), Err(Error::Config(_))));
        assert!(matches!(WordChunker::new(0, 0), Err(Error::Config(_))));
        assert!(WordChunker::new(1, 0).is_ok());
    }

    #[test]
    fn test_default_window() {
        let chunker = WordChunker::default();
        assert_eq!(chunker.window(), 1000);
        assert_eq!(chunker.overlap(), 200);
        assert_eq!(chunker.stride(), 800);
    }

    #[test]
    fn test_1500_words_makes_two_chunks() {
        let chunks = WordChunker::default().chunk("long.txt", &words(1500));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text.split(' ').count(), 1000);
        assert_eq!(chunks[1].text.split(' ').count(), 700);
        assert!(chunks[1].text.starts_with("w800 "));
        assert_eq!(chunks[0].position, 0);
        assert_eq!(chunks[1].position, 1);
        assert_eq!(chunks[1].source, "long.txt");
    }

    #[test]
    fn test_empty_and_whitespace_text() {
        let chunker = WordChunker::default();
        assert!(chunker.chunk("a.txt", "").is_empty());
        assert!(chunker.chunk("a.txt", " \n\t  ").is_empty());
    }

    #[test]
    fn test_whitespace_is_normalised() {
        let chunker = WordChunker::new(3, 1).unwrap();
        let chunks: Vec<String> = chunker.windows("a\tb\n\nc   d e").collect();
        assert_eq!(chunks, vec!["a b c", "c d e", "e"]);
    }

    #[test]
    fn test_size_hint() {
        let chunker = WordChunker::new(4, 2).unwrap();
        let mut iter = chunker.windows("a b c d e f g");
        assert_eq!(iter.len(), 4);
        iter.next();
        assert_eq!(iter.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_chunk_count(n in 0usize..3000, window in 1usize..300, overlap_frac in 0.0f64..1.0) {
            let overlap = ((window as f64) * overlap_frac) as usize;
            prop_assume!(overlap < window);
            let chunker = WordChunker::new(window, overlap).unwrap();
            let chunks = chunker.chunk("doc", &words(n));
            prop_assert_eq!(chunks.len(), chunker.expected_count(n));
        }

        #[test]
        fn prop_consecutive_chunks_share_overlap(n in 1usize..2000, window in 2usize..200, overlap_frac in 0.0f64..1.0) {
            let overlap = ((window as f64) * overlap_frac) as usize;
            prop_assume!(overlap < window);
            let chunker = WordChunker::new(window, overlap).unwrap();
            let chunks = chunker.chunk("doc", &words(n));

            for pair in chunks.windows(2) {
                let prev: Vec<&str> = pair[0].text.split(' ').collect();
                let next: Vec<&str> = pair[1].text.split(' ').collect();
                let shared = overlap.min(next.len());
                prop_assert_eq!(&prev[prev.len() - shared..], &next[..shared]);
            }
            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.position, i);
            }
        }
    }
}
