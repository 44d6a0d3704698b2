//! In-memory chunk index with brute-force cosine search

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkKey};
use crate::vectorize::Embedding;

/// A retrieved chunk with its similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, Clone)]
struct Entry {
    chunk: Chunk,
    vector: Embedding,
}

/// Append-only collection of `(chunk, vector)` pairs in insertion order
#[derive(Debug, Clone, Default)]
pub struct ChunkIndex {
    entries: Vec<Entry>,
    keys: HashSet<ChunkKey>,
}

impl ChunkIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk; `(source, position)` must not already be indexed
    pub fn append(&mut self, chunk: Chunk, vector: Embedding) -> Result<()> {
        let key = chunk.key();
        if self.keys.contains(&key) {
            return Err(Error::DuplicateKey {
                document: key.source,
                position: key.position,
            });
        }
        self.keys.insert(key);
        self.entries.push(Entry { chunk, vector });
        Ok(())
    }

    /// The `k` most similar chunks, best first; equal scores keep insertion order
    pub fn query(&self, vector: &Embedding, k: usize) -> Vec<ScoredChunk> {
        if k == 0 || self.entries.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, entry.vector.cosine(vector)))
            .collect();

        // Stable sort keeps insertion order among ties
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect()
    }

    /// Whether a chunk with this key is indexed
    pub fn contains(&self, source: &str, position: usize) -> bool {
        self.keys.contains(&ChunkKey {
            source: source.to_string(),
            position,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indexed chunks in insertion order
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    /// Distinct sources in insertion order
    pub fn sources(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|e| e.chunk.source.as_str())
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// Dimensionality of the stored vectors, 0 when empty
    pub fn dimensions(&self) -> usize {
        self.entries.first().map(|e| e.vector.dimensions()).unwrap_or(0)
    }

    /// Replace every stored vector, in insertion order
    pub fn revectorize(&mut self, vectors: Vec<Embedding>) -> Result<()> {
        if vectors.len() != self.entries.len() {
            return Err(Error::internal(format!(
                "revectorize got {} vectors for {} chunks",
                vectors.len(),
                self.entries.len()
            )));
        }
        for (entry, vector) in self.entries.iter_mut().zip(vectors) {
            entry.vector = vector;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunk(source: &str, position: usize) -> Chunk {
        Chunk::new(format!("{} #{}", source, position), source, position)
    }

    fn dense(v: &[f32]) -> Embedding {
        Embedding::Dense(v.to_vec())
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut index = ChunkIndex::new();
        index.append(chunk("a.txt", 0), dense(&[1.0, 0.0])).unwrap();

        let err = index.append(chunk("a.txt", 0), dense(&[0.0, 1.0])).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateKey { ref document, position: 0 } if document == "a.txt"
        ));
        assert_eq!(index.len(), 1);

        index.append(chunk("a.txt", 1), dense(&[0.0, 1.0])).unwrap();
        index.append(chunk("b.txt", 0), dense(&[0.0, 1.0])).unwrap();
        assert!(index.contains("b.txt", 0));
        assert!(!index.contains("b.txt", 1));
        assert_eq!(index.sources(), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_query_ranks_by_cosine() {
        let mut index = ChunkIndex::new();
        index.append(chunk("a", 0), dense(&[0.0, 1.0])).unwrap();
        index.append(chunk("b", 0), dense(&[1.0, 0.1])).unwrap();
        index.append(chunk("c", 0), dense(&[1.0, 1.0])).unwrap();

        let results = index.query(&dense(&[1.0, 0.0]), 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.source, "b");
        assert_eq!(results[1].chunk.source, "c");
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_query_edge_cases() {
        let empty = ChunkIndex::new();
        assert!(empty.query(&dense(&[1.0]), 3).is_empty());
        assert_eq!(empty.dimensions(), 0);

        let mut index = ChunkIndex::new();
        index.append(chunk("a", 0), dense(&[1.0])).unwrap();
        assert!(index.query(&dense(&[1.0]), 0).is_empty());
        assert_eq!(index.query(&dense(&[1.0]), 10).len(), 1);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut index = ChunkIndex::new();
        for i in 0..4 {
            index.append(chunk("same", i), dense(&[1.0, 1.0])).unwrap();
        }
        let positions: Vec<usize> = index
            .query(&dense(&[1.0, 1.0]), 4)
            .iter()
            .map(|r| r.chunk.position)
            .collect();
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_revectorize() {
        let mut index = ChunkIndex::new();
        index.append(chunk("a", 0), dense(&[1.0, 0.0])).unwrap();
        index.append(chunk("a", 1), dense(&[0.0, 1.0])).unwrap();

        assert!(matches!(
            index.revectorize(vec![dense(&[1.0, 0.0])]),
            Err(Error::Internal(_))
        ));

        index
            .revectorize(vec![dense(&[0.0, 1.0, 0.0]), dense(&[1.0, 0.0, 0.0])])
            .unwrap();
        assert_eq!(index.dimensions(), 3);
        assert_eq!(index.query(&dense(&[1.0, 0.0, 0.0]), 1)[0].chunk.position, 1);
    }

    proptest! {
        #[test]
        fn prop_query_is_sorted_and_bounded(
            vectors in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 3), 0..40),
            query in prop::collection::vec(-1.0f32..1.0, 3),
            k in 0usize..50,
        ) {
            let mut index = ChunkIndex::new();
            for (i, v) in vectors.iter().enumerate() {
                index.append(chunk("doc", i), dense(v)).unwrap();
            }

            let results = index.query(&dense(&query), k);
            prop_assert_eq!(results.len(), k.min(vectors.len()));
            for pair in results.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
                if pair[0].score == pair[1].score {
                    prop_assert!(pair[0].chunk.position < pair[1].chunk.position);
                }
            }
        }
    }
}
