//! Corpus-wide TF-IDF vectorizer

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::config::SparseConfig;

use super::stop_words::is_stop_word;
use super::SparseVector;

/// Tokens are runs of two or more word characters
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("Invalid regex"));

/// TF-IDF vectorizer whose vocabulary grows monotonically across refits
///
/// `fit_transform` is called with the whole corpus on every ingestion. Terms
/// already in the vocabulary keep their index; new terms are admitted by
/// descending corpus frequency (ties by term) while `max_features` allows.
/// With no cap every term is admitted, so documents ingested later are
/// always represented.
#[derive(Debug, Clone)]
pub struct SparseVectorizer {
    /// Term -> column index
    vocabulary: HashMap<String, u32>,
    /// Column index -> term
    terms: Vec<String>,
    /// Smoothed inverse document frequency per column
    idf: Vec<f32>,
    max_features: Option<usize>,
    stop_words: bool,
}

impl Default for SparseVectorizer {
    fn default() -> Self {
        Self::from_config(&SparseConfig::default())
    }
}

impl SparseVectorizer {
    /// Create an empty vectorizer
    pub fn new(max_features: Option<usize>, stop_words: bool) -> Self {
        Self {
            vocabulary: HashMap::new(),
            terms: Vec::new(),
            idf: Vec::new(),
            max_features,
            stop_words,
        }
    }

    /// Create an empty vectorizer from configuration
    pub fn from_config(config: &SparseConfig) -> Self {
        Self::new(config.max_features, config.english_stop_words)
    }

    /// Current vocabulary size, which is also the vector dimensionality
    pub fn vocabulary_len(&self) -> usize {
        self.terms.len()
    }

    /// Whether `term` has been admitted to the vocabulary
    pub fn contains_term(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }

    /// Lowercase and split into tokens, dropping stop words when enabled
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        TOKEN_RE
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|t| !(self.stop_words && is_stop_word(t)))
            .map(str::to_string)
            .collect()
    }

    /// Refit over the full corpus and return one vector per document, in order
    pub fn fit_transform(&mut self, corpus: &[&str]) -> Vec<SparseVector> {
        let tokenized: Vec<Vec<String>> = corpus.iter().map(|doc| self.tokenize(doc)).collect();

        let mut frequency: HashMap<&str, usize> = HashMap::new();
        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for tokens in &tokenized {
            let mut seen: HashSet<&str> = HashSet::new();
            for token in tokens {
                *frequency.entry(token.as_str()).or_insert(0) += 1;
                seen.insert(token.as_str());
            }
            for token in seen {
                *document_frequency.entry(token).or_insert(0) += 1;
            }
        }

        let mut candidates: Vec<(&str, usize)> = frequency
            .iter()
            .filter(|(term, _)| !self.vocabulary.contains_key(**term))
            .map(|(term, count)| (*term, *count))
            .collect();
        candidates.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let room = match self.max_features {
            Some(max) => max.saturating_sub(self.terms.len()),
            None => candidates.len(),
        };
        for (term, _) in candidates.into_iter().take(room) {
            let index = self.terms.len() as u32;
            self.vocabulary.insert(term.to_string(), index);
            self.terms.push(term.to_string());
        }

        let n = corpus.len() as f32;
        self.idf = self
            .terms
            .iter()
            .map(|term| {
                let df = document_frequency.get(term.as_str()).copied().unwrap_or(0) as f32;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        tracing::debug!(
            "TF-IDF refit over {} documents, vocabulary {}",
            corpus.len(),
            self.terms.len()
        );

        tokenized.iter().map(|tokens| self.weigh(tokens)).collect()
    }

    /// Project `text` onto the current vocabulary; unknown terms are ignored
    pub fn transform(&self, text: &str) -> SparseVector {
        self.weigh(&self.tokenize(text))
    }

    fn weigh(&self, tokens: &[String]) -> SparseVector {
        let mut counts: HashMap<u32, f32> = HashMap::new();
        for token in tokens {
            if let Some(&index) = self.vocabulary.get(token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let pairs = counts
            .into_iter()
            .map(|(index, count)| (index, count * self.idf[index as usize]))
            .collect();
        let mut vector = SparseVector::from_pairs(pairs, self.terms.len());
        vector.normalize();
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorize::sparse_cosine;

    #[test]
    fn test_tokenize() {
        let vectorizer = SparseVectorizer::new(None, true);
        assert_eq!(
            vectorizer.tokenize("What is the Capital of France? A b"),
            vec!["capital", "france"]
        );

        let keep_all = SparseVectorizer::new(None, false);
        assert_eq!(keep_all.tokenize("The cat, a dog"), vec!["the", "cat", "dog"]);
    }

    #[test]
    fn test_paris_ranks_first() {
        let corpus = [
            "Paris is the capital of France.",
            "Rust is a systems programming language.",
            "Bananas are rich in potassium.",
        ];
        let mut vectorizer = SparseVectorizer::default();
        let vectors = vectorizer.fit_transform(&corpus);
        let query = vectorizer.transform("What is the capital of France?");

        let scores: Vec<f32> = vectors.iter().map(|v| sparse_cosine(&query, v)).collect();
        assert!(scores[0] > 0.0);
        assert!(scores[0] > scores[1]);
        assert!(scores[0] > scores[2]);
    }

    #[test]
    fn test_unknown_query_is_zero_vector() {
        let mut vectorizer = SparseVectorizer::default();
        let vectors = vectorizer.fit_transform(&["alpha beta gamma"]);
        let query = vectorizer.transform("zeta omega");

        assert_eq!(query.nnz(), 0);
        assert_eq!(query.dimensions, vectorizer.vocabulary_len());
        assert_eq!(sparse_cosine(&query, &vectors[0]), 0.0);
    }

    #[test]
    fn test_vocabulary_is_monotonic() {
        let mut vectorizer = SparseVectorizer::new(Some(4), true);
        vectorizer.fit_transform(&["alpha alpha beta"]);
        assert!(vectorizer.contains_term("alpha"));
        assert!(vectorizer.contains_term("beta"));
        let alpha = vectorizer.vocabulary["alpha"];

        // "delta" is more frequent than "gamma" and "epsilon", so it is admitted first
        vectorizer.fit_transform(&[
            "alpha alpha beta",
            "delta delta delta gamma epsilon zeta",
        ]);
        assert_eq!(vectorizer.vocabulary_len(), 4);
        assert!(vectorizer.contains_term("alpha"));
        assert!(vectorizer.contains_term("beta"));
        assert!(vectorizer.contains_term("delta"));
        assert!(vectorizer.contains_term("epsilon"));
        assert!(!vectorizer.contains_term("gamma"));
        assert_eq!(vectorizer.vocabulary["alpha"], alpha);

        vectorizer.fit_transform(&["zeta zeta zeta"]);
        assert!(vectorizer.contains_term("alpha"));
        assert_eq!(vectorizer.vocabulary_len(), 4);
    }

    #[test]
    fn test_vectors_change_after_refit() {
        let mut vectorizer = SparseVectorizer::default();
        let first = vectorizer.fit_transform(&["apples oranges"]);
        let second = vectorizer.fit_transform(&["apples oranges", "apples pears"]);

        assert_ne!(first[0], second[0]);
        assert_eq!(second[0].dimensions, 3);
        assert!((second[0].norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_idf_smoothing() {
        let mut vectorizer = SparseVectorizer::new(None, false);
        vectorizer.fit_transform(&["common rare", "common"]);
        let common = vectorizer.vocabulary["common"] as usize;
        let rare = vectorizer.vocabulary["rare"] as usize;

        assert!((vectorizer.idf[common] - 1.0).abs() < 1e-6);
        assert!((vectorizer.idf[rare] - ((3.0f32 / 2.0).ln() + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_repeated_term_counts_once_per_document() {
        let mut vectorizer = SparseVectorizer::new(None, false);
        vectorizer.fit_transform(&["echo echo echo", "echo other"]);
        let echo = vectorizer.vocabulary["echo"] as usize;
        let other = vectorizer.vocabulary["other"] as usize;

        assert_eq!(echo, 0);
        assert!((vectorizer.idf[echo] - 1.0).abs() < 1e-6);
        assert!((vectorizer.idf[other] - ((3.0f32 / 2.0).ln() + 1.0)).abs() < 1e-6);
    }
}
