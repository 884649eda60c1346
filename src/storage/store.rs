//! Embedding Store
//!
//! Vocabulary of word vectors with exact nearest-neighbor queries.

use hashbrown::{HashMap, HashSet};
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::vector::cosine_similarity;

/// A single lookup hit
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Neighbor word
    pub word: String,
    /// Cosine similarity to the query word
    pub score: f64,
}

impl QueryResult {
    #[inline]
    fn outranks(&self, other: &QueryResult) -> bool {
        ranks_above(self.score, &self.word, other)
    }
}

/// Higher score wins; equal scores go to the lexicographically smaller word.
#[inline]
fn ranks_above(score: f64, word: &str, other: &QueryResult) -> bool {
    score > other.score || (score == other.score && word < other.word.as_str())
}

/// In-memory word -> vector mapping
///
/// `dimension` is recorded, not derived: every insert overwrites it with the
/// inserted vector's length. Consistency across the vocabulary is only checked
/// by [`EmbeddingStore::validate_dimensions`].
#[derive(Debug, Clone, Default)]
pub struct EmbeddingStore {
    vocab: HashMap<String, Vec<f64>>,
    dimension: usize,
}

impl EmbeddingStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store sized for `capacity` words
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vocab: HashMap::with_capacity(capacity),
            dimension: 0,
        }
    }

    /// Declared vector length
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn set_dimension(&mut self, dimension: usize) {
        self.dimension = dimension;
    }

    /// Insert or replace a word's vector, returning the previous one
    pub fn insert(&mut self, word: impl Into<String>, vector: Vec<f64>) -> Option<Vec<f64>> {
        self.dimension = vector.len();
        self.vocab.insert(word.into(), vector)
    }

    /// Get a word's vector
    pub fn get(&self, word: &str) -> Option<&[f64]> {
        self.vocab.get(word).map(Vec::as_slice)
    }

    /// Check if word exists
    pub fn contains(&self, word: &str) -> bool {
        self.vocab.contains_key(word)
    }

    /// Remove a word, returns its vector if it existed
    pub fn remove(&mut self, word: &str) -> Option<Vec<f64>> {
        self.vocab.remove(word)
    }

    /// Get number of words
    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }

    /// All words, sorted
    pub fn words(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self.vocab.keys().map(String::as_str).collect();
        words.sort_unstable();
        words
    }

    /// Iterate entries in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.vocab.iter().map(|(w, v)| (w.as_str(), v.as_slice()))
    }

    /// Entries sorted by word
    pub fn sorted_entries(&self) -> Vec<(&str, &[f64])> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Check that every vector has the declared dimension.
    /// An empty store is trivially valid.
    pub fn validate_dimensions(&self) -> bool {
        self.vocab.values().all(|v| v.len() == self.dimension)
    }

    /// Find the `k` words most similar to `word`, best first.
    ///
    /// Returns `None` if `word` is not in the vocabulary. The query word is never
    /// part of its own result, so at most `len() - 1` results come back.
    /// Candidates whose vector length differs from the query's are skipped.
    pub fn lookup(&self, word: &str, k: usize) -> Option<Vec<QueryResult>> {
        let query = self.vocab.get(word)?;

        let limit = k.min(self.vocab.len().saturating_sub(1));
        let mut results: Vec<QueryResult> = Vec::with_capacity(limit);
        if limit == 0 {
            return Some(results);
        }

        for (candidate, vector) in &self.vocab {
            if candidate == word || vector.len() != query.len() {
                continue;
            }

            let score = cosine_similarity(query, vector);
            if score.is_nan() {
                continue;
            }

            if results.len() == limit {
                if !ranks_above(score, candidate, &results[limit - 1]) {
                    continue;
                }
                results.pop();
            }
            let hit = QueryResult {
                word: candidate.clone(),
                score,
            };
            results.push(hit);

            // Bubble the new entry up to its sorted slot
            let mut i = results.len() - 1;
            while i > 0 && results[i].outranks(&results[i - 1]) {
                results.swap(i, i - 1);
                i -= 1;
            }
        }

        Some(results)
    }

    /// Cosine similarity between two words.
    /// `None` if either is missing or their vector lengths differ.
    pub fn compare(&self, a: &str, b: &str) -> Option<f64> {
        let va = self.vocab.get(a)?;
        let vb = self.vocab.get(b)?;
        if va.len() != vb.len() {
            return None;
        }
        Some(cosine_similarity(va, vb))
    }

    /// Drop every word that is not in `keep`.
    ///
    /// `None` is rejected and returns false. An empty set is valid and
    /// empties the store. Words in `keep` that are not in the vocabulary are
    /// ignored.
    pub fn prune<S: AsRef<str>>(&mut self, keep: Option<&[S]>) -> bool {
        let Some(keep) = keep else {
            return false;
        };

        let keep: HashSet<&str> = keep.iter().map(AsRef::as_ref).collect();
        let before = self.vocab.len();
        self.vocab.retain(|word, _| keep.contains(word.as_str()));

        debug!(
            removed = before - self.vocab.len(),
            remaining = self.vocab.len(),
            "Pruned vocabulary"
        );
        true
    }

    /// Save the store as a text model at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::persistence::save(self, path)
    }
}
