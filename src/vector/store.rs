//! Vector Store
//!
//! Word-keyed embedding table. Vectors live in one flat row-major buffer;
//! the word index maps each word to its row.

use hashbrown::{HashMap, HashSet};

use super::similarity::normalize_in_place;
use crate::error::{Error, Result};

/// A borrowed row of the store
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VocabularyEntry<'a> {
    pub word: &'a str,
    pub vector: &'a [f32],
    pub index: usize,
}

/// Result of a batch export
#[derive(Debug, Default)]
pub struct VectorBatch<'a> {
    /// Words found, in request order
    pub found: Vec<(&'a str, &'a [f32])>,
    /// Requested words with no vector
    pub skipped: Vec<String>,
}

impl VectorBatch<'_> {
    pub fn len(&self) -> usize {
        self.found.len()
    }

    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }
}

/// Embedding table keyed by word
#[derive(Debug, Clone, Default)]
pub struct VectorStore {
    dimension: usize,
    words: Vec<String>,
    index: HashMap<String, usize>,
    data: Vec<f32>,
}

impl VectorStore {
    /// Create an empty store for vectors of `dimension` components
    pub fn new(dimension: usize) -> Self {
        Self::with_capacity(dimension, 0)
    }

    pub fn with_capacity(dimension: usize, capacity: usize) -> Self {
        Self {
            dimension,
            words: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            data: Vec::with_capacity(capacity * dimension),
        }
    }

    /// Append an entry and return its index
    pub fn push(&mut self, word: impl Into<String>, vector: &[f32]) -> Result<usize> {
        if vector.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        let word = word.into();
        if self.index.contains_key(&word) {
            return Err(Error::DuplicateWord(word));
        }

        let idx = self.words.len();
        self.index.insert(word.clone(), idx);
        self.words.push(word);
        self.data.extend_from_slice(vector);
        Ok(idx)
    }

    /// Exact, case-sensitive lookup
    pub fn lookup(&self, word: &str) -> Option<&[f32]> {
        self.index.get(word).map(|&i| self.vector(i))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Word at `index`
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn word(&self, index: usize) -> &str {
        &self.words[index]
    }

    /// Vector at `index`
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn vector(&self, index: usize) -> &[f32] {
        let start = index * self.dimension;
        &self.data[start..start + self.dimension]
    }

    /// Contiguous rows `start..end` as one flat slice
    pub fn rows(&self, start: usize, end: usize) -> &[f32] {
        &self.data[start * self.dimension..end * self.dimension]
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn entries(&self) -> impl Iterator<Item = VocabularyEntry<'_>> + '_ {
        self.words.iter().enumerate().map(|(index, word)| VocabularyEntry {
            word,
            vector: self.vector(index),
            index,
        })
    }

    /// Export vectors for `words`, skipping and recording unknown ones
    pub fn vectors_for<'a, I, S>(&'a self, words: I) -> VectorBatch<'a>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut batch = VectorBatch::default();
        for word in words {
            let word = word.as_ref();
            match self.index.get_key_value(word) {
                Some((key, &i)) => batch.found.push((key.as_str(), self.vector(i))),
                None => batch.skipped.push(word.to_string()),
            }
        }
        batch
    }

    /// New store holding only the entries whose word is in `keep`.
    ///
    /// Surviving entries keep their relative order and are re-indexed from 0;
    /// vectors are copied unchanged.
    pub fn rebuild_subset(&self, keep: &HashSet<String>) -> VectorStore {
        let kept = self.words.iter().filter(|w| keep.contains(*w)).count();
        let mut subset = VectorStore::with_capacity(self.dimension, kept);

        for entry in self.entries().filter(|e| keep.contains(e.word)) {
            subset.index.insert(entry.word.to_string(), subset.words.len());
            subset.words.push(entry.word.to_string());
            subset.data.extend_from_slice(entry.vector);
        }

        subset
    }

    /// Unit-normalize every row in place; returns the number of zero rows left as-is
    pub fn normalize(&mut self) -> usize {
        if self.dimension == 0 {
            return self.len();
        }
        self.data
            .chunks_exact_mut(self.dimension)
            .map(|row| normalize_in_place(row))
            .filter(|normalized| !normalized)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::similarity::magnitude;

    fn sample() -> VectorStore {
        let mut store = VectorStore::new(3);
        store.push("cat", &[3.0, 4.0, 0.0]).unwrap();
        store.push("dog", &[0.0, 2.0, 0.0]).unwrap();
        store.push("car", &[1.0, 1.0, 1.0]).unwrap();
        store.push("Cat", &[0.0, 0.0, 9.0]).unwrap();
        store
    }

    #[test]
    fn test_lookup_is_exact() {
        let store = sample();
        assert_eq!(store.lookup("cat"), Some(&[3.0, 4.0, 0.0][..]));
        assert_eq!(store.lookup("Cat"), Some(&[0.0, 0.0, 9.0][..]));
        assert!(store.lookup("CAT").is_none());
        assert!(store.lookup(" cat").is_none());
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_push_validation() {
        let mut store = sample();
        assert!(matches!(
            store.push("bird", &[1.0, 2.0]),
            Err(Error::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert!(matches!(store.push("cat", &[1.0, 1.0, 1.0]), Err(Error::DuplicateWord(_))));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_vectors_for_records_skipped() {
        let store = sample();
        let batch = store.vectors_for(["dog", "unicorn", "cat", "yeti"]);
        let words: Vec<&str> = batch.found.iter().map(|(w, _)| *w).collect();
        assert_eq!(words, vec!["dog", "cat"]);
        assert_eq!(batch.skipped, vec!["unicorn".to_string(), "yeti".to_string()]);
    }

    #[test]
    fn test_rebuild_subset() {
        let store = sample();
        let keep: HashSet<String> = ["car", "cat", "missing"].iter().map(|s| s.to_string()).collect();
        let subset = store.rebuild_subset(&keep);

        assert_eq!(subset.words(), &["cat".to_string(), "car".to_string()]);
        assert_eq!(subset.index_of("cat"), Some(0));
        assert_eq!(subset.index_of("car"), Some(1));
        assert_eq!(subset.lookup("car"), store.lookup("car"));
        assert!(subset.lookup("dog").is_none());

        // original untouched
        assert_eq!(store.len(), 4);
        assert_eq!(store.index_of("car"), Some(2));
    }

    #[test]
    fn test_rebuild_subset_idempotent() {
        let store = sample();
        let keep: HashSet<String> = ["dog", "Cat"].iter().map(|s| s.to_string()).collect();
        let once = store.rebuild_subset(&keep);
        let twice = once.rebuild_subset(&keep);

        assert_eq!(once.words(), twice.words());
        for entry in once.entries() {
            assert_eq!(twice.lookup(entry.word), Some(entry.vector));
            assert_eq!(twice.index_of(entry.word), Some(entry.index));
        }
    }

    #[test]
    fn test_normalize_norms() {
        let mut store = sample();
        assert!((magnitude(store.lookup("cat").unwrap()) - 5.0).abs() < 1e-6);
        assert!((magnitude(store.lookup("Cat").unwrap()) - 9.0).abs() < 1e-6);

        store.push("void", &[0.0, 0.0, 0.0]).unwrap();
        let zeros = store.normalize();
        assert_eq!(zeros, 1);

        for entry in store.entries().filter(|e| e.word != "void") {
            assert!((magnitude(entry.vector) - 1.0).abs() < 1e-5, "{}", entry.word);
        }
        assert_eq!(store.lookup("void"), Some(&[0.0, 0.0, 0.0][..]));
    }
}
