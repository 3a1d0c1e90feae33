//! Reference Matrix
//!
//! Unit vectors of the domain corpus, stacked row-major as R × D.

use tracing::debug;

use crate::error::{Error, Result};
use crate::vector::{dot_product, UnitVector, VectorStore};

#[derive(Debug, Clone)]
pub struct ReferenceMatrix {
    words: Vec<String>,
    data: Vec<f32>,
    dimension: usize,
}

impl ReferenceMatrix {
    /// Stack the unit vectors of `words` found in `store`.
    ///
    /// Missing words and zero vectors are left out; an empty result is a
    /// configuration error.
    pub fn build<S: AsRef<str>>(store: &VectorStore, words: &[S]) -> Result<Self> {
        let batch = store.vectors_for(words);
        let dimension = store.dimension();

        let mut matrix = Self {
            words: Vec::with_capacity(batch.len()),
            data: Vec::with_capacity(batch.len() * dimension),
            dimension,
        };
        let mut zero = 0usize;
        for (word, vector) in batch.found {
            match UnitVector::new(word, vector) {
                Ok(unit) => {
                    matrix.words.push(word.to_string());
                    matrix.data.extend_from_slice(&unit);
                }
                Err(_) => zero += 1,
            }
        }

        debug!(
            "Reference corpus: {} of {} words embedded ({} missing, {} zero)",
            matrix.words.len(),
            words.len(),
            batch.skipped.len(),
            zero
        );

        if matrix.words.is_empty() {
            return Err(Error::Configuration(
                "reference corpus has no words in the embedding vocabulary".to_string(),
            ));
        }
        Ok(matrix)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Largest inner product of a unit row against every reference vector
    pub fn max_similarity(&self, row: &[f32]) -> f32 {
        self.data
            .chunks_exact(self.dimension)
            .map(|reference| dot_product(reference, row))
            .fold(f32::NEG_INFINITY, f32::max)
    }
}
