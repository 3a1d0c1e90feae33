//! Similarity Reducer
//!
//! Computes, for every vocabulary row, the maximum cosine similarity to the
//! reference corpus without ever materializing a V × R matrix. Rows are
//! processed in chunks of `chunk_size`; each chunk is normalized into its own
//! C × D buffer, so peak memory is O(workers · C · D) plus the V-length output.

use std::path::{Path, PathBuf};

use hashbrown::HashSet;
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info, warn};

use super::config::ReducerConfig;
use super::reference::ReferenceMatrix;
use crate::error::{Error, ReductionStage, Result};
use crate::persistence::{Fingerprint, MaxSimilarityFile};
use crate::vector::{normalize_into, VectorStore};

/// Max similarity per vocabulary row, aligned with store indices
#[derive(Debug, Clone, PartialEq)]
pub struct MaxSimilarity {
    values: Vec<f32>,
}

impl MaxSimilarity {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    /// Value for `word` when this buffer was computed over `store`
    pub fn for_word(&self, store: &VectorStore, word: &str) -> Option<f32> {
        store.index_of(word).and_then(|i| self.get(i))
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Offline vocabulary reducer
pub struct SimilarityReducer {
    config: ReducerConfig,
    pool: ThreadPool,
}

impl SimilarityReducer {
    pub fn new(config: ReducerConfig) -> Result<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.effective_workers())
            .thread_name(|i| format!("reduce-{i}"))
            .build()
            .map_err(|e| Error::Configuration(format!("cannot start reducer workers: {e}")))?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    /// Max similarity of every store row to the reference words, in memory
    pub fn compute_max_similarity<S: AsRef<str>>(
        &self,
        store: &VectorStore,
        reference_words: &[S],
    ) -> Result<MaxSimilarity> {
        let reference = ReferenceMatrix::build(store, reference_words)?;
        info!(
            "Computing max similarity of {} words against {} reference words",
            store.len(),
            reference.len()
        );

        let mut values = vec![0f32; store.len()];
        self.pool
            .install(|| fill_rows(store, &reference, 0, self.config.chunk_size, &mut values));
        Ok(MaxSimilarity::new(values))
    }

    /// Same as [`compute_max_similarity`](Self::compute_max_similarity), but
    /// backed by a memory-mapped file at `path`.
    ///
    /// A finished file for the same `fingerprint` is returned directly. An
    /// interrupted run (left at `path` + `.partial`) resumes from its last
    /// flushed wave.
    pub fn compute_max_similarity_to<S: AsRef<str>>(
        &self,
        store: &VectorStore,
        reference_words: &[S],
        path: &Path,
        fingerprint: Fingerprint,
    ) -> Result<MaxSimilarity> {
        if path.exists() {
            match MaxSimilarityFile::load(path, store.len(), fingerprint) {
                Ok(values) => {
                    info!("Reusing max similarity buffer {}", path.display());
                    return Ok(MaxSimilarity::new(values));
                }
                Err(Error::InvalidArtifact { reason, .. }) => {
                    warn!("Recomputing {}: {}", path.display(), reason);
                }
                Err(e) => return Err(e),
            }
        }

        let reference = ReferenceMatrix::build(store, reference_words)?;
        let partial = partial_path(path);
        let mut buffer = MaxSimilarityFile::create_or_resume(&partial, store.len(), fingerprint)?;

        let chunk_size = self.config.chunk_size;
        let wave_rows = chunk_size * self.pool.current_num_threads().max(1);
        let total = store.len();
        let mut start = buffer.completed_rows();
        if start > 0 {
            info!("Resuming max similarity at row {}/{}", start, total);
        } else {
            info!(
                "Computing max similarity of {} words against {} reference words",
                total,
                reference.len()
            );
        }

        let mut wave = Vec::with_capacity(wave_rows.min(total));
        while start < total {
            let end = (start + wave_rows).min(total);
            wave.clear();
            wave.resize(end - start, 0.0);

            self.pool
                .install(|| fill_rows(store, &reference, start, chunk_size, &mut wave));
            buffer.write_rows(start, &wave);
            buffer
                .commit(end)
                .map_err(|e| Error::exhausted(ReductionStage::Flush, Some(start / chunk_size), e))?;

            debug!("Flushed rows {}..{} of {}", start, end, total);
            start = end;
        }

        let values = buffer.finish(path)?;
        info!("Saved max similarity buffer to {}", path.display());
        Ok(MaxSimilarity::new(values))
    }

    /// Words whose max similarity reaches `threshold`
    pub fn filter_vocabulary(
        store: &VectorStore,
        max_similarity: &MaxSimilarity,
        threshold: f32,
    ) -> Result<HashSet<String>> {
        if max_similarity.len() != store.len() {
            return Err(Error::Configuration(format!(
                "max similarity buffer has {} rows, store has {}",
                max_similarity.len(),
                store.len()
            )));
        }

        Ok(store
            .entries()
            .zip(max_similarity.values())
            .filter(|(_, sim)| **sim >= threshold)
            .map(|(entry, _)| entry.word.to_string())
            .collect())
    }

    /// Compute, filter with the configured threshold and rebuild the store
    pub fn reduce<S: AsRef<str>>(
        &self,
        store: &VectorStore,
        reference_words: &[S],
    ) -> Result<VectorStore> {
        let max_similarity = self.compute_max_similarity(store, reference_words)?;
        let keep = Self::filter_vocabulary(store, &max_similarity, self.config.threshold)?;
        let reduced = store.rebuild_subset(&keep);
        info!(
            "Reduced vocabulary from {} to {} words (threshold {})",
            store.len(),
            reduced.len(),
            self.config.threshold
        );
        Ok(reduced)
    }
}

/// Fill `out` with max similarities for rows `first_row..first_row + out.len()`
fn fill_rows(
    store: &VectorStore,
    reference: &ReferenceMatrix,
    first_row: usize,
    chunk_size: usize,
    out: &mut [f32],
) {
    let dimension = store.dimension();
    out.par_chunks_mut(chunk_size)
        .enumerate()
        .for_each(|(chunk, values)| {
            let start = first_row + chunk * chunk_size;
            let rows = store.rows(start, start + values.len());

            let mut normalized = vec![0f32; values.len() * dimension];
            for ((value, src), dst) in values
                .iter_mut()
                .zip(rows.chunks_exact(dimension))
                .zip(normalized.chunks_exact_mut(dimension))
            {
                *value = if normalize_into(src, dst) {
                    reference.max_similarity(dst)
                } else {
                    0.0
                };
            }
        });
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}
