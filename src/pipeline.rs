//! Reduction Pipeline
//!
//! Ties the embedding file, the emoji dataset and the artifact cache together:
//! dataset → reference corpus → reduced store (cached or rebuilt).

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;

use crate::emoji::EmojiDataset;
use crate::error::{Error, ReductionStage, Result};
use crate::persistence::{write_atomic, ArtifactKey, ArtifactPaths};
use crate::reduce::{ReducerConfig, SimilarityReducer};
use crate::vector::{word2vec, VectorStore};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Full word2vec embedding file
    pub embeddings: PathBuf,

    /// Directory for cached artifacts
    pub data_dir: PathBuf,

    /// Reduction settings
    pub reducer: ReducerConfig,
}

impl PipelineConfig {
    pub fn new(embeddings: impl Into<PathBuf>) -> Self {
        Self {
            embeddings: embeddings.into(),
            data_dir: PathBuf::from("data"),
            reducer: ReducerConfig::default(),
        }
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_reducer(mut self, reducer: ReducerConfig) -> Self {
        self.reducer = reducer;
        self
    }
}

/// Offline reduction with artifact caching
pub struct Pipeline {
    config: PipelineConfig,
    reducer: SimilarityReducer,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let reducer = SimilarityReducer::new(config.reducer.clone())?;
        Ok(Self { config, reducer })
    }

    /// Artifact locations for `dataset` against the configured embeddings
    pub fn artifact_paths(&self, dataset: &EmojiDataset) -> Result<(ArtifactKey, ArtifactPaths)> {
        let key = ArtifactKey::for_source_file(
            &self.config.embeddings,
            &dataset.corpus(),
            self.config.reducer.threshold,
        )?;
        let paths = ArtifactPaths::new(&self.config.data_dir, &key);
        Ok((key, paths))
    }

    /// Reduced store for `dataset`, loaded from cache when available
    pub fn reduced_store(&self, dataset: &EmojiDataset) -> Result<VectorStore> {
        let (key, paths) = self.artifact_paths(dataset)?;
        if paths.reduced_store.exists() {
            info!("Loading reduced store from {}", paths.reduced_store.display());
            return word2vec::read(&paths.reduced_store);
        }

        let started = Instant::now();
        let store = word2vec::read(&self.config.embeddings)?;

        let corpus = dataset.corpus();
        let max_similarity = self.reducer.compute_max_similarity_to(
            &store,
            &corpus,
            &paths.max_similarity,
            key.similarity(),
        )?;
        let keep = SimilarityReducer::filter_vocabulary(
            &store,
            &max_similarity,
            self.config.reducer.threshold,
        )?;
        let reduced = store.rebuild_subset(&keep);
        info!(
            "Reduced vocabulary from {} to {} words (threshold {})",
            store.len(),
            reduced.len(),
            self.config.reducer.threshold
        );

        save_store(&reduced, &paths.reduced_store)?;
        info!(
            "Saved reduced store to {} in {:?}",
            paths.reduced_store.display(),
            started.elapsed()
        );
        Ok(reduced)
    }
}

fn save_store(store: &VectorStore, path: &Path) -> Result<()> {
    write_atomic(path, |file| {
        let mut writer = BufWriter::new(file);
        word2vec::write_to(store, &mut writer).map_err(|e| match e {
            Error::Io(io) => io,
            other => io::Error::other(other.to_string()),
        })?;
        writer.flush()
    })
    .map_err(|e| Error::exhausted(ReductionStage::PersistStore, None, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emoji::EmojiRecord;
    use tempfile::tempdir;

    fn dataset() -> EmojiDataset {
        EmojiDataset::from_records(vec![
            EmojiRecord::new("cat", "🐱", vec!["kitten".into()]),
            EmojiRecord::new("dog", "🐶", vec![]),
        ])
    }

    fn embeddings(path: &Path) {
        let mut store = VectorStore::new(3);
        store.push("cat", &[1.0, 0.0, 0.0]).unwrap();
        store.push("dog", &[0.0, 2.0, 0.0]).unwrap();
        store.push("kitten", &[0.9, 0.19f32.sqrt(), 0.0]).unwrap();
        store.push("car", &[0.1, 0.1, 0.98f32.sqrt()]).unwrap();
        word2vec::write(&store, path).unwrap();
    }

    #[test]
    fn test_reduced_store_and_cache() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("vectors.bin");
        embeddings(&source);

        let config = PipelineConfig::new(&source)
            .with_data_dir(dir.path().join("cache"))
            .with_reducer(ReducerConfig::default().with_chunk_size(2).with_workers(1));
        let pipeline = Pipeline::new(config).unwrap();
        let dataset = dataset();

        let reduced = pipeline.reduced_store(&dataset).unwrap();
        assert_eq!(reduced.len(), 3);
        assert!(!reduced.contains("car"));

        let (_, paths) = pipeline.artifact_paths(&dataset).unwrap();
        assert!(paths.max_similarity.exists());
        assert!(paths.reduced_store.exists());

        // a cache hit never touches the max similarity buffer
        std::fs::remove_file(&paths.max_similarity).unwrap();
        let cached = pipeline.reduced_store(&dataset).unwrap();
        assert_eq!(cached.words(), reduced.words());
        assert!(!paths.max_similarity.exists());
    }

    #[test]
    fn test_threshold_changes_reduced_artifact() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("vectors.bin");
        embeddings(&source);
        let dataset = dataset();

        let strict = Pipeline::new(
            PipelineConfig::new(&source)
                .with_data_dir(dir.path())
                .with_reducer(ReducerConfig::default().with_threshold(0.95)),
        )
        .unwrap();
        let loose = Pipeline::new(
            PipelineConfig::new(&source)
                .with_data_dir(dir.path())
                .with_reducer(ReducerConfig::default().with_threshold(0.05)),
        )
        .unwrap();

        assert_eq!(strict.reduced_store(&dataset).unwrap().len(), 3);
        assert_eq!(loose.reduced_store(&dataset).unwrap().len(), 4);

        let (strict_key, strict_paths) = strict.artifact_paths(&dataset).unwrap();
        let (loose_key, loose_paths) = loose.artifact_paths(&dataset).unwrap();
        assert_eq!(strict_key.similarity(), loose_key.similarity());
        assert_eq!(strict_paths.max_similarity, loose_paths.max_similarity);
        assert_ne!(strict_paths.reduced_store, loose_paths.reduced_store);
    }

    #[test]
    fn test_missing_embeddings() {
        let dir = tempdir().unwrap();
        let pipeline = Pipeline::new(
            PipelineConfig::new(dir.path().join("absent.bin")).with_data_dir(dir.path()),
        )
        .unwrap();
        assert!(matches!(
            pipeline.reduced_store(&dataset()),
            Err(Error::Io(_))
        ));
    }
}
