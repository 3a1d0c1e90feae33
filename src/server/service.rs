//! Query Service
//!
//! What both network surfaces share: the engine, the dataset used for
//! labels, and the metrics.

use std::sync::Arc;

use tracing::debug;

use crate::emoji::{EmojiDataset, LabelFormat};
use crate::error::Error;
use crate::metrics::Metrics;
use crate::query::QueryEngine;

#[derive(Clone)]
pub struct QueryService {
    engine: Arc<QueryEngine>,
    dataset: Arc<EmojiDataset>,
    metrics: Arc<Metrics>,
}

impl QueryService {
    pub fn new(engine: Arc<QueryEngine>, dataset: Arc<EmojiDataset>) -> Self {
        Self {
            engine,
            dataset,
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Labelled matches for `word`, or `None` when the word cannot be queried.
    ///
    /// A missing `count` uses the engine's default.
    pub fn answer(
        &self,
        word: &str,
        count: Option<usize>,
        format: LabelFormat,
    ) -> Option<Vec<(String, f32)>> {
        let n = count.unwrap_or(self.engine.config().default_results);
        match self.engine.query(word, n) {
            Ok(matches) => Some(QueryEngine::render(&self.dataset, &matches, format)),
            Err(e @ Error::UnknownWord(_)) | Err(e @ Error::ZeroVector(_)) => {
                self.metrics.record_unknown_word();
                debug!("{}", e);
                None
            }
            Err(e) => {
                debug!("Query for '{}' failed: {}", word, e);
                None
            }
        }
    }
}
