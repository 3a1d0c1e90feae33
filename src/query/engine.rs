//! Query Engine
//!
//! Ranks every representative word against a query vector, then turns the
//! best representatives into distinct emoji. Representatives whose category
//! is small are emitted by score; large categories only fill the slots that
//! remain, smallest first.

use std::cmp::Ordering;
use std::sync::Arc;

use hashbrown::HashSet;
use tracing::{debug, info};

use super::config::QueryConfig;
use crate::emoji::{Category, CorpusIndex, EmojiDataset, LabelFormat};
use crate::error::{Error, Result};
use crate::vector::{dot_product, UnitVector, VectorStore};

/// One emitted emoji with the score of the representative that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMatch {
    pub emoji_id: String,
    pub score: f32,
}

/// Immutable query engine; share it behind an `Arc`
pub struct QueryEngine {
    store: Arc<VectorStore>,
    index: CorpusIndex,
    /// R × D unit vectors, one row per representative
    vectors: Vec<f32>,
    dimension: usize,
    config: QueryConfig,
}

impl QueryEngine {
    pub fn new(store: Arc<VectorStore>, index: CorpusIndex, config: QueryConfig) -> Result<Self> {
        if index.is_empty() {
            return Err(Error::Configuration(
                "no emoji words in the vocabulary; nothing to rank against".to_string(),
            ));
        }

        let dimension = store.dimension();
        let mut vectors = Vec::with_capacity(index.len() * dimension);
        for word in index.words() {
            let vector = store.lookup(word).ok_or_else(|| {
                Error::Configuration(format!("representative '{word}' missing from the store"))
            })?;
            let unit = UnitVector::new(word, vector).map_err(|_| {
                Error::Configuration(format!("representative '{word}' has a zero vector"))
            })?;
            vectors.extend_from_slice(&unit);
        }

        info!(
            "Query engine ready: {} representatives, dimension {}",
            index.len(),
            dimension
        );
        Ok(Self {
            store,
            index,
            vectors,
            dimension,
            config,
        })
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Number of representatives
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Up to `n` distinct emoji for `word`
    pub fn query(&self, word: &str, n: usize) -> Result<Vec<RankedMatch>> {
        let vector = self
            .store
            .lookup(word)
            .ok_or_else(|| Error::UnknownWord(word.to_string()))?;
        let query = UnitVector::new(word, vector)?;
        if n == 0 {
            return Ok(Vec::new());
        }

        let scores = self.scores(&query);
        let top = top_k(&scores, n);

        let (small, mut large): (Vec<usize>, Vec<usize>) = top
            .into_iter()
            .partition(|&i| self.index.category_at(i).len() < self.config.category_length);
        large.sort_by_key(|&i| self.index.category_at(i).len());

        let emittable: usize = small
            .iter()
            .chain(large.iter())
            .map(|&i| self.index.category_at(i).len())
            .sum();
        let mut emitter = Emitter::new(n, emittable);
        for &i in small.iter().chain(large.iter()) {
            if emitter.emit(self.index.category_at(i), scores[i]) {
                break;
            }
        }

        debug!(
            "Query '{}': {} results ({} small, {} large candidates)",
            word,
            emitter.matches.len(),
            small.len(),
            large.len()
        );
        Ok(emitter.matches)
    }

    /// Like [`query`](Self::query), but words that cannot be queried give no matches
    pub fn lookup_matches(&self, word: &str, n: usize) -> Vec<RankedMatch> {
        match self.query(word, n) {
            Ok(matches) => matches,
            Err(e) => {
                debug!("No matches for '{}': {}", word, e);
                Vec::new()
            }
        }
    }

    /// Labels for `matches`; ids missing from `dataset` are labelled by id
    pub fn render(
        dataset: &EmojiDataset,
        matches: &[RankedMatch],
        format: LabelFormat,
    ) -> Vec<(String, f32)> {
        matches
            .iter()
            .map(|m| {
                let label = dataset
                    .get(&m.emoji_id)
                    .map(|record| record.label(format))
                    .unwrap_or(m.emoji_id.as_str());
                (label.to_string(), m.score)
            })
            .collect()
    }

    fn scores(&self, query: &[f32]) -> Vec<f32> {
        self.vectors
            .chunks_exact(self.dimension)
            .map(|rep| dot_product(rep, query))
            .collect()
    }
}

/// Indices of the `n` best scores, best first.
///
/// Score descending, then index ascending, so equal scores keep
/// representative order.
fn top_k(scores: &[f32], n: usize) -> Vec<usize> {
    let by_rank = |a: &usize, b: &usize| {
        scores[*b]
            .partial_cmp(&scores[*a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(b))
    };

    let mut indices: Vec<usize> = (0..scores.len()).collect();
    let k = n.min(indices.len());
    if k < indices.len() {
        indices.select_nth_unstable_by(k - 1, by_rank);
        indices.truncate(k);
    }
    indices.sort_unstable_by(by_rank);
    indices
}

struct Emitter {
    limit: usize,
    seen: HashSet<String>,
    matches: Vec<RankedMatch>,
}

impl Emitter {
    /// `emittable` bounds the ids the candidate categories can yield
    fn new(limit: usize, emittable: usize) -> Self {
        let capacity = limit.min(emittable);
        Self {
            limit,
            seen: HashSet::with_capacity(capacity),
            matches: Vec::with_capacity(capacity),
        }
    }

    /// Emit unseen ids of `category`; true once the limit is reached
    fn emit(&mut self, category: &Category, score: f32) -> bool {
        for id in category.ids() {
            if self.matches.len() >= self.limit {
                break;
            }
            if self.seen.insert(id.clone()) {
                self.matches.push(RankedMatch {
                    emoji_id: id.clone(),
                    score,
                });
            }
        }
        self.matches.len() >= self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emoji::{CorpusIndexer, EmojiRecord};

    fn record(id: &str, keywords: &[&str]) -> EmojiRecord {
        EmojiRecord::new(id, id, keywords.iter().map(|k| k.to_string()).collect())
    }

    /// "smile" names 😀 only; "grin" is a keyword of 8 emoji including 😀
    fn faces() -> (Arc<VectorStore>, EmojiDataset) {
        let mut records = vec![record("grinning", &["smile", "grin"])];
        for i in 2..=8 {
            records.push(record(&format!("g{i}"), &["grin"]));
        }
        let dataset = EmojiDataset::from_records(records);

        let mut store = VectorStore::new(2);
        store.push("smile", &[1.0, 0.0]).unwrap();
        store.push("grin", &[0.8, 0.6]).unwrap();
        store.push("happy", &[0.95, 0.05]).unwrap();
        (Arc::new(store), dataset)
    }

    fn engine(store: Arc<VectorStore>, dataset: &EmojiDataset) -> QueryEngine {
        let index = CorpusIndexer::build(dataset, &store);
        QueryEngine::new(store, index, QueryConfig::default()).unwrap()
    }

    fn ids(matches: &[RankedMatch]) -> Vec<&str> {
        matches.iter().map(|m| m.emoji_id.as_str()).collect()
    }

    #[test]
    fn test_small_first_then_large_fallback() {
        let (store, dataset) = faces();
        let engine = engine(store, &dataset);

        let matches = engine.query("happy", 3).unwrap();
        assert_eq!(ids(&matches), vec!["grinning", "g2", "g3"]);
        assert!(matches[0].score > matches[1].score);
        assert_eq!(matches[1].score, matches[2].score);
    }

    #[test]
    fn test_large_categories_by_size() {
        let mut records = Vec::new();
        for i in 0..10 {
            records.push(record(&format!("wide{i}"), &["wide"]));
        }
        for i in 0..8 {
            records.push(record(&format!("narrow{i}"), &["narrow"]));
        }
        let dataset = EmojiDataset::from_records(records);

        let mut store = VectorStore::new(2);
        store.push("wide", &[1.0, 0.0]).unwrap();
        store.push("narrow", &[0.6, 0.8]).unwrap();
        let engine = engine(Arc::new(store), &dataset);

        // "wide" scores higher but "narrow" is the smaller large category
        let matches = engine.query("wide", 2).unwrap();
        assert_eq!(ids(&matches), vec!["narrow0", "narrow1"]);
    }

    #[test]
    fn test_distinct_and_bounded() {
        let (store, dataset) = faces();
        let engine = engine(store, &dataset);

        for n in 0..12 {
            let matches = engine.query("grin", n).unwrap();
            assert!(matches.len() <= n);
            let unique: HashSet<&str> = ids(&matches).into_iter().collect();
            assert_eq!(unique.len(), matches.len());
        }
        assert_eq!(engine.query("grin", 20).unwrap().len(), 8);
    }

    #[test]
    fn test_unbounded_count_returns_every_id() {
        let (store, dataset) = faces();
        let engine = engine(store, &dataset);

        let matches = engine.query("grin", usize::MAX).unwrap();
        let unique: HashSet<&str> = ids(&matches).into_iter().collect();
        assert_eq!(matches.len(), 8);
        assert_eq!(unique.len(), 8);
    }

    #[test]
    fn test_self_query_ranks_first() {
        let (store, dataset) = faces();
        let engine = engine(store, &dataset);

        let matches = engine.query("smile", 1).unwrap();
        assert_eq!(ids(&matches), vec!["grinning"]);
        assert!((matches[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ties_keep_representative_order() {
        let dataset = EmojiDataset::from_records(vec![
            record("first", &[]),
            record("second", &[]),
            record("third", &[]),
        ]);
        let mut store = VectorStore::new(2);
        store.push("third", &[0.0, 1.0]).unwrap();
        store.push("second", &[0.0, 3.0]).unwrap();
        store.push("first", &[0.0, 2.0]).unwrap();
        store.push("up", &[0.0, 1.0]).unwrap();
        let engine = engine(Arc::new(store), &dataset);

        let matches = engine.query("up", 2).unwrap();
        assert_eq!(ids(&matches), vec!["first", "second"]);
    }

    #[test]
    fn test_unknown_word() {
        let (store, dataset) = faces();
        let engine = engine(store, &dataset);

        assert!(matches!(
            engine.query("zzzz", 3),
            Err(Error::UnknownWord(w)) if w == "zzzz"
        ));
        assert!(engine.lookup_matches("zzzz", 3).is_empty());
    }

    #[test]
    fn test_empty_index_rejected() {
        let store = Arc::new(VectorStore::new(2));
        let result = QueryEngine::new(store, CorpusIndex::default(), QueryConfig::default());
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_zero_representative_rejected() {
        let dataset = EmojiDataset::from_records(vec![record("blank", &[])]);
        let mut store = VectorStore::new(2);
        store.push("blank", &[0.0, 0.0]).unwrap();
        let store = Arc::new(store);
        let index = CorpusIndexer::build(&dataset, &store);
        assert!(QueryEngine::new(store, index, QueryConfig::default()).is_err());
    }

    #[test]
    fn test_render_labels() {
        let dataset = EmojiDataset::from_records(vec![
            EmojiRecord::new("grinning", "😀", vec![]).with_short_name("grinning_face"),
            EmojiRecord::new("cat", "🐱", vec![]),
        ]);
        let matches = vec![
            RankedMatch {
                emoji_id: "grinning".into(),
                score: 0.9,
            },
            RankedMatch {
                emoji_id: "cat".into(),
                score: 0.5,
            },
            RankedMatch {
                emoji_id: "ghost".into(),
                score: 0.1,
            },
        ];

        let chars = QueryEngine::render(&dataset, &matches, LabelFormat::Char);
        assert_eq!(chars[0], ("😀".to_string(), 0.9));
        let names = QueryEngine::render(&dataset, &matches, LabelFormat::Name);
        assert_eq!(names[0].0, "grinning_face");
        assert_eq!(names[1].0, "cat");
        assert_eq!(names[2].0, "ghost");
    }

    #[test]
    fn test_top_k() {
        let scores = [0.1, 0.9, 0.5, 0.9, -1.0];
        assert_eq!(top_k(&scores, 3), vec![1, 3, 2]);
        assert_eq!(top_k(&scores, 10), vec![1, 3, 2, 0, 4]);
        assert_eq!(top_k(&scores, 1), vec![1]);
    }
}
