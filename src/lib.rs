//! emojimatch - word-embedding emoji matcher
//!
//! An offline reducer shrinks a large word2vec vocabulary to the words close
//! to the emoji corpus; a query engine then maps a word to distinct emoji,
//! served over a framed binary protocol (EMJ) and HTTP.

pub mod emoji;
pub mod error;
pub mod metrics;
pub mod persistence;
pub mod pipeline;
pub mod protocol;
pub mod query;
pub mod reduce;
pub mod server;
pub mod vector;

pub use emoji::{Category, CorpusIndex, CorpusIndexer, EmojiDataset, EmojiRecord, LabelFormat};
pub use error::{Error, ReductionStage, Result};
pub use metrics::Metrics;
pub use pipeline::{Pipeline, PipelineConfig};
pub use protocol::{Command, EmjCodec, Frame, Response};
pub use query::{QueryConfig, QueryEngine, RankedMatch};
pub use reduce::{MaxSimilarity, ReducerConfig, SimilarityReducer};
pub use server::{Config, Server};
pub use vector::{UnitVector, VectorStore};
