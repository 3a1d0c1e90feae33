//! Offline vocabulary reduction
//!
//! Shrinks a general-purpose embedding vocabulary to the words that are
//! close to the emoji corpus.

mod config;
mod reducer;
mod reference;

pub use config::{ReducerConfig, DEFAULT_CHUNK_SIZE, DEFAULT_THRESHOLD};
pub use reducer::{MaxSimilarity, SimilarityReducer};
pub use reference::ReferenceMatrix;
