//! Vector Module
//!
//! Embedding storage, the word2vec file codec and similarity primitives.

mod similarity;
mod store;
pub mod word2vec;

pub use similarity::{
    cosine_similarity, dot_product, magnitude, normalize_in_place, normalize_into, UnitVector,
    UNIT_EPSILON,
};
pub use store::{VectorBatch, VectorStore, VocabularyEntry};
