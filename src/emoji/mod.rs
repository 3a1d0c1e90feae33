//! Emoji Module
//!
//! The emoji dataset and the word -> emoji category index built over it.

mod dataset;
mod index;

pub use dataset::{EmojiDataset, EmojiRecord, LabelFormat};
pub use index::{Category, CorpusIndex, CorpusIndexer};
