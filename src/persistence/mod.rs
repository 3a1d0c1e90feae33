//! Persistence Module
//!
//! On-disk artifacts of the offline reduction: the resumable max-similarity
//! buffer and the cache naming that lets a valid artifact skip recomputation.

mod artifacts;
mod max_similarity;

pub use artifacts::{source_identity, write_atomic, ArtifactKey, ArtifactPaths, Fingerprint};
pub use max_similarity::MaxSimilarityFile;
