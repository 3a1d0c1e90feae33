//! Error Types
//!
//! One error enum for the library; binaries wrap it in `anyhow`.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Stage of the offline reduction in which a resource failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionStage {
    /// Creating or sizing the max-similarity buffer file
    AllocateBuffer,
    /// Mapping the buffer file into memory
    MapBuffer,
    /// Flushing a wave of chunks to disk
    Flush,
    /// Writing the reduced store
    PersistStore,
}

impl fmt::Display for ReductionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReductionStage::AllocateBuffer => write!(f, "allocate-buffer"),
            ReductionStage::MapBuffer => write!(f, "map-buffer"),
            ReductionStage::Flush => write!(f, "flush"),
            ReductionStage::PersistStore => write!(f, "persist-store"),
        }
    }
}

/// Errors produced by emojimatch
#[derive(Error, Debug)]
pub enum Error {
    /// Query word is not in the vocabulary
    #[error("Unknown word: '{0}'")]
    UnknownWord(String),

    /// Vector has zero norm and cannot be normalized
    #[error("Zero vector for '{0}' cannot be normalized")]
    ZeroVector(String),

    /// Fatal startup misconfiguration
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Duplicate word in vector store: '{0}'")]
    DuplicateWord(String),

    /// Disk or memory exhaustion during the offline reduction
    #[error("Resource exhausted during {stage}{}: {source}", chunk_suffix(.chunk))]
    ResourceExhausted {
        stage: ReductionStage,
        chunk: Option<usize>,
        #[source]
        source: io::Error,
    },

    /// Malformed emoji record
    #[error("Dataset inconsistency in record '{id}': {reason}")]
    DatasetInconsistency { id: String, reason: String },

    /// On-disk artifact is unreadable or belongs to other inputs
    #[error("Invalid artifact '{path}': {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error only concerns a single request
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnknownWord(_) | Error::ZeroVector(_) | Error::DatasetInconsistency { .. }
        )
    }

    pub(crate) fn exhausted(stage: ReductionStage, chunk: Option<usize>, source: io::Error) -> Self {
        Error::ResourceExhausted {
            stage,
            chunk,
            source,
        }
    }
}

fn chunk_suffix(chunk: &Option<usize>) -> String {
    chunk.map(|c| format!(" at chunk {c}")).unwrap_or_default()
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
