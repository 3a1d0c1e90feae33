//! Reducer Configuration

use crate::error::{Error, Result};

/// Default minimum similarity for a word to survive the reduction
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Default number of vocabulary rows per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Reducer configuration
#[derive(Debug, Clone)]
pub struct ReducerConfig {
    /// Words whose max similarity is below this are dropped
    pub threshold: f32,

    /// Rows per chunk
    pub chunk_size: usize,

    /// Worker threads (0 = auto-detect)
    pub workers: usize,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: 0,
        }
    }
}

impl ReducerConfig {
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Worker count with auto-detection resolved
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::Configuration(format!(
                "threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }
        if self.chunk_size == 0 {
            return Err(Error::Configuration("chunk size must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(ReducerConfig::default().validate().is_ok());
        assert!(ReducerConfig::default().with_threshold(1.5).validate().is_err());
        assert!(ReducerConfig::default().with_threshold(f32::NAN).validate().is_err());
        assert!(ReducerConfig::default().with_chunk_size(0).validate().is_err());
        assert!(ReducerConfig::default().with_workers(3).effective_workers() == 3);
    }
}
