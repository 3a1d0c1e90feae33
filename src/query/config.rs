//! Query Configuration

/// Categories with at least this many emoji only fill leftover slots
pub const DEFAULT_CATEGORY_LENGTH: usize = 8;

/// Results per query when the caller does not ask for a count
pub const DEFAULT_RESULTS: usize = 10;

#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Size at which a category counts as large
    pub category_length: usize,

    /// Default result count
    pub default_results: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            category_length: DEFAULT_CATEGORY_LENGTH,
            default_results: DEFAULT_RESULTS,
        }
    }
}

impl QueryConfig {
    pub fn with_category_length(mut self, length: usize) -> Self {
        self.category_length = length;
        self
    }

    pub fn with_default_results(mut self, n: usize) -> Self {
        self.default_results = n;
        self
    }
}
