//! Online emoji queries

mod config;
mod engine;

pub use config::{QueryConfig, DEFAULT_CATEGORY_LENGTH, DEFAULT_RESULTS};
pub use engine::{QueryEngine, RankedMatch};
