//! Scoring configuration and answer aggregation.

pub mod aggregator;
pub mod table;

pub use aggregator::{accumulate, resolve, AggregationEngine};
pub use table::{CategoryRegistry, OptionScores, ScoringConfig, ScoringTable};
