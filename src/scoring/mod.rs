//! Transaction anomaly scoring components

pub mod aggregator;
pub mod rules;
pub mod scorer;

pub use aggregator::ScoreAggregator;
pub use rules::{HourWindow, RuleSet};
pub use scorer::{AnomalyScorer, Assessment};
