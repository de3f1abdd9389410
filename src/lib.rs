//! Transaction Anomaly Scorer
//!
//! Scores a transaction against a user's historical spending baseline:
//! amount z-score, time-of-day, location and merchant-category checks,
//! combined into a bounded risk score and a LOW/MEDIUM/HIGH tier.

pub mod baseline_builder;
pub mod config;
pub mod consumer;
pub mod error;
pub mod metrics;
pub mod producer;
pub mod provider;
pub mod scoring;
pub mod service;
pub mod types;

pub use baseline_builder::BaselineBuilder;
pub use config::AppConfig;
pub use error::ScoringError;
pub use provider::{BaselineProvider, HistoryBaselineProvider, InMemoryBaselineStore};
pub use scoring::{AnomalyScorer, Assessment};
pub use service::ScoringService;
pub use types::{
    AnomalyFlag, HistoricalTransaction, RiskReport, RiskTier, Transaction, TransactionBaseline,
};
