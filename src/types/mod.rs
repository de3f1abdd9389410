//! Type definitions for transaction anomaly scoring

pub mod baseline;
pub mod message;
pub mod report;
pub mod transaction;

pub use baseline::{BaselineSummary, TransactionBaseline};
pub use message::{ScoreOutcome, ScoreRequest};
pub use report::{AnomalyFlag, Recommendation, RiskReport, RiskTier};
pub use transaction::{HistoricalTransaction, Transaction};
