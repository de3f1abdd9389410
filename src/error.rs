//! Error types for baseline construction and transaction scoring

use thiserror::Error;

/// Typed failures surfaced by the baseline builder and the anomaly scorer.
///
/// None of these are recovered inside the crate; the caller decides the
/// fallback policy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// Structurally invalid transaction (negative amount, hour outside 0-23, ...)
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Baseline that cannot be scored against (blank user, negative or
    /// non-finite statistics, hour outside 0-23)
    #[error("invalid baseline: {0}")]
    InvalidBaseline(String),

    /// No baseline is available for the user
    #[error("no baseline available for user '{user_id}'")]
    MissingBaseline { user_id: String },

    /// Baseline requested from an empty history
    #[error("cannot build a baseline for user '{user_id}' from an empty history")]
    InsufficientHistory { user_id: String },
}

impl ScoringError {
    /// Stable machine-readable name of the failure, used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoringError::InvalidTransaction(_) => "invalid_transaction",
            ScoringError::InvalidBaseline(_) => "invalid_baseline",
            ScoringError::MissingBaseline { .. } => "missing_baseline",
            ScoringError::InsufficientHistory { .. } => "insufficient_history",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ScoringError::InvalidTransaction("x".into()).kind(),
            "invalid_transaction"
        );
        assert_eq!(
            ScoringError::InvalidBaseline("x".into()).kind(),
            "invalid_baseline"
        );
        assert_eq!(
            ScoringError::MissingBaseline { user_id: "u".into() }.kind(),
            "missing_baseline"
        );
        assert_eq!(
            ScoringError::InsufficientHistory { user_id: "u".into() }.kind(),
            "insufficient_history"
        );
    }

    #[test]
    fn test_error_display() {
        let err = ScoringError::MissingBaseline {
            user_id: "alice".to_string(),
        };
        assert_eq!(err.to_string(), "no baseline available for user 'alice'");
    }
}
