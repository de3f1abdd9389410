//! Message envelopes exchanged with the scoring service

use crate::error::ScoringError;
use crate::types::baseline::BaselineSummary;
use crate::types::report::RiskReport;
use crate::types::transaction::Transaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to score one transaction for one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    /// Caller-supplied correlation id; generated when absent
    #[serde(default)]
    pub request_id: Option<String>,

    #[serde(alias = "userId")]
    pub user_id: String,

    pub transaction: Transaction,
}

impl ScoreRequest {
    pub fn new(user_id: impl Into<String>, transaction: Transaction) -> Self {
        Self {
            request_id: Some(uuid::Uuid::new_v4().to_string()),
            user_id: user_id.into(),
            transaction,
        }
    }

    /// Correlation id, generating one if the caller supplied none.
    pub fn correlation_id(&self) -> String {
        self.request_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }
}

/// Tagged result published for every scored request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScoreOutcome {
    Scored {
        request_id: String,
        report: RiskReport,
        baseline: BaselineSummary,
        scored_at: DateTime<Utc>,
    },
    Failed {
        request_id: String,
        user_id: String,
        error_kind: String,
        message: String,
        scored_at: DateTime<Utc>,
    },
}

impl ScoreOutcome {
    pub fn scored(request_id: String, report: RiskReport, baseline: BaselineSummary) -> Self {
        ScoreOutcome::Scored {
            request_id,
            report,
            baseline,
            scored_at: Utc::now(),
        }
    }

    pub fn failed(request_id: String, user_id: String, error: &ScoringError) -> Self {
        ScoreOutcome::Failed {
            request_id,
            user_id,
            error_kind: error.kind().to_string(),
            message: error.to_string(),
            scored_at: Utc::now(),
        }
    }

    pub fn request_id(&self) -> &str {
        match self {
            ScoreOutcome::Scored { request_id, .. } | ScoreOutcome::Failed { request_id, .. } => {
                request_id
            }
        }
    }
}
