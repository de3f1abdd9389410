//! Risk report data structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest score classified as [`RiskTier::Medium`].
pub const MEDIUM_TIER_THRESHOLD: f64 = 30.0;

/// Lowest score classified as [`RiskTier::High`].
pub const HIGH_TIER_THRESHOLD: f64 = 65.0;

/// Upper bound of every risk score.
pub const MAX_RISK_SCORE: f64 = 100.0;

/// Coarse risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Map a risk score onto a tier.
    ///
    /// `[0, 30)` is LOW, `[30, 65)` is MEDIUM, `[65, 100]` is HIGH.
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_TIER_THRESHOLD {
            RiskTier::High
        } else if score >= MEDIUM_TIER_THRESHOLD {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        }
    }

    pub fn recommendation(&self) -> Recommendation {
        match self {
            RiskTier::Low => Recommendation::Approve,
            RiskTier::Medium => Recommendation::Review,
            RiskTier::High => Recommendation::Block,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Suggested handling for a scored transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Approve,
    Review,
    Block,
}

impl Recommendation {
    pub fn describe(&self) -> &'static str {
        match self {
            Recommendation::Approve => "APPROVE - transaction is consistent with the user's history",
            Recommendation::Review => "REVIEW - deviations from the user's history warrant manual review",
            Recommendation::Block => "BLOCK - high risk transaction, hold for investigation",
        }
    }
}

/// Named deviation from baseline behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnomalyFlag {
    AmountOutlier,
    OffHours,
    UnusualLocation,
    UnusualCategory,
}

impl AnomalyFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyFlag::AmountOutlier => "amount-outlier",
            AnomalyFlag::OffHours => "off-hours",
            AnomalyFlag::UnusualLocation => "unusual-location",
            AnomalyFlag::UnusualCategory => "unusual-category",
        }
    }
}

impl fmt::Display for AnomalyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of scoring one transaction against one baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    /// User whose baseline was used
    pub user_id: String,

    /// Signed amount z-score; absent when the baseline spread is unknown or zero
    pub z_score: Option<f64>,

    /// Triggered rules in evaluation order
    pub flags: Vec<AnomalyFlag>,

    /// Combined score in `[0, 100]`
    pub risk_score: f64,

    pub risk_tier: RiskTier,

    pub recommendation: Recommendation,

    /// One reason per flag, in the same order as `flags`
    pub explanation: Vec<String>,

    /// Free-text description of the scored transaction
    #[serde(default)]
    pub description: String,
}

impl RiskReport {
    pub fn has_flag(&self, flag: AnomalyFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }

    /// Flag names as plain strings.
    pub fn flag_names(&self) -> Vec<&'static str> {
        self.flags.iter().map(AnomalyFlag::as_str).collect()
    }
}

impl fmt::Display for RiskReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} risk ({:.1}/100) for user '{}'",
            self.risk_tier, self.risk_score, self.user_id
        )?;
        if let Some(z) = self.z_score {
            write!(f, ", amount z-score {z:.2}")?;
        }
        if self.explanation.is_empty() {
            write!(f, "; no anomalies detected")?;
        } else {
            for reason in &self.explanation {
                write!(f, "\n  - {reason}")?;
            }
        }
        write!(f, "\n  {}", self.recommendation.describe())
    }
}
