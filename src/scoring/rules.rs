//! Rule checks comparing a transaction with a baseline.
//!
//! Rules run in a fixed order: amount, time of day, location, category.
//! The order only affects the sequence of flags and explanations.

use crate::types::baseline::TransactionBaseline;
use crate::types::report::AnomalyFlag;
use crate::types::transaction::{Transaction, MAX_HOUR};
use serde::{Deserialize, Serialize};

/// Default `|z|` at which an amount counts as an outlier.
pub const DEFAULT_OUTLIER_Z: f64 = 3.0;

/// Inclusive range of hours, wrapping past midnight when `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    pub start: u8,
    pub end: u8,
}

impl HourWindow {
    pub fn new(start: u8, end: u8) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, hour: u8) -> bool {
        if self.start <= self.end {
            (self.start..=self.end).contains(&hour)
        } else {
            hour >= self.start || hour <= self.end
        }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= MAX_HOUR && self.end <= MAX_HOUR
    }
}

/// Midnight through 5am.
impl Default for HourWindow {
    fn default() -> Self {
        Self { start: 0, end: 5 }
    }
}

/// A triggered rule with its human-readable reason.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleHit {
    pub flag: AnomalyFlag,
    pub reason: String,
}

/// Outcome of running every rule against one transaction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleEvaluation {
    pub z_score: Option<f64>,
    pub hits: Vec<RuleHit>,
}

impl RuleEvaluation {
    /// Number of hits other than the amount outlier.
    pub fn contextual_flag_count(&self) -> usize {
        self.hits
            .iter()
            .filter(|hit| hit.flag != AnomalyFlag::AmountOutlier)
            .count()
    }
}

/// Configured rule thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    outlier_z: f64,
    high_risk_window: HourWindow,
}

impl RuleSet {
    pub fn new(outlier_z: f64, high_risk_window: HourWindow) -> Self {
        Self {
            outlier_z,
            high_risk_window,
        }
    }

    pub fn outlier_z(&self) -> f64 {
        self.outlier_z
    }

    pub fn high_risk_window(&self) -> HourWindow {
        self.high_risk_window
    }

    /// Run all rules in evaluation order. Expects a validated transaction.
    pub fn evaluate(&self, tx: &Transaction, baseline: &TransactionBaseline) -> RuleEvaluation {
        let mut evaluation = RuleEvaluation::default();

        let (z_score, amount_hit) = self.check_amount(tx, baseline);
        evaluation.z_score = z_score;

        evaluation.hits.extend(
            [
                amount_hit,
                self.check_hour(tx, baseline),
                check_location(tx, baseline),
                check_category(tx, baseline),
            ]
            .into_iter()
            .flatten(),
        );

        evaluation
    }

    fn check_amount(
        &self,
        tx: &Transaction,
        baseline: &TransactionBaseline,
    ) -> (Option<f64>, Option<RuleHit>) {
        let Some(std_dev) = baseline.usable_std_dev() else {
            return (None, None);
        };

        let z = (tx.amount - baseline.mean_amount) / std_dev;
        if z.is_nan() {
            return (None, None);
        }

        let hit = (z.abs() >= self.outlier_z).then(|| RuleHit {
            flag: AnomalyFlag::AmountOutlier,
            reason: format!(
                "Amount {:.2} is {:.2} standard deviations {} the typical {:.2}",
                tx.amount,
                z.abs(),
                if z >= 0.0 { "above" } else { "below" },
                baseline.mean_amount
            ),
        });

        (Some(z), hit)
    }

    fn check_hour(&self, tx: &Transaction, baseline: &TransactionBaseline) -> Option<RuleHit> {
        let hour = tx.hour()?;
        if baseline.is_typical_hour(hour) || !self.high_risk_window.contains(hour) {
            return None;
        }
        Some(RuleHit {
            flag: AnomalyFlag::OffHours,
            reason: format!(
                "Transaction at {:02}:00 is outside the user's usual hours and inside the high-risk window {:02}:00-{:02}:59",
                hour, self.high_risk_window.start, self.high_risk_window.end
            ),
        })
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(DEFAULT_OUTLIER_Z, HourWindow::default())
    }
}

fn check_location(tx: &Transaction, baseline: &TransactionBaseline) -> Option<RuleHit> {
    let country = tx.country_label()?;
    if baseline.is_typical_country(country) {
        return None;
    }
    Some(RuleHit {
        flag: AnomalyFlag::UnusualLocation,
        reason: format!("Country '{country}' does not appear in the user's history"),
    })
}

fn check_category(tx: &Transaction, baseline: &TransactionBaseline) -> Option<RuleHit> {
    let category = tx.category_label()?;
    if baseline.is_typical_category(category) {
        return None;
    }
    Some(RuleHit {
        flag: AnomalyFlag::UnusualCategory,
        reason: format!("Merchant category '{category}' does not appear in the user's history"),
    })
}
