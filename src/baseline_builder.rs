//! Baseline statistics for a user's transaction history.
//!
//! Turns a list of historical transactions into a [`TransactionBaseline`]:
//! amount mean and sample standard deviation plus the sets of hours,
//! merchant categories and countries observed in the history.

use crate::error::{Result, ScoringError};
use crate::types::baseline::TransactionBaseline;
use crate::types::transaction::HistoricalTransaction;
use std::collections::BTreeSet;
use tracing::debug;

/// Builds per-user baselines from raw history.
///
/// Every distinct observed value counts as typical; there is no frequency
/// cutoff. The result does not depend on the order of the history.
#[derive(Debug, Clone, Copy)]
pub struct BaselineBuilder;

impl BaselineBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Compute the baseline for `user_id`.
    ///
    /// Fails with `InsufficientHistory` when `history` is empty, with
    /// `InvalidTransaction` when an observation is malformed and with
    /// `InvalidBaseline` when the user id is blank.
    pub fn build(
        &self,
        user_id: &str,
        history: &[HistoricalTransaction],
    ) -> Result<TransactionBaseline> {
        if history.is_empty() {
            return Err(ScoringError::InsufficientHistory {
                user_id: user_id.to_string(),
            });
        }

        for observation in history {
            observation.validate()?;
        }

        // Sorted so that the floating point sums are identical for any ordering
        let mut amounts: Vec<f64> = history.iter().map(|tx| tx.amount).collect();
        amounts.sort_by(f64::total_cmp);

        let mean_amount = mean(&amounts);
        let std_dev_amount = sample_std_dev(&amounts, mean_amount);

        let typical_hours: BTreeSet<u8> = history.iter().map(|tx| tx.hour_of_day).collect();
        let typical_merchant_categories: BTreeSet<String> = history
            .iter()
            .filter_map(HistoricalTransaction::category_label)
            .map(str::to_string)
            .collect();
        let typical_countries: BTreeSet<String> = history
            .iter()
            .filter_map(HistoricalTransaction::country_label)
            .map(str::to_string)
            .collect();

        let baseline = TransactionBaseline {
            user_id: user_id.to_string(),
            mean_amount,
            std_dev_amount,
            typical_hours,
            typical_merchant_categories,
            typical_countries,
            observation_count: history.len(),
            max_amount: amounts.last().copied(),
        };
        baseline.validate()?;

        debug!(
            user_id = %user_id,
            observations = history.len(),
            mean_amount,
            std_dev_amount = ?std_dev_amount,
            "Baseline computed"
        );

        Ok(baseline)
    }
}

impl Default for BaselineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Running mean; never overflows for finite non-negative inputs.
fn mean(values: &[f64]) -> f64 {
    values
        .iter()
        .enumerate()
        .fold(0.0, |mean, (i, &x)| mean + (x - mean) / (i + 1) as f64)
}

/// Sample standard deviation (n - 1 denominator); unknown below two values.
///
/// Deviations are scaled by the largest one before squaring so amounts near
/// `f64::MAX` still give a finite result.
fn sample_std_dev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let scale = values
        .iter()
        .map(|&x| (x - mean).abs())
        .fold(0.0, f64::max);
    if scale == 0.0 {
        return Some(0.0);
    }
    let scaled_variance = values
        .iter()
        .map(|&x| ((x - mean) / scale).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    Some(scale * scaled_variance.sqrt())
}
