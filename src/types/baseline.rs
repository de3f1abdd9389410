//! Per-user spending baseline

use crate::error::{Result, ScoringError};
use crate::types::transaction::MAX_HOUR;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Statistical summary of a user's historical transactions.
///
/// Built by [`crate::baseline_builder::BaselineBuilder`] or supplied directly
/// by a caller that owns its own storage. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionBaseline {
    pub user_id: String,

    pub mean_amount: f64,

    /// Sample standard deviation of amounts; `None` when fewer than two
    /// observations were available.
    pub std_dev_amount: Option<f64>,

    pub typical_hours: BTreeSet<u8>,

    pub typical_merchant_categories: BTreeSet<String>,

    pub typical_countries: BTreeSet<String>,

    /// Number of historical observations the baseline was computed from
    #[serde(default)]
    pub observation_count: usize,

    /// Largest historical amount, when known
    #[serde(default)]
    pub max_amount: Option<f64>,
}

impl TransactionBaseline {
    /// Create a baseline with empty typical sets.
    pub fn new(user_id: impl Into<String>, mean_amount: f64, std_dev_amount: Option<f64>) -> Self {
        Self {
            user_id: user_id.into(),
            mean_amount,
            std_dev_amount,
            typical_hours: BTreeSet::new(),
            typical_merchant_categories: BTreeSet::new(),
            typical_countries: BTreeSet::new(),
            observation_count: 0,
            max_amount: None,
        }
    }

    pub fn with_typical_hours(mut self, hours: impl IntoIterator<Item = u8>) -> Self {
        self.typical_hours.extend(hours);
        self
    }

    pub fn with_typical_categories<S: Into<String>>(
        mut self,
        categories: impl IntoIterator<Item = S>,
    ) -> Self {
        self.typical_merchant_categories
            .extend(categories.into_iter().map(Into::into));
        self
    }

    pub fn with_typical_countries<S: Into<String>>(
        mut self,
        countries: impl IntoIterator<Item = S>,
    ) -> Self {
        self.typical_countries
            .extend(countries.into_iter().map(Into::into));
        self
    }

    /// Reject baselines the scorer cannot trust.
    ///
    /// Runs before every score, since caller-supplied baselines never pass
    /// through the builder.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(invalid("user id must not be empty".to_string()));
        }
        if !self.mean_amount.is_finite() || self.mean_amount < 0.0 {
            return Err(invalid(format!(
                "mean amount must be a finite non-negative number, got {}",
                self.mean_amount
            )));
        }
        if let Some(std_dev) = self.std_dev_amount {
            if !std_dev.is_finite() || std_dev < 0.0 {
                return Err(invalid(format!(
                    "standard deviation must be a finite non-negative number, got {std_dev}"
                )));
            }
        }
        if let Some(&hour) = self.typical_hours.iter().find(|&&hour| hour > MAX_HOUR) {
            return Err(invalid(format!(
                "typical hours must be between 0 and {MAX_HOUR}, got {hour}"
            )));
        }
        Ok(())
    }

    /// Standard deviation usable as a z-score denominator.
    ///
    /// Unknown, zero, negative and non-finite values all yield `None`.
    pub fn usable_std_dev(&self) -> Option<f64> {
        self.std_dev_amount
            .filter(|std_dev| std_dev.is_finite() && *std_dev > 0.0)
    }

    pub fn is_typical_hour(&self, hour: u8) -> bool {
        self.typical_hours.contains(&hour)
    }

    /// Labels compare case-insensitively, ignoring surrounding whitespace.
    pub fn is_typical_category(&self, category: &str) -> bool {
        contains_label(&self.typical_merchant_categories, category)
    }

    pub fn is_typical_country(&self, country: &str) -> bool {
        contains_label(&self.typical_countries, country)
    }

    pub fn summary(&self) -> BaselineSummary {
        BaselineSummary {
            user_id: self.user_id.clone(),
            mean_amount: self.mean_amount,
            std_dev_amount: self.std_dev_amount,
            max_typical_amount: self.max_amount,
            hour_range: self
                .typical_hours
                .first()
                .copied()
                .zip(self.typical_hours.last().copied()),
            observation_count: self.observation_count,
        }
    }
}

fn invalid(reason: String) -> ScoringError {
    ScoringError::InvalidBaseline(reason)
}

fn contains_label(labels: &BTreeSet<String>, value: &str) -> bool {
    let value = value.trim();
    labels
        .iter()
        .any(|label| label.trim().eq_ignore_ascii_case(value))
}

/// Condensed view of a baseline returned alongside risk reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSummary {
    pub user_id: String,
    pub mean_amount: f64,
    pub std_dev_amount: Option<f64>,
    pub max_typical_amount: Option<f64>,
    /// Earliest and latest typical hour
    pub hour_range: Option<(u8, u8)>,
    pub observation_count: usize,
}

impl fmt::Display for BaselineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.std_dev_amount {
            Some(std_dev) => write!(f, "typical amount {:.0} ± {:.0}", self.mean_amount, std_dev)?,
            None => write!(f, "typical amount {:.0} (spread unknown)", self.mean_amount)?,
        }
        if let Some(max) = self.max_typical_amount {
            write!(f, ", max {max:.0}")?;
        }
        if let Some((first, last)) = self.hour_range {
            write!(f, ", hours {first}-{last}")?;
        }
        Ok(())
    }
}
