//! Transaction data structures for anomaly scoring

use crate::error::{Result, ScoringError};
use serde::{Deserialize, Serialize};

/// Latest valid hour of the day.
pub const MAX_HOUR: u8 = 23;

/// A transaction to be scored against a user's baseline.
///
/// Fields arrive already structured; free-text parsing happens upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction amount (must be finite and non-negative)
    pub amount: f64,

    /// Hour of day the transaction happened (0-23). Wider than the valid
    /// range so out-of-range input decodes and fails validation.
    #[serde(alias = "hourOfDay", alias = "hour")]
    pub hour_of_day: i64,

    /// Merchant category label, if known
    #[serde(default, alias = "merchantCategory")]
    pub merchant_category: Option<String>,

    /// Country or region label, if known
    #[serde(default)]
    pub country: Option<String>,

    /// Original free-text description, echoed in reports only
    #[serde(default, alias = "rawDescription")]
    pub raw_description: String,
}

impl Transaction {
    /// Create a transaction with no category, country or description.
    pub fn new(amount: f64, hour_of_day: i64) -> Self {
        Self {
            amount,
            hour_of_day,
            merchant_category: None,
            country: None,
            raw_description: String::new(),
        }
    }

    pub fn with_merchant_category(mut self, category: impl Into<String>) -> Self {
        self.merchant_category = Some(category.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.raw_description = description.into();
        self
    }

    /// Reject amounts and hours outside the documented domain.
    pub fn validate(&self) -> Result<()> {
        validate_fields(self.amount, self.hour_of_day)
    }

    /// Hour of day, or `None` when outside 0-23.
    pub fn hour(&self) -> Option<u8> {
        u8::try_from(self.hour_of_day)
            .ok()
            .filter(|&hour| hour <= MAX_HOUR)
    }

    /// Merchant category with surrounding whitespace removed; blank counts as absent.
    pub fn category_label(&self) -> Option<&str> {
        label(&self.merchant_category)
    }

    /// Country with surrounding whitespace removed; blank counts as absent.
    pub fn country_label(&self) -> Option<&str> {
        label(&self.country)
    }
}

/// One observation from a user's transaction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalTransaction {
    pub amount: f64,

    #[serde(alias = "hourOfDay", alias = "hour")]
    pub hour_of_day: u8,

    #[serde(default, alias = "merchantCategory")]
    pub merchant_category: Option<String>,

    #[serde(default)]
    pub country: Option<String>,
}

impl HistoricalTransaction {
    pub fn new(
        amount: f64,
        hour_of_day: u8,
        merchant_category: Option<&str>,
        country: Option<&str>,
    ) -> Self {
        Self {
            amount,
            hour_of_day,
            merchant_category: merchant_category.map(str::to_string),
            country: country.map(str::to_string),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_fields(self.amount, i64::from(self.hour_of_day))
    }

    pub fn category_label(&self) -> Option<&str> {
        label(&self.merchant_category)
    }

    pub fn country_label(&self) -> Option<&str> {
        label(&self.country)
    }
}

fn validate_fields(amount: f64, hour_of_day: i64) -> Result<()> {
    if !amount.is_finite() {
        return Err(ScoringError::InvalidTransaction(format!(
            "amount must be a finite number, got {amount}"
        )));
    }
    if amount < 0.0 {
        return Err(ScoringError::InvalidTransaction(format!(
            "amount must be non-negative, got {amount}"
        )));
    }
    if !(0..=i64::from(MAX_HOUR)).contains(&hour_of_day) {
        return Err(ScoringError::InvalidTransaction(format!(
            "hour of day must be between 0 and {MAX_HOUR}, got {hour_of_day}"
        )));
    }
    Ok(())
}

fn label(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty())
}
