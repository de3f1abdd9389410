//! Score aggregation: combines the amount z-score and contextual flags
//! into a single bounded risk score.

use crate::types::report::MAX_RISK_SCORE;
use anyhow::{ensure, Result};

pub const DEFAULT_Z_WEIGHT: f64 = 15.0;
pub const DEFAULT_Z_CAP: f64 = 60.0;
pub const DEFAULT_FLAG_WEIGHT: f64 = 15.0;
pub const DEFAULT_FLAG_CAP: f64 = 45.0;

/// Combines rule outcomes into a risk score in `[0, 100]`.
///
/// `score = clamp(min(z_cap, |z| * z_weight) + min(flag_cap, flags * flag_weight))`
///
/// All coefficients are non-negative, so the score never decreases as `|z|`
/// or the contextual flag count grows.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreAggregator {
    z_weight: f64,
    z_cap: f64,
    flag_weight: f64,
    flag_cap: f64,
}

impl ScoreAggregator {
    pub fn new(z_weight: f64, z_cap: f64, flag_weight: f64, flag_cap: f64) -> Result<Self> {
        for (name, value) in [
            ("z_weight", z_weight),
            ("z_cap", z_cap),
            ("flag_weight", flag_weight),
            ("flag_cap", flag_cap),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{name} must be a non-negative number, got {value}"
            );
        }

        Ok(Self {
            z_weight,
            z_cap,
            flag_weight,
            flag_cap,
        })
    }

    /// Component contributed by the amount deviation. Zero when the z-score is absent.
    pub fn amount_component(&self, z_score: Option<f64>) -> f64 {
        match z_score {
            Some(z) if !z.is_nan() && self.z_weight > 0.0 => {
                (z.abs() * self.z_weight).min(self.z_cap)
            }
            _ => 0.0,
        }
    }

    /// Component contributed by flags other than the amount outlier.
    pub fn flag_component(&self, contextual_flags: usize) -> f64 {
        (contextual_flags as f64 * self.flag_weight).min(self.flag_cap)
    }

    pub fn aggregate(&self, z_score: Option<f64>, contextual_flags: usize) -> f64 {
        (self.amount_component(z_score) + self.flag_component(contextual_flags))
            .clamp(0.0, MAX_RISK_SCORE)
    }

    pub fn z_weight(&self) -> f64 {
        self.z_weight
    }

    pub fn flag_weight(&self) -> f64 {
        self.flag_weight
    }
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self {
            z_weight: DEFAULT_Z_WEIGHT,
            z_cap: DEFAULT_Z_CAP,
            flag_weight: DEFAULT_FLAG_WEIGHT,
            flag_cap: DEFAULT_FLAG_CAP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_aggregation() {
        let aggregator = ScoreAggregator::default();

        // 2.0 * 15 = 30, plus one flag at 15
        assert!((aggregator.aggregate(Some(2.0), 1) - 45.0).abs() < 1e-9);
        // negative z counts by magnitude
        assert!((aggregator.aggregate(Some(-2.0), 0) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_components_saturate() {
        let aggregator = ScoreAggregator::default();
        assert_eq!(aggregator.amount_component(Some(1000.0)), 60.0);
        assert_eq!(aggregator.flag_component(10), 45.0);
        assert_eq!(aggregator.aggregate(Some(1000.0), 10), 100.0);
    }

    #[test]
    fn test_absent_z_score_contributes_nothing() {
        let aggregator = ScoreAggregator::default();
        assert_eq!(aggregator.aggregate(None, 0), 0.0);
        assert_eq!(aggregator.aggregate(None, 2), 30.0);
        assert_eq!(aggregator.aggregate(Some(f64::NAN), 0), 0.0);
    }

    #[test]
    fn test_infinite_z_score_saturates() {
        let aggregator = ScoreAggregator::default();
        assert_eq!(aggregator.amount_component(Some(f64::INFINITY)), 60.0);
        assert_eq!(aggregator.amount_component(Some(f64::NEG_INFINITY)), 60.0);
    }

    #[test]
    fn test_output_is_clamped() {
        let aggregator = ScoreAggregator::new(100.0, 100.0, 100.0, 100.0).unwrap();
        assert_eq!(aggregator.aggregate(Some(5.0), 3), 100.0);
    }

    #[test]
    fn test_negative_coefficients_rejected() {
        assert!(ScoreAggregator::new(-1.0, 60.0, 15.0, 45.0).is_err());
        assert!(ScoreAggregator::new(15.0, 60.0, 15.0, f64::NAN).is_err());
    }
}
