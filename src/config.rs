//! Configuration management for the anomaly scoring service

use crate::scoring::aggregator::{
    DEFAULT_FLAG_CAP, DEFAULT_FLAG_WEIGHT, DEFAULT_Z_CAP, DEFAULT_Z_WEIGHT,
};
use crate::scoring::rules::{HourWindow, DEFAULT_OUTLIER_Z};
use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub baselines: BaselinesConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming score requests
    pub request_subject: String,
    /// Subject for outgoing risk reports when a request has no reply subject
    pub report_subject: String,
}

/// Scoring policy
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScoringConfig {
    /// Hours in which an atypical transaction time is flagged
    #[serde(default)]
    pub high_risk_window: HourWindow,
    /// Minimum |z| for the amount-outlier flag
    #[serde(default = "default_outlier_z")]
    pub outlier_z: f64,
    #[serde(default = "default_z_weight")]
    pub z_weight: f64,
    #[serde(default = "default_z_cap")]
    pub z_cap: f64,
    #[serde(default = "default_flag_weight")]
    pub flag_weight: f64,
    #[serde(default = "default_flag_cap")]
    pub flag_cap: f64,
}

fn default_outlier_z() -> f64 {
    DEFAULT_OUTLIER_Z
}

fn default_z_weight() -> f64 {
    DEFAULT_Z_WEIGHT
}

fn default_z_cap() -> f64 {
    DEFAULT_Z_CAP
}

fn default_flag_weight() -> f64 {
    DEFAULT_FLAG_WEIGHT
}

fn default_flag_cap() -> f64 {
    DEFAULT_FLAG_CAP
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.high_risk_window.is_valid(),
            "high_risk_window hours must be between 0 and 23, got {}-{}",
            self.high_risk_window.start,
            self.high_risk_window.end
        );
        ensure!(
            self.outlier_z.is_finite() && self.outlier_z > 0.0,
            "outlier_z must be positive, got {}",
            self.outlier_z
        );
        for (name, value) in [
            ("z_weight", self.z_weight),
            ("z_cap", self.z_cap),
            ("flag_weight", self.flag_weight),
            ("flag_cap", self.flag_cap),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{name} must be non-negative, got {value}"
            );
        }
        Ok(())
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            high_risk_window: HourWindow::default(),
            outlier_z: DEFAULT_OUTLIER_Z,
            z_weight: DEFAULT_Z_WEIGHT,
            z_cap: DEFAULT_Z_CAP,
            flag_weight: DEFAULT_FLAG_WEIGHT,
            flag_cap: DEFAULT_FLAG_CAP,
        }
    }
}

/// Baseline seeding
#[derive(Debug, Clone, Deserialize)]
pub struct BaselinesConfig {
    /// Users seeded with the synthetic demo history
    pub synthetic_users: Vec<String>,
}

impl Default for BaselinesConfig {
    fn default() -> Self {
        Self {
            synthetic_users: vec!["default".to_string()],
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of requests scored concurrently
    pub workers: usize,
    /// Seconds between metrics summaries
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_metrics_interval() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path, then apply `SCORER__*`
    /// environment overrides (e.g. `SCORER__NATS__URL`,
    /// `SCORER__BASELINES__SYNTHETIC_USERS=alice,bob`).
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_env(path, env_overrides())
    }

    fn load_with_env<P: AsRef<Path>>(path: P, env: Environment) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(env)
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.scoring.validate().context("Invalid scoring configuration")?;
        ensure!(self.pipeline.workers > 0, "pipeline.workers must be at least 1");
        ensure!(
            self.pipeline.metrics_interval_secs > 0,
            "pipeline.metrics_interval_secs must be at least 1"
        );
        Ok(())
    }
}

/// `SCORER__SECTION__KEY` overrides. Scalars are parsed into numbers where
/// possible; list keys are split on commas.
fn env_overrides() -> Environment {
    Environment::with_prefix("SCORER")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("baselines.synthetic_users")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "fraud.score.requests".to_string(),
                report_subject: "fraud.risk.reports".to_string(),
            },
            scoring: ScoringConfig::default(),
            baselines: BaselinesConfig::default(),
            pipeline: PipelineConfig {
                workers: 4,
                metrics_interval_secs: 30,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
