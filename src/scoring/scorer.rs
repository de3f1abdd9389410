//! Anomaly scorer: validates a transaction, runs the rules against a
//! baseline and turns the outcome into a [`RiskReport`].

use crate::baseline_builder::BaselineBuilder;
use crate::config::ScoringConfig;
use crate::error::{Result, ScoringError};
use crate::provider::BaselineProvider;
use crate::scoring::aggregator::ScoreAggregator;
use crate::scoring::rules::{RuleEvaluation, RuleSet};
use crate::types::baseline::{BaselineSummary, TransactionBaseline};
use crate::types::report::{RiskReport, RiskTier};
use crate::types::transaction::{HistoricalTransaction, Transaction};
use tracing::debug;

/// Report together with the baseline it was scored against
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub report: RiskReport,
    pub baseline: BaselineSummary,
}

/// Stateless transaction scorer.
///
/// Holds only immutable policy, so one instance can be shared across
/// threads and called concurrently.
#[derive(Debug, Clone, Default)]
pub struct AnomalyScorer {
    rules: RuleSet,
    aggregator: ScoreAggregator,
    builder: BaselineBuilder,
}

impl AnomalyScorer {
    pub fn new(rules: RuleSet, aggregator: ScoreAggregator) -> Self {
        Self {
            rules,
            aggregator,
            builder: BaselineBuilder::new(),
        }
    }

    /// Build a scorer from validated configuration.
    pub fn from_config(config: &ScoringConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let aggregator = ScoreAggregator::new(
            config.z_weight,
            config.z_cap,
            config.flag_weight,
            config.flag_cap,
        )?;
        Ok(Self::new(
            RuleSet::new(config.outlier_z, config.high_risk_window),
            aggregator,
        ))
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn aggregator(&self) -> &ScoreAggregator {
        &self.aggregator
    }

    /// Score `tx` against `baseline`.
    ///
    /// Fails with `InvalidTransaction` or `InvalidBaseline` before any rule
    /// runs when either input is malformed.
    pub fn score(&self, tx: &Transaction, baseline: &TransactionBaseline) -> Result<RiskReport> {
        tx.validate()?;
        baseline.validate()?;

        let evaluation = self.rules.evaluate(tx, baseline);
        let report = self.to_report(tx, baseline, evaluation);

        debug!(
            user_id = %report.user_id,
            z_score = ?report.z_score,
            flags = ?report.flag_names(),
            risk_score = report.risk_score,
            risk_tier = %report.risk_tier,
            "Transaction scored"
        );

        Ok(report)
    }

    /// Look up the user's baseline through `provider` and score against it.
    ///
    /// The transaction is validated before the lookup; a user without a
    /// baseline fails with `MissingBaseline`.
    pub fn score_for_user<P>(&self, user_id: &str, tx: &Transaction, provider: &P) -> Result<Assessment>
    where
        P: BaselineProvider + ?Sized,
    {
        tx.validate()?;

        let baseline = provider
            .get_baseline(user_id)?
            .ok_or_else(|| ScoringError::MissingBaseline {
                user_id: user_id.to_string(),
            })?;

        let report = self.score(tx, &baseline)?;
        Ok(Assessment {
            report,
            baseline: baseline.summary(),
        })
    }

    /// Build a fresh baseline from `history` and score against it.
    pub fn score_against_history(
        &self,
        user_id: &str,
        tx: &Transaction,
        history: &[HistoricalTransaction],
    ) -> Result<RiskReport> {
        tx.validate()?;
        let baseline = self.builder.build(user_id, history)?;
        self.score(tx, &baseline)
    }

    fn to_report(
        &self,
        tx: &Transaction,
        baseline: &TransactionBaseline,
        evaluation: RuleEvaluation,
    ) -> RiskReport {
        let risk_score = self
            .aggregator
            .aggregate(evaluation.z_score, evaluation.contextual_flag_count());
        let risk_tier = RiskTier::from_score(risk_score);

        let (flags, explanation): (Vec<_>, Vec<_>) = evaluation
            .hits
            .into_iter()
            .map(|hit| (hit.flag, hit.reason))
            .unzip();

        RiskReport {
            user_id: baseline.user_id.clone(),
            z_score: evaluation.z_score,
            flags,
            risk_score,
            risk_tier,
            recommendation: risk_tier.recommendation(),
            explanation,
            description: tx.raw_description.clone(),
        }
    }
}
