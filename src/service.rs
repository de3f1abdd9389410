//! Request handling shared by the NATS worker: decode, score, record.

use crate::metrics::ScoringMetrics;
use crate::provider::BaselineProvider;
use crate::scoring::AnomalyScorer;
use crate::types::message::{ScoreOutcome, ScoreRequest};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Scores decoded requests against a shared baseline provider.
#[derive(Clone)]
pub struct ScoringService {
    scorer: Arc<AnomalyScorer>,
    provider: Arc<dyn BaselineProvider>,
    metrics: Arc<ScoringMetrics>,
}

impl ScoringService {
    pub fn new(
        scorer: AnomalyScorer,
        provider: Arc<dyn BaselineProvider>,
        metrics: Arc<ScoringMetrics>,
    ) -> Self {
        Self {
            scorer: Arc::new(scorer),
            provider,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<ScoringMetrics> {
        &self.metrics
    }

    /// Decode and score one payload. Undecodable payloads yield `None`.
    pub fn handle_payload(&self, payload: &[u8]) -> Option<ScoreOutcome> {
        match serde_json::from_slice::<ScoreRequest>(payload) {
            Ok(request) => Some(self.handle(&request)),
            Err(e) => {
                warn!(error = %e, "Failed to deserialize score request");
                self.metrics.record_rejected();
                None
            }
        }
    }

    /// Score one request, always producing an outcome.
    pub fn handle(&self, request: &ScoreRequest) -> ScoreOutcome {
        let start_time = Instant::now();
        let request_id = request.correlation_id();

        match self
            .scorer
            .score_for_user(&request.user_id, &request.transaction, self.provider.as_ref())
        {
            Ok(assessment) => {
                let report = &assessment.report;
                self.metrics.record_report(
                    start_time.elapsed(),
                    report.risk_score,
                    report.risk_tier,
                    &report.flags,
                );

                if report.is_clean() {
                    debug!(
                        request_id = %request_id,
                        user_id = %request.user_id,
                        risk_score = report.risk_score,
                        "Transaction scored without anomalies"
                    );
                } else {
                    info!(
                        request_id = %request_id,
                        user_id = %request.user_id,
                        risk_score = report.risk_score,
                        risk_tier = %report.risk_tier,
                        flags = ?report.flag_names(),
                        "Anomalies detected"
                    );
                }

                ScoreOutcome::scored(request_id, assessment.report, assessment.baseline)
            }
            Err(e) => {
                self.metrics.record_failure(start_time.elapsed(), e.kind());
                warn!(
                    request_id = %request_id,
                    user_id = %request.user_id,
                    error_kind = e.kind(),
                    error = %e,
                    "Scoring failed"
                );
                ScoreOutcome::failed(request_id, request.user_id.clone(), &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::HistoryBaselineProvider;
    use crate::types::report::RiskTier;
    use crate::types::transaction::Transaction;
    use std::sync::atomic::Ordering;

    fn service() -> ScoringService {
        ScoringService::new(
            AnomalyScorer::default(),
            Arc::new(HistoryBaselineProvider::with_synthetic_users(&["default"])),
            Arc::new(ScoringMetrics::new()),
        )
    }

    #[test]
    fn test_suspicious_request_is_scored_high() {
        let service = service();
        let request = ScoreRequest::new(
            "default",
            Transaction::new(5000.0, 3)
                .with_country("RU")
                .with_merchant_category("wire-transfer"),
        );

        match service.handle(&request) {
            ScoreOutcome::Scored {
                request_id,
                report,
                baseline,
                ..
            } => {
                assert_eq!(Some(request_id), request.request_id);
                assert_eq!(report.risk_tier, RiskTier::High);
                assert_eq!(baseline.observation_count, 30);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(service.metrics().requests_scored.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_unknown_user_fails_with_missing_baseline() {
        let service = service();
        let request = ScoreRequest::new("stranger", Transaction::new(20.0, 12));

        match service.handle(&request) {
            ScoreOutcome::Failed { error_kind, user_id, .. } => {
                assert_eq!(error_kind, "missing_baseline");
                assert_eq!(user_id, "stranger");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(service.metrics().requests_failed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_payload_decoding() {
        let service = service();

        let outcome = service
            .handle_payload(br#"{"user_id":"default","transaction":{"amount":-3.0,"hour_of_day":10}}"#)
            .unwrap();
        assert!(matches!(
            outcome,
            ScoreOutcome::Failed { ref error_kind, .. } if error_kind == "invalid_transaction"
        ));

        assert!(service.handle_payload(b"not json").is_none());
        assert_eq!(service.metrics().requests_rejected.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_out_of_range_hour_gets_typed_outcome() {
        let service = service();

        for payload in [
            br#"{"user_id":"default","transaction":{"amount":10.0,"hour_of_day":300}}"#.as_slice(),
            br#"{"user_id":"default","transaction":{"amount":10.0,"hour_of_day":-1}}"#.as_slice(),
        ] {
            let outcome = service.handle_payload(payload).unwrap();
            assert!(matches!(
                outcome,
                ScoreOutcome::Failed { ref error_kind, .. } if error_kind == "invalid_transaction"
            ));
        }
        assert_eq!(service.metrics().requests_failed.load(Ordering::Relaxed), 2);
        assert_eq!(service.metrics().requests_rejected.load(Ordering::Relaxed), 0);
    }
}
