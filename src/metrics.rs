//! Throughput, latency and outcome statistics for the scoring service.

use crate::types::report::{AnomalyFlag, RiskTier, MAX_RISK_SCORE};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

const SCORE_BUCKETS: usize = 10;

/// Metrics collector for the scoring service
pub struct ScoringMetrics {
    /// Requests that produced a risk report
    pub requests_scored: AtomicU64,
    /// Requests that ended in a typed failure
    pub requests_failed: AtomicU64,
    /// Payloads that could not be decoded
    pub requests_rejected: AtomicU64,
    reports_by_tier: RwLock<HashMap<RiskTier, u64>>,
    failures_by_kind: RwLock<HashMap<String, u64>>,
    flag_counts: RwLock<HashMap<AnomalyFlag, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Risk score histogram over [0, 100] in steps of 10
    score_buckets: RwLock<[u64; SCORE_BUCKETS]>,
    start_time: Instant,
}

impl ScoringMetrics {
    pub fn new() -> Self {
        Self {
            requests_scored: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            reports_by_tier: RwLock::new(HashMap::new()),
            failures_by_kind: RwLock::new(HashMap::new()),
            flag_counts: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; SCORE_BUCKETS]),
            start_time: Instant::now(),
        }
    }

    /// Record a request that produced a report
    pub fn record_report(
        &self,
        processing_time: Duration,
        risk_score: f64,
        tier: RiskTier,
        flags: &[AnomalyFlag],
    ) {
        self.requests_scored.fetch_add(1, Ordering::Relaxed);
        self.record_processing_time(processing_time);

        let bucket = ((risk_score / MAX_RISK_SCORE) * SCORE_BUCKETS as f64)
            .clamp(0.0, (SCORE_BUCKETS - 1) as f64) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }

        if let Ok(mut by_tier) = self.reports_by_tier.write() {
            *by_tier.entry(tier).or_insert(0) += 1;
        }

        if let Ok(mut counts) = self.flag_counts.write() {
            for flag in flags {
                *counts.entry(*flag).or_insert(0) += 1;
            }
        }
    }

    /// Record a request that failed with a typed error
    pub fn record_failure(&self, processing_time: Duration, error_kind: &str) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        self.record_processing_time(processing_time);

        if let Ok(mut by_kind) = self.failures_by_kind.write() {
            *by_kind.entry(error_kind.to_string()).or_insert(0) += 1;
        }
    }

    /// Record an undecodable payload
    pub fn record_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    fn record_processing_time(&self, processing_time: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the most recent samples
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let Ok(times) = self.processing_times.read() else {
            return ProcessingStats::default();
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Requests handled per second since startup
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_requests() as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.requests_scored.load(Ordering::Relaxed) + self.requests_failed.load(Ordering::Relaxed)
    }

    pub fn get_score_distribution(&self) -> [u64; SCORE_BUCKETS] {
        self.score_buckets
            .read()
            .map(|buckets| *buckets)
            .unwrap_or_default()
    }

    pub fn get_reports_by_tier(&self) -> HashMap<RiskTier, u64> {
        self.reports_by_tier
            .read()
            .map(|by_tier| by_tier.clone())
            .unwrap_or_default()
    }

    pub fn get_failures_by_kind(&self) -> HashMap<String, u64> {
        self.failures_by_kind
            .read()
            .map(|by_kind| by_kind.clone())
            .unwrap_or_default()
    }

    pub fn get_flag_counts(&self) -> HashMap<AnomalyFlag, u64> {
        self.flag_counts
            .read()
            .map(|counts| counts.clone())
            .unwrap_or_default()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let scored = self.requests_scored.load(Ordering::Relaxed);
        let failed = self.requests_failed.load(Ordering::Relaxed);
        let rejected = self.requests_rejected.load(Ordering::Relaxed);
        let processing = self.get_processing_stats();

        info!(
            scored,
            failed,
            rejected,
            throughput = format!("{:.1} req/s", self.get_throughput()),
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            "Scoring metrics summary"
        );

        let mut by_tier: Vec<_> = self.get_reports_by_tier().into_iter().collect();
        by_tier.sort();
        for (tier, count) in by_tier {
            let pct = if scored > 0 {
                (count as f64 / scored as f64) * 100.0
            } else {
                0.0
            };
            info!(tier = %tier, count, "  {:<6} {:>6} ({:>5.1}%)", tier.as_str(), count, pct);
        }

        let mut flags: Vec<_> = self.get_flag_counts().into_iter().collect();
        flags.sort();
        for (flag, count) in flags {
            info!(flag = %flag, count, "  flag {}", flag);
        }

        for (kind, count) in self.get_failures_by_kind() {
            info!(error_kind = %kind, count, "  failure {}", kind);
        }

        let distribution = self.get_score_distribution();
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            let bar = "█".repeat(((pct / 5.0) as usize).min(20));
            info!(
                "  {:>3}-{:<3}: {:>6} ({:>5.1}%) {}",
                i * 10,
                (i + 1) * 10,
                count,
                pct,
                bar
            );
        }
    }
}

impl Default for ScoringMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic metrics summary printer
pub struct MetricsReporter {
    metrics: Arc<ScoringMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ScoringMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // First tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ScoringMetrics::new();

        metrics.record_report(
            Duration::from_micros(100),
            12.0,
            RiskTier::Low,
            &[],
        );
        metrics.record_report(
            Duration::from_micros(200),
            100.0,
            RiskTier::High,
            &[AnomalyFlag::AmountOutlier, AnomalyFlag::OffHours],
        );
        metrics.record_failure(Duration::from_micros(50), "missing_baseline");
        metrics.record_rejected();

        assert_eq!(metrics.requests_scored.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.requests_failed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.requests_rejected.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.total_requests(), 3);

        let by_tier = metrics.get_reports_by_tier();
        assert_eq!(by_tier.get(&RiskTier::High), Some(&1));
        assert_eq!(metrics.get_flag_counts().get(&AnomalyFlag::OffHours), Some(&1));
        assert_eq!(metrics.get_failures_by_kind().get("missing_baseline"), Some(&1));
    }

    #[test]
    fn test_score_buckets() {
        let metrics = ScoringMetrics::new();
        metrics.record_report(Duration::from_micros(1), 0.0, RiskTier::Low, &[]);
        metrics.record_report(Duration::from_micros(1), 29.9, RiskTier::Low, &[]);
        metrics.record_report(Duration::from_micros(1), 100.0, RiskTier::High, &[]);

        let distribution = metrics.get_score_distribution();
        assert_eq!(distribution[0], 1);
        assert_eq!(distribution[2], 1);
        assert_eq!(distribution[9], 1);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = ScoringMetrics::new();
        for micros in 1..=100 {
            metrics.record_failure(Duration::from_micros(micros), "invalid_transaction");
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 100);
        assert_eq!(stats.max_us, 100);
        assert_eq!(stats.p99_us, 100);
        assert_eq!(stats.mean_us, 50);
    }
}
