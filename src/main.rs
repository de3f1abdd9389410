//! Anomaly scoring service - main entry point
//!
//! Consumes score requests from NATS, scores them against per-user
//! baselines and publishes risk reports.

use anyhow::Result;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use transaction_anomaly_scorer::{
    config::{AppConfig, LoggingConfig},
    consumer::RequestConsumer,
    metrics::{MetricsReporter, ScoringMetrics},
    producer::ReportProducer,
    AnomalyScorer, HistoryBaselineProvider, ScoringService,
};

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!("transaction_anomaly_scorer={}", logging.level))
    })?;

    if logging.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting anomaly scoring service");
    info!(
        high_risk_window = ?config.scoring.high_risk_window,
        outlier_z = config.scoring.outlier_z,
        "Scoring policy loaded"
    );

    let scorer = AnomalyScorer::from_config(&config.scoring)?;
    let provider = Arc::new(HistoryBaselineProvider::with_synthetic_users(
        config.baselines.synthetic_users.as_slice(),
    ));
    let metrics = Arc::new(ScoringMetrics::new());
    let service = ScoringService::new(scorer, provider, metrics.clone());

    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);
    let producer = ReportProducer::new(client.clone(), &config.nats.report_subject);

    let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.metrics_interval_secs);
    tokio::spawn(reporter.start());

    info!(
        workers = config.pipeline.workers,
        requests = %consumer.subject(),
        reports = %producer.subject(),
        "Starting request loop"
    );

    let semaphore = Arc::new(Semaphore::new(config.pipeline.workers));
    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        let permit = semaphore.clone().acquire_owned().await?;

        let service = service.clone();
        let producer = producer.clone();

        tokio::spawn(async move {
            if let Some(outcome) = service.handle_payload(&message.payload) {
                if let Err(e) = producer.publish(&outcome, message.reply.clone()).await {
                    error!(
                        request_id = %outcome.request_id(),
                        error = %e,
                        "Failed to publish scoring outcome"
                    );
                }
            }
            drop(permit);
        });
    }

    info!("Scoring service shutting down...");
    metrics.print_summary();

    Ok(())
}
