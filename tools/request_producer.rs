//! Score Request Producer
//!
//! Generates synthetic score requests and publishes them to NATS for
//! exercising the scoring service.
//!
//! Usage: request-producer [nats_url] [subject] [count] [suspicious_rate] [delay_ms] [user_id]

use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};
use transaction_anomaly_scorer::types::{ScoreRequest, Transaction};

const NORMAL_CATEGORIES: [&str; 6] = [
    "grocery_store",
    "coffee_shop",
    "restaurant",
    "pharmacy",
    "gas_station",
    "amazon",
];

const SUSPICIOUS_CATEGORIES: [&str; 4] = ["wire-transfer", "crypto-exchange", "gift-cards", "casino"];

const SUSPICIOUS_COUNTRIES: [&str; 4] = ["RU", "NG", "KP", "US"];

/// Request generator for testing
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
    user_id: String,
    counter: u64,
}

impl RequestGenerator {
    fn new(user_id: &str) -> Self {
        Self {
            rng: rand::thread_rng(),
            user_id: user_id.to_string(),
            counter: 0,
        }
    }

    /// Everyday purchase during business hours
    fn generate_normal(&mut self) -> ScoreRequest {
        self.counter += 1;
        let amount = (self.rng.gen_range(10.0..200.0_f64) * 100.0).round() / 100.0;
        let category = self.random_choice(&NORMAL_CATEGORIES);

        let transaction = Transaction::new(amount, self.rng.gen_range(9..=21))
            .with_merchant_category(category)
            .with_country("US")
            .with_description(format!("Payment of ${amount:.2} at {category}"));

        self.request(transaction)
    }

    /// Large night-time transfer, often abroad
    fn generate_suspicious(&mut self) -> ScoreRequest {
        self.counter += 1;
        let amount = (self.rng.gen_range(1000.0..10000.0_f64) * 100.0).round() / 100.0;
        let category = self.random_choice(&SUSPICIOUS_CATEGORIES);
        let country = self.random_choice(&SUSPICIOUS_COUNTRIES);

        let transaction = Transaction::new(amount, self.rng.gen_range(0..6))
            .with_merchant_category(category)
            .with_country(country)
            .with_description(format!("Transfer of ${amount:.2} via {category} in {country}"));

        self.request(transaction)
    }

    fn request(&self, transaction: Transaction) -> ScoreRequest {
        ScoreRequest {
            request_id: Some(format!("req_{:012}", self.counter)),
            user_id: self.user_id.clone(),
            transaction,
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("request_producer=info".parse()?),
        )
        .init();

    info!("Starting score request producer");

    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("fraud.score.requests");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let suspicious_rate: f64 = args
        .get(4)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.1_f64)
        .clamp(0.0, 1.0);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);
    let user_id = args.get(6).map(|s| s.as_str()).unwrap_or("default");

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count,
        suspicious_rate,
        delay_ms,
        user_id = %user_id,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, suspicious_rate, delay_ms, user_id).await;
        }
    };

    let mut generator = RequestGenerator::new(user_id);
    let mut rng = rand::thread_rng();

    let mut normal_count = 0;
    let mut suspicious_count = 0;

    for i in 0..count {
        let request = if rng.gen_bool(suspicious_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            normal_count += 1;
            generator.generate_normal()
        };

        let payload = serde_json::to_vec(&request)?;
        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} requests ({} normal, {} suspicious)",
                i + 1,
                count,
                normal_count,
                suspicious_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    client.flush().await?;

    info!(
        "Completed! Published {} requests ({} normal, {} suspicious)",
        count, normal_count, suspicious_count
    );

    Ok(())
}

async fn run_dry_mode(
    count: u64,
    suspicious_rate: f64,
    delay_ms: u64,
    user_id: &str,
) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = RequestGenerator::new(user_id);
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let request = if rng.gen_bool(suspicious_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_normal()
        };

        if (i + 1) % 10 == 0 || i == 0 {
            let json = serde_json::to_string_pretty(&request)?;
            info!("Sample request {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
