//! NATS publisher for scoring outcomes

use crate::types::message::ScoreOutcome;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Publishes [`ScoreOutcome`]s, preferring the request's reply subject
#[derive(Clone)]
pub struct ReportProducer {
    client: Client,
    subject: String,
}

impl ReportProducer {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish an outcome to `reply` when present, else to the report subject.
    pub async fn publish(&self, outcome: &ScoreOutcome, reply: Option<Subject>) -> Result<()> {
        let payload = serde_json::to_vec(outcome)?;

        match reply {
            Some(reply) => {
                debug!(request_id = %outcome.request_id(), reply = %reply, "Replying with outcome");
                self.client.publish(reply, payload.into()).await?;
            }
            None => {
                debug!(request_id = %outcome.request_id(), subject = %self.subject, "Publishing outcome");
                self.client
                    .publish(self.subject.clone(), payload.into())
                    .await?;
            }
        }

        Ok(())
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}
