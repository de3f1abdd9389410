//! Baseline lookup.
//!
//! The scorer never owns storage; callers hand it a [`BaselineProvider`]
//! that answers "what is the baseline for this user".

use crate::baseline_builder::BaselineBuilder;
use crate::error::Result;
use crate::types::baseline::TransactionBaseline;
use crate::types::transaction::HistoricalTransaction;
use std::collections::HashMap;
use tracing::info;

/// Source of per-user baselines.
pub trait BaselineProvider: Send + Sync {
    /// Baseline for `user_id`, or `None` when the user is unknown.
    fn get_baseline(&self, user_id: &str) -> Result<Option<TransactionBaseline>>;
}

/// Precomputed baselines keyed by user id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBaselineStore {
    baselines: HashMap<String, TransactionBaseline>,
}

impl InMemoryBaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the baseline for its user.
    pub fn insert(&mut self, baseline: TransactionBaseline) -> Option<TransactionBaseline> {
        self.baselines.insert(baseline.user_id.clone(), baseline)
    }

    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}

impl FromIterator<TransactionBaseline> for InMemoryBaselineStore {
    fn from_iter<I: IntoIterator<Item = TransactionBaseline>>(iter: I) -> Self {
        let mut store = Self::new();
        for baseline in iter {
            store.insert(baseline);
        }
        store
    }
}

impl BaselineProvider for InMemoryBaselineStore {
    fn get_baseline(&self, user_id: &str) -> Result<Option<TransactionBaseline>> {
        Ok(self.baselines.get(user_id).cloned())
    }
}

/// Raw histories keyed by user id; a fresh baseline is built on every lookup.
#[derive(Debug, Clone, Default)]
pub struct HistoryBaselineProvider {
    histories: HashMap<String, Vec<HistoricalTransaction>>,
    builder: BaselineBuilder,
}

impl HistoryBaselineProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider seeded with [`synthetic_history`] for each user id.
    pub fn with_synthetic_users<S: AsRef<str>>(user_ids: &[S]) -> Self {
        let mut provider = Self::new();
        for user_id in user_ids {
            provider.insert_history(user_id.as_ref(), synthetic_history());
        }
        info!(users = provider.len(), "Seeded synthetic user histories");
        provider
    }

    pub fn insert_history(&mut self, user_id: &str, history: Vec<HistoricalTransaction>) {
        self.histories.insert(user_id.to_string(), history);
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    pub fn user_ids(&self) -> impl Iterator<Item = &str> {
        self.histories.keys().map(String::as_str)
    }
}

impl BaselineProvider for HistoryBaselineProvider {
    fn get_baseline(&self, user_id: &str) -> Result<Option<TransactionBaseline>> {
        self.histories
            .get(user_id)
            .map(|history| self.builder.build(user_id, history))
            .transpose()
    }
}

const SYNTHETIC_AMOUNTS: [f64; 30] = [
    25.0, 45.0, 12.0, 89.0, 156.0, 67.0, 34.0, 78.0, 23.0, 190.0, 45.0, 67.0, 123.0, 89.0, 34.0,
    56.0, 78.0, 45.0, 123.0, 67.0, 234.0, 89.0, 45.0, 156.0, 78.0, 23.0, 345.0, 67.0, 89.0, 123.0,
];

// Business hours, evenings and weekend repeats
const SYNTHETIC_HOURS: [u8; 19] = [
    9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 10, 11, 14, 18, 19,
];

const SYNTHETIC_CATEGORIES: [&str; 12] = [
    "walmart",
    "target",
    "amazon",
    "grocery_store",
    "gas_station",
    "restaurant",
    "coffee_shop",
    "pharmacy",
    "bank_transfer",
    "utility_company",
    "netflix",
    "spotify",
];

/// Demo spending profile: thirty everyday purchases between 09:00 and
/// 22:00, all domestic ("US").
pub fn synthetic_history() -> Vec<HistoricalTransaction> {
    SYNTHETIC_AMOUNTS
        .iter()
        .enumerate()
        .map(|(i, &amount)| {
            HistoricalTransaction::new(
                amount,
                SYNTHETIC_HOURS[i % SYNTHETIC_HOURS.len()],
                Some(SYNTHETIC_CATEGORIES[i % SYNTHETIC_CATEGORIES.len()]),
                Some("US"),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoringError;
    use std::collections::BTreeSet;

    #[test]
    fn test_in_memory_store_lookup() {
        let store: InMemoryBaselineStore = [
            TransactionBaseline::new("alice", 20.0, Some(5.0)),
            TransactionBaseline::new("bob", 80.0, None),
        ]
        .into_iter()
        .collect();

        assert_eq!(store.len(), 2);
        let alice = store.get_baseline("alice").unwrap().unwrap();
        assert_eq!(alice.mean_amount, 20.0);
        assert!(store.get_baseline("carol").unwrap().is_none());
    }

    #[test]
    fn test_history_provider_builds_fresh_baseline() {
        let provider = HistoryBaselineProvider::with_synthetic_users(&["default"]);
        let baseline = provider.get_baseline("default").unwrap().unwrap();

        assert_eq!(baseline.observation_count, 30);
        assert_eq!(baseline.max_amount, Some(345.0));
        assert_eq!(baseline.typical_hours, (9..=22).collect::<BTreeSet<u8>>());
        assert_eq!(baseline.typical_merchant_categories.len(), 12);
        assert!(baseline.is_typical_country("US"));
        assert!(baseline.std_dev_amount.unwrap() > 0.0);
    }

    #[test]
    fn test_synthetic_mean() {
        let total: f64 = SYNTHETIC_AMOUNTS.iter().sum();
        let provider = HistoryBaselineProvider::with_synthetic_users(&["default"]);
        let baseline = provider.get_baseline("default").unwrap().unwrap();
        assert!((baseline.mean_amount - total / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_history_provider_unknown_user() {
        let provider = HistoryBaselineProvider::new();
        assert!(provider.get_baseline("nobody").unwrap().is_none());
    }

    #[test]
    fn test_history_provider_empty_history() {
        let mut provider = HistoryBaselineProvider::new();
        provider.insert_history("fresh", Vec::new());

        let err = provider.get_baseline("fresh").unwrap_err();
        assert!(matches!(err, ScoringError::InsufficientHistory { .. }));
    }
}
