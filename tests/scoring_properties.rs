use proptest::prelude::*;
use proptest::test_runner::Config;
use transaction_anomaly_scorer::types::report::{HIGH_TIER_THRESHOLD, MEDIUM_TIER_THRESHOLD};
use transaction_anomaly_scorer::{
    AnomalyFlag, AnomalyScorer, BaselineBuilder, HistoricalTransaction, RiskTier, Transaction,
    TransactionBaseline,
};

fn baseline(mean: f64, std_dev: Option<f64>) -> TransactionBaseline {
    TransactionBaseline::new("prop-user", mean, std_dev)
        .with_typical_hours(9..=17)
        .with_typical_countries(["US"])
        .with_typical_categories(["retail", "grocery"])
}

fn expected_tier(score: f64) -> RiskTier {
    if score < MEDIUM_TIER_THRESHOLD {
        RiskTier::Low
    } else if score < HIGH_TIER_THRESHOLD {
        RiskTier::Medium
    } else {
        RiskTier::High
    }
}

fn country() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("US".to_string())),
        Just(Some("RU".to_string())),
        Just(Some("BR".to_string())),
    ]
}

fn category() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("grocery".to_string())),
        Just(Some("wire-transfer".to_string())),
    ]
}

fn transaction() -> impl Strategy<Value = Transaction> {
    (0.0_f64..1.0e7, 0_i64..=23, category(), country()).prop_map(
        |(amount, hour, merchant_category, country)| Transaction {
            amount,
            hour_of_day: hour,
            merchant_category,
            country,
            raw_description: String::new(),
        },
    )
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn score_is_bounded_and_tier_matches(
        tx in transaction(),
        mean in 0.0_f64..10_000.0,
        std_dev in prop::option::of(0.0_f64..1_000.0),
    ) {
        let report = AnomalyScorer::default().score(&tx, &baseline(mean, std_dev)).unwrap();

        prop_assert!((0.0..=100.0).contains(&report.risk_score));
        prop_assert_eq!(report.risk_tier, expected_tier(report.risk_score));
        prop_assert_eq!(report.flags.len(), report.explanation.len());
    }

    #[test]
    fn larger_deviation_never_lowers_score(
        mean in 0.0_f64..1_000.0,
        std_dev in 0.01_f64..500.0,
        near in 0.0_f64..5_000.0,
        extra in 0.0_f64..5_000.0,
        hour in 0_i64..=23,
    ) {
        let scorer = AnomalyScorer::default();
        let baseline = baseline(mean, Some(std_dev));

        let closer = scorer.score(&Transaction::new(mean + near, hour), &baseline).unwrap();
        let farther = scorer
            .score(&Transaction::new(mean + near + extra, hour), &baseline)
            .unwrap();

        prop_assert!(farther.risk_score >= closer.risk_score);
    }

    #[test]
    fn larger_deviation_below_mean_never_lowers_score(
        mean in 0.0_f64..1_000.0,
        std_dev in 0.01_f64..500.0,
        near_frac in 0.0_f64..=1.0,
        extra_frac in 0.0_f64..=1.0,
        hour in 0_i64..=23,
    ) {
        let scorer = AnomalyScorer::default();
        let baseline = baseline(mean, Some(std_dev));

        let closer_amount = mean - mean * near_frac;
        let farther_amount = closer_amount * (1.0 - extra_frac);

        let closer = scorer.score(&Transaction::new(closer_amount, hour), &baseline).unwrap();
        let farther = scorer.score(&Transaction::new(farther_amount, hour), &baseline).unwrap();
        let zero = scorer.score(&Transaction::new(0.0, hour), &baseline).unwrap();

        prop_assert!(farther.risk_score >= closer.risk_score);
        prop_assert!(zero.risk_score >= farther.risk_score);
    }

    #[test]
    fn extra_flag_never_lowers_score(
        amount in 0.0_f64..10_000.0,
        hour in 0_i64..=23,
        category in category(),
    ) {
        let scorer = AnomalyScorer::default();
        let baseline = baseline(50.0, Some(10.0));

        let mut domestic = Transaction::new(amount, hour).with_country("US");
        domestic.merchant_category = category.clone();
        let mut abroad = Transaction::new(amount, hour).with_country("RU");
        abroad.merchant_category = category;

        let without_flag = scorer.score(&domestic, &baseline).unwrap();
        let with_flag = scorer.score(&abroad, &baseline).unwrap();

        prop_assert!(with_flag.has_flag(AnomalyFlag::UnusualLocation));
        prop_assert!(!without_flag.has_flag(AnomalyFlag::UnusualLocation));
        prop_assert!(with_flag.risk_score >= without_flag.risk_score);
    }

    #[test]
    fn scoring_is_deterministic(tx in transaction(), mean in 0.0_f64..1_000.0) {
        let scorer = AnomalyScorer::default();
        let baseline = baseline(mean, Some(25.0));

        let first = scorer.score(&tx, &baseline).unwrap();
        let second = scorer.score(&tx, &baseline).unwrap();

        prop_assert_eq!(first.risk_score.to_bits(), second.risk_score.to_bits());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn zero_or_unknown_variance_never_flags_amount(
        tx in transaction(),
        mean in 0.0_f64..1_000.0,
        zero in any::<bool>(),
    ) {
        let std_dev = if zero { Some(0.0) } else { None };
        let report = AnomalyScorer::default().score(&tx, &baseline(mean, std_dev)).unwrap();

        prop_assert!(report.z_score.is_none());
        prop_assert!(!report.has_flag(AnomalyFlag::AmountOutlier));
    }

    #[test]
    fn baseline_ignores_history_order(
        amounts in prop::collection::vec(0.0_f64..10_000.0, 1..40),
    ) {
        let history: Vec<HistoricalTransaction> = amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| HistoricalTransaction::new(amount, (i % 24) as u8, Some("retail"), Some("US")))
            .collect();
        let mut reversed = history.clone();
        reversed.reverse();

        let builder = BaselineBuilder::new();
        prop_assert_eq!(
            builder.build("u", &history).unwrap(),
            builder.build("u", &reversed).unwrap()
        );
    }
}
