use cvd_risk_core::{FeatureMap, RiskCategory, RiskScorer, ScoreOptions, ScoringError};
use proptest::prelude::*;
use std::sync::OnceLock;

const BUNDLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/models/cvd_gbdt_v1.json");

fn scorer() -> &'static RiskScorer {
    static SCORER: OnceLock<RiskScorer> = OnceLock::new();
    SCORER.get_or_init(|| RiskScorer::from_bundle_path(BUNDLE))
}

fn contract() -> Vec<String> {
    scorer().health().features
}

prop_compose! {
    fn patient()(
        gender in 1i64..=2,
        age in 29i64..=65,
        height in 140.0f64..200.0,
        weight in 40.0f64..150.0,
        ap_hi in 90i64..=200,
        ap_lo in 50i64..=120,
        cholesterol in 1i64..=3,
        gluc in 1i64..=3,
        smoke in 0i64..=1,
        alco in 0i64..=1,
        active in 0i64..=1,
    ) -> FeatureMap {
        let mut features: FeatureMap = [
            ("gender", gender),
            ("age_years", age),
            ("ap_hi", ap_hi),
            ("ap_lo", ap_lo),
            ("pulse_pressure", ap_hi - ap_lo),
            ("cholesterol", cholesterol),
            ("gluc", gluc),
            ("smoke", smoke),
            ("alco", alco),
            ("active", active),
        ]
        .into_iter()
        .collect();
        let metres = height / 100.0;
        features.insert("height", height);
        features.insert("weight", weight);
        features.insert("bmi", weight / (metres * metres));
        features.insert("map", (ap_hi + 2 * ap_lo) as f64 / 3.0);
        features
    }
}

proptest! {
    #[test]
    fn label_follows_threshold(
        features in patient(),
        threshold in 0.0001f64..0.9999,
        top_n in 0usize..20,
    ) {
        let result = scorer()
            .score(&features, &ScoreOptions { threshold, top_n })
            .unwrap();

        prop_assert!((0.0..=1.0).contains(&result.risk_score));
        prop_assert!((0.5..=1.0).contains(&result.model_confidence));
        prop_assert_eq!(result.threshold_used, threshold);
        prop_assert_eq!(result.prediction == 1, result.risk_category == RiskCategory::High);
        prop_assert!(result.risk_percentage <= 100);

        // risk_score is rounded to four places
        if result.prediction == 1 {
            prop_assert!(result.risk_score >= threshold - 5e-5);
        } else {
            prop_assert!(result.risk_score <= threshold + 5e-5);
        }

        prop_assert_eq!(result.top_risk_factors.len(), top_n.min(contract().len()));
        for pair in result.top_risk_factors.windows(2) {
            prop_assert!(pair[0].contribution.abs() >= pair[1].contribution.abs());
        }
    }

    #[test]
    fn confidence_mirrors_score(features in patient()) {
        let result = scorer().score(&features, &ScoreOptions::default()).unwrap();
        let expected = result.risk_score.max(1.0 - result.risk_score);
        prop_assert!((result.model_confidence - expected).abs() < 1e-4);
    }

    #[test]
    fn scoring_is_idempotent(features in patient()) {
        let options = ScoreOptions { threshold: 0.5, top_n: 14 };
        let first = scorer().score(&features, &options).unwrap();
        let second = scorer().score(&features, &options).unwrap();

        prop_assert_eq!(first.risk_score, second.risk_score);
        prop_assert_eq!(first.top_risk_factors, second.top_risk_factors);
    }

    #[test]
    fn dropping_a_feature_names_it(features in patient(), index in 0usize..14) {
        let names = contract();
        let dropped = &names[index];

        let mut partial = features.clone();
        partial.remove(dropped);

        let err = scorer().score(&partial, &ScoreOptions::default()).unwrap_err();
        prop_assert_eq!(err, ScoringError::MissingFeatures(vec![dropped.clone()]));
    }

    #[test]
    fn invalid_thresholds_are_rejected(
        features in patient(),
        threshold in prop_oneof![-10.0f64..=0.0, 1.0f64..10.0],
    ) {
        let err = scorer()
            .score(&features, &ScoreOptions { threshold, top_n: 5 })
            .unwrap_err();
        prop_assert!(matches!(err, ScoringError::InvalidThreshold(_)));
    }
}
