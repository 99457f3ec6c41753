//! Risk scoring pipeline
//!
//! Validates a feature map against the model's contract, infers the
//! positive-class probability, attributes it to features, and packages the
//! top contributors with their clinical readings.

use crate::clinical;
use crate::context::ModelContext;
use crate::errors::{Result, ScoringError};
use crate::features::{FeatureMap, FeatureValue};
use crate::health::{HealthReport, HealthStatus, ServiceInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Identifier reported when the caller does not name the patient
pub const UNKNOWN_PATIENT: &str = "unknown";

pub const DEFAULT_THRESHOLD: f64 = 0.5;
pub const DEFAULT_TOP_N: usize = 5;

/// Per-call scoring knobs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreOptions {
    /// Probability at or above which a case is HIGH risk
    pub threshold: f64,
    /// Number of ranked factors to return
    pub top_n: usize,
}

impl Default for ScoreOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskCategory {
    High,
    Low,
}

/// Direction a feature pushed this prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Impact {
    #[serde(rename = "increases risk")]
    IncreasesRisk,
    #[serde(rename = "decreases risk")]
    DecreasesRisk,
}

impl Impact {
    fn of(contribution: f64) -> Self {
        if contribution > 0.0 {
            Impact::IncreasesRisk
        } else {
            Impact::DecreasesRisk
        }
    }
}

/// One explained feature in a risk result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub feature: String,
    pub feature_name: String,
    pub value: FeatureValue,
    pub unit: String,
    /// Model-level importance, identical for every request
    pub importance: f64,
    /// Signed local contribution for this request
    #[serde(rename = "shap_value")]
    pub contribution: f64,
    pub impact: Impact,
    pub interpretation: String,
}

/// Outcome of one scoring call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub patient_id: String,
    pub risk_score: f64,
    pub risk_percentage: u8,
    pub prediction: u8,
    pub risk_category: RiskCategory,
    pub threshold_used: f64,
    pub top_risk_factors: Vec<RiskFactor>,
    pub model_confidence: f64,
    pub prediction_timestamp: DateTime<Utc>,
}

struct RankedFactor {
    magnitude: f64,
    factor: RiskFactor,
}

/// Scores patients against a model loaded once at startup
///
/// A scorer built without a model stays usable but unhealthy: every scoring
/// call fails with [`ScoringError::ModelUnavailable`].
#[derive(Debug, Clone)]
pub struct RiskScorer {
    context: Option<Arc<ModelContext>>,
    load_error: Option<String>,
}

impl RiskScorer {
    pub fn new(context: Arc<ModelContext>) -> Self {
        Self {
            context: Some(context),
            load_error: None,
        }
    }

    /// A scorer with no model, remembering why loading failed
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!(%reason, "risk scorer running without a model");
        Self {
            context: None,
            load_error: Some(reason),
        }
    }

    /// Load a bundle, degrading to an unhealthy scorer when it cannot be used
    pub fn from_bundle_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match ModelContext::load(path) {
            Ok(context) => Self::new(Arc::new(context)),
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load model bundle");
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn context(&self) -> Option<&Arc<ModelContext>> {
        self.context.as_ref()
    }

    pub fn is_healthy(&self) -> bool {
        self.context.is_some()
    }

    /// Score an anonymous feature map
    pub fn score(&self, features: &FeatureMap, options: &ScoreOptions) -> Result<RiskResult> {
        self.score_patient(UNKNOWN_PATIENT, features, options)
    }

    /// Score a feature map for a named patient
    pub fn score_patient(
        &self,
        patient_id: &str,
        features: &FeatureMap,
        options: &ScoreOptions,
    ) -> Result<RiskResult> {
        let threshold = options.threshold;
        if !(threshold > 0.0 && threshold < 1.0) {
            warn!(threshold, "rejected scoring request");
            return Err(ScoringError::InvalidThreshold(threshold));
        }

        let ctx = self.context.as_deref().ok_or(ScoringError::ModelUnavailable)?;
        let contract = ctx.contract();

        let values = features.ordered_values(contract).map_err(|missing| {
            warn!(patient_id, missing = ?missing, "rejected scoring request");
            ScoringError::MissingFeatures(missing)
        })?;

        if let Some((name, _)) = contract.iter().zip(&values).find(|(_, v)| !v.is_finite()) {
            return Err(ScoringError::UnexpectedFailure(format!(
                "feature {name} is not a finite number"
            )));
        }

        let vector: Vec<f64> = values.iter().map(|v| v.as_f64()).collect();

        let probability = ctx.adapter().predict_probability(&vector)?;
        let prediction = u8::from(probability >= threshold);
        let risk_category = if prediction == 1 {
            RiskCategory::High
        } else {
            RiskCategory::Low
        };

        let contributions = ctx.explainer().attribute(&vector)?;
        let importances = ctx.adapter().feature_importances();

        let mut ranked: Vec<RankedFactor> = contract
            .iter()
            .zip(values)
            .zip(contributions.iter().zip(importances))
            .map(|((feature, value), (&contribution, &importance))| RankedFactor {
                magnitude: contribution.abs(),
                factor: RiskFactor {
                    feature: feature.to_string(),
                    feature_name: clinical::display_name(feature),
                    value,
                    unit: clinical::unit(feature).to_string(),
                    importance,
                    contribution,
                    impact: Impact::of(contribution),
                    interpretation: clinical::interpret(feature, value),
                },
            })
            .collect();

        // Stable sort: equal magnitudes keep contract order
        ranked.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));

        let top_risk_factors: Vec<RiskFactor> = ranked
            .into_iter()
            .take(options.top_n)
            .map(|r| r.factor)
            .collect();

        let result = RiskResult {
            patient_id: patient_id.to_string(),
            risk_score: round4(probability),
            risk_percentage: (probability * 100.0) as u8,
            prediction,
            risk_category,
            threshold_used: threshold,
            top_risk_factors,
            model_confidence: round4(probability.max(1.0 - probability)),
            prediction_timestamp: Utc::now(),
        };

        debug!(
            patient_id,
            risk_score = result.risk_score,
            category = ?result.risk_category,
            "scored patient"
        );

        Ok(result)
    }

    /// Liveness and model details for the host's health endpoint
    pub fn health(&self) -> HealthReport {
        match &self.context {
            Some(ctx) => HealthReport {
                status: HealthStatus::Healthy,
                model_loaded: true,
                model_type: Some(ctx.adapter().model_type().to_string()),
                features: ctx.contract().names().to_vec(),
                scale_pos_weight: Some(ctx.adapter().scale_pos_weight()),
                model_hash: Some(ctx.adapter().fingerprint().to_string()),
                error: None,
            },
            None => HealthReport {
                status: HealthStatus::Unhealthy,
                model_loaded: false,
                model_type: None,
                features: Vec::new(),
                scale_pos_weight: None,
                model_hash: None,
                error: self.load_error.clone(),
            },
        }
    }

    /// Static service description for the host's landing endpoint
    pub fn info(&self) -> ServiceInfo {
        match &self.context {
            Some(ctx) => ServiceInfo::new(ctx.contract().len(), Some(ctx.adapter().model_type())),
            None => ServiceInfo::new(0, None),
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbdt::{Node, Objective, Tree, TreeEnsemble};
    use crate::model::ModelBundle;

    /// Three features; `c` is never split on
    fn scorer() -> RiskScorer {
        let trees = vec![
            Tree::new(
                vec![
                    Node::internal(0, 0, 0.5, 1, 2, 10.0),
                    Node::leaf(1, -1.0, 5.0),
                    Node::leaf(2, 1.0, 5.0),
                ],
                1.0,
            ),
            Tree::new(
                vec![
                    Node::internal(0, 1, 0.5, 1, 2, 10.0),
                    Node::leaf(1, -1.0, 5.0),
                    Node::leaf(2, 1.0, 5.0),
                ],
                1.0,
            ),
        ];
        let bundle = ModelBundle {
            features: Some(vec!["a".into(), "b".into(), "c".into()]),
            scale_pos_weight: 2.04,
            model: TreeEnsemble::new(Objective::BinaryLogistic, 0.0, trees, vec![0.5, 0.5, 0.0]),
        };
        RiskScorer::new(Arc::new(ModelContext::from_bundle(bundle).unwrap()))
    }

    fn features(a: i64, b: i64, c: i64) -> FeatureMap {
        [("a", a), ("b", b), ("c", c)].into_iter().collect()
    }

    #[test]
    fn equal_magnitudes_keep_contract_order() {
        // a and b both contribute +1.0; c contributes 0
        let result = scorer().score(&features(1, 1, 0), &ScoreOptions { threshold: 0.5, top_n: 3 }).unwrap();
        let order: Vec<&str> = result.top_risk_factors.iter().map(|f| f.feature.as_str()).collect();
        assert_eq!(order, ["a", "b", "c"]);
        assert_eq!(result.top_risk_factors[2].impact, Impact::DecreasesRisk);
    }

    #[test]
    fn larger_magnitude_ranks_first() {
        let mut map = features(0, 1, 0);
        map.insert("a", 0.4);
        let result = scorer().score(&map, &ScoreOptions::default()).unwrap();
        assert_eq!(result.top_risk_factors.len(), 3);
        assert!(result
            .top_risk_factors
            .windows(2)
            .all(|w| w[0].contribution.abs() >= w[1].contribution.abs()));
    }

    #[test]
    fn even_odds_hit_the_threshold() {
        // margin 0 -> p = 0.5, which is HIGH at threshold 0.5
        let result = scorer().score(&features(1, 0, 0), &ScoreOptions::default()).unwrap();
        assert_eq!(result.risk_score, 0.5);
        assert_eq!(result.prediction, 1);
        assert_eq!(result.risk_category, RiskCategory::High);
        assert_eq!(result.risk_percentage, 50);
        assert_eq!(result.model_confidence, 0.5);
    }

    #[test]
    fn percentage_truncates() {
        // margin 2 -> p = 0.8808, percentage 88
        let result = scorer().score(&features(1, 1, 0), &ScoreOptions::default()).unwrap();
        assert_eq!(result.risk_score, 0.8808);
        assert_eq!(result.risk_percentage, 88);
        assert_eq!(result.model_confidence, 0.8808);
    }

    #[test]
    fn top_n_zero_returns_no_factors() {
        let result = scorer()
            .score(&features(0, 0, 0), &ScoreOptions { threshold: 0.5, top_n: 0 })
            .unwrap();
        assert!(result.top_risk_factors.is_empty());
        assert_eq!(result.risk_category, RiskCategory::Low);
    }

    #[test]
    fn threshold_is_checked_first() {
        let err = RiskScorer::unavailable("no bundle")
            .score(&FeatureMap::new(), &ScoreOptions { threshold: 1.0, top_n: 5 })
            .unwrap_err();
        assert_eq!(err, ScoringError::InvalidThreshold(1.0));

        let err = scorer()
            .score(&features(0, 0, 0), &ScoreOptions { threshold: f64::NAN, top_n: 5 })
            .unwrap_err();
        assert!(matches!(err, ScoringError::InvalidThreshold(_)));
    }

    #[test]
    fn non_finite_values_are_unexpected_failures() {
        let mut map = features(0, 0, 0);
        map.insert("b", f64::INFINITY);
        let err = scorer().score(&map, &ScoreOptions::default()).unwrap_err();
        assert!(matches!(err, ScoringError::UnexpectedFailure(msg) if msg.contains("feature b")));
    }

    #[test]
    fn serialized_field_names_are_stable() {
        let result = scorer()
            .score_patient("p-17", &features(1, 0, 0), &ScoreOptions::default())
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();

        for key in [
            "patient_id",
            "risk_score",
            "risk_percentage",
            "prediction",
            "risk_category",
            "threshold_used",
            "top_risk_factors",
            "model_confidence",
            "prediction_timestamp",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["patient_id"], "p-17");
        assert_eq!(json["risk_category"], "HIGH");

        let factor = &json["top_risk_factors"][0];
        assert_eq!(factor["feature"], "a");
        assert_eq!(factor["value"], 1);
        assert_eq!(factor["impact"], "increases risk");
        assert!(factor.get("shap_value").is_some());
        assert!(factor.get("magnitude").is_none());
    }

    #[test]
    fn health_reflects_model_state() {
        let healthy = scorer().health();
        assert_eq!(healthy.status, HealthStatus::Healthy);
        assert_eq!(healthy.features, ["a", "b", "c"]);
        assert_eq!(healthy.model_hash.as_deref().map(str::len), Some(64));

        let sick = RiskScorer::unavailable("bad bundle").health();
        assert_eq!(sick.status, HealthStatus::Unhealthy);
        assert!(!sick.model_loaded);
        assert_eq!(sick.error.as_deref(), Some("bad bundle"));
        assert_eq!(RiskScorer::unavailable("x").info().features_required, 0);

        // Same keys whether or not a model is loaded
        let healthy_json = serde_json::to_value(scorer().health()).unwrap();
        let sick_json = serde_json::to_value(&sick).unwrap();
        let keys = |v: &serde_json::Value| v.as_object().unwrap().keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys(&healthy_json), keys(&sick_json));
        assert!(sick_json["model_type"].is_null());
    }
}
