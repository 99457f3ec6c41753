//! Tree ensemble with a probability link
//!
//! Implements the classifier behind the risk model:
//! - Weighted sum of tree outputs plus a base score (the margin)
//! - Logistic or identity link from margin to probability
//! - Canonical JSON serialization and blake3 fingerprinting

use super::tree::Tree;
use crate::errors::ModelLoadError;
use crate::serde_canon::{hash_canonical_hex, to_canonical_json};
use serde::{Deserialize, Serialize};

/// Supported ensemble format version
pub const FORMAT_VERSION: i32 = 1;

/// How the ensemble margin maps to a positive-class probability
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Boosted trees: leaves are log-odds, probability is `sigmoid(margin)`
    BinaryLogistic,
    /// Averaging forest: leaves are positive-class probabilities
    ClassProbability,
}

impl Objective {
    /// Human-readable model family, reported by health checks
    pub fn model_type(&self) -> &'static str {
        match self {
            Objective::BinaryLogistic => "GradientBoostedTrees",
            Objective::ClassProbability => "RandomForest",
        }
    }
}

/// Trained tree ensemble with its global feature importances
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeEnsemble {
    /// Model format version (always 1 for now)
    pub version: i32,

    /// Link between margin and probability
    pub objective: Objective,

    /// Constant added to the weighted tree sum
    #[serde(default)]
    pub base_score: f64,

    /// Decision trees in the ensemble
    pub trees: Vec<Tree>,

    /// Model-level importance per feature, aligned with the feature list
    pub feature_importances: Vec<f64>,
}

impl TreeEnsemble {
    /// Create a new ensemble in the current format version
    pub fn new(
        objective: Objective,
        base_score: f64,
        trees: Vec<Tree>,
        feature_importances: Vec<f64>,
    ) -> Self {
        Self {
            version: FORMAT_VERSION,
            objective,
            base_score,
            trees,
            feature_importances,
        }
    }

    /// Validate model structure for a feature vector of `num_features`
    pub fn validate(&self, num_features: usize) -> Result<(), ModelLoadError> {
        if self.version != FORMAT_VERSION {
            return Err(ModelLoadError::ValidationFailed(format!(
                "Unsupported model version: {}",
                self.version
            )));
        }

        if !self.base_score.is_finite() {
            return Err(ModelLoadError::ValidationFailed(format!(
                "Invalid base_score: {}",
                self.base_score
            )));
        }

        if self.trees.is_empty() {
            return Err(ModelLoadError::ValidationFailed(
                "Model has no trees".to_string(),
            ));
        }

        if self.feature_importances.len() != num_features {
            return Err(ModelLoadError::ValidationFailed(format!(
                "Expected {} feature importances, found {}",
                num_features,
                self.feature_importances.len()
            )));
        }

        if let Some(bad) = self.feature_importances.iter().find(|v| !v.is_finite()) {
            return Err(ModelLoadError::ValidationFailed(format!(
                "Non-finite feature importance: {bad}"
            )));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(num_features).map_err(|e| {
                ModelLoadError::ValidationFailed(format!("Tree {} validation failed: {}", i, e))
            })?;
        }

        Ok(())
    }

    /// Raw ensemble output: `base_score + sum(weight * leaf)`
    pub fn margin(&self, features: &[f64]) -> f64 {
        self.trees
            .iter()
            .fold(self.base_score, |sum, tree| sum + tree.weight * tree.evaluate(features))
    }

    /// Margin when no feature value is known, averaged over training covers
    pub fn expected_margin(&self) -> f64 {
        self.trees
            .iter()
            .fold(self.base_score, |sum, tree| sum + tree.weight * tree.expected_value())
    }

    /// Positive-class probability for a feature vector
    pub fn probability(&self, features: &[f64]) -> f64 {
        let margin = self.margin(features);
        match self.objective {
            Objective::BinaryLogistic => sigmoid(margin),
            Objective::ClassProbability => margin.clamp(0.0, 1.0),
        }
    }

    /// Serialize model to canonical JSON (sorted keys, no whitespace)
    pub fn to_canonical_json(&self) -> Result<String, ModelLoadError> {
        Ok(to_canonical_json(self)?)
    }

    /// Blake3 hash of the canonical JSON representation, as hex
    pub fn hash_hex(&self) -> Result<String, ModelLoadError> {
        Ok(hash_canonical_hex(self)?)
    }

    /// Get number of trees in the model
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
