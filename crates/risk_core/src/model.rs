//! Persisted model bundle and the inference adapter around it

use crate::errors::{ModelLoadError, ScoringError};
use crate::gbdt::TreeEnsemble;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Class-imbalance weight assumed when a bundle does not record one
pub const DEFAULT_SCALE_POS_WEIGHT: f64 = 2.04;

fn default_scale_pos_weight() -> f64 {
    DEFAULT_SCALE_POS_WEIGHT
}

/// On-disk model artifact: the fitted ensemble plus its metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelBundle {
    /// Ordered feature names; `None` when the artifact omits them
    #[serde(default)]
    pub features: Option<Vec<String>>,

    /// Positive-class weight the model was trained with
    #[serde(default = "default_scale_pos_weight")]
    pub scale_pos_weight: f64,

    pub model: TreeEnsemble,
}

impl ModelBundle {
    pub fn from_json_str(json: &str) -> Result<Self, ModelLoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a bundle from a JSON file; structure is checked by `ModelContext`
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelLoadError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Probability inference over contract-ordered feature vectors
#[derive(Debug)]
pub struct ModelAdapter {
    model: Arc<TreeEnsemble>,
    scale_pos_weight: f64,
    fingerprint: String,
}

impl ModelAdapter {
    /// Wrap an ensemble that has already been validated against its contract
    pub(crate) fn new(model: Arc<TreeEnsemble>, scale_pos_weight: f64) -> Result<Self, ModelLoadError> {
        if !scale_pos_weight.is_finite() || scale_pos_weight <= 0.0 {
            return Err(ModelLoadError::ValidationFailed(format!(
                "Invalid scale_pos_weight: {scale_pos_weight}"
            )));
        }

        let fingerprint = model.hash_hex()?;

        Ok(Self {
            model,
            scale_pos_weight,
            fingerprint,
        })
    }

    /// Positive-class probability in [0, 1]
    pub fn predict_probability(&self, vector: &[f64]) -> Result<f64, ScoringError> {
        let expected = self.num_features();
        if vector.len() != expected {
            return Err(ScoringError::UnexpectedFailure(format!(
                "feature vector has {} values, model expects {}",
                vector.len(),
                expected
            )));
        }

        let p = self.model.probability(vector);
        if !p.is_finite() {
            return Err(ScoringError::UnexpectedFailure(
                "model produced a non-finite probability".to_string(),
            ));
        }
        Ok(p)
    }

    /// Model-level importance per feature, in contract order
    pub fn feature_importances(&self) -> &[f64] {
        &self.model.feature_importances
    }

    pub fn num_features(&self) -> usize {
        self.model.feature_importances.len()
    }

    pub fn scale_pos_weight(&self) -> f64 {
        self.scale_pos_weight
    }

    pub fn model_type(&self) -> &'static str {
        self.model.objective.model_type()
    }

    /// Blake3 hex digest of the ensemble's canonical JSON
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub(crate) fn ensemble(&self) -> &Arc<TreeEnsemble> {
        &self.model
    }
}
