//! Health and service descriptors reported to the hosting layer

use serde::{Deserialize, Serialize};

/// Service name reported by [`ServiceInfo`]
pub const SERVICE_NAME: &str = "CVD Risk Prediction API";

/// Model family named in [`ServiceInfo`] before a model is loaded
pub const MODEL_FAMILY: &str = "Tree ensemble";

const EXPLAINER: &str = "TreeSHAP explainability";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Model state of a running scorer
///
/// Every key is always present; model fields are `null` while unhealthy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub model_loaded: bool,
    pub model_type: Option<String>,
    pub features: Vec<String>,
    pub scale_pos_weight: Option<f64>,
    /// Blake3 fingerprint of the loaded ensemble
    pub model_hash: Option<String>,
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub service: String,
    pub status: String,
    pub model: String,
    pub features_required: usize,
    pub version: String,
}

impl ServiceInfo {
    /// `model_type` names the loaded ensemble, if any
    pub fn new(features_required: usize, model_type: Option<&str>) -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            status: "running".to_string(),
            model: format!("{} with {}", model_type.unwrap_or(MODEL_FAMILY), EXPLAINER),
            features_required,
            version: crate::VERSION.to_string(),
        }
    }
}
