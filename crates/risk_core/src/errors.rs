//! Error types for the risk scoring core

use crate::serde_canon::CanonicalError;
use thiserror::Error;

/// Errors returned by a scoring call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// No model is loaded; fails until the process restarts with a valid bundle
    #[error("Model not loaded")]
    ModelUnavailable,

    /// Contract features absent or null in the input, in contract order
    #[error("Missing features: {}", .0.join(", "))]
    MissingFeatures(Vec<String>),

    /// Threshold outside the open interval (0, 1)
    #[error("Threshold must be between 0 and 1 (exclusive), got {0}")]
    InvalidThreshold(f64),

    /// Inference or attribution failed
    #[error("Prediction failed: {0}")]
    UnexpectedFailure(String),
}

impl ScoringError {
    /// Whether the caller can fix the failure by changing its input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ScoringError::MissingFeatures(_) | ScoringError::InvalidThreshold(_)
        )
    }
}

/// Errors raised while loading a model bundle
#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model bundle has no feature list")]
    MissingFeatureList,

    #[error("Duplicate feature in contract: {0}")]
    DuplicateFeature(String),

    #[error("Model validation failed: {0}")]
    ValidationFailed(String),

    #[error("Canonical serialization error: {0}")]
    Canonical(#[from] CanonicalError),
}

/// Result type for scoring operations
pub type Result<T> = std::result::Result<T, ScoringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_features_message_lists_names() {
        let err = ScoringError::MissingFeatures(vec!["ap_hi".into(), "bmi".into()]);
        assert_eq!(err.to_string(), "Missing features: ap_hi, bmi");
        assert!(err.is_client_error());
    }

    #[test]
    fn server_side_errors_are_not_client_errors() {
        assert!(!ScoringError::ModelUnavailable.is_client_error());
        assert!(!ScoringError::UnexpectedFailure("overflow".into()).is_client_error());
        assert!(ScoringError::InvalidThreshold(1.0).is_client_error());
    }
}
