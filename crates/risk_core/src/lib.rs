//! Cardiovascular disease risk scoring with per-feature explanations
//!
//! Scores a patient's clinical features against a gradient-boosted tree
//! ensemble and explains the prediction with exact TreeSHAP attributions,
//! annotated with clinical readings of each value.
//!
//! Modules:
//! - `gbdt`: Tree ensemble format and inference
//! - `contract`: Ordered feature names the model was trained on
//! - `features`: Request feature values and maps
//! - `clinical`: Display names, units and interpretation rules
//! - `model`: Model bundle artifact and probability adapter
//! - `shap`: Path-dependent TreeSHAP attribution engine
//! - `context`: Model state shared by all scoring calls
//! - `pipeline`: Validation, scoring and risk factor ranking
//! - `patient`: Patient records and derived vitals
//! - `health`: Health and service descriptors
//! - `config`: TOML configuration with environment overrides

pub mod clinical;
pub mod config;
pub mod context;
pub mod contract;
pub mod errors;
pub mod features;
pub mod gbdt;
pub mod health;
pub mod model;
pub mod patient;
pub mod pipeline;
pub mod serde_canon;
pub mod shap;

pub use config::{ConfigError, ScoringConfig};
pub use context::ModelContext;
pub use contract::FeatureContract;
pub use errors::{ModelLoadError, ScoringError};
pub use features::{FeatureMap, FeatureValue};
pub use health::{HealthReport, HealthStatus, ServiceInfo};
pub use model::{ModelAdapter, ModelBundle};
pub use patient::{PatientRecord, PatientVitals, ScoreRequest};
pub use pipeline::{Impact, RiskCategory, RiskFactor, RiskResult, RiskScorer, ScoreOptions};
pub use shap::TreeExplainer;

/// Crate version string reported by service info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
