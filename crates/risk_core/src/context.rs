//! Process-wide model state, built once at startup

use crate::contract::FeatureContract;
use crate::errors::ModelLoadError;
use crate::model::{ModelAdapter, ModelBundle};
use crate::shap::TreeExplainer;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Loaded model, its feature contract and an explainer bound to it
///
/// Immutable after construction and shared by reference between concurrent
/// scoring calls.
#[derive(Debug)]
pub struct ModelContext {
    contract: FeatureContract,
    adapter: ModelAdapter,
    explainer: TreeExplainer,
}

impl ModelContext {
    /// Validate a bundle and wire up inference and attribution over one ensemble
    pub fn from_bundle(bundle: ModelBundle) -> Result<Self, ModelLoadError> {
        let contract = FeatureContract::new(bundle.features)?;
        bundle.model.validate(contract.len())?;

        let adapter = ModelAdapter::new(Arc::new(bundle.model), bundle.scale_pos_weight)?;
        let explainer = TreeExplainer::new(&adapter);
        debug_assert!(explainer.is_bound_to(&adapter));

        info!(
            features = contract.len(),
            trees = adapter.ensemble().num_trees(),
            model_type = adapter.model_type(),
            fingerprint = adapter.fingerprint(),
            "model context ready"
        );

        Ok(Self {
            contract,
            adapter,
            explainer,
        })
    }

    /// Load and validate a bundle from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading model bundle");
        Self::from_bundle(ModelBundle::load_json(path)?)
    }

    pub fn contract(&self) -> &FeatureContract {
        &self.contract
    }

    pub fn adapter(&self) -> &ModelAdapter {
        &self.adapter
    }

    pub fn explainer(&self) -> &TreeExplainer {
        &self.explainer
    }
}
