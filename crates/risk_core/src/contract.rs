//! Ordered feature contract shared by inference and attribution

use crate::errors::ModelLoadError;
use std::collections::HashSet;

/// The fixed, ordered list of feature names a model was trained on
///
/// Built once from the model bundle; there is no way to edit it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureContract {
    names: Vec<String>,
}

impl FeatureContract {
    /// Build a contract from the bundle's feature list
    pub fn new(names: Option<Vec<String>>) -> Result<Self, ModelLoadError> {
        let names = match names {
            Some(names) if !names.is_empty() => names,
            _ => return Err(ModelLoadError::MissingFeatureList),
        };

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(ModelLoadError::DuplicateFeature(name.clone()));
            }
        }

        Ok(Self { names })
    }

    /// Feature names in model order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Index of `name` in the model's feature vector
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
