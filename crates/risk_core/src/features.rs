//! Feature values and request-scoped feature maps

use crate::contract::FeatureContract;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single clinical input, keeping the caller's integer/float distinction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
}

impl FeatureValue {
    pub fn as_f64(self) -> f64 {
        match self {
            FeatureValue::Int(v) => v as f64,
            FeatureValue::Float(v) => v,
        }
    }

    /// Integral value usable as a categorical code (`2.0` counts as `2`)
    pub fn as_code(self) -> Option<i64> {
        match self {
            FeatureValue::Int(v) => Some(v),
            FeatureValue::Float(v)
                if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 =>
            {
                Some(v as i64)
            }
            FeatureValue::Float(_) => None,
        }
    }

    pub fn is_finite(self) -> bool {
        match self {
            FeatureValue::Int(_) => true,
            FeatureValue::Float(v) => v.is_finite(),
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Int(v) => write!(f, "{v}"),
            // Debug keeps the trailing ".0" on whole floats
            FeatureValue::Float(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Int(v)
    }
}

impl From<i32> for FeatureValue {
    fn from(v: i32) -> Self {
        FeatureValue::Int(v.into())
    }
}

impl From<u8> for FeatureValue {
    fn from(v: u8) -> Self {
        FeatureValue::Int(v.into())
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Float(v)
    }
}

/// Named inputs for one scoring call
///
/// A `null` entry is kept distinct from an absent key on the wire, but both
/// count as missing when checked against a contract. Keys outside the
/// contract are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureMap(HashMap<String, Option<FeatureValue>>);

impl FeatureMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        self.0.insert(name.into(), Some(value.into()));
    }

    /// Record an explicit `null` for `name`
    pub fn insert_null(&mut self, name: impl Into<String>) {
        self.0.insert(name.into(), None);
    }

    pub fn remove(&mut self, name: &str) -> Option<FeatureValue> {
        self.0.remove(name).flatten()
    }

    /// Value for `name` when present and non-null
    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        self.0.get(name).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Values in contract order, or every missing contract name in contract order
    pub fn ordered_values(&self, contract: &FeatureContract) -> Result<Vec<FeatureValue>, Vec<String>> {
        let mut values = Vec::with_capacity(contract.len());
        let mut missing = Vec::new();

        for name in contract.iter() {
            match self.get(name) {
                Some(value) => values.push(value),
                None => missing.push(name.to_string()),
            }
        }

        if missing.is_empty() {
            Ok(values)
        } else {
            Err(missing)
        }
    }
}

impl<K, V> FromIterator<(K, V)> for FeatureMap
where
    K: Into<String>,
    V: Into<FeatureValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        )
    }
}
