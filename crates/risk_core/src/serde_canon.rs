//! Canonical JSON and fingerprints for persisted models
//!
//! Two bundles that describe the same ensemble must report the same
//! fingerprint regardless of how their JSON was laid out on disk, so object
//! keys are sorted recursively and output is compact before hashing.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanonicalError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Serialize a value to canonical JSON (sorted keys, no whitespace)
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let json_value = serde_json::to_value(value)
        .map_err(|e| CanonicalError::SerializationError(e.to_string()))?;

    serde_json::to_string(&canonicalize_value(json_value))
        .map_err(|e| CanonicalError::SerializationError(e.to_string()))
}

fn canonicalize_value(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: BTreeMap<String, serde_json::Value> = map
                .into_iter()
                .map(|(k, v)| (k, canonicalize_value(v)))
                .collect();
            serde_json::Value::Object(sorted.into_iter().collect())
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(canonicalize_value).collect())
        }
        other => other,
    }
}

/// Blake3 hash of the canonical JSON form, hex encoded
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let json = to_canonical_json(value)?;
    Ok(hex::encode(blake3::hash(json.as_bytes()).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Split {
        threshold: f64,
        feature_idx: i32,
        cover: f64,
    }

    #[test]
    fn test_keys_are_sorted_and_compact() {
        let json = to_canonical_json(&Split {
            threshold: 129.5,
            feature_idx: 5,
            cover: 700.0,
        })
        .unwrap();

        assert_eq!(json, r#"{"cover":700.0,"feature_idx":5,"threshold":129.5}"#);
    }

    #[test]
    fn test_layout_does_not_change_hash() {
        let compact: serde_json::Value =
            serde_json::from_str(r#"{"b":{"y":1,"x":2},"a":[3,4]}"#).unwrap();
        let spaced: serde_json::Value = serde_json::from_str(
            r#"{
                "a": [3, 4],
                "b": { "x": 2, "y": 1 }
            }"#,
        )
        .unwrap();

        let hash = hash_canonical_hex(&compact).unwrap();
        assert_eq!(hash, hash_canonical_hex(&spaced).unwrap());
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_hash_changes_with_values() {
        let a = Split {
            threshold: 129.5,
            feature_idx: 5,
            cover: 700.0,
        };
        let b = Split {
            threshold: 139.5,
            ..a
        };
        assert_ne!(hash_canonical_hex(&a).unwrap(), hash_canonical_hex(&b).unwrap());
    }
}
