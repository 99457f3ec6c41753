//! Patient records and derived vitals

use crate::features::{FeatureMap, FeatureValue};
use serde::{Deserialize, Serialize};

/// Raw vitals as collected at intake; derived pressures and BMI are computed
///
/// Age and blood pressures accept integers or decimals and keep whichever
/// form the caller sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientVitals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    /// 1 = female, 2 = male
    pub gender: i64,
    pub age_years: FeatureValue,
    /// Centimetres
    pub height: f64,
    /// Kilograms
    pub weight: f64,
    pub ap_hi: FeatureValue,
    pub ap_lo: FeatureValue,
    pub cholesterol: i64,
    pub gluc: i64,
    pub smoke: i64,
    pub alco: i64,
    pub active: i64,
}

impl PatientVitals {
    /// Body mass index, one decimal
    pub fn bmi(&self) -> f64 {
        let metres = self.height / 100.0;
        round1(self.weight / (metres * metres))
    }

    /// Systolic minus diastolic; integral when both readings are
    pub fn pulse_pressure(&self) -> FeatureValue {
        match (self.ap_hi, self.ap_lo) {
            (FeatureValue::Int(hi), FeatureValue::Int(lo)) => hi
                .checked_sub(lo)
                .map_or(FeatureValue::Float(hi as f64 - lo as f64), FeatureValue::Int),
            (hi, lo) => FeatureValue::Float(hi.as_f64() - lo.as_f64()),
        }
    }

    /// Mean arterial pressure, one decimal
    pub fn mean_arterial_pressure(&self) -> f64 {
        round1((self.ap_hi.as_f64() + 2.0 * self.ap_lo.as_f64()) / 3.0)
    }

    pub fn to_record(&self) -> PatientRecord {
        PatientRecord {
            patient_id: self.patient_id.clone(),
            gender: self.gender,
            age_years: self.age_years,
            height: self.height,
            weight: self.weight,
            bmi: self.bmi(),
            ap_hi: self.ap_hi,
            ap_lo: self.ap_lo,
            pulse_pressure: self.pulse_pressure(),
            map: self.mean_arterial_pressure(),
            cholesterol: self.cholesterol,
            gluc: self.gluc,
            smoke: self.smoke,
            alco: self.alco,
            active: self.active,
        }
    }

    pub fn to_feature_map(&self) -> FeatureMap {
        self.to_record().to_feature_map()
    }
}

/// Every model input for one patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    pub gender: i64,
    pub age_years: FeatureValue,
    pub height: f64,
    pub weight: f64,
    pub bmi: f64,
    pub ap_hi: FeatureValue,
    pub ap_lo: FeatureValue,
    pub pulse_pressure: FeatureValue,
    pub map: f64,
    pub cholesterol: i64,
    pub gluc: i64,
    pub smoke: i64,
    pub alco: i64,
    pub active: i64,
}

impl PatientRecord {
    pub fn to_feature_map(&self) -> FeatureMap {
        let mut features = FeatureMap::new();
        features.insert("gender", self.gender);
        features.insert("age_years", self.age_years);
        features.insert("height", self.height);
        features.insert("weight", self.weight);
        features.insert("bmi", self.bmi);
        features.insert("ap_hi", self.ap_hi);
        features.insert("ap_lo", self.ap_lo);
        features.insert("pulse_pressure", self.pulse_pressure);
        features.insert("map", self.map);
        features.insert("cholesterol", self.cholesterol);
        features.insert("gluc", self.gluc);
        features.insert("smoke", self.smoke);
        features.insert("alco", self.alco);
        features.insert("active", self.active);
        features
    }
}

impl From<&PatientVitals> for FeatureMap {
    fn from(vitals: &PatientVitals) -> Self {
        vitals.to_feature_map()
    }
}

impl From<&PatientRecord> for FeatureMap {
    fn from(record: &PatientRecord) -> Self {
        record.to_feature_map()
    }
}

/// A loose scoring request: any feature map plus an optional patient id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(flatten)]
    pub features: FeatureMap,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
