//! Clinical knowledge tables
//!
//! Maps model feature names to how clinicians read them: a display name, a
//! unit, and a rule turning a raw value into an interpretation. Rules are
//! plain data so new features only need a new table row.
//!
//! Every lookup is total. Unknown features fall back to a title-cased name,
//! an empty unit and the value itself; unknown categorical codes read as
//! `"Unknown"`. Interpretation never fails a scoring call.

use crate::features::FeatureValue;

/// How a raw value is turned into a clinical reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rule {
    /// Ordered `(upper_bound, label)` bands matched with `value < upper_bound`,
    /// then the trailing label for everything above the last band
    Bands(&'static [(f64, &'static str)], &'static str),
    /// `(bound, above, otherwise)` matched with `value > bound`
    Above(f64, &'static str, &'static str),
    /// Ordinal category codes; anything else reads as "Unknown"
    Codes(&'static [(i64, &'static str)]),
    /// Two-valued field: `(label when 1, label otherwise)`
    Flag(&'static str, &'static str),
}

impl Rule {
    pub fn apply(&self, value: FeatureValue) -> String {
        match *self {
            Rule::Bands(bands, last) => {
                let x = value.as_f64();
                bands
                    .iter()
                    .find(|(bound, _)| x < *bound)
                    .map_or(last, |&(_, label)| label)
                    .to_string()
            }
            Rule::Above(bound, above, otherwise) => {
                let label = if value.as_f64() > bound { above } else { otherwise };
                label.to_string()
            }
            Rule::Codes(codes) => value
                .as_code()
                .and_then(|code| codes.iter().find(|(c, _)| *c == code))
                .map_or(UNKNOWN_CODE, |&(_, label)| label)
                .to_string(),
            Rule::Flag(yes, no) => {
                let label = if value.as_code() == Some(1) { yes } else { no };
                label.to_string()
            }
        }
    }
}

const UNKNOWN_CODE: &str = "Unknown";

/// One row of the knowledge table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureProfile {
    pub feature: &'static str,
    pub display_name: &'static str,
    pub unit: &'static str,
    pub rule: Option<Rule>,
}

const BP_STAGES_DIASTOLIC: &[(f64, &str)] = &[
    (80.0, "Normal diastolic BP"),
    (90.0, "Stage 1 hypertension"),
];

const BP_STAGES_SYSTOLIC: &[(f64, &str)] = &[
    (120.0, "Normal systolic BP"),
    (130.0, "Elevated systolic BP"),
    (140.0, "Stage 1 hypertension"),
];

const BMI_BANDS: &[(f64, &str)] = &[
    (18.5, "Underweight"),
    (25.0, "Normal weight"),
    (30.0, "Overweight"),
];

const AGE_BANDS: &[(f64, &str)] = &[(40.0, "Young adult"), (60.0, "Middle-aged")];

static PROFILES: &[FeatureProfile] = &[
    FeatureProfile {
        feature: "gender",
        display_name: "Gender",
        unit: "binary",
        rule: Some(Rule::Flag("Female", "Male")),
    },
    FeatureProfile {
        feature: "age_years",
        display_name: "Age",
        unit: "years",
        rule: Some(Rule::Bands(AGE_BANDS, "Older adult")),
    },
    FeatureProfile {
        feature: "height",
        display_name: "Height",
        unit: "cm",
        rule: None,
    },
    FeatureProfile {
        feature: "weight",
        display_name: "Weight",
        unit: "kg",
        rule: None,
    },
    FeatureProfile {
        feature: "bmi",
        display_name: "Body Mass Index",
        unit: "kg/m²",
        rule: Some(Rule::Bands(BMI_BANDS, "Obese")),
    },
    FeatureProfile {
        feature: "ap_hi",
        display_name: "Systolic Blood Pressure",
        unit: "mmHg",
        rule: Some(Rule::Bands(BP_STAGES_SYSTOLIC, "Stage 2 hypertension")),
    },
    FeatureProfile {
        feature: "ap_lo",
        display_name: "Diastolic Blood Pressure",
        unit: "mmHg",
        rule: Some(Rule::Bands(BP_STAGES_DIASTOLIC, "Stage 2 hypertension")),
    },
    FeatureProfile {
        feature: "pulse_pressure",
        display_name: "Pulse Pressure",
        unit: "mmHg",
        rule: Some(Rule::Above(60.0, "Widened pulse pressure", "Normal pulse pressure")),
    },
    FeatureProfile {
        feature: "map",
        display_name: "Mean Arterial Pressure",
        unit: "mmHg",
        rule: Some(Rule::Above(100.0, "Elevated MAP", "Normal MAP")),
    },
    FeatureProfile {
        feature: "cholesterol",
        display_name: "Cholesterol Level",
        unit: "category",
        rule: Some(Rule::Codes(&[
            (1, "Normal"),
            (2, "Above normal"),
            (3, "Well above normal"),
        ])),
    },
    FeatureProfile {
        feature: "gluc",
        display_name: "Glucose Level",
        unit: "category",
        rule: Some(Rule::Codes(&[
            (1, "Normal"),
            (2, "Above normal (prediabetes)"),
            (3, "Well above normal"),
        ])),
    },
    FeatureProfile {
        feature: "smoke",
        display_name: "Smoking Status",
        unit: "binary",
        rule: Some(Rule::Flag("Active smoker", "Non-smoker")),
    },
    FeatureProfile {
        feature: "alco",
        display_name: "Alcohol Consumption",
        unit: "binary",
        rule: Some(Rule::Flag("Consumes alcohol", "No alcohol")),
    },
    FeatureProfile {
        feature: "active",
        display_name: "Physical Activity",
        unit: "binary",
        rule: Some(Rule::Flag("Physically active", "Sedentary")),
    },
];

/// Table row for `feature`, if it has one
pub fn profile(feature: &str) -> Option<&'static FeatureProfile> {
    PROFILES.iter().find(|p| p.feature == feature)
}

/// Human-readable feature name
pub fn display_name(feature: &str) -> String {
    match profile(feature) {
        Some(p) => p.display_name.to_string(),
        None => title_case(&feature.replace('_', " ")),
    }
}

/// Measurement unit, empty when unknown
pub fn unit(feature: &str) -> &'static str {
    profile(feature).map_or("", |p| p.unit)
}

/// Clinical reading of `value` for `feature`
pub fn interpret(feature: &str, value: FeatureValue) -> String {
    match profile(feature).and_then(|p| p.rule) {
        Some(rule) => rule.apply(value),
        None => value.to_string(),
    }
}

/// Upper-case letters that follow a non-letter, lower-case the rest
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut after_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if after_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            out.push(c);
            after_letter = false;
        }
    }
    out
}
