//! Feature schemas for the three supported models.
//!
//! A [`FeatureVector`] can only be built through [`Disease::assemble`] or
//! [`Disease::assemble_inputs`], so every vector that reaches a predictor has
//! the width and column order its model was trained on.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Disease {
    Diabetes,
    Heart,
    #[serde(alias = "parkinson")]
    #[value(alias = "parkinson")]
    Parkinsons,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Float,
    /// Select-style input restricted to 0 or 1.
    Binary,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, label: &'static str, kind: FieldKind) -> Field {
    Field { name, label, kind }
}

const DIABETES_FIELDS: [Field; 8] = [
    field("pregnancies", "Number of Pregnancies", FieldKind::Integer),
    field("glucose", "Glucose Level", FieldKind::Integer),
    field("blood_pressure", "Blood Pressure value", FieldKind::Integer),
    field("skin_thickness", "Skin Thickness value", FieldKind::Integer),
    field("insulin", "Insulin Level", FieldKind::Integer),
    field("bmi", "BMI value", FieldKind::Float),
    field("diabetes_pedigree_function", "Diabetes Pedigree Function", FieldKind::Float),
    field("age", "Age of the Person", FieldKind::Integer),
];

const HEART_FIELDS: [Field; 13] = [
    field("age", "Age", FieldKind::Integer),
    field("sex", "Sex (0 = female, 1 = male)", FieldKind::Binary),
    field("cp", "Chest Pain types", FieldKind::Integer),
    field("trestbps", "Resting Blood Pressure", FieldKind::Integer),
    field("chol", "Serum Cholesterol in mg/dl", FieldKind::Integer),
    field("fbs", "Fasting Blood Sugar > 120 mg/dl", FieldKind::Binary),
    field("restecg", "Resting Electrocardiographic results", FieldKind::Integer),
    field("thalach", "Maximum Heart Rate achieved", FieldKind::Integer),
    field("exang", "Exercise Induced Angina", FieldKind::Binary),
    field("oldpeak", "ST depression induced by exercise", FieldKind::Float),
    field("slope", "Slope of the peak exercise ST segment", FieldKind::Integer),
    field("ca", "Major vessels colored by fluoroscopy", FieldKind::Integer),
    field(
        "thal",
        "Thal (0 = normal, 1 = fixed defect, 2 = reversible defect)",
        FieldKind::Integer,
    ),
];

// Voice measurements; names are the column names of the training data.
const PARKINSONS_FIELDS: [Field; 22] = [
    field("MDVP:Fo(Hz)", "MDVP:Fo(Hz)", FieldKind::Float),
    field("MDVP:Fhi(Hz)", "MDVP:Fhi(Hz)", FieldKind::Float),
    field("MDVP:Flo(Hz)", "MDVP:Flo(Hz)", FieldKind::Float),
    field("MDVP:Jitter(%)", "MDVP:Jitter(%)", FieldKind::Float),
    field("MDVP:Jitter(Abs)", "MDVP:Jitter(Abs)", FieldKind::Float),
    field("MDVP:RAP", "MDVP:RAP", FieldKind::Float),
    field("MDVP:PPQ", "MDVP:PPQ", FieldKind::Float),
    field("Jitter:DDP", "Jitter:DDP", FieldKind::Float),
    field("MDVP:Shimmer", "MDVP:Shimmer", FieldKind::Float),
    field("MDVP:Shimmer(dB)", "MDVP:Shimmer(dB)", FieldKind::Float),
    field("Shimmer:APQ3", "Shimmer:APQ3", FieldKind::Float),
    field("Shimmer:APQ5", "Shimmer:APQ5", FieldKind::Float),
    field("MDVP:APQ", "MDVP:APQ", FieldKind::Float),
    field("Shimmer:DDA", "Shimmer:DDA", FieldKind::Float),
    field("NHR", "NHR", FieldKind::Float),
    field("HNR", "HNR", FieldKind::Float),
    field("RPDE", "RPDE", FieldKind::Float),
    field("DFA", "DFA", FieldKind::Float),
    field("spread1", "spread1", FieldKind::Float),
    field("spread2", "spread2", FieldKind::Float),
    field("D2", "D2", FieldKind::Float),
    field("PPE", "PPE", FieldKind::Float),
];

impl Disease {
    pub const ALL: [Disease; 3] = [Disease::Diabetes, Disease::Heart, Disease::Parkinsons];

    pub fn name(self) -> &'static str {
        match self {
            Disease::Diabetes => "diabetes",
            Disease::Heart => "heart",
            Disease::Parkinsons => "parkinsons",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Disease::Diabetes => "Diabetes Prediction",
            Disease::Heart => "Heart Disease Prediction",
            Disease::Parkinsons => "Parkinson's Prediction",
        }
    }

    pub fn artifact_filename(self) -> &'static str {
        match self {
            Disease::Diabetes => "diabetes_model.json",
            Disease::Heart => "heart_model.json",
            Disease::Parkinsons => "parkinsons_model.json",
        }
    }

    pub fn fields(self) -> &'static [Field] {
        match self {
            Disease::Diabetes => &DIABETES_FIELDS,
            Disease::Heart => &HEART_FIELDS,
            Disease::Parkinsons => &PARKINSONS_FIELDS,
        }
    }

    pub fn width(self) -> usize {
        self.fields().len()
    }

    /// Build a vector from values already in schema order.
    pub fn assemble(self, values: &[f64]) -> Result<FeatureVector> {
        if values.len() != self.width() {
            return Err(Error::SchemaMismatch {
                model: self.name().to_string(),
                expected: self.width(),
                actual: values.len(),
            });
        }

        for (field, &value) in self.fields().iter().zip(values) {
            field.check(value)?;
        }

        Ok(FeatureVector {
            disease: self,
            values: values.to_vec(),
        })
    }

    /// Build a vector from named form inputs. Fields left out default to 0.
    pub fn assemble_inputs<'a, I>(self, inputs: I) -> Result<FeatureVector>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let fields = self.fields();
        let mut values = vec![0.0; fields.len()];

        for (name, value) in inputs {
            let index = fields
                .iter()
                .position(|f| f.name == name)
                .ok_or_else(|| {
                    Error::InvalidInput(format!("Unknown {} field: {}", self.name(), name))
                })?;
            values[index] = value;
        }

        self.assemble(&values)
    }
}

impl Field {
    fn check(&self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::InvalidInput(format!(
                "{} must be a finite number",
                self.name
            )));
        }

        match self.kind {
            FieldKind::Binary if value != 0.0 && value != 1.0 => Err(Error::InvalidInput(
                format!("{} must be 0 or 1, got {}", self.name, value),
            )),
            FieldKind::Integer if value.fract() != 0.0 => Err(Error::InvalidInput(format!(
                "{} must be a whole number, got {}",
                self.name, value
            ))),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Disease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Disease {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "diabetes" => Ok(Disease::Diabetes),
            "heart" => Ok(Disease::Heart),
            "parkinsons" | "parkinson" => Ok(Disease::Parkinsons),
            _ => Err(Error::ModelNotFound(s.to_string())),
        }
    }
}

/// An ordered feature vector bound to the schema it was assembled against.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    disease: Disease,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn disease(&self) -> Disease {
        self.disease
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
