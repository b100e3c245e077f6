use crate::error::{Error, Result};
use crate::model::{Label, ModelSet, Predictor};
use crate::schema::{Disease, FeatureVector};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub disease: Disease,
    pub label: Label,
    pub message: &'static str,
}

/// Run one feature vector through a predictor.
pub fn predict(predictor: &dyn Predictor, features: &FeatureVector) -> Result<Label> {
    let values = features.values();
    if values.len() != predictor.n_features() {
        return Err(Error::SchemaMismatch {
            model: features.disease().to_string(),
            expected: predictor.n_features(),
            actual: values.len(),
        });
    }

    let label = predictor.classify(values)?;
    tracing::debug!(model = %features.disease(), label = u8::from(label), "Prediction complete");
    Ok(label)
}

/// Predict with the model matching the vector's schema and word the result.
pub fn diagnose(models: &ModelSet, features: &FeatureVector) -> Result<Outcome> {
    let disease = features.disease();
    let model = models.get(disease)?;
    let label = predict(model, features)?;

    Ok(Outcome {
        disease,
        label,
        message: message(disease, label),
    })
}

pub fn message(disease: Disease, label: Label) -> &'static str {
    match (disease, label) {
        (Disease::Diabetes, Label::Positive) => "The person is diabetic",
        (Disease::Diabetes, Label::Negative) => "The person is not diabetic",
        (Disease::Heart, Label::Positive) => "The person has heart disease",
        (Disease::Heart, Label::Negative) => "The person does not have heart disease",
        (Disease::Parkinsons, Label::Positive) => "The person has Parkinson's disease",
        (Disease::Parkinsons, Label::Negative) => "The person does not have Parkinson's disease",
    }
}
