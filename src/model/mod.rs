pub mod predictor;
pub mod registry;
pub mod store;

pub use predictor::{Label, Model, Predictor};
pub use registry::{ArtifactInfo, ArtifactRegistry};
pub use store::ArtifactStore;

use crate::error::{Error, Result};
use crate::schema::Disease;
use std::collections::BTreeMap;

/// The predictors loaded at startup. Immutable once built.
#[derive(Debug, Default)]
pub struct ModelSet {
    models: BTreeMap<Disease, Model>,
}

impl ModelSet {
    pub fn insert(&mut self, model: Model) {
        self.models.insert(model.disease(), model);
    }

    pub fn get(&self, disease: Disease) -> Result<&Model> {
        self.models
            .get(&disease)
            .ok_or_else(|| Error::ModelNotFound(disease.to_string()))
    }

    pub fn diseases(&self) -> Vec<Disease> {
        self.models.keys().copied().collect()
    }
}
