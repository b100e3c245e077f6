use crate::error::{Error, Result};
use crate::schema::Disease;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;

/// Binary diagnostic label produced by a predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum Label {
    Negative,
    Positive,
}

impl From<Label> for u8 {
    fn from(label: Label) -> Self {
        match label {
            Label::Negative => 0,
            Label::Positive => 1,
        }
    }
}

impl Label {
    fn from_leaf(value: u8) -> Option<Self> {
        match value {
            0 => Some(Label::Negative),
            1 => Some(Label::Positive),
            _ => None,
        }
    }
}

/// A trained classifier. Implementations hold no mutable state.
pub trait Predictor: Send + Sync {
    fn n_features(&self) -> usize;

    fn classify(&self, features: &[f64]) -> Result<Label>;
}

/// Serialized form of a predictor as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disease: Option<Disease>,
    pub n_features: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<Scaler>,
    pub estimator: Estimator,
}

/// Standardizes each column as `(x - mean) / scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    /// Positive iff `coef . x + intercept > 0`.
    Linear { coef: Vec<f64>, intercept: f64 },
    /// Positive iff `sigmoid(coef . x + intercept) >= threshold`.
    Logistic {
        coef: Vec<f64>,
        intercept: f64,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    Tree(DecisionTree),
    /// Majority vote; ties go to the negative label.
    Forest { trees: Vec<DecisionTree> },
}

fn default_threshold() -> f64 {
    0.5
}

/// Flat decision tree rooted at node 0. Children always sit after their parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(u8),
}

/// A validated predictor loaded from a [`ModelArtifact`].
#[derive(Debug, Clone)]
pub struct Model {
    disease: Disease,
    artifact: ModelArtifact,
}

impl Model {
    pub fn load(path: &Path, disease: Disease) -> Result<Self> {
        tracing::info!("Loading {} model from: {:?}", disease, path);

        let content = std::fs::read(path).map_err(|e| {
            Error::ModelLoadFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let artifact: ModelArtifact = serde_json::from_slice(&content).map_err(|e| {
            Error::ModelLoadFailed(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        let model = Self::from_artifact(artifact, disease)?;

        tracing::info!(
            model = %disease,
            features = model.n_features(),
            estimator = model.estimator_kind(),
            "Model loaded successfully"
        );

        Ok(model)
    }

    pub fn from_artifact(artifact: ModelArtifact, disease: Disease) -> Result<Self> {
        if let Some(declared) = artifact.disease {
            if declared != disease {
                return Err(Error::ModelLoadFailed(format!(
                    "Artifact is a {} model, expected {}",
                    declared, disease
                )));
            }
        }

        if artifact.n_features != disease.width() {
            return Err(Error::ModelLoadFailed(format!(
                "{} model declares {} features but the schema has {}",
                disease,
                artifact.n_features,
                disease.width()
            )));
        }

        validate(&artifact)?;

        Ok(Self { disease, artifact })
    }

    pub fn disease(&self) -> Disease {
        self.disease
    }

    pub fn estimator_kind(&self) -> &'static str {
        match self.artifact.estimator {
            Estimator::Linear { .. } => "linear",
            Estimator::Logistic { .. } => "logistic",
            Estimator::Tree(_) => "tree",
            Estimator::Forest { .. } => "forest",
        }
    }
}

impl Predictor for Model {
    fn n_features(&self) -> usize {
        self.artifact.n_features
    }

    fn classify(&self, features: &[f64]) -> Result<Label> {
        if features.len() != self.n_features() {
            return Err(Error::SchemaMismatch {
                model: self.disease.to_string(),
                expected: self.n_features(),
                actual: features.len(),
            });
        }

        let x: Cow<'_, [f64]> = match &self.artifact.scaler {
            Some(scaler) => Cow::Owned(
                features
                    .iter()
                    .zip(scaler.mean.iter().zip(&scaler.scale))
                    .map(|(v, (mean, scale))| (v - mean) / scale)
                    .collect(),
            ),
            None => Cow::Borrowed(features),
        };

        let label = match &self.artifact.estimator {
            Estimator::Linear { coef, intercept } => {
                if dot(coef, &x) + intercept > 0.0 {
                    Label::Positive
                } else {
                    Label::Negative
                }
            }
            Estimator::Logistic {
                coef,
                intercept,
                threshold,
            } => {
                if sigmoid(dot(coef, &x) + intercept) >= *threshold {
                    Label::Positive
                } else {
                    Label::Negative
                }
            }
            Estimator::Tree(tree) => tree.evaluate(&x)?,
            Estimator::Forest { trees } => {
                let mut positive = 0;
                for tree in trees {
                    if tree.evaluate(&x)? == Label::Positive {
                        positive += 1;
                    }
                }
                if positive * 2 > trees.len() {
                    Label::Positive
                } else {
                    Label::Negative
                }
            }
        };

        Ok(label)
    }
}

impl DecisionTree {
    fn evaluate(&self, x: &[f64]) -> Result<Label> {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    index = if x[*feature] <= *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf(value)) => {
                    return Label::from_leaf(*value).ok_or_else(|| {
                        Error::PredictionError(format!("Invalid leaf label {}", value))
                    });
                }
                None => {
                    return Err(Error::PredictionError(format!(
                        "Tree node {} out of range",
                        index
                    )));
                }
            }
        }
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(Error::ModelLoadFailed("Decision tree has no nodes".to_string()));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(Error::ModelLoadFailed(format!(
                            "Node {} splits on feature {} of {}",
                            index, feature, n_features
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(Error::ModelLoadFailed(format!(
                            "Node {} has a non-finite threshold",
                            index
                        )));
                    }
                    for child in [left, right] {
                        if *child <= index || *child >= self.nodes.len() {
                            return Err(Error::ModelLoadFailed(format!(
                                "Node {} has invalid child {}",
                                index, child
                            )));
                        }
                    }
                }
                TreeNode::Leaf(value) => {
                    if Label::from_leaf(*value).is_none() {
                        return Err(Error::ModelLoadFailed(format!(
                            "Node {} has leaf label {}, expected 0 or 1",
                            index, value
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

fn validate(artifact: &ModelArtifact) -> Result<()> {
    let n = artifact.n_features;

    if let Some(scaler) = &artifact.scaler {
        check_width("scaler mean", &scaler.mean, n)?;
        check_width("scaler scale", &scaler.scale, n)?;
        if scaler.scale.iter().any(|s| *s == 0.0) {
            return Err(Error::ModelLoadFailed(
                "Scaler contains a zero scale".to_string(),
            ));
        }
    }

    match &artifact.estimator {
        Estimator::Linear { coef, intercept } => {
            check_width("coef", coef, n)?;
            check_finite("intercept", *intercept)?;
        }
        Estimator::Logistic {
            coef,
            intercept,
            threshold,
        } => {
            check_width("coef", coef, n)?;
            check_finite("intercept", *intercept)?;
            if !(*threshold > 0.0 && *threshold < 1.0) {
                return Err(Error::ModelLoadFailed(format!(
                    "Logistic threshold {} outside (0, 1)",
                    threshold
                )));
            }
        }
        Estimator::Tree(tree) => tree.validate(n)?,
        Estimator::Forest { trees } => {
            if trees.is_empty() {
                return Err(Error::ModelLoadFailed("Forest has no trees".to_string()));
            }
            for tree in trees {
                tree.validate(n)?;
            }
        }
    }

    Ok(())
}

fn check_width(what: &str, values: &[f64], n: usize) -> Result<()> {
    if values.len() != n {
        return Err(Error::ModelLoadFailed(format!(
            "{} has {} entries, expected {}",
            what,
            values.len(),
            n
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(Error::ModelLoadFailed(format!(
            "{} contains non-finite values",
            what
        )));
    }
    Ok(())
}

fn check_finite(what: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::ModelLoadFailed(format!("{} is not finite", what)))
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(w, x)| w * x).sum()
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures;

    const DIABETES_SAMPLE: [f64; 8] = [6.0, 148.0, 72.0, 35.0, 0.0, 33.6, 0.627, 50.0];
    const HEART_SAMPLE: [f64; 13] = [
        63.0, 1.0, 3.0, 145.0, 233.0, 1.0, 0.0, 150.0, 0.0, 2.3, 0.0, 0.0, 1.0,
    ];

    fn stump(feature: usize, threshold: f64, below: u8, above: u8) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf(below),
                TreeNode::Leaf(above),
            ],
        }
    }

    #[test]
    fn load_from_json_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = fixtures::write(tmp.path(), Disease::Diabetes);

        let model = Model::load(&path, Disease::Diabetes).unwrap();
        assert_eq!(model.n_features(), 8);
        assert_eq!(model.disease(), Disease::Diabetes);
        assert_eq!(model.estimator_kind(), "linear");
    }

    #[test]
    fn diabetes_reference_vector_is_stable() {
        let model = Model::from_artifact(fixtures::artifact(Disease::Diabetes), Disease::Diabetes)
            .unwrap();

        let first = model.classify(&DIABETES_SAMPLE).unwrap();
        for _ in 0..10 {
            assert_eq!(model.classify(&DIABETES_SAMPLE).unwrap(), first);
        }
        assert_eq!(first, Label::Positive);
        assert_eq!(model.classify(&[0.0; 8]).unwrap(), Label::Negative);
    }

    #[test]
    fn heart_reference_vector_is_stable() {
        let model =
            Model::from_artifact(fixtures::artifact(Disease::Heart), Disease::Heart).unwrap();

        let first = model.classify(&HEART_SAMPLE).unwrap();
        for _ in 0..10 {
            assert_eq!(model.classify(&HEART_SAMPLE).unwrap(), first);
        }
        assert_eq!(first, Label::Positive);
        assert_eq!(model.classify(&[0.0; 13]).unwrap(), Label::Negative);
    }

    #[test]
    fn loading_twice_gives_independent_equivalent_models() {
        let tmp = tempfile::tempdir().unwrap();
        let path = fixtures::write(tmp.path(), Disease::Heart);

        let a = Model::load(&path, Disease::Heart).unwrap();
        let b = Model::load(&path, Disease::Heart).unwrap();

        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            a.classify(&HEART_SAMPLE).unwrap(),
            b.classify(&HEART_SAMPLE).unwrap()
        );
        assert_eq!(a.classify(&[0.0; 13]).unwrap(), b.classify(&[0.0; 13]).unwrap());
    }

    #[test]
    fn every_fixture_returns_a_binary_label() {
        for disease in Disease::ALL {
            let model = Model::from_artifact(fixtures::artifact(disease), disease).unwrap();
            for fill in [0.0, 1.0, 50.0, -3.5] {
                let label = model.classify(&vec![fill; disease.width()]).unwrap();
                assert!(u8::from(label) <= 1);
            }
        }
    }

    #[test]
    fn wrong_length_is_rejected() {
        let model = Model::from_artifact(fixtures::artifact(Disease::Parkinsons), Disease::Parkinsons)
            .unwrap();

        for len in [0, 21, 23] {
            let err = model.classify(&vec![0.1; len]).unwrap_err();
            assert!(matches!(err, Error::SchemaMismatch { expected: 22, .. }));
        }
    }

    #[test]
    fn corrupt_file_fails_to_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("diabetes_model.json");
        std::fs::write(&path, b"\x80\x04\x95 not json").unwrap();

        let err = Model::load(&path, Disease::Diabetes).unwrap_err();
        assert!(matches!(err, Error::ModelLoadFailed(_)));
    }

    #[test]
    fn missing_file_fails_to_load() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Model::load(&tmp.path().join("absent.json"), Disease::Heart).unwrap_err();
        assert!(matches!(err, Error::ModelLoadFailed(_)));
    }

    #[test]
    fn artifact_width_must_match_schema() {
        let mut artifact = fixtures::artifact(Disease::Diabetes);
        artifact.disease = None;
        let err = Model::from_artifact(artifact, Disease::Heart).unwrap_err();
        assert!(err.to_string().contains("declares 8 features"));
    }

    #[test]
    fn declared_disease_must_match() {
        let err = Model::from_artifact(fixtures::artifact(Disease::Heart), Disease::Diabetes)
            .unwrap_err();
        assert!(err.to_string().contains("heart model"));
    }

    #[test]
    fn zero_scale_is_rejected() {
        let mut artifact = fixtures::artifact(Disease::Diabetes);
        if let Some(scaler) = artifact.scaler.as_mut() {
            scaler.scale[3] = 0.0;
        }
        assert!(Model::from_artifact(artifact, Disease::Diabetes).is_err());
    }

    #[test]
    fn tree_children_must_point_forward() {
        let artifact = ModelArtifact {
            disease: None,
            n_features: 22,
            scaler: None,
            estimator: Estimator::Tree(DecisionTree {
                nodes: vec![
                    TreeNode::Split {
                        feature: 0,
                        threshold: 1.0,
                        left: 0,
                        right: 1,
                    },
                    TreeNode::Leaf(1),
                ],
            }),
        };
        let err = Model::from_artifact(artifact, Disease::Parkinsons).unwrap_err();
        assert!(err.to_string().contains("invalid child 0"));
    }

    #[test]
    fn leaf_labels_must_be_binary() {
        let artifact = ModelArtifact {
            disease: None,
            n_features: 22,
            scaler: None,
            estimator: Estimator::Tree(stump(0, 1.0, 0, 2)),
        };
        assert!(Model::from_artifact(artifact, Disease::Parkinsons).is_err());
    }

    #[test]
    fn forest_majority_vote() {
        let artifact = ModelArtifact {
            disease: None,
            n_features: 22,
            scaler: None,
            estimator: Estimator::Forest {
                trees: vec![stump(0, 0.5, 0, 1), stump(1, 0.5, 0, 1), stump(2, 0.5, 0, 1)],
            },
        };
        let model = Model::from_artifact(artifact, Disease::Parkinsons).unwrap();

        let mut x = vec![0.0; 22];
        x[0] = 1.0;
        assert_eq!(model.classify(&x).unwrap(), Label::Negative);
        x[1] = 1.0;
        assert_eq!(model.classify(&x).unwrap(), Label::Positive);
    }

    #[test]
    fn forest_tie_is_negative() {
        let artifact = ModelArtifact {
            disease: None,
            n_features: 22,
            scaler: None,
            estimator: Estimator::Forest {
                trees: vec![stump(0, 0.5, 0, 1), stump(1, 0.5, 0, 1)],
            },
        };
        let model = Model::from_artifact(artifact, Disease::Parkinsons).unwrap();

        let mut x = vec![0.0; 22];
        x[0] = 1.0;
        assert_eq!(model.classify(&x).unwrap(), Label::Negative);
    }

    #[test]
    fn logistic_threshold_defaults_to_half() {
        let json = r#"{
            "n_features": 13,
            "estimator": {"kind": "logistic", "coef": [0,0,0,0,0,0,0,0,0,0,0,0,0], "intercept": 0.0}
        }"#;
        let artifact: ModelArtifact = serde_json::from_str(json).unwrap();
        let model = Model::from_artifact(artifact, Disease::Heart).unwrap();

        // sigmoid(0) == 0.5 sits exactly on the default threshold
        assert_eq!(model.classify(&[7.0; 13]).unwrap(), Label::Positive);
    }

    #[test]
    fn label_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Label::Positive).unwrap(), "1");
        assert_eq!(serde_json::to_string(&Label::Negative).unwrap(), "0");
    }
}
