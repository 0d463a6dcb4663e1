//! Pre-trained model artifacts.
//!
//! Artifacts are JSON files exported by the offline training pipeline and
//! loaded once at startup. A missing or malformed artifact is a fatal
//! configuration error; evaluation itself is pure and deterministic.

use std::path::Path;

use dealhound_models::estimate::{EnsembleFeatures, ENSEMBLE_COLUMNS};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AgentError;

/// Ordinary least squares model: `intercept + Σ coefficient_i * x_i`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearModel {
    /// Training column names, in coefficient order. May be empty.
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    pub fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    pub fn predict(&self, x: &[f64]) -> Result<f64, AgentError> {
        if x.len() != self.coefficients.len() {
            return Err(AgentError::ModelArtifact(format!(
                "Linear model expects {} features, got {}",
                self.coefficients.len(),
                x.len()
            )));
        }
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(x)
                .map(|(c, v)| c * v)
                .sum::<f64>())
    }

    fn validate(&self) -> Result<(), AgentError> {
        if !self.feature_names.is_empty() && self.feature_names.len() != self.coefficients.len() {
            return Err(AgentError::ModelArtifact(format!(
                "{} feature names for {} coefficients",
                self.feature_names.len(),
                self.coefficients.len()
            )));
        }
        Ok(())
    }
}

/// One regression tree in flat array form (`tree_` layout: a child index of
/// `-1` marks a leaf).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl RegressionTree {
    fn predict(&self, x: &[f64]) -> f64 {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left < 0 {
                return self.value[node];
            }
            let feature = self.feature[node] as usize;
            node = if x[feature] <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }

    /// Children must point forward so traversal always terminates.
    fn validate(&self, n_features: usize) -> Result<(), AgentError> {
        let n = self.value.len();
        if n == 0 {
            return Err(AgentError::ModelArtifact("Empty regression tree".to_string()));
        }
        if [
            self.children_left.len(),
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
        ]
        .iter()
        .any(|len| *len != n)
        {
            return Err(AgentError::ModelArtifact(
                "Regression tree arrays have different lengths".to_string(),
            ));
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left < 0 {
                continue;
            }
            let forward = |child: i64| child > node as i64 && (child as usize) < n;
            if !forward(left) || !forward(right) {
                return Err(AgentError::ModelArtifact(format!(
                    "Invalid children at node {node}"
                )));
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(AgentError::ModelArtifact(format!(
                    "Node {node} splits on feature {feature} outside 0..{n_features}"
                )));
            }
        }
        Ok(())
    }
}

/// Random forest regressor: the mean of its trees' predictions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForestModel {
    pub n_features: usize,
    pub trees: Vec<RegressionTree>,
}

impl ForestModel {
    fn predict(&self, x: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict(x)).sum();
        total / self.trees.len() as f64
    }
}

/// Regression model evaluated on a description embedding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressionModel {
    RandomForest(ForestModel),
    Linear(LinearModel),
}

impl RegressionModel {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let model: Self = load_artifact(path.as_ref(), "Regression model")?;
        model.validate()?;
        info!(
            path = %path.as_ref().display(),
            n_features = model.n_features(),
            "Regression model loaded"
        );
        Ok(model)
    }

    pub fn n_features(&self) -> usize {
        match self {
            RegressionModel::RandomForest(forest) => forest.n_features,
            RegressionModel::Linear(linear) => linear.n_features(),
        }
    }

    /// Raw prediction. May be negative; callers clamp.
    pub fn predict(&self, x: &[f64]) -> Result<f64, AgentError> {
        if x.len() != self.n_features() {
            return Err(AgentError::ModelArtifact(format!(
                "Regression model expects {} features, got {} (embedding model mismatch?)",
                self.n_features(),
                x.len()
            )));
        }
        match self {
            RegressionModel::RandomForest(forest) => Ok(forest.predict(x)),
            RegressionModel::Linear(linear) => linear.predict(x),
        }
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        match self {
            RegressionModel::RandomForest(forest) => {
                if forest.trees.is_empty() {
                    return Err(AgentError::ModelArtifact(
                        "Random forest has no trees".to_string(),
                    ));
                }
                forest
                    .trees
                    .iter()
                    .try_for_each(|t| t.validate(forest.n_features))
            }
            RegressionModel::Linear(linear) => linear.validate(),
        }
    }
}

/// Linear combination of the three estimators plus their min and max.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleModel {
    linear: LinearModel,
}

impl EnsembleModel {
    pub fn new(linear: LinearModel) -> Result<Self, AgentError> {
        linear.validate()?;
        if linear.n_features() != ENSEMBLE_COLUMNS.len() {
            return Err(AgentError::ModelArtifact(format!(
                "Ensemble model needs {} coefficients, found {}",
                ENSEMBLE_COLUMNS.len(),
                linear.n_features()
            )));
        }
        if !linear.feature_names.is_empty()
            && linear
                .feature_names
                .iter()
                .zip(ENSEMBLE_COLUMNS)
                .any(|(name, expected)| name != expected)
        {
            return Err(AgentError::ModelArtifact(format!(
                "Ensemble columns {:?} do not match {:?}",
                linear.feature_names, ENSEMBLE_COLUMNS
            )));
        }
        Ok(Self { linear })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let linear: LinearModel = load_artifact(path.as_ref(), "Ensemble model")?;
        let model = Self::new(linear)?;
        info!(
            path = %path.as_ref().display(),
            coefficients = ?model.linear.coefficients,
            intercept = model.linear.intercept,
            "Ensemble model loaded"
        );
        Ok(model)
    }

    /// Raw prediction. May be negative; callers clamp.
    pub fn predict(&self, features: &EnsembleFeatures) -> f64 {
        self.linear.intercept
            + self
                .linear
                .coefficients
                .iter()
                .zip(features.to_vector())
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }
}

fn load_artifact<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T, AgentError> {
    if !path.exists() {
        return Err(AgentError::ModelArtifact(format!(
            "{what} not found at '{}'. Train it with the training pipeline before using this estimator.",
            path.display()
        )));
    }
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AgentError::ModelArtifact(format!("Failed to read {what} '{}': {e}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        AgentError::ModelArtifact(format!("Failed to parse {what} '{}': {e}", path.display()))
    })
}
