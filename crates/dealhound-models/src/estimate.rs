use serde::{Deserialize, Serialize};

/// Column order the ensemble combination model was trained with.
pub const ENSEMBLE_COLUMNS: [&str; 5] = ["Specialist", "Frontier", "RandomForest", "Min", "Max"];

/// Output of a single price estimator for a single description.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PriceEstimate {
    /// A usable, non-negative price.
    Price(f64),
    /// The estimator ran but produced nothing numeric (e.g. an oracle reply with no digits).
    /// Contributes `0.0` wherever a number is required.
    NoSignal,
}

impl PriceEstimate {
    /// Wrap a raw model output, clamping negatives (and NaN) to zero.
    pub fn clamped(value: f64) -> Self {
        PriceEstimate::Price(value.max(0.0))
    }

    pub fn value(&self) -> f64 {
        match self {
            PriceEstimate::Price(v) => *v,
            PriceEstimate::NoSignal => 0.0,
        }
    }

    pub fn has_signal(&self) -> bool {
        matches!(self, PriceEstimate::Price(_))
    }
}

/// Feature vector fed to the ensemble combination model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EnsembleFeatures {
    pub specialist: f64,
    pub contextual: f64,
    pub regression: f64,
    pub min: f64,
    pub max: f64,
}

impl EnsembleFeatures {
    pub fn new(specialist: f64, contextual: f64, regression: f64) -> Self {
        Self {
            specialist,
            contextual,
            regression,
            min: specialist.min(contextual).min(regression),
            max: specialist.max(contextual).max(regression),
        }
    }

    /// Values in `ENSEMBLE_COLUMNS` order.
    pub fn to_vector(&self) -> [f64; 5] {
        [
            self.specialist,
            self.contextual,
            self.regression,
            self.min,
            self.max,
        ]
    }
}

/// A nearest-neighbour hit from the vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarItem {
    pub text: String,
    pub price: f64,
}
