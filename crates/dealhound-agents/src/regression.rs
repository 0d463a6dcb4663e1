use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use dealhound_index::Embedder;
use dealhound_models::estimate::PriceEstimate;
use tracing::info;

use crate::error::AgentError;
use crate::estimator::PriceEstimator;
use crate::model::RegressionModel;

/// Embeds the description and evaluates a pre-trained regressor on it.
pub struct RegressionEstimator {
    embedder: Arc<dyn Embedder>,
    model: Arc<RegressionModel>,
}

impl RegressionEstimator {
    /// Rejects a model whose trees could index outside their arrays.
    pub fn new(embedder: Arc<dyn Embedder>, model: RegressionModel) -> Result<Self, AgentError> {
        model.validate()?;
        Ok(Self {
            embedder,
            model: Arc::new(model),
        })
    }

    /// Load the model artifact. Fails fast if it is missing.
    pub fn load(embedder: Arc<dyn Embedder>, path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let model = RegressionModel::load(path)?;
        info!(embedding_model = %embedder.model(), "Regression estimator is ready");
        Self::new(embedder, model)
    }
}

#[async_trait]
impl PriceEstimator for RegressionEstimator {
    fn name(&self) -> &str {
        "regression"
    }

    async fn price(&self, description: &str) -> Result<PriceEstimate, AgentError> {
        let embedding = self.embedder.embed(description).await?;
        let features: Vec<f64> = embedding.iter().map(|v| f64::from(*v)).collect();
        let raw = self.model.predict(&features)?;

        let estimate = PriceEstimate::clamped(raw);
        info!(raw, estimate = estimate.value(), "Regression estimator complete");
        Ok(estimate)
    }
}
