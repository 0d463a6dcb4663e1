use std::sync::Arc;

use async_trait::async_trait;
use dealhound_models::estimate::{EnsembleFeatures, PriceEstimate};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::AgentError;
use crate::estimator::PriceEstimator;
use crate::model::EnsembleModel;

/// Per-estimator breakdown of one ensemble pricing call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnsemblePricing {
    pub specialist: PriceEstimate,
    pub contextual: PriceEstimate,
    pub regression: PriceEstimate,
    pub features: EnsembleFeatures,
    /// Final clamped estimate.
    pub estimate: f64,
}

/// Combines the specialist, contextual and regression estimators through a
/// trained linear model over `[specialist, contextual, regression, min, max]`.
pub struct EnsembleCombiner {
    specialist: Arc<dyn PriceEstimator>,
    contextual: Arc<dyn PriceEstimator>,
    regression: Arc<dyn PriceEstimator>,
    model: EnsembleModel,
}

impl EnsembleCombiner {
    pub fn new(
        specialist: Arc<dyn PriceEstimator>,
        contextual: Arc<dyn PriceEstimator>,
        regression: Arc<dyn PriceEstimator>,
        model: EnsembleModel,
    ) -> Self {
        Self {
            specialist,
            contextual,
            regression,
            model,
        }
    }

    /// Run all three estimators concurrently and combine them.
    /// Any estimator failure aborts the whole call.
    pub async fn evaluate(&self, description: &str) -> Result<EnsemblePricing, AgentError> {
        let (specialist, contextual, regression) = tokio::try_join!(
            self.specialist.price(description),
            self.contextual.price(description),
            self.regression.price(description),
        )?;

        for (name, estimate) in [
            (self.specialist.name(), &specialist),
            (self.contextual.name(), &contextual),
            (self.regression.name(), &regression),
        ] {
            if !estimate.has_signal() {
                warn!(estimator = %name, "Estimator returned no signal, contributing 0.0");
            }
        }

        let features =
            EnsembleFeatures::new(specialist.value(), contextual.value(), regression.value());
        let estimate = self.model.predict(&features).max(0.0);

        info!(
            specialist = features.specialist,
            contextual = features.contextual,
            regression = features.regression,
            estimate,
            "Ensemble pricing complete"
        );

        Ok(EnsemblePricing {
            specialist,
            contextual,
            regression,
            features,
            estimate,
        })
    }
}

#[async_trait]
impl PriceEstimator for EnsembleCombiner {
    fn name(&self) -> &str {
        "ensemble"
    }

    async fn price(&self, description: &str) -> Result<PriceEstimate, AgentError> {
        let pricing = self.evaluate(description).await?;
        Ok(PriceEstimate::clamped(pricing.estimate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinearModel;
    use crate::test_support::ScriptedEstimator;
    use std::time::{Duration, Instant};

    fn model(coefficients: [f64; 5], intercept: f64) -> EnsembleModel {
        EnsembleModel::new(LinearModel {
            feature_names: vec![],
            coefficients: coefficients.to_vec(),
            intercept,
        })
        .unwrap()
    }

    fn combiner(
        specialist: ScriptedEstimator,
        contextual: ScriptedEstimator,
        regression: ScriptedEstimator,
        model: EnsembleModel,
    ) -> EnsembleCombiner {
        EnsembleCombiner::new(
            Arc::new(specialist),
            Arc::new(contextual),
            Arc::new(regression),
            model,
        )
    }

    #[tokio::test]
    async fn features_follow_column_order() {
        let ensemble = combiner(
            ScriptedEstimator::fixed("specialist", 300.0),
            ScriptedEstimator::fixed("contextual", 250.0),
            ScriptedEstimator::fixed("regression", 180.0),
            model([1.0, 0.0, 0.0, 0.0, 0.0], 0.0),
        );

        let pricing = ensemble.evaluate("Dyson V15").await.unwrap();
        assert_eq!(
            pricing.features.to_vector(),
            [300.0, 250.0, 180.0, 180.0, 300.0]
        );
        assert_eq!(pricing.estimate, 300.0);
    }

    #[tokio::test]
    async fn combines_linearly() {
        let ensemble = combiner(
            ScriptedEstimator::fixed("specialist", 100.0),
            ScriptedEstimator::fixed("contextual", 200.0),
            ScriptedEstimator::fixed("regression", 300.0),
            model([0.25, 0.25, 0.25, 0.125, 0.125], 4.0),
        );

        // 25 + 50 + 75 + 12.5 + 37.5 + 4
        assert_eq!(
            ensemble.price("Desk lamp").await.unwrap(),
            PriceEstimate::Price(204.0)
        );
    }

    #[tokio::test]
    async fn negative_combination_clamps_to_zero() {
        let ensemble = combiner(
            ScriptedEstimator::fixed("specialist", 10.0),
            ScriptedEstimator::fixed("contextual", 500.0),
            ScriptedEstimator::fixed("regression", 10.0),
            model([0.1, -2.0, 0.1, 0.0, -1.0], -50.0),
        );

        let pricing = ensemble.evaluate("Outlier").await.unwrap();
        assert_eq!(pricing.estimate, 0.0);
        assert_eq!(
            ensemble.price("Outlier").await.unwrap(),
            PriceEstimate::Price(0.0)
        );
    }

    #[tokio::test]
    async fn repeated_calls_are_identical() {
        let ensemble = combiner(
            ScriptedEstimator::fixed("specialist", 123.45),
            ScriptedEstimator::fixed("contextual", 98.7),
            ScriptedEstimator::fixed("regression", 150.2),
            model([0.31, 0.27, 0.12, 0.2, 0.1], 1.75),
        );

        let first = ensemble.evaluate("Camera").await.unwrap();
        for _ in 0..5 {
            assert_eq!(ensemble.evaluate("Camera").await.unwrap(), first);
        }
    }

    #[tokio::test]
    async fn single_estimator_failure_aborts() {
        let ensemble = combiner(
            ScriptedEstimator::fixed("specialist", 100.0),
            ScriptedEstimator::failing("contextual"),
            ScriptedEstimator::fixed("regression", 100.0),
            model([0.2; 5], 0.0),
        );

        assert!(ensemble.evaluate("Anything").await.is_err());
    }

    #[tokio::test]
    async fn no_signal_contributes_zero_to_features() {
        let ensemble = combiner(
            ScriptedEstimator::fixed("specialist", 80.0),
            ScriptedEstimator::no_signal("contextual"),
            ScriptedEstimator::fixed("regression", 60.0),
            model([0.0, 0.0, 0.0, 1.0, 0.0], 0.0),
        );

        let pricing = ensemble.evaluate("Unknown").await.unwrap();
        assert_eq!(pricing.contextual, PriceEstimate::NoSignal);
        assert_eq!(pricing.features.contextual, 0.0);
        assert_eq!(pricing.features.min, 0.0);
        assert_eq!(pricing.estimate, 0.0);
    }

    #[tokio::test]
    async fn estimators_run_concurrently() {
        let delay = Duration::from_millis(200);
        let ensemble = combiner(
            ScriptedEstimator::fixed("specialist", 1.0).with_delay(delay),
            ScriptedEstimator::fixed("contextual", 1.0).with_delay(delay),
            ScriptedEstimator::fixed("regression", 1.0).with_delay(delay),
            model([0.2; 5], 0.0),
        );

        let start = Instant::now();
        ensemble.evaluate("Slow item").await.unwrap();
        assert!(start.elapsed() < delay * 3);
    }
}
