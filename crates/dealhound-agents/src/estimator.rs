use async_trait::async_trait;
use dealhound_models::estimate::PriceEstimate;

use crate::error::AgentError;

/// A price estimation strategy. Mockable for testing.
///
/// Implementations return non-negative prices; an estimator that ran but
/// produced nothing usable returns `PriceEstimate::NoSignal`.
#[async_trait]
pub trait PriceEstimator: Send + Sync {
    fn name(&self) -> &str;

    async fn price(&self, description: &str) -> Result<PriceEstimate, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedEstimator;

    #[tokio::test]
    async fn scripted_estimator_returns_configured_prices() {
        let estimator = ScriptedEstimator::fixed("specialist", 120.0)
            .with_price("Espresso machine", 450.0)
            .failing_on("Broken listing");

        assert_eq!(estimator.name(), "specialist");
        assert_eq!(
            estimator.price("Espresso machine").await.unwrap(),
            PriceEstimate::Price(450.0)
        );
        assert_eq!(
            estimator.price("Anything else").await.unwrap(),
            PriceEstimate::Price(120.0)
        );
        assert!(estimator.price("Broken listing").await.is_err());
        assert_eq!(estimator.call_count(), 3);
    }

    #[tokio::test]
    async fn failing_estimator_always_errors() {
        let estimator = ScriptedEstimator::failing("remote");
        let result = estimator.price("Kayak").await;
        assert!(matches!(result, Err(AgentError::Remote(_))));
    }
}
