use std::sync::Arc;

use async_trait::async_trait;
use dealhound_index::SimilarityRetriever;
use dealhound_models::config::OracleConfig;
use dealhound_models::estimate::{PriceEstimate, SimilarItem};
use tracing::{info, warn};

use crate::error::AgentError;
use crate::estimator::PriceEstimator;
use crate::oracle::{ChatRequest, ScoringOracle};
use crate::parser::parse_price;
use crate::prompts::messages_for;

/// Retrieval-augmented estimator: similar products from the vector index are
/// put in front of the scoring oracle as context, and the reply is parsed
/// for a number.
pub struct ContextualEstimator {
    retriever: Arc<dyn SimilarityRetriever>,
    oracle: Arc<dyn ScoringOracle>,
    similar_items: usize,
    seed: u64,
    max_tokens: u32,
}

impl ContextualEstimator {
    pub fn new(
        retriever: Arc<dyn SimilarityRetriever>,
        oracle: Arc<dyn ScoringOracle>,
        config: &OracleConfig,
    ) -> Self {
        Self {
            retriever,
            oracle,
            similar_items: config.similar_items.max(1),
            seed: config.seed,
            max_tokens: config.max_tokens,
        }
    }

    pub fn request_for(&self, description: &str, similars: &[SimilarItem]) -> ChatRequest {
        ChatRequest {
            model: self.oracle.model().to_string(),
            messages: messages_for(description, similars),
            seed: self.seed,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl PriceEstimator for ContextualEstimator {
    fn name(&self) -> &str {
        "contextual"
    }

    async fn price(&self, description: &str) -> Result<PriceEstimate, AgentError> {
        let similars = self
            .retriever
            .find_similar(description, self.similar_items)
            .await?;

        info!(
            model = %self.oracle.model(),
            context_items = similars.len(),
            "Contextual estimator calling oracle"
        );
        let request = self.request_for(description, &similars);
        let reply = self.oracle.complete(&request).await?;

        let estimate = parse_price(&reply);
        match estimate {
            PriceEstimate::Price(value) => {
                info!(estimate = value, "Contextual estimator complete");
            }
            PriceEstimate::NoSignal => {
                warn!(reply = %reply, "Oracle reply contained no price");
            }
        }
        Ok(estimate)
    }
}
