use std::time::Duration;

use async_trait::async_trait;
use dealhound_models::estimate::PriceEstimate;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::AgentError;
use crate::estimator::PriceEstimator;

#[derive(Debug, Serialize)]
struct PriceRequest<'a> {
    description: &'a str,
}

/// Calls a separately hosted fine-tuned pricing model.
///
/// The service answers `POST {base_url}/price` with either a bare JSON number
/// or `{"price": <number>}`.
#[derive(Clone)]
pub struct RemoteSpecialistEstimator {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteSpecialistEstimator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Config(format!("Failed to create HTTP client: {e}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(base_url = %base_url, "Remote specialist is ready");
        Ok(Self { client, base_url })
    }
}

fn coerce_price(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Object(map) => map.get("price").and_then(coerce_price),
        _ => None,
    }
}

#[async_trait]
impl PriceEstimator for RemoteSpecialistEstimator {
    fn name(&self) -> &str {
        "specialist"
    }

    async fn price(&self, description: &str) -> Result<PriceEstimate, AgentError> {
        let response = self
            .client
            .post(format!("{}/price", self.base_url))
            .json(&PriceRequest { description })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(status = %status, "Remote specialist call failed");
            return Err(AgentError::Remote(format!("Status: {status}")));
        }

        let body: serde_json::Value = response.json().await?;
        let value = coerce_price(&body)
            .filter(|v| v.is_finite())
            .ok_or_else(|| AgentError::Remote(format!("Response is not a price: {body}")))?;

        let estimate = PriceEstimate::clamped(value);
        info!(estimate = estimate.value(), "Remote specialist complete");
        Ok(estimate)
    }
}
