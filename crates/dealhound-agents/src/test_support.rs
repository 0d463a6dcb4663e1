//! Scriptable doubles for the pricing pipeline.
//!
//! Each double implements one of the crate's seams (`PriceEstimator`,
//! `ScoringOracle`, `SimilarityRetriever`, `Embedder`, `DealSource`,
//! `Notifier`) with canned behavior, so scenarios can be driven without
//! network access or model artifacts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dealhound_index::{Embedder, IndexError, SimilarityRetriever};
use dealhound_models::estimate::{PriceEstimate, SimilarItem};
use dealhound_models::listing::{Listing, Opportunity};
use dealhound_models::memory::Memory;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::error::AgentError;
use crate::estimator::PriceEstimator;
use crate::notifier::Notifier;
use crate::oracle::{ChatRequest, ScoringOracle};
use crate::source::DealSource;

/// Build a listing with empty raw fields.
pub fn listing(url: &str, description: &str, asking_price: Decimal) -> Listing {
    Listing {
        description: description.to_string(),
        asking_price,
        url: url.to_string(),
        raw_details: String::new(),
        raw_features: String::new(),
    }
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Price(f64),
    NoSignal,
    Fail,
}

/// Estimator answering from a per-description table with a default.
pub struct ScriptedEstimator {
    name: String,
    default: Outcome,
    overrides: HashMap<String, Outcome>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedEstimator {
    fn with_default(name: &str, default: Outcome) -> Self {
        Self {
            name: name.to_string(),
            default,
            overrides: HashMap::new(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always returns `value` unless overridden.
    pub fn fixed(name: &str, value: f64) -> Self {
        Self::with_default(name, Outcome::Price(value))
    }

    /// Always fails with a remote error.
    pub fn failing(name: &str) -> Self {
        Self::with_default(name, Outcome::Fail)
    }

    /// Always returns the no-signal sentinel.
    pub fn no_signal(name: &str) -> Self {
        Self::with_default(name, Outcome::NoSignal)
    }

    pub fn with_price(mut self, description: &str, value: f64) -> Self {
        self.overrides
            .insert(description.to_string(), Outcome::Price(value));
        self
    }

    pub fn failing_on(mut self, description: &str) -> Self {
        self.overrides.insert(description.to_string(), Outcome::Fail);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceEstimator for ScriptedEstimator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn price(&self, description: &str) -> Result<PriceEstimate, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self
            .overrides
            .get(description)
            .copied()
            .unwrap_or(self.default)
        {
            Outcome::Price(value) => Ok(PriceEstimate::Price(value)),
            Outcome::NoSignal => Ok(PriceEstimate::NoSignal),
            Outcome::Fail => Err(AgentError::Remote(format!(
                "{} failed on '{description}'",
                self.name
            ))),
        }
    }
}

/// Oracle returning a canned reply and recording every request.
pub struct ScriptedOracle {
    reply: Option<String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedOracle {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl ScoringOracle for ScriptedOracle {
    fn model(&self) -> &str {
        "scripted-oracle"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, AgentError> {
        self.requests.lock().await.push(request.clone());
        self.reply
            .clone()
            .ok_or_else(|| AgentError::Oracle("Scripted oracle failure".to_string()))
    }
}

/// Retriever over a fixed, already-ranked list.
pub struct StaticRetriever {
    items: Option<Vec<SimilarItem>>,
}

impl StaticRetriever {
    pub fn new(items: Vec<SimilarItem>) -> Self {
        Self { items: Some(items) }
    }

    pub fn unavailable() -> Self {
        Self { items: None }
    }
}

#[async_trait]
impl SimilarityRetriever for StaticRetriever {
    async fn find_similar(
        &self,
        _description: &str,
        k: usize,
    ) -> Result<Vec<SimilarItem>, IndexError> {
        match &self.items {
            Some(items) => Ok(items.iter().take(k).cloned().collect()),
            None => Err(IndexError::Unavailable("Static retriever offline".to_string())),
        }
    }
}

/// Embedder returning the same vector for every text.
pub struct FixedEmbedder {
    vector: Vec<f32>,
}

impl FixedEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector }
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    fn model(&self) -> &str {
        "fixed-embedder"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, IndexError> {
        Ok(self.vector.clone())
    }
}

/// Deal source over a fixed batch of listings.
pub struct StaticDealSource {
    listings: Option<Vec<Listing>>,
    filter_memory: bool,
}

impl StaticDealSource {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self {
            listings: Some(listings),
            filter_memory: true,
        }
    }

    pub fn failing() -> Self {
        Self {
            listings: None,
            filter_memory: true,
        }
    }

    /// Return remembered listings too, as a misbehaving source would.
    pub fn ignoring_memory(mut self) -> Self {
        self.filter_memory = false;
        self
    }
}

#[async_trait]
impl DealSource for StaticDealSource {
    async fn scan(&self, memory: &Memory) -> Result<Vec<Listing>, AgentError> {
        let listings = self
            .listings
            .as_ref()
            .ok_or_else(|| AgentError::Source("Static source offline".to_string()))?;
        Ok(listings
            .iter()
            .filter(|l| !self.filter_memory || !memory.contains_url(&l.url))
            .cloned()
            .collect())
    }
}

/// Notifier that records every alert.
#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<Opportunity>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn alerts(&self) -> Vec<Opportunity> {
        self.alerts.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn alert(&self, opportunity: &Opportunity) {
        self.alerts.lock().await.push(opportunity.clone());
    }
}
