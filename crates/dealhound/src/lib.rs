//! Dealhound - deal discovery and price estimation.
//!
//! Listings from a deal source are priced by an ensemble of three estimators
//! (a remote fine-tuned specialist, a retrieval-augmented oracle and an
//! embedding regressor). The best discount above the threshold is alerted.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use dealhound::models::{DealhoundConfig, Memory};
//! use dealhound::{build_planner, Credentials};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = DealhoundConfig::default();
//! let planner = build_planner(&config, &Credentials::from_env())?;
//! if let Some(deal) = planner.plan(&Memory::new()).await? {
//!     println!("{} is {} under estimate", deal.url(), deal.discount);
//! }
//! # Ok(())
//! # }
//! ```

pub use dealhound_agents as agents;
pub use dealhound_index as index;
pub use dealhound_models as models;

pub mod watch;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dealhound_agents::{
    ContextualEstimator, CycleReport, EnsembleCombiner, EnsembleModel, EnsemblePricing,
    FileDealSource, Messenger,
    NotifierCredentials, OpenAiCompatibleOracle, OracleCredentials, OracleEndpoint, Planner,
    RegressionEstimator, RemoteSpecialistEstimator,
};
use dealhound_index::{CachedEmbedder, Embedder, HttpEmbedder, SqliteCollection, VectorIndex};
use dealhound_models::config::{DealhoundConfig, IndexConfig};
use dealhound_models::memory::Memory;
use tracing::{info, warn};

/// Secrets read once from the environment.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub oracle: OracleCredentials,
    pub notifier: NotifierCredentials,
    pub embedding_api_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            oracle: OracleCredentials {
                deepseek_api_key: lookup("DEEPSEEK_API_KEY"),
                openai_api_key: lookup("OPENAI_API_KEY"),
            },
            notifier: NotifierCredentials {
                pushover_user: lookup("PUSHOVER_USER"),
                pushover_token: lookup("PUSHOVER_TOKEN"),
                twilio_account_sid: lookup("TWILIO_ACCOUNT_SID"),
                twilio_auth_token: lookup("TWILIO_AUTH_TOKEN"),
                twilio_from: lookup("TWILIO_FROM"),
                sms_to: lookup("MY_PHONE_NUMBER"),
            },
            embedding_api_key: lookup("EMBEDDING_API_KEY"),
        }
    }
}

/// Load the TOML config. A missing file yields the defaults.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<DealhoundConfig> {
    let path = path.as_ref();
    if !path.exists() {
        warn!(path = %path.display(), "Config file not found, using defaults");
        return Ok(DealhoundConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// HTTP embedder behind the moka hot cache.
pub fn build_embedder(
    config: &IndexConfig,
    api_key: Option<String>,
) -> anyhow::Result<Arc<dyn Embedder>> {
    let http = HttpEmbedder::new(
        &config.embedding_base_url,
        &config.embedding_model,
        api_key,
        Duration::from_secs(config.timeout_seconds),
    )
    .context("Failed to build embedding client")?;

    Ok(Arc::new(CachedEmbedder::new(
        Arc::new(http),
        config.embedding_cache_capacity,
        Duration::from_secs(config.embedding_cache_ttl_seconds),
    )))
}

/// Build the three estimators and the combiner. Missing credentials, model
/// artifacts or vector store are fatal here rather than at pricing time.
pub fn build_ensemble(
    config: &DealhoundConfig,
    credentials: &Credentials,
) -> anyhow::Result<EnsembleCombiner> {
    let endpoint = OracleEndpoint::resolve(&credentials.oracle, &config.oracle)?;
    info!(provider = ?endpoint.provider, model = %endpoint.model, "Scoring oracle selected");
    let oracle =
        OpenAiCompatibleOracle::new(endpoint, Duration::from_secs(config.oracle.timeout_seconds))?;

    let model = EnsembleModel::load(&config.models.ensemble_path)?;
    let embedder = build_embedder(&config.index, credentials.embedding_api_key.clone())?;
    let regression = RegressionEstimator::load(Arc::clone(&embedder), &config.models.regression_path)?;

    let collection = SqliteCollection::open(&config.index.sqlite_path).with_context(|| {
        format!("Failed to open vector store: {}", config.index.sqlite_path)
    })?;
    let index = VectorIndex::new(
        collection,
        config.index.collection.clone(),
        config.index.distance,
        embedder,
    );
    let contextual = ContextualEstimator::new(Arc::new(index), Arc::new(oracle), &config.oracle);

    let specialist = RemoteSpecialistEstimator::new(
        &config.specialist.base_url,
        Duration::from_secs(config.specialist.timeout_seconds),
    )?;

    Ok(EnsembleCombiner::new(
        Arc::new(specialist),
        Arc::new(contextual),
        Arc::new(regression),
        model,
    ))
}

/// Price one description with the full ensemble.
pub async fn price_description(
    ensemble: &EnsembleCombiner,
    description: &str,
) -> anyhow::Result<EnsemblePricing> {
    ensemble
        .evaluate(description)
        .await
        .context("Pricing failed")
}

/// Build a Planner from configuration.
pub fn build_planner(config: &DealhoundConfig, credentials: &Credentials) -> anyhow::Result<Planner> {
    let ensemble = build_ensemble(config, credentials)?;
    let messenger = Messenger::from_config(&config.notifier, &credentials.notifier)?;
    let source = FileDealSource::new(&config.source.listings_path);

    Ok(Planner::new(
        Arc::new(source),
        Arc::new(ensemble),
        Arc::new(messenger),
        config.planner.clone(),
    ))
}

/// Read the memory file. A missing file is an empty memory.
pub fn load_memory(path: impl AsRef<Path>) -> anyhow::Result<Memory> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Memory::new());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read memory: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse memory: {}", path.display()))
}

pub fn save_memory(path: impl AsRef<Path>, memory: &Memory) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(memory)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write memory: {}", path.display()))
}

/// Run one cycle against the memory file and persist any alerted opportunity.
pub async fn plan_and_remember(
    planner: &Planner,
    memory_path: impl AsRef<Path>,
) -> anyhow::Result<CycleReport> {
    let memory_path = memory_path.as_ref();
    let mut memory = load_memory(memory_path)?;
    let report = planner.run_cycle(&memory).await?;

    if let Some(opportunity) = &report.alerted {
        if memory.remember(opportunity.clone()) {
            save_memory(memory_path, &memory)?;
            info!(remembered = memory.len(), "Memory updated");
        }
    }
    Ok(report)
}
