use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::index_schema::DistanceMetric;

/// Top-level configuration for dealhound.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DealhoundConfig {
    pub index: IndexConfig,
    pub oracle: OracleConfig,
    pub specialist: SpecialistConfig,
    pub models: ModelsConfig,
    pub planner: PlannerConfig,
    pub source: SourceConfig,
    pub notifier: NotifierConfig,
}

/// Vector index and embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    /// Path to the SQLite file holding the product collection (written by the index builder).
    pub sqlite_path: String,
    /// Collection name inside the file.
    pub collection: String,
    pub distance: DistanceMetric,
    /// OpenAI-compatible embeddings endpoint base URL.
    pub embedding_base_url: String,
    /// Must be the same model the collection was built with.
    pub embedding_model: String,
    /// Maximum number of descriptions kept in the in-memory embedding cache.
    pub embedding_cache_capacity: u64,
    pub embedding_cache_ttl_seconds: u64,
    pub timeout_seconds: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            sqlite_path: "data/products_vectorstore.db".to_string(),
            collection: "products".to_string(),
            distance: DistanceMetric::L2,
            embedding_base_url: "http://localhost:8080/v1".to_string(),
            embedding_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            embedding_cache_capacity: 1_000,
            embedding_cache_ttl_seconds: 600,
            timeout_seconds: 30,
        }
    }
}

/// Remote scoring oracle settings. Which provider is used depends on the credentials present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OracleConfig {
    pub openai_base_url: String,
    pub openai_model: String,
    pub deepseek_base_url: String,
    pub deepseek_model: String,
    /// Fixed sampling seed so replies are reproducible.
    pub seed: u64,
    /// Output token budget; enough for a short number.
    pub max_tokens: u32,
    /// Number of similar products included as context.
    pub similar_items: usize,
    pub timeout_seconds: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            deepseek_base_url: "https://api.deepseek.com".to_string(),
            deepseek_model: "deepseek-chat".to_string(),
            seed: 42,
            max_tokens: 5,
            similar_items: 5,
            timeout_seconds: 60,
        }
    }
}

/// Hosted fine-tuned specialist model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpecialistConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for SpecialistConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_seconds: 120,
        }
    }
}

/// Paths to the pre-trained model artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelsConfig {
    pub regression_path: String,
    pub ensemble_path: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            regression_path: "models/random_forest_model.json".to_string(),
            ensemble_path: "models/ensemble_model.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlannerConfig {
    /// Minimum discount (in listing currency) that triggers an alert. Strictly greater-than.
    pub deal_threshold: Decimal,
    /// Candidates priced per cycle, taken in source order.
    pub max_candidates: usize,
    /// JSON file holding previously surfaced opportunities.
    pub memory_path: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            deal_threshold: Decimal::new(50, 0),
            max_candidates: 5,
            memory_path: "data/memory.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON array of normalized listings written by the external scanner.
    pub listings_path: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            listings_path: "data/listings.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotifierConfig {
    pub enable_push: bool,
    pub enable_sms: bool,
    /// Characters of the description included in the alert text.
    pub description_chars: usize,
    pub pushover_base_url: String,
    pub twilio_base_url: String,
    pub timeout_seconds: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enable_push: true,
            enable_sms: false,
            description_chars: 10,
            pushover_base_url: "https://api.pushover.net".to_string(),
            twilio_base_url: "https://api.twilio.com".to_string(),
            timeout_seconds: 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_match_pipeline_constants() {
        let config = DealhoundConfig::default();
        assert_eq!(config.planner.deal_threshold, dec!(50));
        assert_eq!(config.planner.max_candidates, 5);
        assert_eq!(config.oracle.seed, 42);
        assert_eq!(config.oracle.max_tokens, 5);
        assert_eq!(config.oracle.similar_items, 5);
        assert_eq!(config.index.distance, DistanceMetric::L2);
        assert!(config.notifier.enable_push);
        assert!(!config.notifier.enable_sms);
    }

    #[test]
    fn config_from_toml() {
        let toml_str = r#"
[index]
sqlite_path = "/tmp/products.db"
distance = "cosine"

[oracle]
deepseek_model = "deepseek-reasoner"
similar_items = 3

[models]
regression_path = "/models/rf.json"
ensemble_path = "/models/ensemble.json"

[planner]
deal_threshold = "75.5"
max_candidates = 3

[notifier]
enable_sms = true
"#;

        let config: DealhoundConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.index.sqlite_path, "/tmp/products.db");
        assert_eq!(config.index.distance, DistanceMetric::Cosine);
        assert_eq!(config.index.collection, "products");
        assert_eq!(config.oracle.deepseek_model, "deepseek-reasoner");
        assert_eq!(config.oracle.similar_items, 3);
        assert_eq!(config.oracle.seed, 42);
        assert_eq!(config.planner.deal_threshold, dec!(75.5));
        assert_eq!(config.planner.max_candidates, 3);
        assert!(config.notifier.enable_sms);
        assert!(config.notifier.enable_push);
        assert_eq!(config.specialist, SpecialistConfig::default());
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config: DealhoundConfig = toml::from_str("").unwrap();
        assert_eq!(config, DealhoundConfig::default());
    }
}
