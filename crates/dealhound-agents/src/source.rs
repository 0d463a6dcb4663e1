use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use dealhound_models::listing::Listing;
use dealhound_models::memory::Memory;
use tracing::{debug, info};

use crate::error::AgentError;

/// Supplies normalized candidate listings. Mockable for testing.
#[async_trait]
pub trait DealSource: Send + Sync {
    /// Candidates whose URL is not already in `memory`, in source order.
    async fn scan(&self, memory: &Memory) -> Result<Vec<Listing>, AgentError>;
}

/// Reads listings from a JSON array written by the external feed scanner.
pub struct FileDealSource {
    path: PathBuf,
}

impl FileDealSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DealSource for FileDealSource {
    async fn scan(&self, memory: &Memory) -> Result<Vec<Listing>, AgentError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AgentError::Source(format!("Failed to read {}: {e}", self.path.display()))
        })?;
        let listings: Vec<Listing> = serde_json::from_str(&raw).map_err(|e| {
            AgentError::Source(format!("Failed to parse {}: {e}", self.path.display()))
        })?;

        let total = listings.len();
        let known = memory.urls();
        let mut seen: HashSet<String> = HashSet::new();
        let mut fresh = Vec::new();
        for listing in listings {
            if known.contains(listing.url.as_str()) || !seen.insert(listing.url.clone()) {
                debug!(url = %listing.url, "Skipping known listing");
                continue;
            }
            fresh.push(listing);
        }

        info!(total, fresh = fresh.len(), "Deal source scanned");
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealhound_models::listing::Opportunity;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write_listings(value: serde_json::Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{value}").unwrap();
        file
    }

    fn feed() -> serde_json::Value {
        serde_json::json!([
            {"description": "LG 27in 4K monitor", "asking_price": "199.99", "url": "https://d/monitor"},
            {"description": "Anker power bank", "asking_price": "25.00", "url": "https://d/powerbank"},
            {"description": "LG 27in 4K monitor (repost)", "asking_price": "199.99", "url": "https://d/monitor"},
            {"description": "Weber grill", "asking_price": "349", "url": "https://d/grill",
             "raw_details": "Gas grill", "raw_features": "3 burners"}
        ])
    }

    #[tokio::test]
    async fn excludes_remembered_and_duplicate_urls() {
        let file = write_listings(feed());
        let source = FileDealSource::new(file.path());

        let remembered = Opportunity::new(
            Listing {
                description: "Anker power bank".to_string(),
                asking_price: dec!(25.00),
                url: "https://d/powerbank".to_string(),
                raw_details: String::new(),
                raw_features: String::new(),
            },
            90.0,
        );
        let memory = Memory::from_opportunities(vec![remembered]);

        let listings = source.scan(&memory).await.unwrap();
        let urls: Vec<&str> = listings.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec!["https://d/monitor", "https://d/grill"]);
        assert_eq!(listings[1].raw_features, "3 burners");
    }

    #[tokio::test]
    async fn missing_file_is_a_source_error() {
        let source = FileDealSource::new("/nonexistent/listings.json");
        let result = source.scan(&Memory::new()).await;
        assert!(matches!(result, Err(AgentError::Source(_))));
    }

    #[tokio::test]
    async fn malformed_file_is_a_source_error() {
        let file = write_listings(serde_json::json!({"not": "an array"}));
        let source = FileDealSource::new(file.path());
        assert!(matches!(
            source.scan(&Memory::new()).await,
            Err(AgentError::Source(_))
        ));
    }
}
