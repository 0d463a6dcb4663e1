use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dealhound_models::estimate::SimilarItem;
use dealhound_models::index_schema::DistanceMetric;
use tracing::debug;

use crate::embedder::Embedder;
use crate::error::IndexError;
use crate::sqlite::SqliteCollection;

/// Finds products similar to a description, with their known prices.
/// Mockable for testing.
#[async_trait]
pub trait SimilarityRetriever: Send + Sync {
    /// Up to `k` items ordered by descending similarity. An empty index yields
    /// an empty result, not an error.
    async fn find_similar(&self, description: &str, k: usize)
        -> Result<Vec<SimilarItem>, IndexError>;
}

/// Nearest-neighbour retrieval over a SQLite product collection.
///
/// SQLite access is synchronized via `Mutex` since `rusqlite::Connection` is not `Sync`.
pub struct VectorIndex {
    collection: Mutex<SqliteCollection>,
    name: String,
    metric: DistanceMetric,
    embedder: Arc<dyn Embedder>,
}

impl VectorIndex {
    pub fn new(
        collection: SqliteCollection,
        name: impl Into<String>,
        metric: DistanceMetric,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            collection: Mutex::new(collection),
            name: name.into(),
            metric,
            embedder,
        }
    }

    pub fn document_count(&self) -> Result<u64, IndexError> {
        let collection = self
            .collection
            .lock()
            .map_err(|e| IndexError::Unavailable(format!("SQLite mutex poisoned: {e}")))?;
        collection.count(&self.name)
    }
}

#[async_trait]
impl SimilarityRetriever for VectorIndex {
    async fn find_similar(
        &self,
        description: &str,
        k: usize,
    ) -> Result<Vec<SimilarItem>, IndexError> {
        let query = self.embedder.embed(description).await?;

        let hits = {
            let collection = self
                .collection
                .lock()
                .map_err(|e| IndexError::Unavailable(format!("SQLite mutex poisoned: {e}")))?;
            collection.nearest(&self.name, &query, k, self.metric)?
        };

        debug!(
            collection = %self.name,
            requested = k,
            found = hits.len(),
            "Similarity search complete"
        );

        Ok(hits
            .into_iter()
            .map(|h| SimilarItem {
                text: h.document,
                price: h.price,
            })
            .collect())
    }
}
