use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::error::IndexError;

/// In-memory embedding cache backed by moka.
///
/// Keyed by the exact description text. Entries are evicted after TTL or when
/// capacity is reached.
pub struct HotCache {
    inner: Cache<String, Arc<Vec<f32>>>,
}

impl HotCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Get the entry or run `init` to load it. Concurrent callers for the
    /// same text wait on a single load. Errors are returned, not cached.
    pub async fn try_get_with<F>(
        &self,
        text: &str,
        init: F,
    ) -> Result<Arc<Vec<f32>>, Arc<IndexError>>
    where
        F: Future<Output = Result<Arc<Vec<f32>>, IndexError>>,
    {
        self.inner.try_get_with(text.to_string(), init).await
    }
}
