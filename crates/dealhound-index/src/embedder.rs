use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::IndexError;
use crate::hot_cache::HotCache;

/// Turns a product description into a fixed-dimension embedding.
///
/// The same model must be used for building the collection, for retrieval
/// queries and for the regression estimator.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible `/embeddings` endpoint
/// (e.g. a text-embeddings-inference server hosting all-MiniLM-L6-v2).
#[derive(Clone)]
pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, IndexError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IndexError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        debug!(model = %self.model, chars = text.len(), "Requesting embedding");

        let mut request = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&EmbeddingRequest {
                model: &self.model,
                input: [text],
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IndexError::Embedding(format!("Status {status}: {body}")));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| IndexError::Embedding("Response contained no embedding".to_string()))
    }
}

/// Read-through cache: checks moka (hot) → inner embedder.
///
/// Retrieval and regression embed the same description concurrently during a
/// pricing call; both wait on one inner request.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    hot: HotCache,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            hot: HotCache::new(max_capacity, ttl),
        }
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        let embedding = self
            .hot
            .try_get_with(text, async { self.inner.embed(text).await.map(Arc::new) })
            .await?;
        Ok(embedding.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingEmbedder {
        calls: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn model(&self) -> &str {
            "counting"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    #[tokio::test]
    async fn cached_embedder_reads_through_once() {
        let inner = Arc::new(CountingEmbedder::default());
        let cached = CachedEmbedder::new(inner.clone(), 100, Duration::from_secs(60));

        let first = cached.embed("stand mixer").await.unwrap();
        let second = cached.embed("stand mixer").await.unwrap();
        cached.embed("air fryer").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.model(), "counting");
    }

    #[tokio::test]
    async fn concurrent_embeds_share_one_request() {
        let inner = Arc::new(CountingEmbedder {
            delay: Duration::from_millis(50),
            ..Default::default()
        });
        let cached = CachedEmbedder::new(inner.clone(), 100, Duration::from_secs(60));

        let (first, second) =
            tokio::join!(cached.embed("stand mixer"), cached.embed("stand mixer"));

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn http_embedder_parses_openai_shape() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/embeddings")
                    .header("authorization", "Bearer sk-test")
                    .json_body_partial(
                        r#"{"model": "sentence-transformers/all-MiniLM-L6-v2", "input": ["Robot vacuum"]}"#,
                    );
                then.status(200).json_body(serde_json::json!({
                    "object": "list",
                    "data": [{"object": "embedding", "index": 0, "embedding": [0.25, -0.5, 1.0]}],
                    "model": "sentence-transformers/all-MiniLM-L6-v2"
                }));
            })
            .await;

        let embedder = HttpEmbedder::new(
            server.url("/v1/"),
            "sentence-transformers/all-MiniLM-L6-v2",
            Some("sk-test".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        let vector = embedder.embed("Robot vacuum").await.unwrap();
        mock.assert_async().await;
        assert_eq!(vector, vec![0.25, -0.5, 1.0]);
    }

    #[tokio::test]
    async fn http_embedder_surfaces_server_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(503).body("model loading");
            })
            .await;

        let embedder =
            HttpEmbedder::new(server.base_url(), "m", None, Duration::from_secs(5)).unwrap();

        let err = embedder.embed("anything").await.unwrap_err();
        assert!(matches!(err, IndexError::Embedding(ref msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn http_embedder_rejects_empty_data() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200).json_body(serde_json::json!({"data": []}));
            })
            .await;

        let embedder =
            HttpEmbedder::new(server.base_url(), "m", None, Duration::from_secs(5)).unwrap();

        assert!(embedder.embed("anything").await.is_err());
    }
}
