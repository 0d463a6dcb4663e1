pub mod embedder;
pub mod error;
pub mod hot_cache;
pub mod retriever;
pub mod sqlite;

pub use embedder::{CachedEmbedder, Embedder, HttpEmbedder};
pub use error::IndexError;
pub use hot_cache::HotCache;
pub use retriever::{SimilarityRetriever, VectorIndex};
pub use sqlite::SqliteCollection;
