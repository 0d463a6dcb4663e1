use serde::{Deserialize, Serialize};

/// Distance metric used for nearest-neighbour queries over the collection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared euclidean distance.
    #[default]
    L2,
    /// One minus cosine similarity.
    Cosine,
}

impl DistanceMetric {
    /// Distance between two vectors of equal length. Smaller is more similar.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::L2 => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum(),
            DistanceMetric::Cosine => {
                let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
                let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
                if na == 0.0 || nb == 0.0 {
                    1.0
                } else {
                    1.0 - dot / (na * nb)
                }
            }
        }
    }
}

/// The SQLite table the index builder writes and the retriever reads.
///
/// ```sql
/// CREATE TABLE IF NOT EXISTS documents (
///     id          TEXT NOT NULL,
///     collection  TEXT NOT NULL,
///     document    TEXT NOT NULL,
///     embedding   BLOB NOT NULL,   -- little-endian f32 values
///     category    TEXT NOT NULL,
///     price       REAL NOT NULL,
///     PRIMARY KEY (collection, id)
/// );
/// ```
pub const DOCUMENTS_TABLE_DDL: &str = "\
CREATE TABLE IF NOT EXISTS documents (
    id          TEXT NOT NULL,
    collection  TEXT NOT NULL,
    document    TEXT NOT NULL,
    embedding   BLOB NOT NULL,
    category    TEXT NOT NULL,
    price       REAL NOT NULL,
    PRIMARY KEY (collection, id)
);
CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);
";

/// A product document as stored in the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    pub id: String,
    pub document: String,
    pub embedding: Vec<f32>,
    pub category: String,
    pub price: f64,
}
