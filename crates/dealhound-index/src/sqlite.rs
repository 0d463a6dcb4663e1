use std::cmp::Ordering;

use dealhound_models::index_schema::{DistanceMetric, DocumentRow, DOCUMENTS_TABLE_DDL};
use rusqlite::Connection;

use crate::error::IndexError;

/// SQLite-backed product collection.
///
/// The collection is written once by the offline index builder and only read
/// here. Queries scan the collection and keep the `k` closest documents.
pub struct SqliteCollection {
    conn: Connection,
}

/// A document hit together with its distance to the query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbour {
    pub id: String,
    pub document: String,
    pub category: String,
    pub price: f64,
    pub distance: f32,
}

impl SqliteCollection {
    /// Open a read-only connection to an existing collection file.
    pub fn open(path: &str) -> Result<Self, IndexError> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Open a writable in-memory collection with the schema applied. Used by tests.
    pub fn open_in_memory() -> Result<Self, IndexError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(DOCUMENTS_TABLE_DDL)?;
        Ok(Self { conn })
    }

    /// Open (or create) a writable collection file with the schema applied.
    pub fn create(path: &str) -> Result<Self, IndexError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(DOCUMENTS_TABLE_DDL)?;
        Ok(Self { conn })
    }

    pub fn count(&self, collection: &str) -> Result<u64, IndexError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            rusqlite::params![collection],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// The `k` documents nearest to `query`, closest first.
    pub fn nearest(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
        metric: DistanceMetric,
    ) -> Result<Vec<Neighbour>, IndexError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare_cached(
            "SELECT id, document, embedding, category, price \
             FROM documents WHERE collection = ?1",
        )?;
        let rows = stmt.query_map(rusqlite::params![collection], |row| {
            let blob: Vec<u8> = row.get(2)?;
            Ok(DocumentRow {
                id: row.get(0)?,
                document: row.get(1)?,
                embedding: decode_embedding(&blob),
                category: row.get(3)?,
                price: row.get(4)?,
            })
        })?;

        let mut best: Vec<Neighbour> = Vec::with_capacity(k + 1);
        for row in rows {
            let row = row?;
            if row.embedding.len() != query.len() {
                return Err(IndexError::Dimension {
                    id: row.id,
                    query: query.len(),
                    document: row.embedding.len(),
                });
            }
            let distance = metric.distance(query, &row.embedding);
            if best.len() == k
                && best
                    .last()
                    .is_some_and(|worst| distance >= worst.distance)
            {
                continue;
            }

            // Insert after any equal distance so earlier rows win ties.
            let pos = best.partition_point(|n| {
                n.distance.partial_cmp(&distance).unwrap_or(Ordering::Less) != Ordering::Greater
            });
            best.insert(
                pos,
                Neighbour {
                    id: row.id,
                    document: row.document,
                    category: row.category,
                    price: row.price,
                    distance,
                },
            );
            best.truncate(k);
        }

        Ok(best)
    }

    /// Insert or replace a document. The index builder owns production writes;
    /// this is used by tests and tooling.
    pub fn insert(&self, collection: &str, row: &DocumentRow) -> Result<(), IndexError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO documents \
             (id, collection, document, embedding, category, price) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                row.id,
                collection,
                row.document,
                encode_embedding(&row.embedding),
                row.category,
                row.price,
            ],
        )?;
        Ok(())
    }
}

/// Little-endian f32 encoding used for the `embedding` column.
pub fn encode_embedding(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, embedding: Vec<f32>, price: f64) -> DocumentRow {
        DocumentRow {
            id: id.to_string(),
            document: format!("Product {id}"),
            embedding,
            category: "Electronics".to_string(),
            price,
        }
    }

    fn seeded() -> SqliteCollection {
        let coll = SqliteCollection::open_in_memory().unwrap();
        coll.insert("products", &doc("doc_0", vec![0.0, 0.0], 10.0))
            .unwrap();
        coll.insert("products", &doc("doc_1", vec![1.0, 0.0], 20.0))
            .unwrap();
        coll.insert("products", &doc("doc_2", vec![5.0, 5.0], 30.0))
            .unwrap();
        coll.insert("products", &doc("doc_3", vec![0.9, 0.1], 40.0))
            .unwrap();
        coll.insert("other", &doc("doc_9", vec![1.0, 0.0], 99.0))
            .unwrap();
        coll
    }

    #[test]
    fn nearest_orders_by_distance() {
        let coll = seeded();
        let hits = coll
            .nearest("products", &[1.0, 0.0], 3, DistanceMetric::L2)
            .unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["doc_1", "doc_3", "doc_0"]);
        assert_eq!(hits[0].price, 20.0);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn nearest_is_scoped_to_collection() {
        let coll = seeded();
        let hits = coll
            .nearest("products", &[1.0, 0.0], 10, DistanceMetric::L2)
            .unwrap();
        assert_eq!(hits.len(), 4);
        assert!(hits.iter().all(|h| h.id != "doc_9"));
    }

    #[test]
    fn empty_collection_returns_nothing() {
        let coll = SqliteCollection::open_in_memory().unwrap();
        let hits = coll
            .nearest("products", &[1.0, 0.0], 5, DistanceMetric::Cosine)
            .unwrap();
        assert!(hits.is_empty());
        assert_eq!(coll.count("products").unwrap(), 0);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let coll = seeded();
        let err = coll
            .nearest("products", &[1.0, 0.0, 0.0], 2, DistanceMetric::L2)
            .unwrap_err();
        assert!(matches!(err, IndexError::Dimension { query: 3, document: 2, .. }));
    }

    #[test]
    fn embedding_blob_roundtrip() {
        let values = vec![0.5f32, -1.25, 3.0e-7];
        assert_eq!(decode_embedding(&encode_embedding(&values)), values);
    }

    #[test]
    fn read_only_open_of_created_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.db");
        let path = path.to_str().unwrap();
        {
            let coll = SqliteCollection::create(path).unwrap();
            coll.insert("products", &doc("doc_0", vec![0.0, 1.0], 12.5))
                .unwrap();
        }

        let coll = SqliteCollection::open(path).unwrap();
        assert_eq!(coll.count("products").unwrap(), 1);
        let hits = coll
            .nearest("products", &[0.0, 1.0], 1, DistanceMetric::Cosine)
            .unwrap();
        assert_eq!(hits[0].price, 12.5);
    }
}
