//! Index and store seams used by the pipeline

use crate::db::{Database, Item};
use crate::error::Result;
use async_trait::async_trait;

/// Full-text index returning raw relevance scores (higher is better)
#[async_trait]
pub trait LexicalIndex: Send + Sync {
    /// Ordered `(item_id, raw_score)` pairs, at most `limit`
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<(i64, f64)>>;
}

/// One chunk matched by the vector index
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorHit {
    pub item_id: i64,
    pub chunk_seq: u32,
    /// Cosine similarity
    pub score: f64,
}

/// Vector index returning chunk-level hits
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Best chunk hits for the text; implementations may return several per item
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<VectorHit>>;
}

/// Item metadata lookup
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get_item(&self, id: i64) -> Result<Option<Item>>;
}

#[async_trait]
impl ItemStore for Database {
    async fn get_item(&self, id: i64) -> Result<Option<Item>> {
        Database::get_item(self, id)
    }
}
