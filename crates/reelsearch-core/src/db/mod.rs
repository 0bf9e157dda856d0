//! Database layer for reelsearch
//!
//! Provides SQLite-based storage with:
//! - FTS5 full-text search over the item catalog
//! - Chunk embedding storage for vector search

mod items;
mod schema;
pub mod vectors;

pub use items::Item;
pub use schema::Database;
pub use vectors::{ChunkEmbedding, StoredChunk};
use std::path::PathBuf;

impl Database {
    /// Get the default database path
    pub fn default_path() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CACHE_DIR_NAME)
            .join("index.sqlite")
    }
}
