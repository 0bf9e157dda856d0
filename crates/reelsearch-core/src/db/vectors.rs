//! Vector storage operations
//!
//! Stores chunk embeddings as BLOBs and computes cosine similarity in Rust.

use super::Database;
use crate::error::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

/// A stored chunk embedding
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub item_id: i64,
    pub seq: u32,
    pub embedding: Vec<f32>,
}

/// Chunk text ready to be written with its embedding
#[derive(Debug, Clone)]
pub struct ChunkEmbedding {
    pub pos: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl Database {
    /// Replace every stored chunk of an item in one transaction
    pub fn replace_item_vectors(
        &self,
        item_id: i64,
        model: &str,
        chunks: &[ChunkEmbedding],
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM item_vectors WHERE item_id = ?1", params![item_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO item_vectors (item_id, seq, pos, model, chunk, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (seq, chunk) in chunks.iter().enumerate() {
                stmt.execute(params![
                    item_id,
                    seq as u32,
                    chunk.pos as i64,
                    model,
                    chunk.text,
                    embedding_to_bytes(&chunk.embedding),
                    now
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Check if vector index exists and has data
    pub fn has_vector_index(&self) -> Result<bool> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM item_vectors", [], |row| row.get(0))?;
        Ok(count > 0)
    }

    /// Get all chunk embeddings produced by a model
    pub fn get_all_embeddings(&self, model: &str) -> Result<Vec<StoredChunk>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT v.item_id, v.seq, v.embedding
             FROM item_vectors v
             JOIN items i ON i.id = v.item_id
             WHERE v.model = ?1",
        )?;

        let results = stmt
            .query_map(params![model], |row| {
                let embedding_bytes: Vec<u8> = row.get(2)?;
                Ok(StoredChunk {
                    item_id: row.get(0)?,
                    seq: row.get(1)?,
                    embedding: bytes_to_embedding(&embedding_bytes),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(results)
    }

    /// Ids of items without any stored vector for the model
    pub fn get_items_needing_embedding(&self, model: &str) -> Result<Vec<i64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT i.id FROM items i
             WHERE NOT EXISTS (
                SELECT 1 FROM item_vectors v WHERE v.item_id = i.id AND v.model = ?1
             )
             ORDER BY i.id",
        )?;
        let ids = stmt
            .query_map(params![model], |row| row.get(0))?
            .collect::<std::result::Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    /// Count items that have at least one vector
    pub fn embedded_item_count(&self) -> Result<usize> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(DISTINCT item_id) FROM item_vectors",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Check if model dimensions are compatible with expected dimensions
    pub fn check_model_compatibility(&self, model: &str, expected_dims: usize) -> Result<bool> {
        match self.get_model_dimensions(model)? {
            Some(stored_dims) => Ok(stored_dims == expected_dims),
            None => Ok(true),
        }
    }

    /// Register model with its dimensions
    pub fn register_model(&self, model: &str, dimensions: usize) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        self.conn()?.execute(
            "INSERT INTO model_metadata (model, dimensions, created_at, last_used_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(model) DO UPDATE SET dimensions = ?2, last_used_at = ?3",
            params![model, dimensions as i64, now],
        )?;

        Ok(())
    }

    /// Get stored model dimensions
    pub fn get_model_dimensions(&self, model: &str) -> Result<Option<usize>> {
        let dims = self
            .conn()?
            .query_row(
                "SELECT dimensions FROM model_metadata WHERE model = ?1",
                params![model],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(dims.map(|d| d as usize))
    }

    /// Drop every stored vector (used before a forced re-index)
    pub fn clear_vectors(&self) -> Result<usize> {
        let rows = self.conn()?.execute("DELETE FROM item_vectors", [])?;
        Ok(rows)
    }
}

/// Convert f32 embedding to bytes (little-endian)
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert bytes to f32 embedding
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    fn chunk(pos: usize, embedding: Vec<f32>) -> ChunkEmbedding {
        ChunkEmbedding {
            pos,
            text: format!("chunk at {}", pos),
            embedding,
        }
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!((sim - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!(sim.abs() < 0.0001);
    }

    #[test]
    fn test_cosine_similarity_dimension_mismatch() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_replace_item_vectors() {
        let db = test_db();
        db.insert_item(1, "Film", "About a singer").unwrap();

        db.replace_item_vectors(1, "m", &[chunk(0, vec![1.0, 0.0]), chunk(160, vec![0.0, 1.0])])
            .unwrap();
        assert_eq!(db.get_all_embeddings("m").unwrap().len(), 2);

        db.replace_item_vectors(1, "m", &[chunk(0, vec![0.5, 0.5])]).unwrap();
        let stored = db.get_all_embeddings("m").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].item_id, 1);
        assert_eq!(stored[0].embedding, vec![0.5, 0.5]);
        assert!(db.has_vector_index().unwrap());
    }

    #[test]
    fn test_items_needing_embedding() {
        let db = test_db();
        db.insert_item(1, "A", "a").unwrap();
        db.insert_item(2, "B", "b").unwrap();
        db.replace_item_vectors(2, "m", &[chunk(0, vec![1.0])]).unwrap();

        assert_eq!(db.get_items_needing_embedding("m").unwrap(), vec![1]);
        assert_eq!(db.get_items_needing_embedding("other").unwrap(), vec![1, 2]);
        assert_eq!(db.embedded_item_count().unwrap(), 1);
    }

    #[test]
    fn test_update_drops_vectors() {
        let db = test_db();
        db.insert_item(3, "C", "c").unwrap();
        db.replace_item_vectors(3, "m", &[chunk(0, vec![1.0])]).unwrap();
        db.update_item(3, None, Some("changed")).unwrap();
        assert!(!db.has_vector_index().unwrap());
    }

    #[test]
    fn test_vector_index_check_surfaces_errors() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.has_vector_index().is_err());

        let db = test_db();
        assert!(!db.has_vector_index().unwrap());
    }

    #[test]
    fn test_model_registration() {
        let db = test_db();
        assert!(db.check_model_compatibility("m", 384).unwrap());
        db.register_model("m", 384).unwrap();
        assert_eq!(db.get_model_dimensions("m").unwrap(), Some(384));
        assert!(!db.check_model_compatibility("m", 1024).unwrap());
    }
}
