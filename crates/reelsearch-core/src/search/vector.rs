//! Vector similarity search
//!
//! Computes cosine similarity between the query embedding and stored chunk embeddings.

use super::{sort_ranked, ScoredItem, SearchSource, VectorHit, VectorIndex};
use crate::db::vectors::cosine_similarity;
use crate::db::Database;
use crate::error::{ReelSearchError, Result};
use crate::llm::Embedder;
use async_trait::async_trait;
use std::collections::HashMap;

/// Chunk vectors stored in SQLite, queried through an embedder
pub struct SqliteVectorIndex<'a> {
    db: &'a Database,
    embedder: &'a dyn Embedder,
}

impl<'a> SqliteVectorIndex<'a> {
    pub fn new(db: &'a Database, embedder: &'a dyn Embedder) -> Self {
        Self { db, embedder }
    }

    fn rank_chunks(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<VectorHit>> {
        let stored = self.db.get_all_embeddings(self.embedder.model_name())?;

        let mut hits: Vec<VectorHit> = stored
            .iter()
            .map(|chunk| VectorHit {
                item_id: chunk.item_id,
                chunk_seq: chunk.seq,
                score: cosine_similarity(query_embedding, &chunk.embedding) as f64,
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.item_id.cmp(&b.item_id))
                .then_with(|| a.chunk_seq.cmp(&b.chunk_seq))
        });

        // Several chunks may belong to one item, so over-fetch before dedup
        hits.truncate(limit.saturating_mul(3));
        Ok(hits)
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex<'_> {
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<VectorHit>> {
        if !self.db.has_vector_index()? {
            tracing::debug!("No stored vectors, skipping embedding call");
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(text).await?;
        self.rank_chunks(&query_embedding, limit)
    }
}

/// Vector stage: one entry per item (best chunk wins), scores clamped to [0,1]
pub async fn vector_search(
    index: &dyn VectorIndex,
    text: &str,
    limit: usize,
) -> Result<Vec<ScoredItem>> {
    if text.trim().is_empty() || limit == 0 {
        return Ok(Vec::new());
    }

    let hits = index
        .search(text, limit)
        .await
        .map_err(|e| match e {
            ReelSearchError::Search { .. } => e,
            other => ReelSearchError::search("vector", other.to_string()),
        })?;

    let mut best: HashMap<i64, f64> = HashMap::new();
    for hit in hits {
        let score = if hit.score.is_nan() {
            0.0
        } else {
            hit.score.clamp(0.0, 1.0)
        };
        best.entry(hit.item_id)
            .and_modify(|s| *s = s.max(score))
            .or_insert(score);
    }

    let mut items: Vec<ScoredItem> = best
        .into_iter()
        .map(|(id, score)| ScoredItem::new(id, score, SearchSource::Vector))
        .collect();

    sort_ranked(&mut items);
    items.truncate(limit);

    tracing::debug!("Vector search returned {} items", items.len());
    Ok(items)
}
