//! Embedding pipeline for catalog items

use super::chunker::{chunk_text, ChunkingOptions};
use crate::db::{ChunkEmbedding, Database, Item};
use crate::error::{ReelSearchError, Result};
use crate::llm::Embedder;

const BATCH_SIZE: usize = 32;

/// Indexing progress
#[derive(Debug, Clone)]
pub struct IndexProgress {
    pub total_items: usize,
    pub processed_items: usize,
    pub embedded_chunks: usize,
}

/// Indexing statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub total_items: usize,
    pub embedded_items: usize,
    pub embedded_chunks: usize,
    pub failed_items: usize,
}

/// Chunk an item, embed every chunk and replace its stored vectors
///
/// Returns the number of chunks written.
pub async fn index_item(
    db: &Database,
    embedder: &dyn Embedder,
    item: &Item,
    options: ChunkingOptions,
) -> Result<usize> {
    let chunks = chunk_text(&item.context_text(), options);
    let mut stored = Vec::with_capacity(chunks.len());

    for batch in chunks.chunks(BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        if embeddings.len() != batch.len() {
            return Err(ReelSearchError::Llm(format!(
                "Expected {} embeddings, got {}",
                batch.len(),
                embeddings.len()
            )));
        }

        for (chunk, embedding) in batch.iter().zip(embeddings) {
            stored.push(ChunkEmbedding {
                pos: chunk.position,
                text: chunk.text.clone(),
                embedding,
            });
        }
    }

    db.replace_item_vectors(item.id, embedder.model_name(), &stored)?;
    tracing::debug!("Indexed item {} ({} chunks)", item.id, stored.len());
    Ok(stored.len())
}

/// Embed items missing vectors for the embedder's model, or every item when `force`
///
/// A stored model with different dimensions forces a full rebuild. Items whose
/// embedding call fails are counted and skipped.
pub async fn index_all(
    db: &Database,
    embedder: &dyn Embedder,
    options: ChunkingOptions,
    force: bool,
    progress: Option<Box<dyn Fn(IndexProgress) + Send + Sync>>,
) -> Result<IndexStats> {
    let model = embedder.model_name();
    let dimensions = embedder.dimensions();

    let mut rebuild = force;
    if !db.check_model_compatibility(model, dimensions)? {
        tracing::warn!(
            "Stored vectors for {} have different dimensions, rebuilding index",
            model
        );
        rebuild = true;
    }

    if rebuild {
        let cleared = db.clear_vectors()?;
        tracing::info!("Cleared {} stored vectors", cleared);
    }
    db.register_model(model, dimensions)?;

    let ids = db.get_items_needing_embedding(model)?;
    let items = db.list_items(&ids)?;

    let mut stats = IndexStats {
        total_items: items.len(),
        ..Default::default()
    };

    for (idx, item) in items.iter().enumerate() {
        match index_item(db, embedder, item, options).await {
            Ok(chunks) => {
                stats.embedded_items += 1;
                stats.embedded_chunks += chunks;
            }
            Err(ReelSearchError::Database(e)) => return Err(ReelSearchError::Database(e)),
            Err(e) => {
                tracing::warn!("Failed to index item {}: {}", item.id, e);
                stats.failed_items += 1;
            }
        }

        if let Some(ref cb) = progress {
            cb(IndexProgress {
                total_items: stats.total_items,
                processed_items: idx + 1,
                embedded_chunks: stats.embedded_chunks,
            });
        }
    }

    Ok(stats)
}
