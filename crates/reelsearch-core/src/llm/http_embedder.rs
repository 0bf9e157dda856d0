//! Embedder backed by an OpenAI-compatible `/v1/embeddings` endpoint

use super::{Embedder, LLMClient};
use crate::error::{ReelSearchError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Turns item chunks and search text into vectors through the shared client
pub struct HttpEmbedder {
    client: Arc<dyn LLMClient>,
}

impl HttpEmbedder {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }

    fn check_dimensions(&self, embedding: &[f32]) -> Result<()> {
        let expected = self.client.embedding_dimensions();
        if embedding.len() != expected {
            return Err(ReelSearchError::Llm(format!(
                "{} returned {} dimensions, expected {} (set REELSEARCH_EMBEDDING_DIMS)",
                self.client.embedding_model(),
                embedding.len(),
                expected
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.client.embed(text).await?;
        self.check_dimensions(&embedding)?;
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let embeddings = self.client.embed_batch(texts).await?;
        for embedding in &embeddings {
            self.check_dimensions(embedding)?;
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.client.embedding_dimensions()
    }

    fn model_name(&self) -> &str {
        self.client.embedding_model()
    }
}
