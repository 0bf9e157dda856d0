//! LLM trait definitions

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Embedding generation trait
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for batch of texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Turns a free-text query into search keywords
#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    /// Extract normalized keywords; fails with `Error::Extraction`
    async fn extract(&self, query: &str) -> Result<ExtractedKeywords>;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Output of keyword extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedKeywords {
    /// Comma separated keyword string
    pub keywords: String,
    /// Query translated into the catalog language (localized deployments)
    pub translation: Option<String>,
    /// True when the raw query stands in for failed extraction
    pub fallback: bool,
}

impl ExtractedKeywords {
    /// Use the raw query as the keyword string
    pub fn fallback(query: &str) -> Self {
        Self {
            keywords: query.trim().to_string(),
            translation: None,
            fallback: true,
        }
    }

    /// Text handed to both indexes
    pub fn search_text(&self) -> String {
        match self.translation.as_deref().map(str::trim) {
            Some(translation) if !translation.is_empty() => {
                format!("{} {}", self.keywords, translation)
            }
            _ => self.keywords.clone(),
        }
    }
}

/// Binary relevance judge for a single candidate
#[async_trait]
pub trait Judge: Send + Sync {
    /// Decide whether `description` matches the theme of `query`
    async fn judge(&self, query: &str, item_id: i64, description: &str) -> Result<Judgment>;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Outcome of a relevance judgment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    #[default]
    Unjudged,
    Related,
    Unrelated,
}

/// Verdict plus the judge's explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub verdict: Verdict,
    pub rationale: String,
}

impl Judgment {
    pub fn is_related(&self) -> bool {
        self.verdict == Verdict::Related
    }
}
