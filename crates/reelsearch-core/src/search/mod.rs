//! Search engine module
//!
//! Provides:
//! - BM25 full-text search via FTS5, normalized into (0,1]
//! - Vector similarity search over chunk embeddings
//! - Weighted score fusion and the optional LLM evaluation filter
//! - The hybrid pipeline tying the stages together

mod evaluation;
mod fusion;
mod lexical;
mod pipeline;
mod traits;
mod vector;

pub use evaluation::EvaluationFilter;
pub use fusion::{dedupe_best, fuse};
pub use lexical::lexical_search;
pub use pipeline::HybridPipeline;
pub use traits::{ItemStore, LexicalIndex, VectorHit, VectorIndex};
pub use vector::{vector_search, SqliteVectorIndex};

use crate::error::{ReelSearchError, Result};
use crate::llm::{ExtractedKeywords, Judgment};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

lazy_static! {
    static ref FTS_TOKEN: Regex = Regex::new(r"[\p{L}\p{N}_]+").unwrap();
}

/// A candidate item flowing through the pipeline stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_id: i64,
    /// Normalized lexical, cosine or fused score depending on the stage
    pub score: f64,
    pub source: SearchSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set only by the evaluation filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judgment: Option<Judgment>,
}

impl ScoredItem {
    pub fn new(item_id: i64, score: f64, source: SearchSource) -> Self {
        Self {
            item_id,
            score,
            source,
            title: None,
            description: None,
            judgment: None,
        }
    }
}

/// Stage that produced a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    Lexical,
    Vector,
    Hybrid,
}

impl SearchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchSource::Lexical => "lexical",
            SearchSource::Vector => "vector",
            SearchSource::Hybrid => "hybrid",
        }
    }
}

impl std::fmt::Display for SearchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weights applied when blending lexical and vector scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub lexical: f64,
    pub vector: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            lexical: 0.7,
            vector: 0.3,
        }
    }
}

/// Everything a pipeline run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub query: String,
    pub keywords: ExtractedKeywords,
    pub results: Vec<ScoredItem>,
    /// Branches that errored or timed out and were treated as empty
    pub failed_branches: Vec<SearchSource>,
    pub evaluated: bool,
}

/// Sort descending by score, ties broken by ascending item id
pub(crate) fn sort_ranked(items: &mut [ScoredItem]) {
    items.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
}

/// Bound an external call; expiry becomes `Timeout` for `stage`
pub(crate) async fn with_timeout<T>(
    stage: &'static str,
    duration: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(ReelSearchError::Timeout {
            stage,
            millis: duration.as_millis() as u64,
        }),
    }
}

/// Common English stop words, ignored like a natural-language full-text match would
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "in", "is",
    "it", "its", "of", "on", "or", "that", "the", "to", "was", "were", "will", "with",
];

/// Build an FTS5 OR-query of quoted terms from keyword text
///
/// Returns an empty string when nothing searchable remains.
pub fn build_fts_query(text: &str) -> String {
    let mut seen = HashSet::new();
    FTS_TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|term| !STOP_WORDS.contains(&term.as_str()))
        .filter(|term| seen.insert(term.clone()))
        .map(|term| format!("\"{}\"", term))
        .collect::<Vec<_>>()
        .join(" OR ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_fts_query() {
        assert_eq!(
            build_fts_query("singer, music, Singer"),
            "\"singer\" OR \"music\""
        );
    }

    #[test]
    fn test_build_fts_query_strips_operators() {
        assert_eq!(
            build_fts_query("ghost* AND (village) -\"night\""),
            "\"ghost\" OR \"village\" OR \"night\""
        );
    }

    #[test]
    fn test_build_fts_query_punctuation_only() {
        assert_eq!(build_fts_query("?!, ... ()"), "");
        assert_eq!(build_fts_query("the of a"), "");
    }

    #[test]
    fn test_build_fts_query_unicode() {
        assert_eq!(build_fts_query("penyanyi wanita, café"), "\"penyanyi\" OR \"wanita\" OR \"café\"");
    }

    #[test]
    fn test_sort_ranked_ties_by_id() {
        let mut items = vec![
            ScoredItem::new(3, 0.5, SearchSource::Hybrid),
            ScoredItem::new(1, 0.5, SearchSource::Hybrid),
            ScoredItem::new(2, 0.9, SearchSource::Hybrid),
        ];
        sort_ranked(&mut items);
        let ids: Vec<i64> = items.iter().map(|i| i.item_id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_search_source_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SearchSource::Vector).unwrap(),
            "\"vector\""
        );
    }
}
