//! ReelSearch Core Library
//!
//! Hybrid retrieval and rerank pipeline for a movie catalog.
//!
//! # Features
//! - SQLite FTS5 full-text search with normalized BM25 scoring
//! - Vector similarity search over chunk embeddings
//! - Weighted fusion of lexical and vector scores
//! - LLM-powered keyword extraction and relevance judgments

pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod llm;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, LLMServiceConfig, PipelineConfig};
pub use db::{Database, Item};
pub use error::{Error, ReelSearchError, Result};
pub use index::{index_all, index_item, ChunkingOptions, IndexStats};
pub use llm::{
    Embedder, ExtractedKeywords, HttpEmbedder, HttpJudge, HttpKeywordExtractor, HttpLlmClient,
    Judge, Judgment, KeywordExtractor, LLMClient, Verdict,
};
pub use search::{
    fuse, lexical_search, vector_search, EvaluationFilter, FusionWeights, HybridPipeline,
    ItemStore, LexicalIndex, ScoredItem, SearchOutcome, SearchSource, SqliteVectorIndex,
    VectorHit, VectorIndex,
};

/// Default cache directory name
pub const CACHE_DIR_NAME: &str = "reelsearch";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "reelsearch";
