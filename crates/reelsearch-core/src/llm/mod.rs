//! LLM integration
//!
//! Provides traits and implementations for:
//! - Embedding generation via external services (Ollama, vLLM, OpenAI, etc.)
//! - Keyword extraction from free-text queries
//! - Binary relevance judgments

mod cache;
mod client;
mod http_embedder;
mod judge;
mod keyword_extractor;
mod traits;

pub use cache::LLMCache;
pub use client::{
    extract_json_object, ChatMessage, CompletionOptions, HttpLlmClient, LLMClient,
    MetricsSnapshot,
};
pub use http_embedder::HttpEmbedder;
pub use judge::HttpJudge;
pub use keyword_extractor::{normalize_keywords, HttpKeywordExtractor};
pub use traits::*;
