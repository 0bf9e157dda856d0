//! Deterministic collaborators for unit tests

use crate::db::Item;
use crate::error::{ReelSearchError, Result};
use crate::llm::{
    ChatMessage, CompletionOptions, Embedder, ExtractedKeywords, Judge, Judgment, KeywordExtractor,
    LLMClient, Verdict,
};
use crate::search::{ItemStore, LexicalIndex, VectorHit, VectorIndex};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Chat client answering every request with one scripted response
#[derive(Default)]
pub struct ScriptedLlm {
    response: Option<String>,
    failure: Option<String>,
    calls: AtomicUsize,
    last_options: Mutex<Option<CompletionOptions>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, response: &str) -> Self {
        self.response = Some(response.to_string());
        self
    }

    pub fn fail(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<CompletionOptions> {
        self.last_options.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMClient for ScriptedLlm {
    async fn chat_completion(
        &self,
        _messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(options.clone());

        if let Some(ref message) = self.failure {
            return Err(ReelSearchError::ExternalError(message.clone()));
        }
        Ok(self.response.clone().unwrap_or_default())
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(ReelSearchError::Llm("no embeddings scripted".to_string()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(ReelSearchError::Llm("no embeddings scripted".to_string()))
    }

    fn embedding_dimensions(&self) -> usize {
        0
    }

    fn model_name(&self) -> &str {
        "scripted-chat"
    }

    fn embedding_model(&self) -> &str {
        "scripted-embed"
    }
}

/// Embeds text as occurrence counts of a fixed keyword list
pub struct KeywordEmbedder {
    keywords: Vec<String>,
    failing: bool,
}

impl KeywordEmbedder {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            failing: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .map(|k| text.matches(k.as_str()).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.failing {
            return Err(ReelSearchError::ExternalError("embedder offline".to_string()));
        }
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.failing {
            return Err(ReelSearchError::ExternalError("embedder offline".to_string()));
        }
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.keywords.len()
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }
}

/// Lexical index with canned raw scores
pub struct FixedLexical(pub Vec<(i64, f64)>);

#[async_trait]
impl LexicalIndex for FixedLexical {
    async fn search(&self, _text: &str, _limit: usize) -> Result<Vec<(i64, f64)>> {
        Ok(self.0.clone())
    }
}

/// Vector index with canned chunk hits
pub struct FixedVector(pub Vec<VectorHit>);

#[async_trait]
impl VectorIndex for FixedVector {
    async fn search(&self, _text: &str, _limit: usize) -> Result<Vec<VectorHit>> {
        Ok(self.0.clone())
    }
}

/// Index that is always down
pub struct FailingIndex;

#[async_trait]
impl LexicalIndex for FailingIndex {
    async fn search(&self, _text: &str, _limit: usize) -> Result<Vec<(i64, f64)>> {
        Err(ReelSearchError::ExternalError("index unavailable".to_string()))
    }
}

#[async_trait]
impl VectorIndex for FailingIndex {
    async fn search(&self, _text: &str, _limit: usize) -> Result<Vec<VectorHit>> {
        Err(ReelSearchError::ExternalError("index unavailable".to_string()))
    }
}

/// Index that answers empty after a delay
pub struct SlowIndex(pub Duration);

#[async_trait]
impl LexicalIndex for SlowIndex {
    async fn search(&self, _text: &str, _limit: usize) -> Result<Vec<(i64, f64)>> {
        tokio::time::sleep(self.0).await;
        Ok(Vec::new())
    }
}

#[async_trait]
impl VectorIndex for SlowIndex {
    async fn search(&self, _text: &str, _limit: usize) -> Result<Vec<VectorHit>> {
        tokio::time::sleep(self.0).await;
        Ok(Vec::new())
    }
}

/// In-memory item store, optionally answering after a delay
#[derive(Default)]
pub struct MemoryStore {
    items: HashMap<i64, Item>,
    delay: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: i64, title: &str, description: &str) -> Self {
        self.items.insert(
            id,
            Item {
                id,
                title: title.to_string(),
                description: description.to_string(),
                created_at: "2024-01-01T00:00:00+00:00".to_string(),
                modified_at: "2024-01-01T00:00:00+00:00".to_string(),
            },
        );
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn get_item(&self, id: i64) -> Result<Option<Item>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.items.get(&id).cloned())
    }
}

/// Extractor returning fixed keywords or always failing
pub struct ScriptedExtractor {
    keywords: Option<String>,
    delay: Option<Duration>,
}

impl ScriptedExtractor {
    pub fn keywords(keywords: &str) -> Self {
        Self {
            keywords: Some(keywords.to_string()),
            delay: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            keywords: None,
            delay: None,
        }
    }

    /// Answer only after `delay`
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl KeywordExtractor for ScriptedExtractor {
    async fn extract(&self, _query: &str) -> Result<ExtractedKeywords> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.keywords {
            Some(ref keywords) => Ok(ExtractedKeywords {
                keywords: keywords.clone(),
                translation: None,
                fallback: false,
            }),
            None => Err(ReelSearchError::Extraction("service unavailable".to_string())),
        }
    }

    fn model_name(&self) -> &str {
        "scripted-extractor"
    }
}

#[derive(Clone, Copy)]
enum Scripted {
    Verdict(Verdict),
    Malformed,
}

/// Judge with per-item verdicts; unscripted items are unrelated
#[derive(Default)]
pub struct ScriptedJudge {
    verdicts: HashMap<i64, Scripted>,
    delays: HashMap<i64, Duration>,
    calls: AtomicUsize,
    last_description: Mutex<Option<String>>,
}

impl ScriptedJudge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn related(mut self, item_id: i64) -> Self {
        self.verdicts
            .insert(item_id, Scripted::Verdict(Verdict::Related));
        self
    }

    pub fn unrelated(mut self, item_id: i64) -> Self {
        self.verdicts
            .insert(item_id, Scripted::Verdict(Verdict::Unrelated));
        self
    }

    pub fn malformed(mut self, item_id: i64) -> Self {
        self.verdicts.insert(item_id, Scripted::Malformed);
        self
    }

    pub fn delay(mut self, item_id: i64, delay: Duration) -> Self {
        self.delays.insert(item_id, delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_description(&self) -> Option<String> {
        self.last_description.lock().unwrap().clone()
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn judge(&self, _query: &str, item_id: i64, description: &str) -> Result<Judgment> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_description.lock().unwrap() = Some(description.to_string());

        if let Some(delay) = self.delays.get(&item_id) {
            tokio::time::sleep(*delay).await;
        }

        match self.verdicts.get(&item_id) {
            Some(Scripted::Verdict(verdict)) => Ok(Judgment {
                verdict: *verdict,
                rationale: format!("scripted verdict for item {}", item_id),
            }),
            Some(Scripted::Malformed) => Err(ReelSearchError::Judgment {
                item_id,
                message: "unexpected binary_score 'maybe'".to_string(),
            }),
            None => Ok(Judgment {
                verdict: Verdict::Unrelated,
                rationale: String::new(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "scripted-judge"
    }
}
