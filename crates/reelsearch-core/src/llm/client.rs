//! HTTP client for external LLM services (Ollama, vLLM, OpenAI, etc.)

use super::cache::{cache_key, CacheKind, LLMCache};
use crate::config::LLMServiceConfig;
use crate::error::{ReelSearchError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{atomic::AtomicU64, Arc};
use std::time::{Duration, Instant};

/// Trait for LLM service clients
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate chat completion
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> Result<String>;

    /// Generate embeddings for text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimensions
    fn embedding_dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;

    /// Get embedding model name
    fn embedding_model(&self) -> &str;
}

/// Chat message for completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Sampling options for one completion
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    /// Ask the service for a JSON object response
    pub json: bool,
    pub max_tokens: u32,
    /// Overrides the client's configured model
    pub model: Option<String>,
}

impl CompletionOptions {
    /// Temperature 0, JSON output; stable answers for classification tasks
    pub fn deterministic() -> Self {
        Self {
            temperature: 0.0,
            json: true,
            max_tokens: 512,
            model: None,
        }
    }

    /// Free-text generation at the given temperature
    pub fn creative(temperature: f32) -> Self {
        Self {
            temperature,
            json: false,
            max_tokens: 256,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    fn is_cacheable(&self) -> bool {
        self.temperature == 0.0
    }
}

/// API metrics for monitoring
#[derive(Debug, Default)]
pub struct APIMetrics {
    pub total_requests: AtomicU64,
    pub total_errors: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub total_latency_ms: AtomicU64,
}

/// OpenAI-compatible HTTP client
pub struct HttpLlmClient {
    http_client: reqwest::Client,
    config: LLMServiceConfig,
    embedding_dimensions: usize,
    cache: Arc<LLMCache>,
    metrics: Arc<APIMetrics>,
}

impl HttpLlmClient {
    /// Create new client from configuration
    pub fn new(config: LLMServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ReelSearchError::Http)?;

        // mxbai-embed-large produces 1024-dimensional vectors
        let embedding_dimensions = config.embedding_dimensions.unwrap_or(1024);

        Ok(Self {
            http_client,
            config,
            embedding_dimensions,
            cache: Arc::new(LLMCache::new()),
            metrics: Arc::new(APIMetrics::default()),
        })
    }

    /// Get current API metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        use std::sync::atomic::Ordering;

        let total = self.metrics.total_requests.load(Ordering::Relaxed);
        let hits = self.metrics.cache_hits.load(Ordering::Relaxed);
        let misses = self.metrics.cache_misses.load(Ordering::Relaxed);

        MetricsSnapshot {
            total_requests: total,
            total_errors: self.metrics.total_errors.load(Ordering::Relaxed),
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate: if total > 0 {
                hits as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            avg_latency_ms: if total > 0 {
                self.metrics.total_latency_ms.load(Ordering::Relaxed) as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    fn record_error(&self) {
        self.metrics
            .total_errors
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key {
            Some(ref api_key) => req.header("Authorization", format!("Bearer {}", api_key)),
            None => req,
        }
    }
}

/// Snapshot of API metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub total_errors: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f64,
    pub avg_latency_ms: f64,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[async_trait]
impl LLMClient for HttpLlmClient {
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
    ) -> Result<String> {
        use std::sync::atomic::Ordering;

        let start = Instant::now();
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        let model = options.model.as_deref().unwrap_or(&self.config.model);

        // Only deterministic calls are safe to replay from cache
        let key = if options.is_cacheable() {
            let messages_json = serde_json::to_string(&messages)?;
            Some(cache_key(CacheKind::Chat, model, &messages_json))
        } else {
            None
        };

        if let Some(cached) = key.as_deref().and_then(|key| self.cache.get(key)) {
            tracing::debug!("Cache hit for chat completion");
            self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }
        self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);

        let request = ChatRequest {
            model,
            messages: &messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: options.json.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let url = format!("{}/v1/chat/completions", self.config.url);
        let req = self.authorize(self.http_client.post(&url).json(&request));

        let response = req.send().await.map_err(|e| {
            self.record_error();
            ReelSearchError::Http(e)
        })?;

        if !response.status().is_success() {
            self.record_error();
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReelSearchError::ExternalError(format!(
                "LLM service error (HTTP {}): {}",
                status, body
            )));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            self.record_error();
            ReelSearchError::Http(e)
        })?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| {
                self.record_error();
                ReelSearchError::Llm("No response from LLM".to_string())
            })?
            .message
            .content;

        if let Some(key) = key {
            self.cache.set(key, content.clone());
        }

        let elapsed = start.elapsed().as_millis() as u64;
        self.metrics
            .total_latency_ms
            .fetch_add(elapsed, Ordering::Relaxed);

        Ok(content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| ReelSearchError::Llm("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        use std::sync::atomic::Ordering;

        let start = Instant::now();
        self.metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        // Check cache for each text
        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut uncached_texts = Vec::new();
        let mut uncached_indices = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let key = cache_key(CacheKind::Embedding, &self.config.embedding_model, text);
            if let Some(embedding) = self
                .cache
                .get(&key)
                .and_then(|cached| serde_json::from_str::<Vec<f32>>(&cached).ok())
            {
                results.push(Some(embedding));
                self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            self.metrics.cache_misses.fetch_add(1, Ordering::Relaxed);
            results.push(None);
            uncached_texts.push(text.clone());
            uncached_indices.push(i);
        }

        if !uncached_texts.is_empty() {
            tracing::debug!(
                "Embedding batch: {} cached, {} to fetch",
                texts.len() - uncached_texts.len(),
                uncached_texts.len()
            );

            #[derive(Serialize)]
            struct EmbedRequest<'a> {
                model: &'a str,
                input: &'a [String],
            }

            #[derive(Deserialize)]
            struct EmbedResponse {
                data: Vec<EmbedData>,
            }

            #[derive(Deserialize)]
            struct EmbedData {
                embedding: Vec<f32>,
            }

            let request = EmbedRequest {
                model: &self.config.embedding_model,
                input: &uncached_texts,
            };

            let url = format!("{}/v1/embeddings", self.config.embeddings_url());
            let req = self.authorize(self.http_client.post(&url).json(&request));

            let response = req.send().await.map_err(|e| {
                self.record_error();
                ReelSearchError::Http(e)
            })?;

            if !response.status().is_success() {
                self.record_error();
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(ReelSearchError::ExternalError(format!(
                    "Embedding service error (HTTP {}): {}",
                    status, body
                )));
            }

            let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                self.record_error();
                ReelSearchError::Http(e)
            })?;

            if embed_response.data.len() != uncached_texts.len() {
                self.record_error();
                return Err(ReelSearchError::Llm(format!(
                    "Expected {} embeddings, got {}",
                    uncached_texts.len(),
                    embed_response.data.len()
                )));
            }

            for ((text, original_idx), data) in uncached_texts
                .iter()
                .zip(uncached_indices)
                .zip(embed_response.data)
            {
                let key = cache_key(CacheKind::Embedding, &self.config.embedding_model, text);
                if let Ok(json) = serde_json::to_string(&data.embedding) {
                    self.cache.set(key, json);
                }
                results[original_idx] = Some(data.embedding);
            }
        }

        let elapsed = start.elapsed().as_millis() as u64;
        self.metrics
            .total_latency_ms
            .fetch_add(elapsed, Ordering::Relaxed);

        Ok(results.into_iter().flatten().collect())
    }

    fn embedding_dimensions(&self) -> usize {
        self.embedding_dimensions
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn embedding_model(&self) -> &str {
        &self.config.embedding_model
    }
}

/// Extract the outermost JSON object from a response (handles markdown fences
/// and chatter around the payload)
pub fn extract_json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (end > start).then(|| &response[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_object_from_fenced_response() {
        let response = "Here you go:\n```json\n{\"keywords\": \"a, b\"}\n```";
        assert_eq!(
            extract_json_object(response),
            Some("{\"keywords\": \"a, b\"}")
        );
    }

    #[test]
    fn test_extract_json_object_missing() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_completion_options_modes() {
        let judge = CompletionOptions::deterministic().with_model("llama3.2:3b");
        assert!(judge.is_cacheable());
        assert!(judge.json);
        assert_eq!(judge.model.as_deref(), Some("llama3.2:3b"));

        let keywords = CompletionOptions::creative(0.7);
        assert!(!keywords.is_cacheable());
        assert!(!keywords.json);
    }

    #[test]
    fn test_fresh_client_metrics() {
        let client = HttpLlmClient::new(LLMServiceConfig::default()).unwrap();
        let metrics = client.metrics();
        assert_eq!(metrics.total_requests, 0);
        assert_eq!(metrics.cache_hit_rate, 0.0);
        assert_eq!(metrics.avg_latency_ms, 0.0);
    }

    #[tokio::test]
    async fn test_unreachable_service_counts_error() {
        let config = LLMServiceConfig {
            url: "http://127.0.0.1:9".to_string(),
            ..LLMServiceConfig::default()
        };
        let client = HttpLlmClient::new(config).unwrap();
        let result = client
            .chat_completion(vec![ChatMessage::user("hi")], &CompletionOptions::creative(0.5))
            .await;
        assert!(result.is_err());

        let metrics = client.metrics();
        assert_eq!(metrics.total_requests, 1);
        assert_eq!(metrics.total_errors, 1);
    }

    #[test]
    fn test_chat_request_serialization() {
        let messages = vec![ChatMessage::user("hi")];
        let request = ChatRequest {
            model: "m",
            messages: &messages,
            temperature: 0.0,
            max_tokens: 16,
            response_format: Some(ResponseFormat {
                kind: "json_object",
            }),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["messages"][0]["role"], "user");

        let plain = ChatRequest {
            response_format: None,
            ..request
        };
        let value = serde_json::to_value(&plain).unwrap();
        assert!(value.get("response_format").is_none());
    }
}
