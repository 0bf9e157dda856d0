//! Configuration management

use crate::error::{ReelSearchError, Result};
use crate::index::ChunkingOptions;
use crate::search::FusionWeights;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    /// Retrieval pipeline tuning
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// LLM service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the LLM service for chat/completions
    pub url: String,

    /// Model name for keyword extraction
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Model used for relevance judgments (falls back to `model`)
    #[serde(default)]
    pub judge_model: Option<String>,

    /// Base URL for embeddings service (can be different from LLM URL)
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Model name for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimensions (will be auto-detected if not specified)
    #[serde(default)]
    pub embedding_dimensions: Option<usize>,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sampling temperature for free-text keyword generation
    #[serde(default = "default_creative_temperature")]
    pub creative_temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl LLMServiceConfig {
    /// Get the embeddings URL (falls back to main URL if not specified)
    pub fn embeddings_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or(&self.url)
    }

    /// Model used for judgment calls
    pub fn judge_model(&self) -> &str {
        self.judge_model.as_deref().unwrap_or(&self.model)
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("REELSEARCH_LLM_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: default_chat_model(),
            judge_model: std::env::var("REELSEARCH_JUDGE_MODEL").ok(),
            embedding_url: std::env::var("REELSEARCH_EMBEDDING_URL").ok(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: std::env::var("REELSEARCH_EMBEDDING_DIMS")
                .ok()
                .and_then(|s| s.parse().ok()),
            api_key: std::env::var("REELSEARCH_LLM_API_KEY").ok(),
            creative_temperature: default_creative_temperature(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("REELSEARCH_LLM_MODEL").unwrap_or_else(|_| "llama3.1:8b-instruct-q8_0".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("REELSEARCH_EMBEDDING_MODEL").unwrap_or_else(|_| "mxbai-embed-large".to_string())
}

fn default_creative_temperature() -> f32 {
    0.7
}

fn default_timeout() -> u64 {
    env_parse("REELSEARCH_LLM_TIMEOUT_SECS").unwrap_or(60)
}

/// Retrieval pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Weight applied to normalized lexical scores
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f64,

    /// Weight applied to vector scores of items also found lexically
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f64,

    /// Result cap for the full-text query
    #[serde(default = "default_branch_limit")]
    pub lexical_limit: usize,

    /// Result cap for the vector query
    #[serde(default = "default_branch_limit")]
    pub vector_limit: usize,

    /// Number of fused results returned to the caller
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    /// Run the LLM evaluation filter over the top results
    #[serde(default)]
    pub evaluate: bool,

    /// Number of top results sent to the evaluation filter
    #[serde(default = "default_evaluation_top_k")]
    pub evaluation_top_k: usize,

    /// Maximum judgment calls in flight
    #[serde(default = "default_evaluation_concurrency")]
    pub evaluation_concurrency: usize,

    /// Catalog language; enables query translation during keyword extraction
    #[serde(default = "default_target_language")]
    pub target_language: Option<String>,

    #[serde(default = "default_llm_stage_timeout")]
    pub extraction_timeout_secs: u64,

    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: u64,

    #[serde(default = "default_llm_stage_timeout")]
    pub judgment_timeout_secs: u64,

    /// UTF-8 bytes per embedded chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// UTF-8 bytes shared between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lexical_weight: default_lexical_weight(),
            vector_weight: default_vector_weight(),
            lexical_limit: default_branch_limit(),
            vector_limit: default_branch_limit(),
            result_limit: default_result_limit(),
            evaluate: false,
            evaluation_top_k: default_evaluation_top_k(),
            evaluation_concurrency: default_evaluation_concurrency(),
            target_language: default_target_language(),
            extraction_timeout_secs: default_llm_stage_timeout(),
            search_timeout_secs: default_search_timeout(),
            judgment_timeout_secs: default_llm_stage_timeout(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl PipelineConfig {
    /// Fusion weights as a typed pair
    pub fn weights(&self) -> FusionWeights {
        FusionWeights {
            lexical: self.lexical_weight,
            vector: self.vector_weight,
        }
    }

    pub fn chunking(&self) -> ChunkingOptions {
        ChunkingOptions {
            size: self.chunk_size,
            overlap: self.chunk_overlap,
        }
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn judgment_timeout(&self) -> Duration {
        Duration::from_secs(self.judgment_timeout_secs)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in [
            ("lexical_weight", self.lexical_weight),
            ("vector_weight", self.vector_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ReelSearchError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        if self.evaluation_concurrency == 0 {
            return Err(ReelSearchError::Config(
                "evaluation_concurrency must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(ReelSearchError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn default_lexical_weight() -> f64 {
    env_parse("REELSEARCH_LEXICAL_WEIGHT").unwrap_or(0.7)
}

fn default_vector_weight() -> f64 {
    env_parse("REELSEARCH_VECTOR_WEIGHT").unwrap_or(0.3)
}

fn default_branch_limit() -> usize {
    10
}

fn default_result_limit() -> usize {
    10
}

fn default_evaluation_top_k() -> usize {
    5
}

fn default_evaluation_concurrency() -> usize {
    4
}

fn default_target_language() -> Option<String> {
    std::env::var("REELSEARCH_TARGET_LANGUAGE")
        .ok()
        .filter(|s| !s.trim().is_empty())
}

fn default_llm_stage_timeout() -> u64 {
    env_parse("REELSEARCH_LLM_TIMEOUT_SECS").unwrap_or(60)
}

fn default_search_timeout() -> u64 {
    env_parse("REELSEARCH_SEARCH_TIMEOUT_SECS").unwrap_or(10)
}

fn default_chunk_size() -> usize {
    200
}

fn default_chunk_overlap() -> usize {
    40
}

impl Config {
    /// Load config from default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load config from a specific path, falling back to defaults when absent
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_yaml::from_str::<Config>(&content)?
        } else {
            Config::default()
        };
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("REELSEARCH_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "pipeline:\n  lexical_weight: 0.8\n  vector_weight: 0.2\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.pipeline.lexical_weight, 0.8);
        assert_eq!(config.pipeline.vector_weight, 0.2);
        assert_eq!(config.pipeline.evaluation_top_k, 5);
        assert_eq!(config.pipeline.chunk_size, 200);
        assert_eq!(config.pipeline.chunk_overlap, 40);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let config = PipelineConfig {
            lexical_weight: -0.1,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ReelSearchError::Config(_))));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let config = PipelineConfig {
            chunk_size: 40,
            chunk_overlap: 40,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.yml")).unwrap();
        assert_eq!(config.pipeline.result_limit, 10);
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "llm_service:\n  url: http://llm:8000\n  judge_model: llama3.2:3b\npipeline:\n  evaluate: true\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.llm_service.url, "http://llm:8000");
        assert_eq!(config.llm_service.judge_model(), "llama3.2:3b");
        assert!(config.pipeline.evaluate);
    }
}
