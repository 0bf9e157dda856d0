//! Error types for reelsearch

use thiserror::Error;

/// Result type alias using ReelSearchError
pub type Result<T> = std::result::Result<T, ReelSearchError>;

/// Error type alias for convenience
pub type Error = ReelSearchError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for reelsearch
#[derive(Debug, Error)]
pub enum ReelSearchError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Item not found: {0}")]
    ItemNotFound(i64),

    /// Keyword extraction failed; callers fall back to the raw query
    #[error("Keyword extraction error: {0}")]
    Extraction(String),

    /// A lexical or vector index could not answer
    #[error("{stage} search error: {message}")]
    Search { stage: &'static str, message: String },

    /// A single relevance judgment failed; the item is dropped
    #[error("Judgment error for item {item_id}: {message}")]
    Judgment { item_id: i64, message: String },

    #[error("{stage} timed out after {millis}ms")]
    Timeout { stage: &'static str, millis: u64 },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External service error: {0}")]
    ExternalError(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl ReelSearchError {
    /// Build a search error tagged with the failing stage
    pub fn search(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Search {
            stage,
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ItemNotFound(_) => exit_codes::NOT_FOUND,
            Self::InvalidInput(_) | Self::Config(_) => exit_codes::INVALID_INPUT,
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            ReelSearchError::ItemNotFound(7).exit_code(),
            exit_codes::NOT_FOUND
        );
        assert_eq!(
            ReelSearchError::InvalidInput("x".into()).exit_code(),
            exit_codes::INVALID_INPUT
        );
        assert_eq!(
            ReelSearchError::search("lexical", "down").exit_code(),
            exit_codes::GENERAL_ERROR
        );
    }

    #[test]
    fn test_search_error_message_names_stage() {
        let err = ReelSearchError::search("vector", "index unavailable");
        assert_eq!(err.to_string(), "vector search error: index unavailable");
    }
}
