//! HTTP-based keyword extraction using external LLM service

use super::client::extract_json_object;
use super::{ChatMessage, CompletionOptions, ExtractedKeywords, KeywordExtractor, LLMClient};
use crate::error::{ReelSearchError, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

lazy_static! {
    /// Bullet or enumeration prefix such as "- ", "* ", "1. " or "2) "
    static ref LIST_MARKER: Regex = Regex::new(r"^\s*(?:[-*•]+|\d+[.)])\s*").unwrap();
}

/// Longest fragment still treated as a keyword rather than prose
const MAX_KEYWORD_CHARS: usize = 64;

/// Keyword extractor using external HTTP LLM service
pub struct HttpKeywordExtractor {
    client: Arc<dyn LLMClient>,
    temperature: f32,
    target_language: Option<String>,
}

impl HttpKeywordExtractor {
    /// Create from LLM client
    pub fn new(client: Arc<dyn LLMClient>, temperature: f32) -> Self {
        Self {
            client,
            temperature,
            target_language: None,
        }
    }

    /// Also translate the query into the catalog language
    pub fn with_target_language(mut self, language: Option<String>) -> Self {
        self.target_language = language;
        self
    }

    async fn extract_plain(&self, query: &str) -> Result<ExtractedKeywords> {
        let messages = vec![
            ChatMessage::system(
                "You extract search keywords for a movie database. \
                 Respond with comma separated keywords only, no introduction or summary.",
            ),
            ChatMessage::user(build_plain_prompt(query)),
        ];

        let response = self
            .client
            .chat_completion(messages, &CompletionOptions::creative(self.temperature))
            .await
            .map_err(|e| ReelSearchError::Extraction(e.to_string()))?;

        parse_plain_response(&response)
    }

    async fn extract_localized(&self, query: &str, language: &str) -> Result<ExtractedKeywords> {
        let response = self
            .client
            .chat_completion(
                localized_messages(query, language),
                &CompletionOptions::deterministic(),
            )
            .await
            .map_err(|e| ReelSearchError::Extraction(e.to_string()))?;

        parse_localized_response(&response)
    }
}

#[async_trait]
impl KeywordExtractor for HttpKeywordExtractor {
    async fn extract(&self, query: &str) -> Result<ExtractedKeywords> {
        if query.trim().is_empty() {
            return Err(ReelSearchError::InvalidInput(
                "query must not be empty".to_string(),
            ));
        }

        let extracted = match self.target_language.as_deref() {
            Some(language) => self.extract_localized(query, language).await?,
            None => self.extract_plain(query).await?,
        };

        tracing::info!(
            "Extracted keywords: [{}] translation: [{}]",
            extracted.keywords,
            extracted.translation.as_deref().unwrap_or("")
        );
        Ok(extracted)
    }

    fn model_name(&self) -> &str {
        self.client.model_name()
    }
}

fn build_plain_prompt(query: &str) -> String {
    format!(
        r#"A user entered this in a movie search box: {}

Give me a set of at least 5 keywords, comma separated, which might be related to the query.
Make sure to only include the most relevant keywords.
Example output for a movie with a female singer in it: beautiful, singer, music, performance, talent, vocalist, film, artist, musical"#,
        query
    )
}

/// Deterministic-mode messages; identical inputs must give identical prompts
/// so repeated queries are answered from the client cache
fn localized_messages(query: &str, language: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!(
            "You extract search keywords for a movie database in {language}. \
             All keywords must be in {language}. \
             Output ONLY valid JSON with two keys: keywords (comma separated string) \
             and translation (the user prompt translated into {language})."
        )),
        ChatMessage::user(format!(
            "Given the prompt: {query}, extract comma separated keywords related to this prompt."
        )),
    ]
}

fn parse_plain_response(response: &str) -> Result<ExtractedKeywords> {
    // Some models answer in JSON even when asked for plain text
    let raw = extract_json_object(response)
        .and_then(|json| serde_json::from_str::<serde_json::Value>(json).ok())
        .and_then(|value| keywords_field(&value))
        .unwrap_or_else(|| response.to_string());

    let keywords = normalize_keywords(&raw).ok_or_else(|| {
        tracing::debug!("Raw LLM response: {}", response);
        ReelSearchError::Extraction("no keywords in response".to_string())
    })?;

    Ok(ExtractedKeywords {
        keywords,
        translation: None,
        fallback: false,
    })
}

fn parse_localized_response(response: &str) -> Result<ExtractedKeywords> {
    let json_str = extract_json_object(response).ok_or_else(|| {
        tracing::debug!("Raw LLM response: {}", response);
        ReelSearchError::Extraction("no JSON object in response".to_string())
    })?;

    let parsed: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| ReelSearchError::Extraction(format!("JSON parse error: {}", e)))?;

    let keywords = keywords_field(&parsed)
        .as_deref()
        .and_then(normalize_keywords)
        .ok_or_else(|| ReelSearchError::Extraction("missing keywords field".to_string()))?;

    let translation = parsed["translation"]
        .as_str()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Ok(ExtractedKeywords {
        keywords,
        translation,
        fallback: false,
    })
}

/// Read `keywords` as either a string or an array of strings
fn keywords_field(value: &serde_json::Value) -> Option<String> {
    match &value["keywords"] {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    }
}

/// Split, clean and dedupe keywords, joined with ", "
///
/// Returns `None` when nothing usable remains.
pub fn normalize_keywords(raw: &str) -> Option<String> {
    let mut seen = HashSet::new();
    let keywords: Vec<String> = raw
        .split([',', '\n', ';'])
        .map(clean_keyword)
        .filter(|k| !k.is_empty() && k.chars().count() <= MAX_KEYWORD_CHARS)
        .filter(|k| seen.insert(k.to_lowercase()))
        .collect();

    if keywords.is_empty() {
        None
    } else {
        Some(keywords.join(", "))
    }
}

fn clean_keyword(fragment: &str) -> String {
    let stripped = LIST_MARKER.replace(fragment, "");
    let trimmed = stripped
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.');
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}
