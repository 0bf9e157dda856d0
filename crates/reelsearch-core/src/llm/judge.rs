//! HTTP-based relevance judge using external LLM service

use super::client::extract_json_object;
use super::{ChatMessage, CompletionOptions, Judge, Judgment, LLMClient, Verdict};
use crate::error::{ReelSearchError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Longest description sent to the judge, in characters
const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Judge using external HTTP LLM service in deterministic mode
pub struct HttpJudge {
    client: Arc<dyn LLMClient>,
    options: CompletionOptions,
}

impl HttpJudge {
    /// Create from LLM client
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self {
            client,
            options: CompletionOptions::deterministic(),
        }
    }

    /// Judge with a different model than the client's default
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.options = self.options.with_model(model);
        self
    }
}

#[async_trait]
impl Judge for HttpJudge {
    async fn judge(&self, query: &str, item_id: i64, description: &str) -> Result<Judgment> {
        let messages = vec![
            ChatMessage::system(
                "You are an evaluator for a movie search service. Assess whether an item \
                 description matches the theme of the user's prompt. A score of yes means the \
                 item has the theme, even if it is minor. Output ONLY JSON with two keys: \
                 binary_score ('yes' or 'no') and explanation (your step by step reasoning).",
            ),
            ChatMessage::user(build_judgment_prompt(query, description)),
        ];

        let response = self
            .client
            .chat_completion(messages, &self.options)
            .await
            .map_err(|e| ReelSearchError::Judgment {
                item_id,
                message: e.to_string(),
            })?;

        parse_judgment_response(&response).map_err(|message| {
            tracing::debug!("Raw judge response for item {}: {}", item_id, response);
            ReelSearchError::Judgment { item_id, message }
        })
    }

    fn model_name(&self) -> &str {
        self.options
            .model
            .as_deref()
            .unwrap_or_else(|| self.client.model_name())
    }
}

fn build_judgment_prompt(query: &str, description: &str) -> String {
    let description: String = description.chars().take(MAX_DESCRIPTION_CHARS).collect();
    format!(
        "Given the prompt: {}\nand the item description: {}\nassess if the description has the theme in the prompt.",
        query, description
    )
}

fn parse_judgment_response(response: &str) -> std::result::Result<Judgment, String> {
    let json_str = extract_json_object(response).ok_or("no JSON object in response")?;
    let parsed: serde_json::Value =
        serde_json::from_str(json_str).map_err(|e| format!("JSON parse error: {}", e))?;

    let verdict = match parsed["binary_score"]
        .as_str()
        .map(|s| s.trim().to_ascii_lowercase())
        .as_deref()
    {
        Some("yes") => Verdict::Related,
        Some("no") => Verdict::Unrelated,
        Some(other) => return Err(format!("unexpected binary_score '{}'", other)),
        None => return Err("missing binary_score".to_string()),
    };

    let rationale = parsed["explanation"]
        .as_str()
        .unwrap_or_default()
        .trim()
        .to_string();

    Ok(Judgment { verdict, rationale })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;

    #[test]
    fn test_parse_yes() {
        let judgment =
            parse_judgment_response(r#"{"binary_score": "yes", "explanation": "features a singer"}"#)
                .unwrap();
        assert_eq!(judgment.verdict, Verdict::Related);
        assert_eq!(judgment.rationale, "features a singer");
    }

    #[test]
    fn test_parse_no_case_insensitive() {
        let judgment = parse_judgment_response(r#"{"binary_score": " No "}"#).unwrap();
        assert_eq!(judgment.verdict, Verdict::Unrelated);
        assert_eq!(judgment.rationale, "");
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_judgment_response("yes").is_err());
        assert!(parse_judgment_response(r#"{"binary_score": "maybe"}"#).is_err());
        assert!(parse_judgment_response(r#"{"explanation": "?"}"#).is_err());
    }

    #[test]
    fn test_prompt_truncates_long_descriptions() {
        let description = "x".repeat(MAX_DESCRIPTION_CHARS + 500);
        let prompt = build_judgment_prompt("q", &description);
        assert!(prompt.len() < MAX_DESCRIPTION_CHARS + 200);
    }

    #[tokio::test]
    async fn test_judge_uses_deterministic_mode_and_model() {
        let llm = Arc::new(ScriptedLlm::new().respond(r#"{"binary_score": "yes", "explanation": "ok"}"#));
        let judge = HttpJudge::new(llm.clone()).with_model("llama3.2:3b-instruct-q8_0");

        let judgment = judge.judge("singer", 1, "A singer rises.").await.unwrap();
        assert!(judgment.is_related());

        let options = llm.last_options().unwrap();
        assert_eq!(options.temperature, 0.0);
        assert_eq!(options.model.as_deref(), Some("llama3.2:3b-instruct-q8_0"));
        assert_eq!(judge.model_name(), "llama3.2:3b-instruct-q8_0");
    }

    #[tokio::test]
    async fn test_judge_malformed_response_is_judgment_error() {
        let llm = Arc::new(ScriptedLlm::new().respond("I think so"));
        let judge = HttpJudge::new(llm);
        let err = judge.judge("singer", 9, "desc").await.unwrap_err();
        assert!(matches!(err, ReelSearchError::Judgment { item_id: 9, .. }));
    }
}
