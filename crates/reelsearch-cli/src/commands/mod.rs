//! CLI command handlers

pub mod index;
pub mod item;
pub mod search;
pub mod status;

use anyhow::Result;
use reelsearch_core::{Config, HttpLlmClient, LLMClient};
use std::sync::Arc;

/// Shared LLM client for every collaborator of one command
pub fn llm_client(config: &Config) -> Result<Arc<dyn LLMClient>> {
    let client = HttpLlmClient::new(config.llm_service.clone())?;
    Ok(Arc::new(client))
}
