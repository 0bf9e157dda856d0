//! LLM evaluation filter over fused results

use super::{with_timeout, ItemStore, ScoredItem};
use crate::llm::Judge;
use futures::stream::{self, StreamExt};
use std::time::Duration;

const DEFAULT_TOP_K: usize = 5;
const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Asks a judge about each top candidate and keeps only related ones
///
/// Judgments run concurrently but survivors keep their input order.
pub struct EvaluationFilter<'a> {
    judge: &'a dyn Judge,
    store: &'a dyn ItemStore,
    top_k: usize,
    concurrency: usize,
    timeout: Duration,
    lookup_timeout: Duration,
}

impl<'a> EvaluationFilter<'a> {
    pub fn new(judge: &'a dyn Judge, store: &'a dyn ItemStore) -> Self {
        Self {
            judge,
            store,
            top_k: DEFAULT_TOP_K,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bound on fetching an unenriched item's description
    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    /// Judge the top `top_k` items; unrelated, failed and missing ones are dropped
    pub async fn filter(&self, query: &str, items: Vec<ScoredItem>) -> Vec<ScoredItem> {
        let judged: Vec<Option<ScoredItem>> = stream::iter(items.into_iter().take(self.top_k))
            .map(|item| self.evaluate_one(query, item))
            .buffered(self.concurrency)
            .collect()
            .await;

        let survivors: Vec<ScoredItem> = judged.into_iter().flatten().collect();
        tracing::info!(
            "Evaluation kept {} items for query '{}'",
            survivors.len(),
            query
        );
        survivors
    }

    async fn evaluate_one(&self, query: &str, mut item: ScoredItem) -> Option<ScoredItem> {
        let item_id = item.item_id;

        let context = match (&item.title, &item.description) {
            (Some(title), Some(description)) => format!("{}. {}", title, description),
            _ => {
                let lookup = self.store.get_item(item_id);
                match with_timeout("item lookup", self.lookup_timeout, lookup).await {
                    Ok(Some(stored)) => {
                        let context = stored.context_text();
                        item.title = Some(stored.title);
                        item.description = Some(stored.description);
                        context
                    }
                    Ok(None) => {
                        tracing::warn!(
                            "evaluation: item {} not found for query '{}', dropping",
                            item_id,
                            query
                        );
                        return None;
                    }
                    Err(e) => {
                        tracing::warn!(
                            "evaluation: lookup of item {} failed for query '{}': {}",
                            item_id,
                            query,
                            e
                        );
                        return None;
                    }
                }
            }
        };

        match tokio::time::timeout(self.timeout, self.judge.judge(query, item_id, &context)).await
        {
            Ok(Ok(judgment)) if judgment.is_related() => {
                tracing::debug!("evaluation: item {} related: {}", item_id, judgment.rationale);
                item.judgment = Some(judgment);
                Some(item)
            }
            Ok(Ok(_)) => {
                tracing::debug!("evaluation: item {} unrelated to '{}'", item_id, query);
                None
            }
            Ok(Err(e)) => {
                tracing::warn!("evaluation: query '{}': {}", query, e);
                None
            }
            Err(_) => {
                tracing::warn!(
                    "evaluation: judgment of item {} timed out after {:?} for query '{}'",
                    item_id,
                    self.timeout,
                    query
                );
                None
            }
        }
    }
}
