//! Hybrid retrieval and rerank pipeline

use super::{
    fuse, lexical_search, vector_search, with_timeout, EvaluationFilter, ItemStore, LexicalIndex,
    ScoredItem, SearchOutcome, SearchSource, VectorIndex,
};
use crate::config::PipelineConfig;
use crate::error::{ReelSearchError, Result};
use crate::llm::{ExtractedKeywords, Judge, KeywordExtractor};

/// One search request's worth of collaborators
///
/// Built per request from borrowed handles; it owns no connections and keeps
/// no state between runs.
pub struct HybridPipeline<'a> {
    extractor: &'a dyn KeywordExtractor,
    lexical: &'a dyn LexicalIndex,
    vector: &'a dyn VectorIndex,
    store: &'a dyn ItemStore,
    judge: Option<&'a dyn Judge>,
    config: PipelineConfig,
}

impl<'a> HybridPipeline<'a> {
    pub fn new(
        extractor: &'a dyn KeywordExtractor,
        lexical: &'a dyn LexicalIndex,
        vector: &'a dyn VectorIndex,
        store: &'a dyn ItemStore,
        config: PipelineConfig,
    ) -> Self {
        Self {
            extractor,
            lexical,
            vector,
            store,
            judge: None,
            config,
        }
    }

    /// Judge used when `config.evaluate` is set
    pub fn with_judge(mut self, judge: Option<&'a dyn Judge>) -> Self {
        self.judge = judge;
        self
    }

    /// Run every stage for one query
    ///
    /// Extraction failures fall back to the raw query. A timed-out branch, or a
    /// single failing one, is treated as empty; only both branches failing with
    /// real errors is an error.
    pub async fn run(&self, query: &str) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ReelSearchError::InvalidInput(
                "query must not be empty".to_string(),
            ));
        }

        let keywords = self.extract(query).await;
        let text = keywords.search_text();
        tracing::debug!("Searching with '{}'", text);

        let timeout = self.config.search_timeout();
        let (lexical, vector) = tokio::join!(
            with_timeout(
                "lexical search",
                timeout,
                lexical_search(self.lexical, &text, self.config.lexical_limit),
            ),
            with_timeout(
                "vector search",
                timeout,
                vector_search(self.vector, &text, self.config.vector_limit),
            ),
        );

        let mut failed_branches = Vec::new();
        let (lexical, vector) = match (lexical, vector) {
            (Err(lex_err), Err(vec_err)) if !is_timeout(&lex_err) && !is_timeout(&vec_err) => {
                tracing::error!("Both search branches failed for query '{}'", query);
                return Err(ReelSearchError::search(
                    "hybrid",
                    format!("lexical: {}; vector: {}", lex_err, vec_err),
                ));
            }
            (lexical, vector) => (
                settle(SearchSource::Lexical, query, lexical, &mut failed_branches),
                settle(SearchSource::Vector, query, vector, &mut failed_branches),
            ),
        };

        let mut results = fuse(lexical, vector, self.config.weights());
        results.truncate(self.config.result_limit);
        self.enrich(&mut results).await;

        let mut evaluated = false;
        if self.config.evaluate {
            match self.judge {
                Some(judge) => {
                    results = EvaluationFilter::new(judge, self.store)
                        .with_top_k(self.config.evaluation_top_k)
                        .with_concurrency(self.config.evaluation_concurrency)
                        .with_timeout(self.config.judgment_timeout())
                        .with_lookup_timeout(self.config.search_timeout())
                        .filter(query, results)
                        .await;
                    evaluated = true;
                }
                None => tracing::warn!("Evaluation requested but no judge configured"),
            }
        }

        Ok(SearchOutcome {
            query: query.to_string(),
            keywords,
            results,
            failed_branches,
            evaluated,
        })
    }

    async fn extract(&self, query: &str) -> ExtractedKeywords {
        match with_timeout(
            "keyword extraction",
            self.config.extraction_timeout(),
            self.extractor.extract(query),
        )
        .await
        {
            Ok(keywords) => keywords,
            Err(e) => {
                tracing::warn!(
                    "extraction: query '{}': {}; searching with the raw query",
                    query,
                    e
                );
                ExtractedKeywords::fallback(query)
            }
        }
    }

    async fn enrich(&self, results: &mut [ScoredItem]) {
        let timeout = self.config.search_timeout();
        for item in results.iter_mut() {
            match with_timeout("item lookup", timeout, self.store.get_item(item.item_id)).await {
                Ok(Some(stored)) => {
                    item.title = Some(stored.title);
                    item.description = Some(stored.description);
                }
                Ok(None) => tracing::warn!("enrichment: item {} not found", item.item_id),
                Err(e) => tracing::warn!("enrichment: item {}: {}", item.item_id, e),
            }
        }
    }
}

fn is_timeout(err: &ReelSearchError) -> bool {
    matches!(err, ReelSearchError::Timeout { .. })
}

fn settle(
    source: SearchSource,
    query: &str,
    result: Result<Vec<ScoredItem>>,
    failed: &mut Vec<SearchSource>,
) -> Vec<ScoredItem> {
    match result {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("{}: query '{}': {}; continuing without it", source, query, e);
            failed.push(source);
            Vec::new()
        }
    }
}
