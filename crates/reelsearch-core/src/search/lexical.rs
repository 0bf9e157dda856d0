//! BM25 full-text search via FTS5

use super::{build_fts_query, dedupe_best, sort_ranked, LexicalIndex, ScoredItem, SearchSource};
use crate::db::Database;
use crate::error::{ReelSearchError, Result};
use async_trait::async_trait;
use rusqlite::params;

impl Database {
    /// Raw BM25 scores for keyword text, best first
    ///
    /// `bm25()` is negative with lower meaning better, so the sign is flipped.
    pub fn search_fts(&self, text: &str, limit: usize) -> Result<Vec<(i64, f64)>> {
        let query = build_fts_query(text);
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT rowid, -bm25(items_fts) AS score
             FROM items_fts
             WHERE items_fts MATCH ?1
             ORDER BY score DESC, rowid ASC
             LIMIT ?2",
        )?;

        let results = stmt
            .query_map(params![query, limit as i64], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(results)
    }
}

#[async_trait]
impl LexicalIndex for Database {
    /// Runs on the blocking pool so a stage timeout can stop waiting on it
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<(i64, f64)>> {
        let db = self.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || db.search_fts(&text, limit))
            .await
            .map_err(|e| ReelSearchError::search("lexical", e.to_string()))?
    }
}

/// Lexical stage: query the index and normalize scores by the best match
///
/// Scores land in (0,1] with the top item at exactly 1.0. A non-positive best
/// score zeroes the whole list instead of dividing by it.
pub async fn lexical_search(
    index: &dyn LexicalIndex,
    text: &str,
    limit: usize,
) -> Result<Vec<ScoredItem>> {
    if text.trim().is_empty() || limit == 0 {
        return Ok(Vec::new());
    }

    let raw = index
        .search(text, limit)
        .await
        .map_err(|e| match e {
            ReelSearchError::Search { .. } => e,
            other => ReelSearchError::search("lexical", other.to_string()),
        })?;

    let items = dedupe_best(
        raw.into_iter()
            .map(|(id, score)| ScoredItem::new(id, score, SearchSource::Lexical))
            .collect(),
    );

    let max_score = items
        .iter()
        .map(|item| item.score)
        .filter(|score| score.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);

    let mut normalized: Vec<ScoredItem> = items
        .into_iter()
        .map(|mut item| {
            item.score = if max_score > 0.0 && item.score.is_finite() {
                (item.score / max_score).max(0.0)
            } else {
                0.0
            };
            item
        })
        .collect();

    sort_ranked(&mut normalized);
    normalized.truncate(limit);

    tracing::debug!("Lexical search returned {} items", normalized.len());
    Ok(normalized)
}
