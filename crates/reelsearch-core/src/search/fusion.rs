//! Weighted score fusion

use super::{sort_ranked, FusionWeights, ScoredItem, SearchSource};
use std::collections::{HashMap, HashSet};

/// Collapse duplicate item ids, keeping the highest-scoring entry
///
/// First-occurrence order is kept for the surviving ids.
pub fn dedupe_best(items: Vec<ScoredItem>) -> Vec<ScoredItem> {
    let mut positions: HashMap<i64, usize> = HashMap::with_capacity(items.len());
    let mut kept: Vec<ScoredItem> = Vec::with_capacity(items.len());

    for item in items {
        match positions.get(&item.item_id) {
            Some(&pos) => {
                if item.score > kept[pos].score {
                    kept[pos] = item;
                }
            }
            None => {
                positions.insert(item.item_id, kept.len());
                kept.push(item);
            }
        }
    }

    kept
}

/// Blend lexical and vector rankings into one list
///
/// Lexical items score `w_lex * lex + w_vec * vec` (a missing vector score counts
/// as 0). Items only found by vector search keep their raw vector score. The
/// result is sorted descending by score with ties on ascending item id, uncapped.
pub fn fuse(
    lexical: Vec<ScoredItem>,
    vector: Vec<ScoredItem>,
    weights: FusionWeights,
) -> Vec<ScoredItem> {
    let lexical = dedupe_best(lexical);
    let vector = dedupe_best(vector);

    let vector_scores: HashMap<i64, f64> =
        vector.iter().map(|item| (item.item_id, item.score)).collect();

    let mut fused: Vec<ScoredItem> = Vec::with_capacity(lexical.len() + vector.len());

    for mut item in lexical {
        let vector_score = vector_scores.get(&item.item_id).copied();
        item.score = weights.lexical * item.score + weights.vector * vector_score.unwrap_or(0.0);
        item.source = match vector_score {
            Some(_) => SearchSource::Hybrid,
            None => SearchSource::Lexical,
        };
        fused.push(item);
    }

    let lexical_ids: HashSet<i64> = fused.iter().map(|item| item.item_id).collect();
    fused.extend(
        vector
            .into_iter()
            .filter(|item| !lexical_ids.contains(&item.item_id)),
    );

    sort_ranked(&mut fused);
    fused
}
