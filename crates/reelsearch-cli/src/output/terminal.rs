//! Terminal output formatter

use reelsearch_core::{Item, SearchOutcome};

const DESCRIPTION_PREVIEW_CHARS: usize = 160;

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= DESCRIPTION_PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}

pub fn format_outcome(outcome: &SearchOutcome) -> String {
    if outcome.results.is_empty() {
        return "No results\n".to_string();
    }

    let mut output = String::new();
    for result in &outcome.results {
        let score_pct = (result.score * 100.0).round() as u32;
        output.push_str(&format!(
            "{:>3}% #{} {} [{}]\n",
            score_pct,
            result.item_id,
            result.title.as_deref().unwrap_or("(untitled)"),
            result.source
        ));
        if let Some(ref description) = result.description {
            output.push_str(&format!("     {}\n", preview(description)));
        }
        if let Some(ref judgment) = result.judgment {
            if !judgment.rationale.is_empty() {
                output.push_str(&format!("     judge: {}\n", judgment.rationale));
            }
        }
    }
    output
}

pub fn format_item(item: &Item) -> String {
    format!(
        "#{} {}\n  modified: {}\n\n{}\n",
        item.id, item.title, item.modified_at, item.description
    )
}

pub fn format_items(items: &[Item]) -> String {
    if items.is_empty() {
        return "No items\n".to_string();
    }
    items
        .iter()
        .map(|item| format!("{:>6}  {}\n", item.id, item.title))
        .collect()
}
