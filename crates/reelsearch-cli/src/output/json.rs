//! JSON output formatter

use reelsearch_core::{Item, SearchOutcome};
use serde::Serialize;

fn pretty<T: Serialize + ?Sized>(value: &T, empty: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| empty.to_string()) + "\n"
}

pub fn format_outcome(outcome: &SearchOutcome) -> String {
    pretty(outcome, "{}")
}

pub fn format_item(item: &Item) -> String {
    pretty(item, "{}")
}

pub fn format_items(items: &[Item]) -> String {
    pretty(items, "[]")
}
