//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use reelsearch_core::{Item, SearchOutcome};

/// Format a pipeline run
pub fn format_search_outcome(outcome: &SearchOutcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_outcome(outcome),
        OutputFormat::Cli => terminal::format_outcome(outcome),
    }
}

pub fn format_item(item: &Item, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_item(item),
        OutputFormat::Cli => terminal::format_item(item),
    }
}

pub fn format_items(items: &[Item], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_items(items),
        OutputFormat::Cli => terminal::format_items(items),
    }
}
