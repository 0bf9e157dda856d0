//! Status command

use crate::app::OutputFormat;
use anyhow::Result;
use reelsearch_core::{Config, Database};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct Status {
    database: String,
    items: usize,
    embedded: usize,
    pending: usize,
    embedding_model: String,
    llm_url: String,
}

pub async fn run(
    db: &Database,
    config: &Config,
    db_path: &Path,
    format: OutputFormat,
) -> Result<()> {
    let model = &config.llm_service.embedding_model;
    let status = Status {
        database: db_path.display().to_string(),
        items: db.item_count()?,
        embedded: db.embedded_item_count()?,
        pending: db.get_items_needing_embedding(model)?.len(),
        embedding_model: model.clone(),
        llm_url: config.llm_service.url.clone(),
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        OutputFormat::Cli => {
            println!("Database:        {}", status.database);
            println!("Items:           {}", status.items);
            println!();
            println!("Embeddings:");
            println!("  Model:         {}", status.embedding_model);
            println!("  Embedded:      {}", status.embedded);
            println!("  Pending:       {}", status.pending);
            println!();
            println!("LLM service:     {}", status.llm_url);
        }
    }
    Ok(())
}
