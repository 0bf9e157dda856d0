//! Item catalog commands

use super::llm_client;
use crate::app::{ItemAction, ItemArgs, OutputFormat};
use crate::output::{format_item, format_items};
use anyhow::Result;
use reelsearch_core::{index_item, Config, Database, HttpEmbedder, Item, ReelSearchError};

pub async fn run(args: ItemArgs, db: &Database, config: &Config, format: OutputFormat) -> Result<()> {
    match args.action {
        ItemAction::Add {
            id,
            title,
            description,
        } => {
            let item = db.insert_item(id, &title, &description)?;
            embed_item(db, config, &item).await;
            print!("{}", format_item(&item, format));
        }
        ItemAction::Get { id } => {
            let item = db.get_item(id)?.ok_or(ReelSearchError::ItemNotFound(id))?;
            print!("{}", format_item(&item, format));
        }
        ItemAction::List { ids } => {
            let items = if ids.is_empty() {
                db.list_all_items()?
            } else {
                db.list_items(&ids)?
            };
            print!("{}", format_items(&items, format));
        }
        ItemAction::Update {
            id,
            title,
            description,
        } => {
            if title.is_none() && description.is_none() {
                return Err(ReelSearchError::InvalidInput(
                    "nothing to update, pass --title and/or --description".to_string(),
                )
                .into());
            }
            let item = db.update_item(id, title.as_deref(), description.as_deref())?;
            embed_item(db, config, &item).await;
            print!("{}", format_item(&item, format));
        }
        ItemAction::Delete { id } => {
            if !db.delete_item(id)? {
                return Err(ReelSearchError::ItemNotFound(id).into());
            }
            eprintln!("Deleted item {}", id);
        }
    }
    Ok(())
}

/// Embed a freshly written item; the catalog change stands even if this fails
async fn embed_item(db: &Database, config: &Config, item: &Item) {
    let embedder = match llm_client(config) {
        Ok(client) => HttpEmbedder::new(client),
        Err(e) => {
            tracing::warn!("Embedding client unavailable: {}", e);
            return;
        }
    };

    if let Err(e) = index_item(db, &embedder, item, config.pipeline.chunking()).await {
        tracing::warn!("Failed to embed item {}: {}", item.id, e);
        eprintln!(
            "Warning: item {} saved but not embedded. Run 'reelsearch index' later.",
            item.id
        );
    }
}
