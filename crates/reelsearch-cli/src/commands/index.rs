//! Index command

use super::llm_client;
use crate::app::IndexArgs;
use anyhow::Result;
use reelsearch_core::index::{index_all, IndexProgress};
use reelsearch_core::{Config, Database, Embedder, HttpEmbedder};

pub async fn run(args: IndexArgs, db: &Database, config: &Config) -> Result<()> {
    let embedder = HttpEmbedder::new(llm_client(config)?);

    println!(
        "Embedding model: {} ({} dimensions)",
        embedder.model_name(),
        embedder.dimensions()
    );

    let stats = index_all(
        db,
        &embedder,
        config.pipeline.chunking(),
        args.force,
        Some(Box::new(|progress: IndexProgress| {
            eprint!(
                "\rProcessing: {}/{} items, {} chunks   ",
                progress.processed_items, progress.total_items, progress.embedded_chunks
            );
        })),
    )
    .await?;

    if stats.total_items > 0 {
        eprintln!();
    }
    println!("Indexing complete:");
    println!("  Items:  {}/{}", stats.embedded_items, stats.total_items);
    println!("  Chunks: {}", stats.embedded_chunks);
    if stats.failed_items > 0 {
        println!("  Failed: {} (see warnings above)", stats.failed_items);
    }

    Ok(())
}
