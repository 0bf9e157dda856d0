//! Search command

use crate::app::{OutputFormat, SearchArgs};
use crate::output::format_search_outcome;
use anyhow::Result;
use reelsearch_core::{
    Config, Database, HttpEmbedder, HttpJudge, HttpKeywordExtractor, HttpLlmClient,
    HybridPipeline, Judge, LLMClient, SqliteVectorIndex,
};
use std::sync::Arc;

pub async fn run(
    args: SearchArgs,
    db: &Database,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let query = args.query.join(" ");

    let mut pipeline_config = config.pipeline.clone();
    if let Some(limit) = args.limit {
        pipeline_config.result_limit = limit;
    }
    if let Some(weight) = args.lexical_weight {
        pipeline_config.lexical_weight = weight;
    }
    if let Some(weight) = args.vector_weight {
        pipeline_config.vector_weight = weight;
    }
    pipeline_config.evaluate |= args.evaluate;
    pipeline_config.validate()?;

    if !db.has_vector_index()? {
        eprintln!("Note: no vector embeddings found. Run 'reelsearch index' for vector search.");
    }

    let http_client = Arc::new(HttpLlmClient::new(config.llm_service.clone())?);
    let client: Arc<dyn LLMClient> = http_client.clone();
    let extractor = HttpKeywordExtractor::new(
        client.clone(),
        config.llm_service.creative_temperature,
    )
    .with_target_language(pipeline_config.target_language.clone());
    let embedder = HttpEmbedder::new(client.clone());
    let vector_index = SqliteVectorIndex::new(db, &embedder);
    let judge = HttpJudge::new(client).with_model(config.llm_service.judge_model());

    let judge_ref: Option<&dyn Judge> = if pipeline_config.evaluate {
        Some(&judge)
    } else {
        None
    };

    let outcome = HybridPipeline::new(&extractor, db, &vector_index, db, pipeline_config)
        .with_judge(judge_ref)
        .run(&query)
        .await?;
    tracing::debug!("LLM usage: {:?}", http_client.metrics());

    if outcome.keywords.fallback {
        eprintln!("Note: keyword extraction unavailable, searched with the raw query.");
    }
    for branch in &outcome.failed_branches {
        eprintln!("Warning: {} search failed, results come from the other index.", branch);
    }

    print!("{}", format_search_outcome(&outcome, format));
    Ok(())
}
