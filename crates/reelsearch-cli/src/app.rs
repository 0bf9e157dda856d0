//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Largest catalog id accepted by the CLI
pub const MAX_ITEM_ID: i64 = 100_000;

#[derive(Parser)]
#[command(name = "reelsearch")]
#[command(
    author,
    version,
    about = "Hybrid keyword and vector search for a movie catalog"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search the catalog
    Search(SearchArgs),

    /// Manage catalog items
    Item(ItemArgs),

    /// Generate embeddings for catalog items
    Index(IndexArgs),

    /// Show index status
    Status,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Search query
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Number of results
    #[arg(short = 'n')]
    pub limit: Option<usize>,

    /// Ask the LLM to judge the top results and drop unrelated ones
    #[arg(long)]
    pub evaluate: bool,

    /// Weight of the normalized lexical score
    #[arg(long)]
    pub lexical_weight: Option<f64>,

    /// Weight of the vector score for items also found lexically
    #[arg(long)]
    pub vector_weight: Option<f64>,
}

#[derive(Args)]
pub struct ItemArgs {
    #[command(subcommand)]
    pub action: ItemAction,
}

#[derive(Subcommand)]
pub enum ItemAction {
    /// Add a new item
    Add {
        #[arg(long, value_parser = item_id)]
        id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
    },
    /// Show one item
    Get {
        #[arg(value_parser = item_id)]
        id: i64,
    },
    /// List items
    #[command(alias = "ls")]
    List {
        /// Only these ids, comma separated
        #[arg(long, value_delimiter = ',', value_parser = item_id)]
        ids: Vec<i64>,
    },
    /// Change an item's title or description
    Update {
        #[arg(value_parser = item_id)]
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove an item
    #[command(alias = "rm")]
    Delete {
        #[arg(value_parser = item_id)]
        id: i64,
    },
}

#[derive(Args)]
pub struct IndexArgs {
    /// Re-embed every item, not just those without vectors
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}

fn item_id(value: &str) -> Result<i64, String> {
    let id: i64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid item id", value))?;
    if !(0..=MAX_ITEM_ID).contains(&id) {
        return Err(format!("item id must be between 0 and {}", MAX_ITEM_ID));
    }
    Ok(id)
}
