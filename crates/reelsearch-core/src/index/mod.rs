//! Indexing pipeline
//!
//! Chunking and embedding of catalog items for vector search.

mod chunker;
mod indexer;

pub use chunker::*;
pub use indexer::*;
