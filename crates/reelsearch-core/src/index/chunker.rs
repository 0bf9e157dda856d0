//! Item text chunking for embedding

use serde::{Deserialize, Serialize};

/// Default chunk size in bytes of UTF-8 text
pub const CHUNK_SIZE_BYTES: usize = 200;
/// Default overlap in bytes carried into the next chunk
pub const CHUNK_OVERLAP_BYTES: usize = 40;

/// Chunking parameters, both measured in UTF-8 bytes
///
/// Cuts are snapped to char boundaries, so a chunk never exceeds `size` bytes
/// unless a single char is wider than `size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingOptions {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            size: CHUNK_SIZE_BYTES,
            overlap: CHUNK_OVERLAP_BYTES,
        }
    }
}

/// A slice of item text
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    /// Byte offset of the chunk in the source text
    pub position: usize,
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Split text into overlapping chunks, preferring sentence and word breaks
///
/// Blank text yields no chunks. Every chunk ends on a char boundary, and the
/// start always advances so the loop terminates for any size/overlap pair.
pub fn chunk_text(content: &str, options: ChunkingOptions) -> Vec<Chunk> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let chunk_size = options.size.max(1);
    if content.len() <= chunk_size {
        return vec![Chunk {
            text: content.to_string(),
            position: 0,
        }];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < content.len() {
        let raw_end = (start + chunk_size).min(content.len());
        let end = floor_char_boundary(content, raw_end);
        let mut chunk_end = end;

        // Look for a natural break in the last 30%
        if end < content.len() {
            let search_start = ceil_char_boundary(content, start + (chunk_size * 70 / 100));

            if search_start < end {
                let region = &content[search_start..end];

                if let Some(pos) = region.rfind("\n\n") {
                    chunk_end = search_start + pos + 2;
                } else if let Some(pos) = region.rfind(". ") {
                    chunk_end = search_start + pos + 2;
                } else if let Some(pos) = region.rfind('\n') {
                    chunk_end = search_start + pos + 1;
                } else if let Some(pos) = region.rfind(' ') {
                    chunk_end = search_start + pos + 1;
                }
            }
        }

        // A multi-byte char wider than the chunk would leave an empty slice
        if chunk_end <= start {
            chunk_end = ceil_char_boundary(content, start + 1);
        }

        chunks.push(Chunk {
            text: content[start..chunk_end].to_string(),
            position: start,
        });

        if chunk_end >= content.len() {
            break;
        }

        let next = ceil_char_boundary(content, chunk_end.saturating_sub(options.overlap));
        start = if next > start { next } else { chunk_end };
    }

    chunks
}
