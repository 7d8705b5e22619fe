//! Text chunking for embedding and retrieval.
//!
//! Documents are split into bounded, overlapping character windows so each
//! embedding call stays small and context survives chunk boundaries.

mod recursive;

pub use recursive::RecursiveSplitter;

use crate::documents::RawDocument;
use serde::{Deserialize, Serialize};

/// A contiguous slice of one source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Relative path of the source document.
    pub source: String,
    /// Text content of this chunk.
    pub content: String,
    /// Order of this chunk across the whole rebuild.
    pub position: usize,
    /// Order of this chunk within its source.
    pub chunk_index: usize,
}

/// Size and overlap policy, measured in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Split every document and number the chunks in corpus order.
pub fn chunk_documents(documents: &[RawDocument], config: ChunkingConfig) -> Vec<DocumentChunk> {
    let splitter = RecursiveSplitter::new(config);
    let mut chunks = Vec::new();

    for doc in documents {
        for (chunk_index, content) in splitter.split(&doc.text).into_iter().enumerate() {
            chunks.push(DocumentChunk {
                source: doc.source.clone(),
                content,
                position: chunks.len(),
                chunk_index,
            });
        }
    }

    chunks
}
