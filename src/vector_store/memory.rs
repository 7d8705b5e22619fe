//! In-memory vector index.
//!
//! Brute-force cosine search over every chunk. Instances are never mutated
//! after construction; a rebuild produces a new one.

use super::{cosine_similarity, IndexedChunk, SearchResult};
use crate::embedding::EmbeddingIdentity;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Immutable set of embedded chunks.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    identity: EmbeddingIdentity,
    entries: Vec<IndexedChunk>,
    built_at: DateTime<Utc>,
    generation: u64,
}

impl VectorIndex {
    /// Create a freshly built index.
    pub fn new(identity: EmbeddingIdentity, entries: Vec<IndexedChunk>) -> Self {
        Self::from_parts(identity, entries, Utc::now())
    }

    /// Reassemble an index, e.g. after loading it from disk.
    pub fn from_parts(
        identity: EmbeddingIdentity,
        mut entries: Vec<IndexedChunk>,
        built_at: DateTime<Utc>,
    ) -> Self {
        entries.sort_by_key(|e| e.chunk.position);
        Self {
            identity,
            entries,
            built_at,
            generation: 0,
        }
    }

    /// Stamp the publication sequence number.
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Top `limit` chunks by cosine similarity, best first.
    ///
    /// Ties keep corpus order, so identical indexes answer identically.
    pub fn search(&self, query_embedding: &[f32], limit: usize) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);
        results
    }

    pub fn identity(&self) -> &EmbeddingIdentity {
        &self.identity
    }

    pub fn entries(&self) -> &[IndexedChunk] {
        &self.entries
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct source documents.
    pub fn source_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.chunk.source.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }
}
