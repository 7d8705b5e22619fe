//! Owns the installed vector index.
//!
//! Readers take a cheap `Arc` snapshot; rebuilds and loads are serialized by
//! one async lock and publish a new snapshot only after they succeed.

mod watcher;

pub use watcher::DocumentWatcher;

use crate::chunking::{chunk_documents, ChunkingConfig};
use crate::config::Settings;
use crate::documents::load_directory;
use crate::embedding::Embedder;
use crate::error::{HelperError, Result};
use crate::vector_store::{load_index, save_index, IndexedChunk, SearchResult, VectorIndex};
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// What a rebuild did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// A new index was persisted and installed.
    Installed {
        chunks: usize,
        sources: usize,
        generation: u64,
    },
    /// The document directory produced no chunks; nothing changed.
    Empty,
}

/// Snapshot of the installed index for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub installed: bool,
    pub generation: u64,
    pub chunks: usize,
    pub built_at: Option<DateTime<Utc>>,
}

/// Builds, loads and serves the vector index.
pub struct IndexService {
    documents_dir: PathBuf,
    index_dir: PathBuf,
    chunking: ChunkingConfig,
    embedder: Arc<dyn Embedder>,
    current: ArcSwapOption<VectorIndex>,
    /// Last published generation. Held for the whole of every load and rebuild.
    generation: Mutex<u64>,
}

impl IndexService {
    pub fn new(
        documents_dir: PathBuf,
        index_dir: PathBuf,
        chunking: ChunkingConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            documents_dir,
            index_dir,
            chunking,
            embedder,
            current: ArcSwapOption::empty(),
            generation: Mutex::new(0),
        }
    }

    pub fn from_settings(settings: &Settings, embedder: Arc<dyn Embedder>) -> Self {
        Self::new(
            settings.documents_dir(),
            settings.index_dir(),
            ChunkingConfig {
                chunk_size: settings.documents.chunk_size,
                chunk_overlap: settings.documents.chunk_overlap,
            },
            embedder,
        )
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    /// The installed index, if any.
    pub fn current(&self) -> Option<Arc<VectorIndex>> {
        self.current.load_full()
    }

    pub fn status(&self) -> IndexStatus {
        match self.current() {
            Some(index) => IndexStatus {
                installed: true,
                generation: index.generation(),
                chunks: index.len(),
                built_at: Some(index.built_at()),
            },
            None => IndexStatus {
                installed: false,
                generation: 0,
                chunks: 0,
                built_at: None,
            },
        }
    }

    /// Install the index persisted on disk. Returns whether one was installed.
    ///
    /// A missing, corrupt or mismatched index is logged and left alone.
    #[instrument(skip(self))]
    pub async fn load_persisted(&self) -> bool {
        let mut generation = self.generation.lock().await;
        self.load_locked(&mut generation).await
    }

    async fn load_locked(&self, generation: &mut u64) -> bool {
        let dir = self.index_dir.clone();
        let identity = self.embedder.identity();
        let loaded = tokio::task::spawn_blocking(move || load_index(&dir, &identity))
            .await
            .map_err(|e| HelperError::VectorStore(format!("index loader panicked: {}", e)))
            .and_then(|r| r);

        match loaded {
            Ok(Some(index)) if !index.is_empty() => {
                *generation += 1;
                let index = index.with_generation(*generation);
                info!(
                    "Installed persisted index: {} chunks from {} sources",
                    index.len(),
                    index.source_count()
                );
                self.current.store(Some(Arc::new(index)));
                true
            }
            Ok(_) => false,
            Err(e @ HelperError::EmbeddingMismatch { .. }) => {
                warn!("Ignoring persisted index: {}", e);
                false
            }
            Err(e) => {
                warn!("Failed to load persisted index: {}", e);
                false
            }
        }
    }

    /// Rebuild the index from the document directory.
    ///
    /// On any error the installed index is left untouched.
    #[instrument(skip(self))]
    pub async fn rebuild(&self) -> Result<RebuildOutcome> {
        let mut generation = self.generation.lock().await;
        self.rebuild_locked(&mut generation).await
    }

    async fn rebuild_locked(&self, generation: &mut u64) -> Result<RebuildOutcome> {
        let root = self.documents_dir.clone();
        let (documents, _report) = tokio::task::spawn_blocking(move || load_directory(&root))
            .await
            .map_err(|e| HelperError::Document(format!("document loader panicked: {}", e)))??;

        let chunks = chunk_documents(&documents, self.chunking);
        if chunks.is_empty() {
            info!("No documents to index; keeping the installed index");
            return Ok(RebuildOutcome::Empty);
        }

        info!("Embedding {} chunks from {} documents", chunks.len(), documents.len());
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(HelperError::Embedding(format!(
                "Expected {} embeddings, received {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk { chunk, embedding })
            .collect();

        let next = *generation + 1;
        let index = Arc::new(VectorIndex::new(self.embedder.identity(), entries).with_generation(next));

        let dir = self.index_dir.clone();
        let persisted = Arc::clone(&index);
        tokio::task::spawn_blocking(move || save_index(&dir, &persisted))
            .await
            .map_err(|e| HelperError::VectorStore(format!("index writer panicked: {}", e)))??;

        *generation = next;
        let outcome = RebuildOutcome::Installed {
            chunks: index.len(),
            sources: index.source_count(),
            generation: next,
        };
        self.current.store(Some(index));
        info!("Installed index generation {}", next);
        Ok(outcome)
    }

    /// Load from disk, else build, as a process starts.
    pub async fn startup(&self) {
        if self.load_persisted().await {
            return;
        }
        match self.rebuild().await {
            Ok(RebuildOutcome::Installed { chunks, .. }) => info!("Built index with {} chunks", chunks),
            Ok(RebuildOutcome::Empty) => warn!("Knowledge base is empty; no index built"),
            Err(e) => warn!("Initial index build failed: {}", e),
        }
    }

    /// The installed index, loading or building one if none is installed yet.
    pub async fn ensure_index(&self) -> Result<Arc<VectorIndex>> {
        if let Some(index) = self.current() {
            return Ok(index);
        }

        let mut generation = self.generation.lock().await;
        // Another caller may have installed one while this one waited.
        if let Some(index) = self.current() {
            return Ok(index);
        }
        if !self.load_locked(&mut generation).await {
            if let Err(e) = self.rebuild_locked(&mut generation).await {
                warn!("On-demand index build failed: {}", e);
            }
        }
        self.current().ok_or(HelperError::IndexUnavailable)
    }

    /// Embed `query` and return the `k` closest chunks of `index`.
    pub async fn search_in(&self, index: &VectorIndex, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let embedding = self.embedder.embed(query).await?;
        Ok(index.search(&embedding, k))
    }

    /// Search the installed index, loading or building it first if needed.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let index = self.ensure_index().await?;
        self.search_in(&index, query, k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::KeywordEmbedder;
    use tempfile::TempDir;

    struct Fixture {
        docs: TempDir,
        index: TempDir,
        embedder: Arc<KeywordEmbedder>,
        service: IndexService,
    }

    fn fixture() -> Fixture {
        let docs = tempfile::tempdir().unwrap();
        let index = tempfile::tempdir().unwrap();
        let embedder = Arc::new(KeywordEmbedder::new());
        let service = IndexService::new(
            docs.path().to_path_buf(),
            index.path().to_path_buf(),
            ChunkingConfig::default(),
            embedder.clone(),
        );
        Fixture {
            docs,
            index,
            embedder,
            service,
        }
    }

    fn long_document() -> String {
        let mut text = "the quick brown fox jumps over the lazy dog ".repeat(67);
        text.push_str("zebra observatory telescope opens at midnight.");
        text
    }

    #[tokio::test]
    async fn test_last_chunk_of_long_document_is_retrievable() {
        let f = fixture();
        std::fs::write(f.docs.path().join("long.txt"), long_document()).unwrap();

        let outcome = f.service.rebuild().await.unwrap();
        let RebuildOutcome::Installed { chunks, sources, generation } = outcome else {
            panic!("expected an installed index");
        };
        assert!(chunks >= 3);
        assert_eq!(sources, 1);
        assert_eq!(generation, 1);

        let results = f.service.search("zebra observatory telescope", 3).await.unwrap();
        let last = f.service.current().unwrap().entries().last().unwrap().chunk.clone();
        assert!(last.content.contains("zebra observatory"));
        assert!(results.iter().any(|r| r.chunk == last));
    }

    #[tokio::test]
    async fn test_empty_directory_keeps_prior_index() {
        let f = fixture();
        let path = f.docs.path().join("rules.txt");
        std::fs::write(&path, "Library closes at 10pm.").unwrap();
        f.service.rebuild().await.unwrap();

        std::fs::remove_file(&path).unwrap();
        std::fs::write(f.docs.path().join("image.png"), b"\x89PNG").unwrap();
        assert_eq!(f.service.rebuild().await.unwrap(), RebuildOutcome::Empty);

        let current = f.service.current().unwrap();
        assert_eq!(current.generation(), 1);
        assert_eq!(current.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_directory_without_index_is_unavailable() {
        let f = fixture();
        assert_eq!(f.service.rebuild().await.unwrap(), RebuildOutcome::Empty);
        assert!(f.service.current().is_none());
        assert!(matches!(
            f.service.ensure_index().await,
            Err(HelperError::IndexUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_rebuilds_are_idempotent() {
        let f = fixture();
        std::fs::write(f.docs.path().join("long.txt"), long_document()).unwrap();
        std::fs::write(f.docs.path().join("fees.json"), r#"{"tuition": 1200, "hostel": 400}"#).unwrap();

        f.service.rebuild().await.unwrap();
        let first: Vec<_> = f.service.search("hostel tuition", 3).await.unwrap();
        f.service.rebuild().await.unwrap();
        let second: Vec<_> = f.service.search("hostel tuition", 3).await.unwrap();

        let positions = |results: &[SearchResult]| results.iter().map(|r| r.chunk.position).collect::<Vec<_>>();
        assert_eq!(positions(&first), positions(&second));
        assert_eq!(f.service.status().generation, 2);
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_installed_index() {
        let f = fixture();
        std::fs::write(f.docs.path().join("rules.txt"), "No smoking on campus.").unwrap();
        f.service.rebuild().await.unwrap();

        std::fs::write(f.docs.path().join("more.txt"), "Parking permits are required.").unwrap();
        f.embedder.set_failing(true);
        assert!(f.service.rebuild().await.is_err());

        let current = f.service.current().unwrap();
        assert_eq!(current.generation(), 1);
        assert_eq!(current.len(), 1);
    }

    #[tokio::test]
    async fn test_persisted_index_is_loaded_by_new_service() {
        let f = fixture();
        std::fs::write(f.docs.path().join("rules.txt"), "No smoking on campus.").unwrap();
        f.service.rebuild().await.unwrap();

        let reopened = IndexService::new(
            f.docs.path().to_path_buf(),
            f.index.path().to_path_buf(),
            ChunkingConfig::default(),
            Arc::new(KeywordEmbedder::new()),
        );
        assert!(reopened.load_persisted().await);
        assert_eq!(reopened.current().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mismatched_identity_is_not_installed() {
        let f = fixture();
        std::fs::write(f.docs.path().join("rules.txt"), "No smoking on campus.").unwrap();
        f.service.rebuild().await.unwrap();

        let other = IndexService::new(
            f.docs.path().to_path_buf(),
            f.index.path().to_path_buf(),
            ChunkingConfig::default(),
            Arc::new(KeywordEmbedder::with_model("another-model")),
        );
        assert!(!other.load_persisted().await);
        assert!(other.current().is_none());

        // ensure_index falls back to a rebuild under the new identity
        let index = other.ensure_index().await.unwrap();
        assert_eq!(index.identity().model, "another-model");
    }

    #[tokio::test]
    async fn test_search_builds_index_on_demand() {
        let f = fixture();
        std::fs::write(f.docs.path().join("rules.txt"), "No smoking on campus.").unwrap();
        let calls_before = f.embedder.calls();
        let results = f.service.search("smoking", 3).await.unwrap();
        assert_eq!(results.len(), 1);
        // one batch for the lazy build, one for the query
        assert_eq!(f.embedder.calls() - calls_before, 2);
    }

    #[tokio::test]
    async fn test_concurrent_ensure_index_builds_once() {
        let f = fixture();
        std::fs::write(f.docs.path().join("rules.txt"), "No smoking on campus.").unwrap();

        let (a, b) = tokio::join!(f.service.ensure_index(), f.service.ensure_index());
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.generation(), 1);
        assert_eq!(f.embedder.calls(), 1);
    }
}
