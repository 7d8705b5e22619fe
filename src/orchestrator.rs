//! Service wiring for Campus Helper.
//!
//! Builds the index, event, auth and query services from settings and runs
//! the startup sequence shared by the server and the CLI.

use crate::auth::AuthService;
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::events::EventStore;
use crate::index::{DocumentWatcher, IndexService};
use crate::rag::{ChatModel, OpenAIChatModel, QueryService};
use crate::server::AppState;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Owns every long-lived service.
pub struct Orchestrator {
    settings: Settings,
    index: Arc<IndexService>,
    events: Arc<EventStore>,
    auth: Arc<AuthService>,
    query: Arc<QueryService>,
}

impl Orchestrator {
    /// Create services backed by the configured hosted models.
    pub fn new(settings: Settings) -> Result<Self> {
        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAIEmbedder::from_settings(&settings.provider, &settings.embedding)?);
        let chat: Arc<dyn ChatModel> =
            Arc::new(OpenAIChatModel::from_settings(&settings.provider, &settings.rag)?);
        Self::with_models(settings, embedder, chat)
    }

    /// Create services around the given models.
    pub fn with_models(settings: Settings, embedder: Arc<dyn Embedder>, chat: Arc<dyn ChatModel>) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        info!("Using embedding model {}", embedder.identity());
        let index = Arc::new(IndexService::from_settings(&settings, embedder));
        let events = Arc::new(EventStore::new(settings.events_file()));
        let auth = Arc::new(AuthService::new(&settings.auth));
        let query = Arc::new(QueryService::new(
            Arc::clone(&index),
            Arc::clone(&events),
            chat,
            prompts,
            settings.rag.top_k,
        ));

        Ok(Self {
            settings,
            index,
            events,
            auth,
            query,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn index(&self) -> &Arc<IndexService> {
        &self.index
    }

    pub fn events(&self) -> &Arc<EventStore> {
        &self.events
    }

    pub fn query(&self) -> &Arc<QueryService> {
        &self.query
    }

    /// Seed sample events if needed, then load or build the index.
    #[instrument(skip(self))]
    pub async fn startup(&self) -> Result<()> {
        if self.events.seed_if_empty().await? {
            info!("Initialized {:?} with sample data", self.events.path());
        }
        self.index.startup().await;
        Ok(())
    }

    /// Start the document watcher unless disabled in settings.
    pub fn spawn_watcher(&self) -> Result<Option<DocumentWatcher>> {
        if !self.settings.watcher.enabled {
            info!("Document watcher disabled");
            return Ok(None);
        }
        let debounce = Duration::from_millis(self.settings.watcher.debounce_ms);
        DocumentWatcher::spawn(Arc::clone(&self.index), debounce).map(Some)
    }

    /// Shared state for the HTTP server.
    pub fn app_state(&self) -> Arc<AppState> {
        Arc::new(AppState {
            index: Arc::clone(&self.index),
            events: Arc::clone(&self.events),
            auth: Arc::clone(&self.auth),
            query: Arc::clone(&self.query),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{KeywordEmbedder, ScriptedChatModel};

    fn settings_in(dir: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.general.data_dir = dir.display().to_string();
        settings.documents.dir = dir.join("kb").display().to_string();
        settings.index.dir = dir.join("index").display().to_string();
        settings.events.file = dir.join("data/events.json").display().to_string();
        settings
    }

    #[tokio::test]
    async fn test_startup_seeds_events_and_builds_index() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        settings.ensure_dirs().unwrap();
        std::fs::write(dir.path().join("kb/welcome.txt"), "Welcome week starts on Monday.").unwrap();

        let orchestrator = Orchestrator::with_models(
            settings,
            Arc::new(KeywordEmbedder::new()),
            Arc::new(ScriptedChatModel::new("Monday.")),
        )
        .unwrap();
        orchestrator.startup().await.unwrap();

        assert_eq!(orchestrator.events().list().await.unwrap().len(), 2);
        assert!(orchestrator.index().current().is_some());
        assert!(dir.path().join("index").join(crate::vector_store::INDEX_FILE_NAME).exists());

        let response = orchestrator.query().answer("When does welcome week start?").await.unwrap();
        assert_eq!(response.answer, "Monday.");
    }

    #[tokio::test]
    async fn test_second_startup_loads_persisted_index() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        settings.ensure_dirs().unwrap();
        std::fs::write(dir.path().join("kb/welcome.txt"), "Welcome week starts on Monday.").unwrap();

        let embedder = Arc::new(KeywordEmbedder::new());
        let first = Orchestrator::with_models(settings.clone(), embedder.clone(), Arc::new(ScriptedChatModel::new("")))
            .unwrap();
        first.startup().await.unwrap();
        let calls = embedder.calls();

        let second = Orchestrator::with_models(settings, embedder.clone(), Arc::new(ScriptedChatModel::new("")))
            .unwrap();
        second.startup().await.unwrap();
        assert!(second.index().current().is_some());
        assert_eq!(embedder.calls(), calls);
    }

    #[tokio::test]
    async fn test_watcher_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(dir.path());
        settings.watcher.enabled = false;

        let orchestrator = Orchestrator::with_models(
            settings,
            Arc::new(KeywordEmbedder::new()),
            Arc::new(ScriptedChatModel::new("")),
        )
        .unwrap();
        assert!(orchestrator.spawn_watcher().unwrap().is_none());
    }
}
