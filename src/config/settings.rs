//! Configuration settings for Campus Helper.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    pub embedding: EmbeddingSettings,
    pub rag: RagSettings,
    pub documents: DocumentSettings,
    pub index: IndexSettings,
    pub watcher: WatcherSettings,
    pub events: EventSettings,
    pub auth: AuthSettings,
    pub bot: BotSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl GeneralSettings {
    /// Log level for a `-v` count; without flags the configured level is used.
    pub fn log_level_for(&self, verbose: u8) -> &str {
        match verbose {
            0 => &self.log_level,
            1 => "debug",
            _ => "trace",
        }
    }
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.campus-helper".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Hosted model provider (any OpenAI-compatible endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Base URL; `None` means the OpenAI default.
    pub api_base: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// HTTP timeout for provider calls.
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 300,
        }
    }
}

impl ProviderSettings {
    /// The API key, if the configured variable is set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Requested embedding dimensions (omit to use the model default).
    pub dimensions: Option<u32>,
    /// Texts per embedding request.
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: Some(1536),
            batch_size: 100,
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Chat model for response generation.
    pub model: String,
    /// Sampling temperature. Zero keeps answers deterministic.
    pub temperature: f32,
    /// Number of retrieved chunks placed in the prompt.
    pub top_k: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            top_k: 3,
        }
    }
}

/// Knowledge base (document corpus) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    /// Directory scanned for source documents.
    pub dir: String,
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared between adjacent chunks of one document.
    pub chunk_overlap: usize,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            dir: "~/.campus-helper/knowledge_base".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Persisted vector index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Directory holding the serialized index.
    pub dir: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            dir: "~/.campus-helper/vector_index".to_string(),
        }
    }
}

/// Directory watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherSettings {
    pub enabled: bool,
    /// Creation events inside this window collapse into one rebuild.
    pub debounce_ms: u64,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 2000,
        }
    }
}

/// Event list storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    pub file: String,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            file: "~/.campus-helper/data/events.json".to_string(),
        }
    }
}

/// Admin credential and token signing.
///
/// `ADMIN_PASSWORD` and `SECRET_KEY` in the environment override the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub admin_username: String,
    pub admin_password: String,
    pub secret_key: String,
    pub token_minutes: i64,
}

pub(crate) const DEFAULT_ADMIN_PASSWORD: &str = "changeme";
pub(crate) const DEFAULT_SECRET_KEY: &str = "devsecret";

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            token_minutes: 60,
        }
    }
}

impl AuthSettings {
    /// Whether either secret still has its built-in development value.
    pub fn uses_default_secrets(&self) -> bool {
        self.admin_password == DEFAULT_ADMIN_PASSWORD || self.secret_key == DEFAULT_SECRET_KEY
    }
}

/// Telegram front-end settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    /// Base URL of the Campus Helper HTTP API.
    pub api_url: String,
    /// Telegram bot token (usually supplied as `TELEGRAM_BOT_TOKEN`).
    pub token: Option<String>,
    /// Timeout for `/chat` calls.
    pub chat_timeout_secs: u64,
    /// Longest message sent to Telegram in one piece.
    pub max_message_chars: usize,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            token: None,
            chat_timeout_secs: 30,
            max_message_chars: 4000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            custom_dir: None,
            variables: super::prompts::default_variables(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied after the file is read.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let mut settings = Self::read_from(path)?;
        settings.normalize();
        Ok(settings)
    }

    /// Read the file and environment overrides without clamping anything.
    ///
    /// Lets the binary pick its log level before [`Settings::normalize`] logs.
    pub fn read_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Overlay secrets and deployment values from the process environment.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = non_empty_env("ADMIN_PASSWORD") {
            self.auth.admin_password = v;
        }
        if let Some(v) = non_empty_env("SECRET_KEY") {
            self.auth.secret_key = v;
        }
        if let Some(v) = non_empty_env("TELEGRAM_BOT_TOKEN") {
            self.bot.token = Some(v);
        }
        if let Some(v) = non_empty_env("CAMPUS_HELPER_API_URL") {
            self.bot.api_url = v;
        }
        if let Some(v) = non_empty_env("CAMPUS_HELPER_DOCUMENTS_DIR") {
            self.documents.dir = v;
        }
    }

    /// Clamp values that would break the pipeline.
    pub fn normalize(&mut self) {
        if self.documents.chunk_overlap >= self.documents.chunk_size {
            warn!(
                "chunk_overlap ({}) must be smaller than chunk_size ({}); using {}",
                self.documents.chunk_overlap,
                self.documents.chunk_size,
                self.documents.chunk_size / 5
            );
            self.documents.chunk_overlap = self.documents.chunk_size / 5;
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::HelperError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("campus-helper")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded knowledge base directory.
    pub fn documents_dir(&self) -> PathBuf {
        Self::expand_path(&self.documents.dir)
    }

    /// Get the expanded vector index directory.
    pub fn index_dir(&self) -> PathBuf {
        Self::expand_path(&self.index.dir)
    }

    /// Get the expanded events file path.
    pub fn events_file(&self) -> PathBuf {
        Self::expand_path(&self.events.file)
    }

    /// Create every directory the service writes into.
    pub fn ensure_dirs(&self) -> crate::error::Result<()> {
        std::fs::create_dir_all(self.data_dir())?;
        std::fs::create_dir_all(self.documents_dir())?;
        std::fs::create_dir_all(self.index_dir())?;
        if let Some(parent) = self.events_file().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
