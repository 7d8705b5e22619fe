//! Configuration module for Campus Helper.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    AuthSettings, BotSettings, DocumentSettings, EmbeddingSettings, EventSettings,
    GeneralSettings, IndexSettings, PromptSettings, ProviderSettings, RagSettings,
    ServerSettings, Settings, WatcherSettings,
};
