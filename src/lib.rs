//! Campus Helper - retrieval-augmented campus assistant
//!
//! Answers questions about a campus from a folder of documents and a small
//! list of upcoming events.
//!
//! # Overview
//!
//! Campus Helper:
//! - Loads txt, md, pdf, docx, html and json files from a knowledge base folder
//! - Splits them into overlapping chunks and embeds them into a persisted vector index
//! - Rebuilds the index when new files appear in the folder
//! - Answers questions from the closest chunks plus the events list
//! - Serves an HTTP API with admin-only event management and reindexing
//! - Relays a Telegram chat to that API
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `documents` - Knowledge base loading and text extraction
//! - `chunking` - Character-window chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - In-memory index and its SQLite snapshot
//! - `index` - Index lifecycle and the folder watcher
//! - `events` - JSON-file event store
//! - `auth` - Admin login and bearer tokens
//! - `rag` - Prompt assembly and answer generation
//! - `server` - HTTP API
//! - `bot` - Telegram front end
//! - `orchestrator` - Wires the services together
//!
//! # Example
//!
//! ```rust,no_run
//! use campus_helper::config::Settings;
//! use campus_helper::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!     orchestrator.startup().await?;
//!
//!     let response = orchestrator.query().answer("When is the library open?").await?;
//!     println!("{}", response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod bot;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod documents;
pub mod embedding;
pub mod error;
pub mod events;
pub mod index;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod server;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{HelperError, Result};
