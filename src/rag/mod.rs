//! Retrieval-augmented answers over the campus knowledge base.
//!
//! A question is answered from the top-k indexed chunks plus the full event
//! list, rendered into one prompt for the hosted chat model.

pub mod context;
mod response;

pub use context::{format_documents, format_events};
pub use response::{OpenAIChatModel, QueryService, RagResponse};

use crate::error::Result;
use async_trait::async_trait;

/// One system + user exchange sent to a chat model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
}

/// A hosted chat completion model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Return the model's reply text verbatim.
    async fn complete(&self, request: ChatRequest) -> Result<String>;
}
