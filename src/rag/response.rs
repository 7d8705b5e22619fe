//! Answer generation.

use super::context::{format_documents, format_events, format_sources_for_display};
use super::{ChatModel, ChatRequest};
use crate::config::{Prompts, ProviderSettings, RagSettings};
use crate::error::{HelperError, Result};
use crate::events::EventStore;
use crate::index::IndexService;
use crate::openai::create_client;
use crate::vector_store::SearchResult;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Chat model behind an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    pub fn from_settings(provider: &ProviderSettings, rag: &RagSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(provider)?,
            model: rag.model.clone(),
            temperature: rag.temperature,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system)
                .build()
                .map_err(|e| HelperError::Rag(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user)
                .build()
                .map_err(|e| HelperError::Rag(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| HelperError::Rag(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| HelperError::OpenAI(format!("Failed to generate response: {}", e)))?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| HelperError::Rag("Empty response from LLM".to_string()))
    }
}

/// An answer with the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Retrieved chunks, best first.
    pub sources: Vec<SearchResult>,
}

impl RagResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();
        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            output.push_str(&format_sources_for_display(&self.sources));
        }
        output
    }
}

/// Answers questions from the index and the event list.
pub struct QueryService {
    index: Arc<IndexService>,
    events: Arc<EventStore>,
    chat: Arc<dyn ChatModel>,
    prompts: Prompts,
    top_k: usize,
}

impl QueryService {
    pub fn new(
        index: Arc<IndexService>,
        events: Arc<EventStore>,
        chat: Arc<dyn ChatModel>,
        prompts: Prompts,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            events,
            chat,
            prompts,
            top_k: top_k.max(1),
        }
    }

    /// Answer one question.
    ///
    /// Empty questions are rejected before any model call. Without an
    /// installed index one load or build is attempted first.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn answer(&self, question: &str) -> Result<RagResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(HelperError::InvalidInput("Empty message".to_string()));
        }
        info!("Processing question: {}", question);

        let index = self.index.ensure_index().await?;
        let sources = self
            .index
            .search_in(&index, question, self.top_k)
            .await
            .map_err(|e| HelperError::Rag(format!("Error during retrieval: {}", e)))?;

        let events = self.events.list().await?;

        let mut vars = HashMap::new();
        vars.insert("documents".to_string(), format_documents(&sources));
        vars.insert("events".to_string(), format_events(&events)?);
        vars.insert("question".to_string(), question.to_string());

        let request = ChatRequest {
            system: self.prompts.system(),
            user: self.prompts.render_with_custom(&self.prompts.rag.user, &vars),
        };

        let answer = self
            .chat
            .complete(request)
            .await
            .map_err(|e| HelperError::Rag(format!("LLM generation error: {}", e)))?;

        debug!("Generated response from {} chunks and {} events", sources.len(), events.len());
        Ok(RagResponse { answer, sources })
    }
}
