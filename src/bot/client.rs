//! HTTP client for the Campus Helper API.

use super::format::{CHAT_ERROR_TEXT, EMPTY_ANSWER_TEXT, EVENTS_ERROR_TEXT, TIMEOUT_TEXT};
use crate::error::{HelperError, Result};
use crate::events::Event;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, instrument};

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: Option<String>,
}

/// Calls `GET /events` and `POST /chat` on a running server.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    chat_timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str, chat_timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            chat_timeout,
        }
    }

    pub async fn list_events(&self) -> Result<Vec<Event>> {
        let events = self
            .http
            .get(format!("{}/events", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(events)
    }

    #[instrument(skip(self, message))]
    pub async fn chat(&self, message: &str) -> Result<String> {
        let reply: ChatResponse = self
            .http
            .post(format!("{}/chat", self.base_url))
            .timeout(self.chat_timeout)
            .json(&ChatRequest { message })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(reply
            .response
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| EMPTY_ANSWER_TEXT.to_string()))
    }

    /// The answer to `message`, or the user-facing text for a failure.
    pub async fn chat_reply(&self, message: &str) -> String {
        match self.chat(message).await {
            Ok(answer) => answer,
            Err(HelperError::Http(e)) if e.is_timeout() => TIMEOUT_TEXT.to_string(),
            Err(e) => {
                error!("Chat request failed: {}", e);
                CHAT_ERROR_TEXT.to_string()
            }
        }
    }

    /// The events list, or the user-facing text for a failure.
    pub async fn events_reply(&self) -> std::result::Result<Vec<Event>, &'static str> {
        self.list_events().await.map_err(|e| {
            error!("Error fetching events: {}", e);
            EVENTS_ERROR_TEXT
        })
    }
}
