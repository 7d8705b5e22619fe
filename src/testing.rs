//! Deterministic stand-ins for the hosted models, used by unit tests.

use crate::embedding::{Embedder, EmbeddingIdentity};
use crate::error::{HelperError, Result};
use crate::rag::{ChatModel, ChatRequest};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const DIMENSIONS: usize = 512;

/// Bag-of-words embedder: every lowercase token is hashed (FNV-1a) into one
/// of 512 buckets and the vector is L2-normalized.
pub struct KeywordEmbedder {
    model: String,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::with_model("keyword-hash")
    }

    pub fn with_model(model: &str) -> Self {
        Self {
            model: model.to_string(),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent call fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of embed/embed_batch calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; DIMENSIONS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in token.to_lowercase().bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            vector[(hash % DIMENSIONS as u64) as usize] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }

    fn check(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(HelperError::OpenAI("embedding provider unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.check()?;
        Ok(Self::vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.check()?;
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }

    fn identity(&self) -> EmbeddingIdentity {
        EmbeddingIdentity {
            model: self.model.clone(),
            dimensions: Some(DIMENSIONS as u32),
        }
    }
}

/// Chat model that records requests and answers with a fixed reply.
pub struct ScriptedChatModel {
    reply: String,
    failing: AtomicBool,
    calls: AtomicUsize,
    last: std::sync::Mutex<Option<ChatRequest>>,
}

impl ScriptedChatModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            last: std::sync::Mutex::new(None),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request);
        if self.failing.load(Ordering::SeqCst) {
            return Err(HelperError::OpenAI("model overloaded".to_string()));
        }
        Ok(self.reply.clone())
    }
}
