//! In-memory stand-ins for the external collaborators.

use crate::completion::{Captioner, ChatMessage, Completer};
use crate::embedding::Embedder;
use crate::error::{QaError, Result};
use crate::tokenizer::TokenCounter;
use async_trait::async_trait;
use std::sync::Mutex;

/// One token per character.
pub struct CharCounter;

impl TokenCounter for CharCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count()
    }
}

/// Returns the same vector for every text and records what it was asked to embed.
pub struct FakeEmbedder {
    pub vector: Vec<f32>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeEmbedder {
    pub fn constant(vector: Vec<f32>) -> Self {
        Self {
            vector,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.lock().unwrap().push(text.to_string());
        Ok(self.vector.clone())
    }

    fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// Always fails, as an unreachable provider would.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(QaError::EmbeddingProvider("connection refused".to_string()))
    }

    fn dimensions(&self) -> usize {
        0
    }
}

/// Returns a fixed caption and records the image bytes it saw.
pub struct FakeCaptioner {
    pub caption: String,
    pub images: Mutex<Vec<Vec<u8>>>,
}

impl FakeCaptioner {
    pub fn new(caption: &str) -> Self {
        Self {
            caption: caption.to_string(),
            images: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Captioner for FakeCaptioner {
    async fn caption(&self, image: &[u8]) -> Result<String> {
        self.images.lock().unwrap().push(image.to_vec());
        Ok(self.caption.clone())
    }
}

/// Returns a fixed answer and records every prompt it was sent.
pub struct FakeCompleter {
    pub answer: String,
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeCompleter {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Completer for FakeCompleter {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.requests.lock().unwrap().push(messages.to_vec());
        Ok(self.answer.clone())
    }
}

/// Always fails with a provider error.
pub struct FailingCompleter;

#[async_trait]
impl Completer for FailingCompleter {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String> {
        Err(QaError::CompletionProvider("rate limited".to_string()))
    }
}
