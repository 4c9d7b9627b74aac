//! Answer assembly: caption, embed, retrieve, budget, complete, cite.

use super::citations::{extract_links, Link};
use super::context::{
    expand, format_context_for_prompt, log_context_preview, truncate, RankedCandidate,
    DEFAULT_MAX_CONTEXT_TOKENS,
};
use super::ranker::{rank, DEFAULT_TOP_K};
use crate::completion::{Captioner, ChatMessage, Completer, OpenAIChat};
use crate::config::{Prompts, Settings, FALLBACK_ANSWER};
use crate::corpus::Corpus;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{QaError, Result};
use crate::tokenizer::{TiktokenCounter, TokenCounter};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// A question, optionally with a base64-encoded image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Query {
    pub question: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl Query {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, base64_image: impl Into<String>) -> Self {
        self.image = Some(base64_image.into());
        self
    }
}

/// Generated answer with its source links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub links: Vec<Link>,
}

impl Answer {
    /// The literal response used when nothing relevant was retrieved.
    pub fn fallback() -> Self {
        Self {
            answer: FALLBACK_ANSWER.to_string(),
            links: Vec::new(),
        }
    }
}

/// Answers questions against a read-only corpus.
///
/// Holds no per-request state, so one engine can serve concurrent requests.
pub struct AnswerEngine {
    corpus: Arc<Corpus>,
    embedder: Arc<dyn Embedder>,
    captioner: Arc<dyn Captioner>,
    completer: Arc<dyn Completer>,
    token_counter: Arc<dyn TokenCounter>,
    prompts: Prompts,
    top_k: usize,
    max_context_tokens: usize,
}

impl AnswerEngine {
    /// Create an engine from its collaborators.
    pub fn new(
        corpus: Arc<Corpus>,
        embedder: Arc<dyn Embedder>,
        captioner: Arc<dyn Captioner>,
        completer: Arc<dyn Completer>,
        token_counter: Arc<dyn TokenCounter>,
    ) -> Self {
        if !corpus.is_empty() && embedder.dimensions() != corpus.dimensions() {
            warn!(
                "Embedder produces {} dimensions but the corpus has {}",
                embedder.dimensions(),
                corpus.dimensions()
            );
        }

        Self {
            corpus,
            embedder,
            captioner,
            completer,
            token_counter,
            prompts: Prompts::default(),
            top_k: DEFAULT_TOP_K,
            max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
        }
    }

    /// Load the corpus and build the OpenAI-backed collaborators from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let corpus = Arc::new(Corpus::load(&settings.snapshot_path())?);
        if corpus.dimensions() != settings.embedding.dimensions as usize && !corpus.is_empty() {
            warn!(
                "Snapshot has {} dimensions but embedding.dimensions is {}",
                corpus.dimensions(),
                settings.embedding.dimensions
            );
        }

        // An empty snapshot has no width of its own
        let dimensions = if corpus.is_empty() {
            settings.embedding.dimensions as usize
        } else {
            corpus.dimensions()
        };
        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            dimensions,
            Duration::from_secs(settings.completion.timeout_secs),
        )?);
        let chat = Arc::new(OpenAIChat::new(&settings.completion, &prompts)?);
        let token_counter = Arc::new(TiktokenCounter::new(&settings.tokenizer.encoding)?);

        Ok(Self::new(corpus, embedder, chat.clone(), chat, token_counter)
            .with_prompts(prompts)
            .with_top_k(settings.retrieval.top_k)
            .with_max_context_tokens(settings.retrieval.max_context_tokens))
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the number of ranked fragments kept before expansion.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the context token budget.
    pub fn with_max_context_tokens(mut self, max_context_tokens: usize) -> Self {
        self.max_context_tokens = max_context_tokens;
        self
    }

    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    pub fn token_counter(&self) -> &dyn TokenCounter {
        self.token_counter.as_ref()
    }

    /// Embed `text` and return ranked plus reply-expanded candidates.
    ///
    /// An empty corpus yields no candidates rather than an error.
    pub async fn retrieve(&self, text: &str) -> Result<Vec<RankedCandidate<'_>>> {
        if self.corpus.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(text).await?;

        let ranked = match rank(&query_embedding, &self.corpus, self.top_k) {
            Ok(ranked) => ranked,
            Err(QaError::EmptyCorpus) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        Ok(expand(&ranked, &self.corpus))
    }

    /// Answer a question, citing the fragments used as context.
    #[instrument(skip(self, query), fields(question = %query.question, has_image = query.image.is_some()))]
    pub async fn answer(&self, query: &Query) -> Result<Answer> {
        let question = query.question.trim();
        if question.is_empty() {
            return Err(QaError::InvalidInput("question must not be empty".to_string()));
        }

        if self.corpus.is_empty() {
            info!("Corpus is empty; returning fallback answer");
            return Ok(Answer::fallback());
        }

        let caption = match query.image.as_deref().map(str::trim) {
            Some(image) if !image.is_empty() => {
                let bytes = decode_image(image)?;
                self.captioner.caption(&bytes).await?
            }
            _ => String::new(),
        };

        let full_query = format!("{} {}", question, caption).trim().to_string();
        let candidates = self.retrieve(&full_query).await?;

        if candidates.is_empty() {
            info!("No candidates retrieved; returning fallback answer");
            return Ok(Answer::fallback());
        }

        let window = truncate(
            candidates,
            self.max_context_tokens,
            self.token_counter.as_ref(),
        );
        log_context_preview(&window);

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), format_context_for_prompt(&window));
        vars.insert("question".to_string(), question.to_string());
        vars.insert("caption".to_string(), caption);

        let messages = vec![
            ChatMessage::system(self.prompts.answer.system.clone()),
            ChatMessage::user(self.prompts.render_with_custom(&self.prompts.answer.user, &vars)),
        ];

        let answer = self.completer.complete(&messages).await?;
        let links = extract_links(&window);

        info!(
            "Answered with {} context chunks and {} links",
            window.len(),
            links.len()
        );

        Ok(Answer { answer, links })
    }
}

/// Decode a base64 image, accepting an optional `data:...;base64,` prefix.
fn decode_image(encoded: &str) -> Result<Vec<u8>> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };

    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| QaError::InvalidInput(format!("image is not valid base64: {}", e)))
}
