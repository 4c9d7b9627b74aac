//! Configuration module for the course assistant.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{
    AnswerPrompts, CaptionPrompts, Prompts, FALLBACK_ANSWER, PRIMARY_CONTEXT_MARKER,
};
pub use settings::{
    CompletionSettings, CorpusSettings, EmbeddingSettings, GeneralSettings, PromptSettings,
    RetrievalSettings, ServerSettings, Settings, TokenizerSettings,
};
