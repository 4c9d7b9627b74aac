//! Token counting for context budgeting.
//!
//! The counter must use the same encoding the snapshot embeddings were produced
//! with, otherwise the budget drifts from what ingestion assumed.

use crate::error::{QaError, Result};
use tiktoken_rs::CoreBPE;

/// Counts tokens in a piece of text.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// BPE token counter backed by `tiktoken-rs`.
pub struct TiktokenCounter {
    bpe: CoreBPE,
    encoding: String,
}

impl TiktokenCounter {
    /// Create a counter for a named encoding (e.g. `cl100k_base`).
    pub fn new(encoding: &str) -> Result<Self> {
        let bpe = match encoding {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "r50k_base" => tiktoken_rs::r50k_base(),
            other => {
                return Err(QaError::Config(format!(
                    "Unknown tokenizer encoding: {}",
                    other
                )))
            }
        }
        .map_err(|e| QaError::Tokenizer(e.to_string()))?;

        Ok(Self {
            bpe,
            encoding: encoding.to_string(),
        })
    }

    /// Name of the encoding in use.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}
