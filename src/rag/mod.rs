//! Retrieval-augmented answering over the course corpus.
//!
//! The pipeline per request:
//!
//! 1. [`ranker::rank`] scores the corpus against the query embedding.
//! 2. [`context::expand`] adds replies to the top match as primary context.
//! 3. [`context::truncate`] keeps the ordered prefix that fits the token budget.
//! 4. [`citations::extract_links`] derives source links from what was kept.
//!
//! [`AnswerEngine`] sequences these around the embedding, caption and
//! completion providers.

pub mod citations;
pub mod context;
mod engine;
pub mod ranker;

#[cfg(test)]
pub(crate) mod testing;

pub use citations::{extract_links, Link};
pub use context::{expand, truncate, ContextItem, ContextWindow, RankedCandidate};
pub use engine::{Answer, AnswerEngine, Query};
pub use ranker::{cosine_similarity, rank, ScoredFragment};
