//! Query embedding for semantic retrieval.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Maps a query into the vector space the corpus snapshot was built in.
///
/// Vectors must come from the same model (and dimensionality) used for the
/// snapshot, otherwise ranking fails with a dimension mismatch.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one query string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of the vectors this embedder produces.
    fn dimensions(&self) -> usize;
}
