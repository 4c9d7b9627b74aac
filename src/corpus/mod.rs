//! Read-only fragment corpus loaded once at startup.
//!
//! Fragment `i` always corresponds to embedding row `i`; that row order is the
//! insertion order from ingestion and is used as the tie-break everywhere.

mod snapshot;

pub use snapshot::{load, parse_snapshot};

use crate::error::{QaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Identifier of a forum post. Several fragments can share one when a post was chunked.
pub type PostId = u64;

/// Where a fragment was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentSource {
    /// Course website content.
    Course,
    /// Discourse forum post.
    Discourse,
}

impl std::fmt::Display for FragmentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FragmentSource::Course => write!(f, "course"),
            FragmentSource::Discourse => write!(f, "discourse"),
        }
    }
}

/// An immutable unit of retrievable text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    /// Post id (discourse only).
    pub id: Option<PostId>,
    /// Embedded text. Never empty.
    pub text: String,
    pub source: FragmentSource,
    /// Canonical course page (course only).
    pub source_url: Option<String>,
    /// Forum topic (discourse only).
    pub topic_url: Option<String>,
    /// Forum post (discourse only).
    pub post_url: Option<String>,
    /// Ids of posts replying to this one, in thread order.
    pub replies: Vec<PostId>,
}

impl Fragment {
    /// Create a course fragment.
    pub fn course(text: impl Into<String>, source_url: Option<&str>) -> Self {
        Self {
            id: None,
            text: text.into(),
            source: FragmentSource::Course,
            source_url: source_url.map(str::to_string),
            topic_url: None,
            post_url: None,
            replies: Vec::new(),
        }
    }

    /// Create a forum fragment.
    pub fn discourse(
        id: PostId,
        text: impl Into<String>,
        topic_url: Option<&str>,
        post_url: Option<&str>,
        replies: Vec<PostId>,
    ) -> Self {
        Self {
            id: Some(id),
            text: text.into(),
            source: FragmentSource::Discourse,
            source_url: None,
            topic_url: topic_url.map(str::to_string),
            post_url: post_url.map(str::to_string),
            replies,
        }
    }
}

/// Summary counts for a loaded corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusStats {
    pub fragments: usize,
    pub course: usize,
    pub discourse: usize,
    pub dimensions: usize,
    /// Distinct post ids in the reply index.
    pub posts: usize,
    /// Total reply references across all fragments.
    pub reply_edges: usize,
}

/// The full fragment set plus its embedding matrix.
#[derive(Debug)]
pub struct Corpus {
    fragments: Vec<Fragment>,
    /// Row-major, `fragments.len() * dimensions` values.
    embeddings: Vec<f32>,
    dimensions: usize,
    /// Post id to fragment rows, rows in corpus order.
    by_id: HashMap<PostId, Vec<usize>>,
}

impl Corpus {
    /// Build a corpus from fragment/embedding rows.
    ///
    /// Every embedding must have the same length.
    pub fn from_rows(rows: Vec<(Fragment, Vec<f32>)>) -> Result<Self> {
        let dimensions = rows.first().map(|(_, e)| e.len()).unwrap_or(0);
        let mut fragments = Vec::with_capacity(rows.len());
        let mut embeddings = Vec::with_capacity(rows.len() * dimensions);
        let mut by_id: HashMap<PostId, Vec<usize>> = HashMap::new();

        for (row, (fragment, embedding)) in rows.into_iter().enumerate() {
            if embedding.len() != dimensions {
                return Err(QaError::CorpusLoad(format!(
                    "embedding row {} has {} values, expected {}",
                    row,
                    embedding.len(),
                    dimensions
                )));
            }
            if fragment.source == FragmentSource::Discourse {
                if let Some(id) = fragment.id {
                    by_id.entry(id).or_default().push(row);
                }
            }
            embeddings.extend_from_slice(&embedding);
            fragments.push(fragment);
        }

        Ok(Self {
            fragments,
            embeddings,
            dimensions,
            by_id,
        })
    }

    /// Load a corpus from a snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        snapshot::load(path)
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Embedding dimensionality (0 for an empty corpus).
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// All fragments in corpus order.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn fragment(&self, row: usize) -> Option<&Fragment> {
        self.fragments.get(row)
    }

    /// Embedding row for a fragment.
    pub fn embedding(&self, row: usize) -> Option<&[f32]> {
        if row >= self.fragments.len() {
            return None;
        }
        let start = row * self.dimensions;
        Some(&self.embeddings[start..start + self.dimensions])
    }

    /// Iterate `(row, fragment, embedding)` in corpus order.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &Fragment, &[f32])> + '_ {
        let width = self.dimensions;
        self.fragments.iter().enumerate().map(move |(row, fragment)| {
            (row, fragment, &self.embeddings[row * width..(row + 1) * width])
        })
    }

    /// Rows of all forum fragments carrying `id`, in corpus order.
    pub fn rows_for_id(&self, id: PostId) -> &[usize] {
        self.by_id.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Compute summary counts.
    pub fn stats(&self) -> CorpusStats {
        let course = self
            .fragments
            .iter()
            .filter(|f| f.source == FragmentSource::Course)
            .count();

        CorpusStats {
            fragments: self.fragments.len(),
            course,
            discourse: self.fragments.len() - course,
            dimensions: self.dimensions,
            posts: self.by_id.len(),
            reply_edges: self.fragments.iter().map(|f| f.replies.len()).sum(),
        }
    }
}
