//! Snapshot loading.
//!
//! The snapshot is a JSON document with two parallel arrays:
//!
//! ```json
//! {
//!   "embeddings": [[0.01, -0.2, ...], ...],
//!   "metadata": [
//!     {"text": "...", "source": "course", "source_url": "https://..."},
//!     {"text": "...", "source": "discourse", "topic_url": "...", "post_url": "...",
//!      "post_id": 10, "replies": [11, 12]},
//!     null
//!   ]
//! }
//! ```
//!
//! Row-count disagreement between the arrays is fatal. Individual records that are
//! null, unparseable, or have no text are dropped together with their embedding row.

use super::{Corpus, Fragment, FragmentSource, PostId};
use crate::error::{QaError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument, warn};

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    embeddings: Vec<Vec<f32>>,
    metadata: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct FragmentRecord {
    #[serde(default)]
    text: Option<String>,
    source: FragmentSource,
    #[serde(default)]
    source_url: Option<String>,
    #[serde(default)]
    topic_url: Option<String>,
    #[serde(default)]
    post_url: Option<String>,
    #[serde(default)]
    post_id: Option<PostId>,
    #[serde(default)]
    replies: Option<Vec<PostId>>,
}

/// Load a corpus snapshot from disk.
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<Corpus> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| QaError::CorpusLoad(format!("cannot read {}: {}", path.display(), e)))?;

    let corpus = parse_snapshot(&content)?;
    info!(
        "Loaded {} fragments ({} dimensions) from {}",
        corpus.len(),
        corpus.dimensions(),
        path.display()
    );
    Ok(corpus)
}

/// Parse a snapshot document.
pub fn parse_snapshot(content: &str) -> Result<Corpus> {
    let snapshot: SnapshotFile = serde_json::from_str(content)
        .map_err(|e| QaError::CorpusLoad(format!("invalid snapshot: {}", e)))?;

    if snapshot.embeddings.len() != snapshot.metadata.len() {
        return Err(QaError::CorpusLoad(format!(
            "{} embedding rows but {} metadata records",
            snapshot.embeddings.len(),
            snapshot.metadata.len()
        )));
    }

    let mut rows = Vec::with_capacity(snapshot.metadata.len());
    let mut dropped = 0usize;

    for (row, (record, embedding)) in snapshot
        .metadata
        .into_iter()
        .zip(snapshot.embeddings)
        .enumerate()
    {
        match parse_record(row, record) {
            Ok(fragment) => rows.push((fragment, embedding)),
            Err(e) => {
                warn!("Dropping fragment: {}", e);
                dropped += 1;
            }
        }
    }

    if dropped > 0 {
        warn!("Dropped {} malformed fragments", dropped);
    }

    Corpus::from_rows(rows)
}

fn parse_record(row: usize, value: serde_json::Value) -> Result<Fragment> {
    if value.is_null() {
        return Err(QaError::MalformedFragment {
            row,
            reason: "empty record".to_string(),
        });
    }

    let record: FragmentRecord =
        serde_json::from_value(value).map_err(|e| QaError::MalformedFragment {
            row,
            reason: e.to_string(),
        })?;

    let text = match record.text {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            return Err(QaError::MalformedFragment {
                row,
                reason: "missing text".to_string(),
            })
        }
    };

    let fragment = match record.source {
        FragmentSource::Course => Fragment {
            id: None,
            text,
            source: FragmentSource::Course,
            source_url: non_empty(record.source_url),
            topic_url: None,
            post_url: None,
            replies: Vec::new(),
        },
        FragmentSource::Discourse => Fragment {
            id: record.post_id,
            text,
            source: FragmentSource::Discourse,
            source_url: None,
            topic_url: non_empty(record.topic_url),
            post_url: non_empty(record.post_url),
            replies: record.replies.unwrap_or_default(),
        },
    };

    Ok(fragment)
}

fn non_empty(url: Option<String>) -> Option<String> {
    url.filter(|u| !u.trim().is_empty())
}
