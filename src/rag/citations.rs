//! Source links for an answer.

use super::context::ContextWindow;
use crate::corpus::FragmentSource;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A citation shown alongside the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    #[serde(rename = "text")]
    pub label: String,
}

impl Link {
    fn new(url: &str, label: &str) -> Self {
        Self {
            url: url.to_string(),
            label: label.to_string(),
        }
    }
}

pub const COURSE_LABEL: &str = "Course content";
pub const TOPIC_LABEL: &str = "Discourse topic";
pub const POST_LABEL: &str = "Discourse post";

/// Collect source links from the context window, deduplicated by URL.
///
/// Iterates in window order; the first occurrence of a URL wins. Fragments
/// without the relevant URL are skipped.
pub fn extract_links(window: &ContextWindow<'_>) -> Vec<Link> {
    let mut links = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for fragment in window.fragments() {
        let candidates: [(Option<&str>, &str); 2] = match fragment.source {
            FragmentSource::Course => [(fragment.source_url.as_deref(), COURSE_LABEL), (None, "")],
            FragmentSource::Discourse => [
                (fragment.topic_url.as_deref(), TOPIC_LABEL),
                (fragment.post_url.as_deref(), POST_LABEL),
            ],
        };

        for (url, label) in candidates {
            let Some(url) = url.filter(|u| !u.is_empty()) else {
                continue;
            };
            if seen.insert(url) {
                links.push(Link::new(url, label));
            }
        }
    }

    links
}
