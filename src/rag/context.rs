//! Context building: reply expansion, token budgeting and prompt formatting.

use super::ranker::ScoredFragment;
use crate::config::PRIMARY_CONTEXT_MARKER;
use crate::corpus::{Corpus, Fragment, FragmentSource, PostId};
use crate::tokenizer::TokenCounter;
use std::collections::HashSet;
use tracing::{debug, info};

/// Default token budget for the context window.
pub const DEFAULT_MAX_CONTEXT_TOKENS: usize = 4000;

/// Characters of each chunk shown in the debug preview.
const PREVIEW_CHARS: usize = 500;

/// A fragment selected for the context, ranked or injected as a reply.
#[derive(Debug, Clone, Copy)]
pub struct RankedCandidate<'a> {
    /// Corpus row.
    pub row: usize,
    pub fragment: &'a Fragment,
    /// Similarity score; `None` for replies injected without ranking.
    pub score: Option<f32>,
    /// Replies to the top-ranked fragment.
    pub is_primary: bool,
}

impl<'a> From<ScoredFragment<'a>> for RankedCandidate<'a> {
    fn from(scored: ScoredFragment<'a>) -> Self {
        Self {
            row: scored.row,
            fragment: scored.fragment,
            score: Some(scored.score),
            is_primary: false,
        }
    }
}

/// Add the replies of the top-ranked fragment as primary context.
///
/// The first candidate is the primary chunk. Every forum post listed in its
/// `replies` is marked primary: in place when one of its fragments already
/// ranked, otherwise by appending its first fragment in corpus order. Each
/// reply id contributes at most once.
pub fn expand<'a>(ranked: &[ScoredFragment<'a>], corpus: &'a Corpus) -> Vec<RankedCandidate<'a>> {
    let Some(primary) = ranked.first() else {
        return Vec::new();
    };

    let reply_ids: HashSet<PostId> = primary.fragment.replies.iter().copied().collect();
    info!(
        "Top match post_id: {:?}, replies: {:?}",
        primary.fragment.id, primary.fragment.replies
    );

    let mut seen_ids: HashSet<PostId> = HashSet::new();
    let mut candidates: Vec<RankedCandidate<'a>> = ranked
        .iter()
        .map(|scored| {
            let mut candidate = RankedCandidate::from(*scored);
            if let Some(id) = reply_id(scored.fragment, &reply_ids) {
                debug!("Marking ranked fragment from reply post_id={} as primary", id);
                candidate.is_primary = true;
                seen_ids.insert(id);
            }
            candidate
        })
        .collect();

    let mut reply_rows: Vec<usize> = reply_ids
        .iter()
        .filter(|id| !seen_ids.contains(*id))
        .filter_map(|id| {
            corpus.rows_for_id(*id).iter().copied().find(|row| {
                corpus
                    .fragment(*row)
                    .is_some_and(|f| !f.text.trim().is_empty())
            })
        })
        .collect();
    reply_rows.sort_unstable();

    for row in reply_rows {
        if let Some(fragment) = corpus.fragment(row) {
            debug!("Adding primary context from reply post_id={:?}", fragment.id);
            candidates.push(RankedCandidate {
                row,
                fragment,
                score: None,
                is_primary: true,
            });
        }
    }

    candidates
}

fn reply_id(fragment: &Fragment, reply_ids: &HashSet<PostId>) -> Option<PostId> {
    if fragment.source != FragmentSource::Discourse {
        return None;
    }
    fragment.id.filter(|id| reply_ids.contains(id))
}

/// A candidate accepted into the context window, with its token cost.
#[derive(Debug, Clone, Copy)]
pub struct ContextItem<'a> {
    pub candidate: RankedCandidate<'a>,
    pub tokens: usize,
}

/// Token-bounded, ordered context sent to the model.
#[derive(Debug, Clone, Default)]
pub struct ContextWindow<'a> {
    items: Vec<ContextItem<'a>>,
    total_tokens: usize,
}

impl<'a> ContextWindow<'a> {
    pub fn items(&self) -> &[ContextItem<'a>] {
        &self.items
    }

    pub fn fragments(&self) -> impl Iterator<Item = &'a Fragment> + '_ {
        self.items.iter().map(|item| item.candidate.fragment)
    }

    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Keep the longest prefix of `candidates` whose token total fits `max_tokens`.
///
/// Stops at the first candidate that would overflow the budget; later
/// candidates are never considered, even if they would fit.
pub fn truncate<'a>(
    candidates: Vec<RankedCandidate<'a>>,
    max_tokens: usize,
    counter: &dyn TokenCounter,
) -> ContextWindow<'a> {
    let mut window = ContextWindow::default();

    for candidate in candidates {
        let tokens = counter.count(&candidate.fragment.text);
        if window.total_tokens + tokens > max_tokens {
            debug!(
                "Context budget reached at {} of {} tokens",
                window.total_tokens, max_tokens
            );
            break;
        }
        window.total_tokens += tokens;
        window.items.push(ContextItem { candidate, tokens });
    }

    window
}

/// Format the context window for the user prompt.
///
/// Primary fragments are prefixed with the marker line the system prompt refers to.
pub fn format_context_for_prompt(window: &ContextWindow<'_>) -> String {
    window
        .items()
        .iter()
        .map(|item| {
            if item.candidate.is_primary {
                format!("{}\n{}", PRIMARY_CONTEXT_MARKER, item.candidate.fragment.text)
            } else {
                item.candidate.fragment.text.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Log a short preview of every chunk in the window.
pub fn log_context_preview(window: &ContextWindow<'_>) {
    debug!(
        "Context window: {} chunks, {} tokens",
        window.len(),
        window.total_tokens()
    );
    for (i, item) in window.items().iter().enumerate() {
        let label = if item.candidate.is_primary {
            "PRIMARY"
        } else {
            "OTHER"
        };
        debug!(
            "Chunk {} [{}] ({} tokens): {}",
            i + 1,
            label,
            item.tokens,
            preview(&item.candidate.fragment.text, PREVIEW_CHARS)
        );
    }
}

/// First `max_chars` characters with newlines flattened.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars()
        .take(max_chars)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::ranker::rank;
    use crate::rag::testing::CharCounter;

    /// Post 10 is closest to [1, 0]; posts 11 (two fragments) and 12 reply to it.
    fn thread_corpus() -> Corpus {
        Corpus::from_rows(vec![
            (Fragment::course("course text", Some("https://c/1")), vec![0.5, 0.5]),
            (
                Fragment::discourse(10, "question", Some("https://d/t/1"), Some("https://d/t/1/1"), vec![11, 12]),
                vec![1.0, 0.0],
            ),
            (
                Fragment::discourse(12, "second reply", Some("https://d/t/1"), Some("https://d/t/1/3"), vec![]),
                vec![0.0, 1.0],
            ),
            (
                Fragment::discourse(11, "first reply", Some("https://d/t/1"), Some("https://d/t/1/2"), vec![]),
                vec![0.1, 1.0],
            ),
            (
                Fragment::discourse(11, "first reply, continued", Some("https://d/t/1"), Some("https://d/t/1/2"), vec![]),
                vec![0.1, 0.9],
            ),
        ])
        .unwrap()
    }

    fn texts<'a>(candidates: &[RankedCandidate<'a>]) -> Vec<&'a str> {
        candidates.iter().map(|c| c.fragment.text.as_str()).collect()
    }

    #[test]
    fn test_expand_appends_replies_in_corpus_order() {
        let corpus = thread_corpus();
        let ranked = rank(&[1.0, 0.0], &corpus, 2).unwrap();
        let expanded = expand(&ranked, &corpus);

        assert_eq!(
            texts(&expanded),
            vec!["question", "course text", "second reply", "first reply"]
        );
        let flags: Vec<bool> = expanded.iter().map(|c| c.is_primary).collect();
        assert_eq!(flags, vec![false, false, true, true]);
        assert!(expanded[2].score.is_none());
    }

    #[test]
    fn test_expand_one_fragment_per_reply_id() {
        let corpus = thread_corpus();
        let ranked = rank(&[1.0, 0.0], &corpus, 1).unwrap();
        let expanded = expand(&ranked, &corpus);

        let reply_11: Vec<_> = expanded
            .iter()
            .filter(|c| c.fragment.id == Some(11))
            .collect();
        assert_eq!(reply_11.len(), 1);
        assert_eq!(reply_11[0].row, 3);
    }

    #[test]
    fn test_expand_does_not_duplicate_ranked_reply() {
        let corpus = thread_corpus();
        // All five rows rank, so both replies are already present.
        let ranked = rank(&[1.0, 0.0], &corpus, 5).unwrap();
        let expanded = expand(&ranked, &corpus);

        assert_eq!(expanded.len(), 5);
        let mut rows: Vec<usize> = expanded.iter().map(|c| c.row).collect();
        rows.sort_unstable();
        rows.dedup();
        assert_eq!(rows.len(), 5);

        for candidate in &expanded {
            let is_reply = matches!(candidate.fragment.id, Some(11) | Some(12));
            assert_eq!(candidate.is_primary, is_reply, "row {}", candidate.row);
        }
    }

    #[test]
    fn test_expand_without_replies_is_identity() {
        let corpus = thread_corpus();
        let ranked = rank(&[0.5, 0.5], &corpus, 1).unwrap();
        assert_eq!(ranked[0].row, 0);

        let expanded = expand(&ranked, &corpus);
        assert_eq!(texts(&expanded), vec!["course text"]);
        assert!(!expanded[0].is_primary);
    }

    #[test]
    fn test_expand_empty_is_noop() {
        let corpus = thread_corpus();
        assert!(expand(&[], &corpus).is_empty());
    }

    #[test]
    fn test_expand_ignores_missing_reply_ids() {
        let corpus = Corpus::from_rows(vec![(
            Fragment::discourse(1, "orphan question", None, None, vec![404]),
            vec![1.0],
        )])
        .unwrap();
        let ranked = rank(&[1.0], &corpus, 5).unwrap();
        assert_eq!(expand(&ranked, &corpus).len(), 1);
    }

    fn sized(corpus: &Corpus) -> Vec<RankedCandidate<'_>> {
        corpus
            .fragments()
            .iter()
            .enumerate()
            .map(|(row, fragment)| RankedCandidate {
                row,
                fragment,
                score: None,
                is_primary: false,
            })
            .collect()
    }

    #[test]
    fn test_truncate_is_prefix_not_best_fit() {
        let corpus = Corpus::from_rows(vec![
            (Fragment::course("a".repeat(100), None), vec![1.0]),
            (Fragment::course("b".repeat(4000), None), vec![1.0]),
            (Fragment::course("c".repeat(50), None), vec![1.0]),
        ])
        .unwrap();

        let window = truncate(sized(&corpus), 4000, &CharCounter);
        assert_eq!(window.len(), 1);
        assert_eq!(window.total_tokens(), 100);
        assert_eq!(window.items()[0].candidate.row, 0);
    }

    #[test]
    fn test_truncate_accepts_exact_budget() {
        let corpus = Corpus::from_rows(vec![
            (Fragment::course("a".repeat(60), None), vec![1.0]),
            (Fragment::course("b".repeat(40), None), vec![1.0]),
            (Fragment::course("c".repeat(1), None), vec![1.0]),
        ])
        .unwrap();

        let window = truncate(sized(&corpus), 100, &CharCounter);
        assert_eq!(window.len(), 2);
        assert_eq!(window.total_tokens(), 100);
    }

    #[test]
    fn test_truncate_first_item_over_budget() {
        let corpus =
            Corpus::from_rows(vec![(Fragment::course("x".repeat(10), None), vec![1.0])]).unwrap();
        let window = truncate(sized(&corpus), 5, &CharCounter);
        assert!(window.is_empty());
    }

    #[test]
    fn test_format_marks_primary() {
        let corpus = thread_corpus();
        let ranked = rank(&[1.0, 0.0], &corpus, 1).unwrap();
        let window = truncate(expand(&ranked, &corpus), 4000, &CharCounter);

        let prompt = format_context_for_prompt(&window);
        assert_eq!(
            prompt,
            format!(
                "question\n\n{m}\nsecond reply\n\n{m}\nfirst reply",
                m = PRIMARY_CONTEXT_MARKER
            )
        );
    }

    #[test]
    fn test_preview_flattens_and_limits() {
        assert_eq!(preview("line one\nline two", 100), "line one line two");
        assert_eq!(preview("héllo", 2), "hé");
    }
}
