//! Exact brute-force similarity ranking over the whole corpus.

use crate::corpus::{Corpus, Fragment};
use crate::error::{QaError, Result};
use std::cmp::Ordering;

/// Number of fragments kept by default.
pub const DEFAULT_TOP_K: usize = 5;

/// A fragment with its similarity to the query.
#[derive(Debug, Clone, Copy)]
pub struct ScoredFragment<'a> {
    /// Corpus row.
    pub row: usize,
    pub fragment: &'a Fragment,
    pub score: f32,
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths, empty or zero-norm vectors, and
/// non-finite results, so such rows sink to the bottom instead of failing.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let score = dot_product / (norm_a * norm_b);
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

/// Score every fragment against `query` and return the best `top_k`.
///
/// Ordered by descending score; equal scores keep corpus order.
pub fn rank<'a>(query: &[f32], corpus: &'a Corpus, top_k: usize) -> Result<Vec<ScoredFragment<'a>>> {
    if corpus.is_empty() {
        return Err(QaError::EmptyCorpus);
    }
    if query.len() != corpus.dimensions() {
        return Err(QaError::DimensionMismatch {
            expected: corpus.dimensions(),
            actual: query.len(),
        });
    }

    let mut scored: Vec<ScoredFragment<'a>> = corpus
        .rows()
        .map(|(row, fragment, embedding)| ScoredFragment {
            row,
            fragment,
            score: cosine_similarity(query, embedding),
        })
        .collect();

    // Scores are always finite. sort_by is stable, which gives the insertion-order tie-break.
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);

    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(rows: Vec<Vec<f32>>) -> Corpus {
        Corpus::from_rows(
            rows.into_iter()
                .enumerate()
                .map(|(i, e)| (Fragment::course(format!("fragment {}", i), None), e))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_zero_norm_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_rank_orders_by_score_and_limits() {
        let corpus = corpus(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.7, 0.7],
            vec![-1.0, 0.0],
        ]);

        let ranked = rank(&[1.0, 0.0], &corpus, 2).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].row, 1);
        assert_eq!(ranked[1].row, 2);
        assert!(ranked[0].score >= ranked[1].score);
    }

    #[test]
    fn test_rank_ties_keep_insertion_order() {
        let corpus = corpus(vec![
            vec![0.0, 1.0],
            vec![2.0, 0.0],
            vec![1.0, 0.0],
            vec![3.0, 0.0],
        ]);

        let ranked = rank(&[1.0, 0.0], &corpus, 10).unwrap();
        let rows: Vec<usize> = ranked.iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![1, 2, 3, 0]);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_zero_norm_row_sinks() {
        let corpus = corpus(vec![vec![0.0, 0.0], vec![-0.5, 1.0], vec![1.0, 1.0]]);

        let ranked = rank(&[1.0, 0.0], &corpus, 3).unwrap();
        let rows: Vec<usize> = ranked.iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![2, 0, 1]);
        assert_eq!(ranked[1].score, 0.0);
    }

    #[test]
    fn test_zero_query_scores_everything_zero() {
        let corpus = corpus(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let ranked = rank(&[0.0, 0.0], &corpus, 5).unwrap();
        let rows: Vec<usize> = ranked.iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![0, 1]);
        assert!(ranked.iter().all(|s| s.score == 0.0));
    }

    #[test]
    fn test_rank_empty_corpus() {
        let corpus = Corpus::from_rows(Vec::new()).unwrap();
        assert!(matches!(rank(&[1.0], &corpus, 5), Err(QaError::EmptyCorpus)));
    }

    #[test]
    fn test_rank_dimension_mismatch() {
        let corpus = corpus(vec![vec![1.0, 0.0]]);
        assert!(matches!(
            rank(&[1.0, 0.0, 0.0], &corpus, 5),
            Err(QaError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_rank_is_deterministic() {
        let corpus = corpus(vec![vec![0.3, 0.4], vec![0.6, 0.8], vec![0.1, 0.9]]);
        let first: Vec<(usize, f32)> = rank(&[0.5, 0.5], &corpus, 3)
            .unwrap()
            .iter()
            .map(|s| (s.row, s.score))
            .collect();
        for _ in 0..5 {
            let again: Vec<(usize, f32)> = rank(&[0.5, 0.5], &corpus, 3)
                .unwrap()
                .iter()
                .map(|s| (s.row, s.score))
                .collect();
            assert_eq!(first, again);
        }
    }
}
