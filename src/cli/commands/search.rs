//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::corpus::FragmentSource;
use crate::rag::AnswerEngine;
use anyhow::Result;

/// Run the search command: rank and expand, but skip completion.
pub async fn run_search(query: &str, limit: usize, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings.snapshot_path()) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let engine = AnswerEngine::from_settings(&settings)?.with_top_k(limit);

    let spinner = Output::spinner("Searching...");
    let candidates = engine.retrieve(query).await;
    spinner.finish_and_clear();
    let candidates = candidates?;

    if candidates.is_empty() {
        Output::info("No results found.");
        return Ok(());
    }

    Output::header(&format!("Results for: {}", query));

    for (i, candidate) in candidates.iter().enumerate() {
        let fragment = candidate.fragment;
        let url = match fragment.source {
            FragmentSource::Course => fragment.source_url.as_deref(),
            FragmentSource::Discourse => fragment.post_url.as_deref().or(fragment.topic_url.as_deref()),
        };
        Output::candidate(
            i + 1,
            &fragment.source.to_string(),
            candidate.score,
            candidate.is_primary,
            &fragment.text,
            url,
        );
    }

    let tokens: usize = candidates
        .iter()
        .map(|c| engine.token_counter().count(&c.fragment.text))
        .sum();
    println!();
    Output::kv("Candidates", &candidates.len().to_string());
    Output::kv("Tokens (before budget)", &tokens.to_string());
    Output::kv("Budget", &settings.retrieval.max_context_tokens.to_string());

    Ok(())
}
