//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::{AnswerEngine, Query};
use anyhow::{Context, Result};
use base64::Engine;
use std::path::PathBuf;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    image: Option<PathBuf>,
    top_k: Option<usize>,
    max_tokens: Option<usize>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Answer, &settings.snapshot_path()) {
        Output::error(&format!("{}", e));
        Output::info("Run 'course-ta doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut engine = AnswerEngine::from_settings(&settings)?;
    if let Some(top_k) = top_k {
        engine = engine.with_top_k(top_k);
    }
    if let Some(max_tokens) = max_tokens {
        engine = engine.with_max_context_tokens(max_tokens);
    }

    let mut query = Query::new(question);
    if let Some(path) = image {
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        query = query.with_image(base64::engine::general_purpose::STANDARD.encode(bytes));
    }

    let spinner = Output::spinner("Searching course content...");

    match engine.answer(&query).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.answer);

            if !response.links.is_empty() {
                Output::header("Sources");
                for link in &response.links {
                    Output::link(&link.label, &link.url);
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
