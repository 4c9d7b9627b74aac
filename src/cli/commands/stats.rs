//! Stats command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::corpus::Corpus;
use anyhow::Result;

/// Run the stats command.
pub fn run_stats(settings: &Settings) -> Result<()> {
    let path = settings.snapshot_path();
    preflight::check(Operation::Stats, &path)?;

    let corpus = Corpus::load(&path)?;
    let stats = corpus.stats();

    Output::header("Corpus");
    Output::kv("Snapshot", &path.display().to_string());
    Output::kv("Fragments", &stats.fragments.to_string());
    Output::kv("Course", &stats.course.to_string());
    Output::kv("Discourse", &stats.discourse.to_string());
    Output::kv("Dimensions", &stats.dimensions.to_string());
    Output::kv("Forum posts", &stats.posts.to_string());
    Output::kv("Reply edges", &stats.reply_edges.to_string());

    if stats.fragments == 0 {
        Output::warning("Snapshot contains no usable fragments; every question will get the fallback answer.");
    }

    Ok(())
}
