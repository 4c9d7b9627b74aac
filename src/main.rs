//! Course TA CLI entry point.

use anyhow::Result;
use clap::Parser;
use course_ta::cli::{commands, Cli, Commands};
use course_ta::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    if let Some(snapshot) = &cli.snapshot {
        settings.corpus.snapshot_path = snapshot.display().to_string();
    }

    // Initialize logging; the server falls back to general.log_level
    let log_level = match cli.verbose {
        0 if matches!(cli.command, Commands::Serve { .. }) => settings.general.log_level.as_str(),
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("course_ta={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Ask {
            question,
            image,
            top_k,
            max_tokens,
        } => {
            commands::run_ask(question, image.clone(), *top_k, *max_tokens, settings).await?;
        }

        Commands::Search { query, limit } => {
            commands::run_search(query, *limit, settings).await?;
        }

        Commands::Stats => {
            commands::run_stats(&settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
