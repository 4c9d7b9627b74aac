//! Doctor command - verify credentials, configuration and the corpus snapshot.

use crate::cli::Output;
use crate::config::Settings;
use crate::corpus::Corpus;
use crate::tokenizer::{TiktokenCounter, TokenCounter};
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Course TA Doctor");
    println!();
    println!("Checking credentials, configuration and corpus...\n");

    let mut checks = Vec::new();

    let sections: [(&str, Vec<CheckResult>); 4] = [
        ("API Configuration", vec![check_openai_api_key()]),
        ("Configuration", vec![check_config_file()]),
        ("Corpus", check_corpus(settings)),
        ("Tokenizer", vec![check_tokenizer(settings)]),
    ];

    for (title, results) in sections {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    }

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before serving questions.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Ready to answer questions.");
    }

    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key() -> CheckResult {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if key.starts_with("sk-") && key.len() > 20 => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", masked))
        }
        Ok(key) if key.is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Ok(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        Err(_) => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check the snapshot exists, loads, and matches the embedding settings.
fn check_corpus(settings: &Settings) -> Vec<CheckResult> {
    let path = settings.snapshot_path();
    if !path.is_file() {
        return vec![CheckResult::error(
            "Snapshot",
            &format!("{} (not found)", path.display()),
            "Set corpus.snapshot_path in the config or pass --snapshot",
        )];
    }

    let size = std::fs::metadata(&path)
        .map(|m| format_size(m.len()))
        .unwrap_or_else(|_| "unknown size".to_string());
    let mut results = vec![CheckResult::ok(
        "Snapshot",
        &format!("{} ({})", path.display(), size),
    )];

    match Corpus::load(&path) {
        Ok(corpus) if corpus.is_empty() => results.push(CheckResult::warning(
            "Fragments",
            "0 usable fragments",
            "Every question will receive the fallback answer",
        )),
        Ok(corpus) => {
            let stats = corpus.stats();
            results.push(CheckResult::ok(
                "Fragments",
                &format!(
                    "{} ({} course, {} discourse)",
                    stats.fragments, stats.course, stats.discourse
                ),
            ));
            results.push(check_dimensions(
                corpus.dimensions(),
                settings.embedding.dimensions as usize,
            ));
        }
        Err(e) => results.push(CheckResult::error(
            "Fragments",
            &e.to_string(),
            "Rebuild the snapshot; embeddings and metadata must have the same row count",
        )),
    }

    results
}

fn check_dimensions(corpus: usize, configured: usize) -> CheckResult {
    if corpus == configured {
        CheckResult::ok("Dimensions", &corpus.to_string())
    } else {
        CheckResult::warning(
            "Dimensions",
            &format!("snapshot {} vs embedding.dimensions {}", corpus, configured),
            "Queries are embedded at the snapshot's dimensionality",
        )
    }
}

fn check_tokenizer(settings: &Settings) -> CheckResult {
    match TiktokenCounter::new(&settings.tokenizer.encoding) {
        Ok(counter) => CheckResult::ok(
            "Encoding",
            &format!(
                "{} (\"hello world\" = {} tokens)",
                counter.encoding(),
                counter.count("hello world")
            ),
        ),
        Err(e) => CheckResult::error(
            "Encoding",
            &e.to_string(),
            "Use the encoding the snapshot was embedded with (usually cl100k_base)",
        ),
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: course-ta config edit",
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
