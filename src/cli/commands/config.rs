//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{Context, Result};

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => show(&settings),
        ConfigAction::Edit => edit(&settings),
        ConfigAction::Path => {
            println!("{}", Settings::default_config_path().display());
            Ok(())
        }
    }
}

/// Print the effective settings, including command-line overrides.
fn show(settings: &Settings) -> Result<()> {
    let toml_str =
        toml::to_string_pretty(settings).context("Failed to serialize config")?;

    let snapshot = settings.snapshot_path();
    let state = if snapshot.is_file() { "found" } else { "missing" };
    println!("# snapshot: {} ({})", snapshot.display(), state);
    println!("{}", toml_str);
    Ok(())
}

/// Open the config file in `$EDITOR`, then re-parse it so mistakes surface immediately.
fn edit(settings: &Settings) -> Result<()> {
    let config_path = Settings::default_config_path();

    if !config_path.exists() {
        settings.save()?;
        Output::info(&format!("Created default config at {}", config_path.display()));
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());
    Output::info(&format!("Opening config in {}...", editor));

    let status = match std::process::Command::new(&editor).arg(&config_path).status() {
        Ok(status) => status,
        Err(e) => {
            Output::error(&format!("Failed to open editor: {}", e));
            Output::info(&format!("Config file is at: {}", config_path.display()));
            return Ok(());
        }
    };

    if !status.success() {
        Output::warning("Editor exited with non-zero status.");
    }

    match Settings::load_from(Some(&config_path)) {
        Ok(updated) => {
            Output::success("Config saved.");
            if !updated.snapshot_path().is_file() {
                Output::warning(&format!(
                    "Snapshot not found at {}",
                    updated.snapshot_path().display()
                ));
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Config no longer parses: {}", e));
            Err(e.into())
        }
    }
}
