//! Pre-flight checks before expensive operations.
//!
//! Validates that credentials and the snapshot are in place before starting
//! operations that would otherwise fail midway.

use crate::error::{QaError, Result};
use std::path::Path;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering calls the embedding and completion providers.
    Answer,
    /// Search embeds the query.
    Search,
    /// Stats only reads the snapshot.
    Stats,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, snapshot: &Path) -> Result<()> {
    match operation {
        Operation::Answer | Operation::Search => {
            check_api_key()?;
            check_snapshot(snapshot)?;
        }
        Operation::Stats => {
            check_snapshot(snapshot)?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
pub fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(QaError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(QaError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check that the snapshot file exists.
pub fn check_snapshot(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(QaError::CorpusLoad(format!(
            "snapshot not found at {}. Set corpus.snapshot_path or pass --snapshot.",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_needs_only_snapshot() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(check(Operation::Stats, file.path()).is_ok());
    }

    #[test]
    fn test_missing_snapshot() {
        let err = check(Operation::Stats, Path::new("/nonexistent/chunks.json")).unwrap_err();
        assert!(matches!(err, QaError::CorpusLoad(_)));
    }
}
