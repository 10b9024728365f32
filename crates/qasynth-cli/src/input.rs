//! Sentence input files

use std::path::Path;

use anyhow::{Context, Result};

/// Read sentences from a JSON array of strings or a text file with one
/// sentence per line. Blank lines are skipped.
pub fn read_sentences(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    if content.trim_start().starts_with('[') {
        let sentences: Vec<String> = serde_json::from_str(&content)
            .with_context(|| format!("{} is not a JSON array of strings", path.display()))?;
        return Ok(sentences
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect());
    }

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
