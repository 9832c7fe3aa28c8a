//! CI output file (`GITHUB_OUTPUT`) support.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Append `key=value` to the CI output file, creating it if needed.
pub fn write_output(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open CI output file: {}", path.display()))?;
    writeln!(file, "{key}={value}")
        .with_context(|| format!("failed to write CI output file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), %key, %value, "CI output written");
    Ok(())
}
