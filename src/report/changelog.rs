//! Markdown history table: one row per date, linking to the report as it was
//! committed that day.

use crate::config::CiContext;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

const HEADER: &str = "# Instance status history\n\n| Date | Status |\n|---|---|\n";

/// Dates already present in the table. Link cells (`[date](url)`) are
/// unwrapped to their text.
pub fn existing_dates(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('|'))
        .filter_map(|line| line.split('|').nth(1))
        .map(|cell| link_text(cell.trim()).to_string())
        .filter(|cell| !cell.is_empty() && !cell.starts_with('-'))
        .collect()
}

fn link_text(cell: &str) -> &str {
    cell.strip_prefix('[')
        .and_then(|rest| rest.split_once(']'))
        .map(|(text, _)| text.trim())
        .unwrap_or(cell)
}

/// Markdown link to the report at the current commit, or the bare date when
/// no repository is known.
pub fn history_link(ci: &CiContext, date: &str, report_path: &Path) -> String {
    match &ci.repository {
        Some(repo) => format!(
            "[{date}]({}/{repo}/commits/{}/{})",
            ci.server_url.trim_end_matches('/'),
            ci.sha.as_deref().unwrap_or("HEAD"),
            report_path.display()
        ),
        None => date.to_string(),
    }
}

/// Append a row for `date` unless one exists. Returns the updated content,
/// or `None` when nothing changed.
pub fn render(existing: Option<&str>, date: &str, link: &str, status: &str) -> Option<String> {
    let mut content = existing.unwrap_or(HEADER).to_string();
    if existing_dates(&content).iter().any(|d| d == date) {
        return None;
    }
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&format!("| {link} | {status} |\n"));
    Some(content)
}

/// Update the history file at `path`. Returns true when a row was appended.
pub fn update(path: &Path, date: &str, link: &str, status: &str) -> Result<bool> {
    let existing = if path.exists() {
        Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read history: {}", path.display()))?,
        )
    } else {
        None
    };

    match render(existing.as_deref(), date, link, status) {
        Some(content) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create directory: {}", dir.display()))?;
            }
            std::fs::write(path, content)
                .with_context(|| format!("failed to write history: {}", path.display()))?;
            info!(path = %path.display(), %date, "History row added");
            Ok(true)
        }
        None => {
            info!(path = %path.display(), %date, "History already has a row for this date");
            Ok(false)
        }
    }
}
