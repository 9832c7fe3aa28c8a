//! HTML status report, patched in place.
//!
//! The file is the only history we keep. Each run prepends one
//! `<div class="log-entry">` to `<div id="content">`; prior entries are read
//! back with plain substring search and re-rendered unchanged.

use crate::check::RunRecord;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

const CONTENT_OPEN: &str = r#"<div id="content">"#;
const ENTRY_OPEN: &str = r#"<div class="log-entry">"#;
const TIMESTAMP_OPEN: &str = r#"<span class="timestamp">"#;
const SUCCESS_MARK: &str = "✅";
const FAILURE_MARK: &str = "❌";

const TEMPLATE_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Space status</title>
    <style>
        body { font-family: sans-serif; }
        .log-entry { margin-bottom: 10px; }
        .timestamp { font-weight: bold; }
        .success { color: green; }
        .failure { color: red; }
    </style>
</head>
<body>
    <h1>Space status</h1>
    "#;

const TEMPLATE_TAIL: &str = "\n</body>\n</html>\n";

/// One instance line inside an entry. `duration` is kept as rendered text so
/// older rows survive untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub instance: String,
    pub success: bool,
    pub duration: String,
}

/// All rows recorded for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub timestamp: String,
    pub rows: Vec<Row>,
}

impl Entry {
    /// Unknown outcomes are rendered as failures.
    pub fn from_records(timestamp: &str, records: &[RunRecord]) -> Self {
        let rows = records
            .iter()
            .map(|r| Row {
                instance: r.instance.clone(),
                success: r.outcome.is_success(),
                duration: format!("{:.2}s", r.elapsed.as_secs_f64()),
            })
            .collect();
        Self {
            timestamp: timestamp.to_string(),
            rows,
        }
    }

    fn render(&self) -> String {
        let mut out = format!("{ENTRY_OPEN}{TIMESTAMP_OPEN}{}</span><br>", self.timestamp);
        for row in &self.rows {
            let (class, mark) = if row.success {
                ("success", SUCCESS_MARK)
            } else {
                ("failure", FAILURE_MARK)
            };
            out.push_str(&format!(
                "{}: <span class='{class}'>{mark}</span> ({})<br>",
                row.instance, row.duration
            ));
        }
        out.push_str("</div>");
        out
    }
}

/// Byte range of `<div id="content">` up to and including its matching
/// `</div>`, counting nested divs.
fn content_region(doc: &str) -> Option<(usize, usize)> {
    let start = doc.find(CONTENT_OPEN)?;
    let mut pos = start + CONTENT_OPEN.len();
    let mut depth = 1usize;

    while depth > 0 {
        let close = pos + doc[pos..].find("</div>")?;
        match doc[pos..].find("<div").map(|i| pos + i) {
            Some(open) if open < close => {
                depth += 1;
                pos = open + "<div".len();
            }
            _ => {
                depth -= 1;
                pos = close + "</div>".len();
            }
        }
    }
    Some((start, pos))
}

/// Pull prior entries out of the inner HTML of the content div.
pub fn parse_entries(content: &str) -> Vec<Entry> {
    content
        .split(ENTRY_OPEN)
        .skip(1)
        .filter_map(parse_entry)
        .collect()
}

fn parse_entry(chunk: &str) -> Option<Entry> {
    let ts_start = chunk.find(TIMESTAMP_OPEN)? + TIMESTAMP_OPEN.len();
    let ts_len = chunk[ts_start..].find("</span>")?;
    let timestamp = chunk[ts_start..ts_start + ts_len].trim().to_string();
    let body = &chunk[ts_start + ts_len + "</span>".len()..];

    let rows = body.split("<br>").filter_map(parse_row).collect();
    Some(Entry { timestamp, rows })
}

fn parse_row(segment: &str) -> Option<Row> {
    let segment = segment.trim();
    let (name, status) = segment.split_once(':')?;
    let name = name.trim();
    if name.is_empty() || name.contains('<') {
        return None;
    }

    let success = if status.contains(SUCCESS_MARK) {
        true
    } else if status.contains(FAILURE_MARK) {
        false
    } else {
        return None;
    };

    let duration = status
        .find('(')
        .and_then(|open| {
            let rest = &status[open + 1..];
            rest.find(')').map(|close| rest[..close].trim().to_string())
        })
        .unwrap_or_default();

    Some(Row {
        instance: name.to_string(),
        success,
        duration,
    })
}

/// Split a document into (before content div, inner content, after its
/// closing tag).
///
/// A content div that is never closed runs up to `</body>`, or to the end of
/// the document when there is no body close either.
fn split_content(doc: &str) -> Option<(&str, &str, &str)> {
    let start = doc.find(CONTENT_OPEN)?;
    let inner_start = start + CONTENT_OPEN.len();
    let (inner_end, tail_start) = match content_region(doc) {
        Some((_, end)) => (end - "</div>".len(), end),
        None => {
            warn!("report content section is not closed, reading entries up to </body>");
            let end = doc[inner_start..]
                .rfind("</body>")
                .map_or(doc.len(), |i| inner_start + i);
            (end, end)
        }
    };
    Some((&doc[..start], &doc[inner_start..inner_end], &doc[tail_start..]))
}

/// Merge `entry` into an existing document (or a fresh one) and return the
/// new document. Newest entry first; an older entry with the same timestamp
/// is replaced.
pub fn render(existing: Option<&str>, entry: &Entry, max_entries: Option<usize>) -> String {
    let (head, inner, tail) = match existing.and_then(split_content) {
        Some(parts) => parts,
        None => {
            if existing.is_some() {
                warn!("report has no content section, starting from template");
            }
            (TEMPLATE_HEAD, "", TEMPLATE_TAIL)
        }
    };

    // Older writers could leave the same entry in the file twice; keep the
    // first occurrence of each timestamp.
    let mut seen = HashSet::from([entry.timestamp.clone()]);
    let mut entries = vec![entry.clone()];
    entries.extend(
        parse_entries(inner)
            .into_iter()
            .filter(|e| seen.insert(e.timestamp.clone())),
    );
    if let Some(max) = max_entries {
        entries.truncate(max.max(1));
    }

    let body: String = entries.iter().map(|e| format!("\n{}", e.render())).collect();
    format!("{head}{CONTENT_OPEN}{body}\n</div>{tail}")
}

/// Read, patch and rewrite the report at `path`.
pub fn update(path: &Path, entry: &Entry, max_entries: Option<usize>) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create report directory: {}", dir.display()))?;
    }

    let existing = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report: {}", path.display()))?;
        info!(path = %path.display(), bytes = content.len(), "Loaded existing report");
        Some(content)
    } else {
        info!(path = %path.display(), "Creating new report");
        None
    };

    let doc = render(existing.as_deref(), entry, max_entries);
    std::fs::write(path, doc)
        .with_context(|| format!("failed to write report: {}", path.display()))?;
    info!(path = %path.display(), timestamp = %entry.timestamp, rows = entry.rows.len(), "Report written");
    Ok(())
}
