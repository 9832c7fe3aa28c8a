//! Report writers: the HTML status page and the Markdown history table.

pub mod changelog;
pub mod html;

use crate::config::{CiContext, ReportConfig};
use crate::runner::RunSummary;
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};

/// Render the run timestamp, e.g. `2026-10-19 20:15:00 UTC+08:00`.
pub fn run_timestamp(now: DateTime<Utc>, utc_offset_minutes: i32) -> Result<String> {
    let offset = utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .with_context(|| format!("invalid report UTC offset: {utc_offset_minutes} minutes"))?;
    Ok(now
        .with_timezone(&offset)
        .format("%Y-%m-%d %H:%M:%S UTC%:z")
        .to_string())
}

/// Date part of a run timestamp.
pub fn date_of(timestamp: &str) -> &str {
    timestamp.split_whitespace().next().unwrap_or(timestamp)
}

/// Short status cell for the history table.
pub fn status_text(summary: &RunSummary) -> String {
    let failed = summary.failed();
    let skipped = summary.skipped.len();
    let total = summary.records.len() + skipped;
    match (failed, skipped) {
        (0, 0) => "✅ all healthy".to_string(),
        (_, 0) => format!("❌ {failed} of {total} failed"),
        (0, _) => format!("❌ {skipped} of {total} skipped"),
        _ => format!("❌ {failed} failed, {skipped} skipped of {total}"),
    }
}

/// Write both reports for a finished run. Returns the timestamp used.
pub fn publish(
    cfg: &ReportConfig,
    ci: &CiContext,
    summary: &RunSummary,
    now: DateTime<Utc>,
) -> Result<String> {
    let timestamp = run_timestamp(now, cfg.utc_offset_minutes)?;

    let entry = html::Entry::from_records(&timestamp, &summary.records);
    html::update(&cfg.html_path, &entry, cfg.max_entries)?;

    let date = date_of(&timestamp);
    if ci.repository.is_none() {
        tracing::warn!("GITHUB_REPOSITORY not set, history row will not link to the report");
    }
    let link = changelog::history_link(ci, date, &cfg.html_path);
    changelog::update(&cfg.changelog_path, date, &link, &status_text(summary))?;

    Ok(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{Action, Outcome, RunRecord};
    use chrono::TimeZone;
    use std::time::Duration;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_run_timestamp_shanghai() {
        assert_eq!(
            run_timestamp(noon(), 480).unwrap(),
            "2026-10-19 20:00:00 UTC+08:00"
        );
    }

    #[test]
    fn test_run_timestamp_crosses_midnight() {
        let late = Utc.with_ymd_and_hms(2026, 10, 19, 18, 30, 0).unwrap();
        let ts = run_timestamp(late, 480).unwrap();
        assert_eq!(date_of(&ts), "2026-10-20");
    }

    #[test]
    fn test_run_timestamp_rejects_bad_offset() {
        assert!(run_timestamp(noon(), 24 * 60).is_err());
        assert!(run_timestamp(noon(), -24 * 60).is_err());
    }

    #[test]
    fn test_run_timestamp_huge_offset_is_error_not_overflow() {
        assert!(run_timestamp(noon(), i32::MAX).is_err());
        assert!(run_timestamp(noon(), i32::MIN).is_err());
    }

    fn record(instance: &str, outcome: Outcome) -> RunRecord {
        RunRecord {
            instance: instance.to_string(),
            outcome,
            action: Action::Rebuilt,
            elapsed: Duration::from_secs(3),
        }
    }

    #[test]
    fn test_status_text() {
        let mut summary = RunSummary::default();
        assert_eq!(status_text(&summary), "✅ all healthy");

        summary.records.push(record("a", Outcome::Success));
        summary.records.push(record("b", Outcome::Unknown));
        assert_eq!(status_text(&summary), "❌ 1 of 2 failed");
    }

    #[test]
    fn test_status_text_reports_skipped_separately() {
        let mut summary = RunSummary {
            records: vec![record("a", Outcome::Success)],
            skipped: vec!["b".to_string()],
        };
        assert_eq!(status_text(&summary), "❌ 1 of 2 skipped");

        summary.records.push(record("c", Outcome::Failure));
        assert_eq!(status_text(&summary), "❌ 1 failed, 1 skipped of 3");
    }

    #[test]
    fn test_publish_writes_both_files_once_per_day() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ReportConfig {
            html_path: dir.path().join("docs/index.html"),
            changelog_path: dir.path().join("README.md"),
            utc_offset_minutes: 0,
            max_entries: None,
        };
        let ci = CiContext::default();
        let summary = RunSummary::default();

        publish(&cfg, &ci, &summary, noon()).unwrap();
        publish(&cfg, &ci, &summary, noon() + chrono::Duration::hours(1)).unwrap();

        let html = std::fs::read_to_string(&cfg.html_path).unwrap();
        assert_eq!(html.matches("class=\"log-entry\"").count(), 2);
        let readme = std::fs::read_to_string(&cfg.changelog_path).unwrap();
        assert_eq!(readme.matches("| 2026-10-19 |").count(), 1);
    }
}
