//! spacemedic -- scheduled health checks and automatic rebuilds for hosted
//! Spaces.
//!
//! This crate probes each configured instance, asks the vendor API to
//! rebuild the ones that do not answer, waits for the rebuild to settle and
//! records the outcome in an HTML status page and a Markdown history table.

pub mod check;
pub mod ci;
pub mod config;
pub mod hub;
pub mod report;
pub mod runner;

use anyhow::Result;
use tracing::Instrument;

use crate::check::RebuildPolicy;
use crate::config::{Settings, Tuning};
use crate::runner::{RunPolicy, RunSummary};

/// Result of a full run, including reporting.
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub timestamp: Option<String>,
    pub exit_code: i32,
}

/// Build the run policy from environment settings and tuning.
pub fn run_policy(settings: &Settings, tuning: &Tuning) -> RunPolicy {
    RunPolicy {
        global_timeout: settings.global_timeout,
        rebuild: RebuildPolicy::from(&tuning.rebuild),
    }
}

/// Full scheduled run: check every instance, write the reports and the CI
/// output key. Reporting failures are logged and turn the exit code to 1.
pub async fn run(settings: &Settings, tuning: &Tuning) -> Result<RunOutcome> {
    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("run", %run_id);

    async move {
        tracing::info!(
            account = %settings.account,
            instances = settings.instances.len(),
            budget_secs = settings.global_timeout.as_secs(),
            "Starting health check run"
        );

        let client = hub::HubClient::new(
            settings.token.clone(),
            settings.account.clone(),
            tuning.endpoints.clone(),
            &tuning.probe,
        )?;
        let policy = run_policy(settings, tuning);
        let summary = runner::run_checks(&client, &settings.instances, &policy).await;

        let mut exit_code = summary.exit_code();
        let timestamp = match report::publish(&tuning.report, &settings.ci, &summary, chrono::Utc::now()) {
            Ok(ts) => Some(ts),
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "Failed to write reports");
                exit_code = 1;
                None
            }
        };

        match &settings.ci.output_path {
            Some(path) => {
                if let Err(e) = ci::write_output(path, "exit_code", &exit_code.to_string()) {
                    tracing::error!(error = %format!("{e:#}"), "Failed to write CI output");
                    exit_code = 1;
                }
            }
            None => tracing::debug!("GITHUB_OUTPUT not set, skipping CI output"),
        }

        Ok::<_, anyhow::Error>(RunOutcome {
            summary,
            timestamp,
            exit_code,
        })
    }
    .instrument(span)
    .await
}
