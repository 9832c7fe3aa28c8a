//! Sequential driver: probe every instance, rebuild the unhealthy ones.

use crate::check::{probe_instance, rebuild_instance, Action, Outcome, RebuildPolicy, RunRecord};
use crate::hub::InstanceApi;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct RunPolicy {
    /// Wall-clock budget for the whole loop, checked before each instance.
    pub global_timeout: Duration,
    pub rebuild: RebuildPolicy,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub records: Vec<RunRecord>,
    /// Instances never started because the global budget ran out.
    pub skipped: Vec<String>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.records.iter().filter(|r| !r.outcome.is_success()).count()
    }

    pub fn all_healthy(&self) -> bool {
        self.failed() == 0 && self.skipped.is_empty()
    }

    /// 0 when every instance ended in success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.all_healthy() {
            0
        } else {
            1
        }
    }
}

/// Check a single instance, rebuilding it if the probe fails.
pub async fn check_instance(
    api: &dyn InstanceApi,
    instance: &str,
    rebuild: &RebuildPolicy,
) -> RunRecord {
    let probe = probe_instance(api, instance).await;
    if probe.success {
        return RunRecord {
            instance: instance.to_string(),
            outcome: Outcome::Success,
            action: Action::Probed,
            elapsed: probe.elapsed,
        };
    }

    let report = rebuild_instance(api, instance, rebuild).await;
    RunRecord {
        instance: instance.to_string(),
        outcome: report.outcome,
        action: Action::Rebuilt,
        elapsed: report.elapsed,
    }
}

/// Run checks over `instances` in order, stopping once the budget is spent.
pub async fn run_checks(api: &dyn InstanceApi, instances: &[String], policy: &RunPolicy) -> RunSummary {
    let start = Instant::now();
    let mut summary = RunSummary::default();

    for (idx, instance) in instances.iter().enumerate() {
        if start.elapsed() > policy.global_timeout {
            summary.skipped = instances[idx..].to_vec();
            warn!(
                remaining = summary.skipped.len(),
                budget_secs = policy.global_timeout.as_secs(),
                "Global timeout reached, remaining instances not processed"
            );
            break;
        }

        let record = check_instance(api, instance, &policy.rebuild).await;
        summary.records.push(record);
    }

    info!(
        checked = summary.records.len(),
        failed = summary.failed(),
        skipped = summary.skipped.len(),
        elapsed_secs = start.elapsed().as_secs_f64(),
        "Run finished"
    );
    summary
}
