use super::Outcome;
use crate::config::RebuildConfig;
use crate::hub::InstanceApi;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Vendor stage string, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Running,
    Errored(String),
    /// Anything else (building, starting, paused, empty...). Keep waiting.
    Pending(String),
}

impl Stage {
    pub fn parse(raw: &str) -> Self {
        if raw == "RUNNING" {
            Stage::Running
        } else if raw.contains("ERROR") {
            Stage::Errored(raw.to_string())
        } else {
            Stage::Pending(raw.to_string())
        }
    }
}

/// Fixed-interval polling limits. Whichever cap is hit first ends the wait.
#[derive(Debug, Clone, Copy)]
pub struct RebuildPolicy {
    pub poll_interval: Duration,
    pub max_attempts: u32,
    pub max_wait: Duration,
}

impl Default for RebuildPolicy {
    fn default() -> Self {
        Self::from(&RebuildConfig::default())
    }
}

impl From<&RebuildConfig> for RebuildPolicy {
    fn from(cfg: &RebuildConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(cfg.poll_interval_secs),
            max_attempts: cfg.max_attempts,
            max_wait: Duration::from_secs(cfg.max_wait_secs),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RebuildReport {
    pub outcome: Outcome,
    pub elapsed: Duration,
    /// Number of status requests issued.
    pub polls: u32,
}

/// Restart an instance and wait for it to come back.
///
/// Sends exactly one restart request, then polls the runtime stage every
/// `poll_interval` until it is `RUNNING` (success), contains `ERROR`
/// (failure), a status request fails (failure), or the attempt/time caps
/// run out (unknown).
pub async fn rebuild_instance(
    api: &dyn InstanceApi,
    instance: &str,
    policy: &RebuildPolicy,
) -> RebuildReport {
    info!(%instance, "Requesting rebuild");
    let start = Instant::now();

    if let Err(e) = api.restart(instance).await {
        error!(%instance, elapsed_secs = start.elapsed().as_secs_f64(), error = %e, "Rebuild request failed");
        return RebuildReport {
            outcome: Outcome::Failure,
            elapsed: start.elapsed(),
            polls: 0,
        };
    }
    info!(%instance, "Rebuild request accepted");

    let mut attempt = 0;
    while start.elapsed() < policy.max_wait && attempt < policy.max_attempts {
        tokio::time::sleep(policy.poll_interval).await;

        let stage = match api.runtime_stage(instance).await {
            Ok(raw) => Stage::parse(&raw),
            Err(e) => {
                error!(%instance, elapsed_secs = start.elapsed().as_secs_f64(), error = %e, "Status request failed");
                return RebuildReport {
                    outcome: Outcome::Failure,
                    elapsed: start.elapsed(),
                    polls: attempt + 1,
                };
            }
        };

        match stage {
            Stage::Running => {
                info!(%instance, elapsed_secs = start.elapsed().as_secs_f64(), "Rebuild complete, instance running");
                return RebuildReport {
                    outcome: Outcome::Success,
                    elapsed: start.elapsed(),
                    polls: attempt + 1,
                };
            }
            Stage::Errored(raw) => {
                error!(%instance, stage = %raw, elapsed_secs = start.elapsed().as_secs_f64(), "Rebuild failed");
                return RebuildReport {
                    outcome: Outcome::Failure,
                    elapsed: start.elapsed(),
                    polls: attempt + 1,
                };
            }
            Stage::Pending(raw) => {
                info!(%instance, stage = %raw, attempt = attempt + 1, "Rebuild in progress");
            }
        }
        attempt += 1;
    }

    warn!(
        %instance,
        polls = attempt,
        elapsed_secs = start.elapsed().as_secs_f64(),
        "Rebuild state unknown (wait time or attempts exhausted)"
    );
    RebuildReport {
        outcome: Outcome::Unknown,
        elapsed: start.elapsed(),
        polls: attempt,
    }
}
