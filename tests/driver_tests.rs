//! Driver behaviour against a scripted in-memory API.

use spacemedic::check::{Action, Outcome, RebuildPolicy};
use spacemedic::hub::{HubError, InstanceApi};
use spacemedic::runner::{run_checks, RunPolicy};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct FakeHub {
    /// Instances whose probe fails.
    down: HashSet<String>,
    /// Stage sequence returned per instance; exhausted -> "BUILDING".
    stages: Mutex<HashMap<String, Vec<&'static str>>>,
    probe_delay: Duration,
    calls: Mutex<Vec<String>>,
}

impl FakeHub {
    fn with_down(names: &[&str]) -> Self {
        Self {
            down: names.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    fn stages(self, instance: &str, seq: &[&'static str]) -> Self {
        let mut seq = seq.to_vec();
        seq.reverse();
        self.stages.lock().unwrap().insert(instance.to_string(), seq);
        self
    }

    fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    fn total(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

#[async_trait::async_trait]
impl InstanceApi for FakeHub {
    async fn probe(&self, instance: &str) -> Result<(), HubError> {
        self.calls.lock().unwrap().push(format!("probe:{instance}"));
        if !self.probe_delay.is_zero() {
            tokio::time::sleep(self.probe_delay).await;
        }
        if self.down.contains(instance) {
            Err(HubError::Status {
                url: format!("https://alice-{instance}.hf.space"),
                status: 503,
            })
        } else {
            Ok(())
        }
    }

    async fn restart(&self, instance: &str) -> Result<(), HubError> {
        self.calls.lock().unwrap().push(format!("restart:{instance}"));
        Ok(())
    }

    async fn runtime_stage(&self, instance: &str) -> Result<String, HubError> {
        self.calls.lock().unwrap().push(format!("status:{instance}"));
        let next = self
            .stages
            .lock()
            .unwrap()
            .get_mut(instance)
            .and_then(|seq| seq.pop());
        Ok(next.unwrap_or("BUILDING").to_string())
    }
}

fn policy(max_attempts: u32) -> RunPolicy {
    RunPolicy {
        global_timeout: Duration::from_secs(60),
        rebuild: RebuildPolicy {
            poll_interval: Duration::ZERO,
            max_attempts,
            max_wait: Duration::from_secs(60),
        },
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_empty_instance_list_succeeds() {
    let hub = FakeHub::default();
    let summary = run_checks(&hub, &[], &policy(10)).await;
    assert!(summary.records.is_empty());
    assert!(summary.skipped.is_empty());
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(hub.total(""), 0);
}

#[tokio::test]
async fn test_healthy_instance_skips_rebuild() {
    let hub = FakeHub::default();
    let summary = run_checks(&hub, &names(&["chat"]), &policy(10)).await;

    assert_eq!(summary.records.len(), 1);
    assert_eq!(summary.records[0].outcome, Outcome::Success);
    assert_eq!(summary.records[0].action, Action::Probed);
    assert_eq!(hub.count("probe:chat"), 1);
    assert_eq!(hub.total("restart:"), 0);
    assert_eq!(hub.total("status:"), 0);
    assert_eq!(summary.exit_code(), 0);
}

#[tokio::test]
async fn test_failed_probe_triggers_one_restart_and_bounded_polls() {
    let hub = FakeHub::with_down(&["chat"]);
    let summary = run_checks(&hub, &names(&["chat"]), &policy(5)).await;

    assert_eq!(hub.count("restart:chat"), 1);
    assert_eq!(hub.count("status:chat"), 5);
    assert_eq!(summary.records[0].action, Action::Rebuilt);
    assert_eq!(summary.records[0].outcome, Outcome::Unknown);
    assert_eq!(summary.exit_code(), 1);
}

#[tokio::test]
async fn test_rebuild_that_reaches_running_counts_as_success() {
    let hub = FakeHub::with_down(&["chat"]).stages("chat", &["BUILDING", "RUNNING"]);
    let summary = run_checks(&hub, &names(&["chat", "api"]), &policy(10)).await;

    assert_eq!(hub.count("restart:chat"), 1);
    assert_eq!(hub.count("status:chat"), 2);
    assert_eq!(hub.total("restart:"), 1);
    assert!(summary.records.iter().all(|r| r.outcome == Outcome::Success));
    assert_eq!(summary.exit_code(), 0);
}

#[tokio::test]
async fn test_error_stage_fails_only_that_instance() {
    let hub = FakeHub::with_down(&["chat"]).stages("chat", &["RUNTIME_ERROR"]);
    let summary = run_checks(&hub, &names(&["chat", "api"]), &policy(10)).await;

    assert_eq!(summary.records.len(), 2);
    assert_eq!(summary.records[0].outcome, Outcome::Failure);
    assert_eq!(summary.records[1].outcome, Outcome::Success);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.exit_code(), 1);
}

#[tokio::test]
async fn test_global_timeout_stops_remaining_instances() {
    let hub = FakeHub {
        probe_delay: Duration::from_millis(30),
        ..FakeHub::default()
    };
    let mut run = policy(10);
    run.global_timeout = Duration::from_millis(10);

    let summary = run_checks(&hub, &names(&["a", "b", "c"]), &run).await;

    assert_eq!(summary.records.len(), 1);
    assert_eq!(summary.records[0].instance, "a");
    assert_eq!(summary.skipped, names(&["b", "c"]));
    assert_eq!(hub.total("probe:"), 1);
    assert_eq!(summary.exit_code(), 1);
}

#[tokio::test]
async fn test_instances_are_processed_in_order() {
    let hub = FakeHub::with_down(&["b"]).stages("b", &["RUNNING"]);
    run_checks(&hub, &names(&["a", "b", "c"]), &policy(10)).await;

    let calls = hub.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec!["probe:a", "probe:b", "restart:b", "status:b", "probe:c"]
    );
}
