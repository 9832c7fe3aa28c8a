//! Per-instance checks: reachability probe and rebuild-and-wait.

pub mod probe;
pub mod rebuild;

use serde::Serialize;
use std::time::Duration;

pub use probe::{probe_instance, ProbeReport};
pub use rebuild::{rebuild_instance, RebuildPolicy, RebuildReport, Stage};

/// Final state of one instance after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
    /// Rebuild was requested but never reached a terminal stage.
    Unknown,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Failure => write!(f, "failure"),
            Outcome::Unknown => write!(f, "unknown"),
        }
    }
}

/// What the driver had to do for an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Probed,
    Rebuilt,
}

/// One row of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub instance: String,
    pub outcome: Outcome,
    pub action: Action,
    #[serde(rename = "elapsed_secs", serialize_with = "as_secs_f64")]
    pub elapsed: Duration,
}

fn as_secs_f64<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}
