use crate::hub::InstanceApi;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Result of a single reachability probe.
#[derive(Debug, Clone, Copy)]
pub struct ProbeReport {
    pub success: bool,
    pub elapsed: Duration,
}

/// Probe an instance once. Errors are logged and reported as `success = false`.
pub async fn probe_instance(api: &dyn InstanceApi, instance: &str) -> ProbeReport {
    info!(%instance, "Probing instance");
    let start = Instant::now();
    let result = api.probe(instance).await;
    let elapsed = start.elapsed();

    match result {
        Ok(()) => {
            info!(%instance, elapsed_secs = elapsed.as_secs_f64(), "Instance reachable");
            ProbeReport {
                success: true,
                elapsed,
            }
        }
        Err(e) => {
            error!(%instance, elapsed_secs = elapsed.as_secs_f64(), error = %e, "Instance unreachable");
            ProbeReport {
                success: false,
                elapsed,
            }
        }
    }
}
