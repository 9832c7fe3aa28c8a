//! Remote boundary: instance reachability and the vendor restart/status API.

pub mod http;

use thiserror::Error;

pub use http::HubClient;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Operations the driver needs from the outside world.
#[async_trait::async_trait]
pub trait InstanceApi: Send + Sync {
    /// GET the instance's public URL. `Ok` means a non-error HTTP status.
    async fn probe(&self, instance: &str) -> Result<(), HubError>;

    /// Ask the vendor to restart (rebuild) the instance.
    async fn restart(&self, instance: &str) -> Result<(), HubError>;

    /// Current runtime stage string as reported by the vendor.
    async fn runtime_stage(&self, instance: &str) -> Result<String, HubError>;
}
