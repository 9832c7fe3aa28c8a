use super::{HubError, InstanceApi};
use crate::config::{EndpointConfig, ProbeConfig};
use anyhow::{Context, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// reqwest-backed client for instance URLs and the Hub API.
pub struct HubClient {
    client: Client,
    token: String,
    account: String,
    endpoints: EndpointConfig,
    probe_timeout: Duration,
    api_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RuntimeStatus {
    #[serde(default)]
    stage: String,
}

impl HubClient {
    pub fn new(
        token: impl Into<String>,
        account: impl Into<String>,
        endpoints: EndpointConfig,
        probe: &ProbeConfig,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("spacemedic/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            token: token.into(),
            account: account.into(),
            endpoints,
            probe_timeout: Duration::from_secs(probe.timeout_secs),
            api_timeout: Duration::from_secs(probe.api_timeout_secs),
        })
    }

    /// Public URL of an instance, from the configured template.
    pub fn instance_url(&self, instance: &str) -> String {
        self.endpoints
            .instance_url
            .replace("{account}", &self.account)
            .replace("{instance}", instance)
    }

    pub fn restart_url(&self, instance: &str) -> String {
        let mut url = format!("{}/restart", self.space_api(instance));
        if self.endpoints.factory {
            url.push_str("?factory=true");
        }
        url
    }

    pub fn runtime_url(&self, instance: &str) -> String {
        format!("{}/runtime", self.space_api(instance))
    }

    fn space_api(&self, instance: &str) -> String {
        format!(
            "{}/api/spaces/{}/{}",
            self.endpoints.api_base.trim_end_matches('/'),
            self.account,
            instance
        )
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    async fn send(&self, req: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Response, HubError> {
        let resp = req.send().await.map_err(|source| HubError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(HubError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }
}

#[async_trait::async_trait]
impl InstanceApi for HubClient {
    async fn probe(&self, instance: &str) -> Result<(), HubError> {
        let url = self.instance_url(instance);
        let req = self.client.get(&url).timeout(self.probe_timeout);
        self.send(req, &url).await.map(|_| ())
    }

    async fn restart(&self, instance: &str) -> Result<(), HubError> {
        let url = self.restart_url(instance);
        let req = self
            .client
            .post(&url)
            .timeout(self.api_timeout)
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, "application/json");
        self.send(req, &url).await.map(|_| ())
    }

    async fn runtime_stage(&self, instance: &str) -> Result<String, HubError> {
        let url = self.runtime_url(instance);
        let req = self
            .client
            .get(&url)
            .timeout(self.api_timeout)
            .header(AUTHORIZATION, self.bearer())
            .header(CONTENT_TYPE, "application/json");
        let resp = self.send(req, &url).await?;
        let body: RuntimeStatus = resp.json().await.map_err(|source| HubError::Decode {
            url: url.clone(),
            source,
        })?;
        Ok(body.stage)
    }
}
