//! Run configuration: required environment variables plus an optional TOML
//! tuning file for endpoints, polling limits and report locations.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Environment variable naming a TOML tuning file.
pub const CONFIG_ENV: &str = "SPACEMEDIC_CONFIG";

const DEFAULT_GLOBAL_TIMEOUT_SECS: u64 = 1800;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {name} is not set")]
    MissingVar { name: &'static str },

    #[error("environment variable {name} must be an integer number of seconds, got {value:?}")]
    InvalidSeconds { name: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// CI context used for history links and the output file.
#[derive(Debug, Clone, Default)]
pub struct CiContext {
    pub repository: Option<String>,
    pub sha: Option<String>,
    pub server_url: String,
    pub output_path: Option<PathBuf>,
}

/// Everything read from the process environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    pub account: String,
    pub instances: Vec<String>,
    pub global_timeout: Duration,
    pub ci: CiContext,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get("HF_TOKEN").ok_or(ConfigError::MissingVar { name: "HF_TOKEN" })?;
        let account = get("USERNAME").ok_or(ConfigError::MissingVar { name: "USERNAME" })?;
        let instances = parse_instance_list(&get("SPACE_LIST").unwrap_or_default());

        let global_timeout = match get("GLOBAL_TIMEOUT_SECONDS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidSeconds {
                    name: "GLOBAL_TIMEOUT_SECONDS",
                    value: raw.clone(),
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_GLOBAL_TIMEOUT_SECS),
        };

        let ci = CiContext {
            repository: get("GITHUB_REPOSITORY"),
            sha: get("GITHUB_SHA"),
            server_url: get("GITHUB_SERVER_URL")
                .unwrap_or_else(|| "https://github.com".to_string()),
            output_path: get("GITHUB_OUTPUT").map(PathBuf::from),
        };

        Ok(Self {
            token,
            account,
            instances,
            global_timeout,
            ci,
        })
    }
}

/// Split a comma-separated list, trimming entries and dropping blanks.
pub fn parse_instance_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Tuning file
// ---------------------------------------------------------------------------

/// Optional knobs, all defaulted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tuning {
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub rebuild: RebuildConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl Tuning {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let tuning: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded tuning configuration");
        Ok(tuning)
    }

    /// Load from `explicit`, then `SPACEMEDIC_CONFIG`, then defaults.
    ///
    /// An explicitly passed path must load; the env fallback only warns.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(t) => return Ok(t),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "{CONFIG_ENV} set but file could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no tuning file, using compiled-in defaults");
        Ok(Self::default())
    }
}

/// Where instances and the vendor API live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Public URL template; `{account}` and `{instance}` are substituted.
    pub instance_url: String,
    pub api_base: String,
    /// Request a factory rebuild rather than a plain restart.
    pub factory: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            instance_url: "https://{account}-{instance}.hf.space".to_string(),
            api_base: "https://huggingface.co".to_string(),
            factory: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub timeout_secs: u64,
    /// Timeout for restart and status calls against the vendor API.
    pub api_timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            api_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RebuildConfig {
    pub poll_interval_secs: u64,
    pub max_attempts: u32,
    pub max_wait_secs: u64,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            max_attempts: 10,
            max_wait_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub html_path: PathBuf,
    pub changelog_path: PathBuf,
    /// Offset of the report clock from UTC, in minutes.
    pub utc_offset_minutes: i32,
    /// Keep at most this many entries in the HTML report.
    pub max_entries: Option<usize>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            html_path: PathBuf::from("docs/index.html"),
            changelog_path: PathBuf::from("README.md"),
            utc_offset_minutes: 8 * 60,
            max_entries: None,
        }
    }
}
