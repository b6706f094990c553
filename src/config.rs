use std::{env, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use log::warn;
use reqwest::Url;

use crate::models::{DEFAULT_ENDPOINT, DEFAULT_MAP_VERSION};
use crate::transport::RetryPolicy;

/// First firing after `initial_delay`, then every `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushSchedule {
    pub initial_delay: Duration,
    pub period: Duration,
}

impl FlushSchedule {
    pub const fn new(initial_delay: Duration, period: Duration) -> Self {
        Self {
            initial_delay,
            period,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Application key sent with the session-start payload.
    pub app_key: String,
    pub capture_point_cloud: bool,
    pub endpoint: String,
    pub map_version: String,
    pub plane_flush: FlushSchedule,
    pub point_cloud_flush: FlushSchedule,
    pub location_poll_interval: Duration,
    pub location_max_attempts: u32,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            capture_point_cloud: false,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            map_version: DEFAULT_MAP_VERSION.to_string(),
            plane_flush: FlushSchedule::new(Duration::from_secs(15), Duration::from_secs(15)),
            point_cloud_flush: FlushSchedule::new(Duration::from_secs(7), Duration::from_secs(4)),
            location_poll_interval: Duration::from_secs(1),
            location_max_attempts: 20,
            retry: RetryPolicy::unbounded(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl PipelineConfig {
    pub fn new(app_key: impl Into<String>, capture_point_cloud: bool) -> Self {
        Self {
            app_key: app_key.into(),
            capture_point_cloud,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_key.trim().is_empty() {
            warn!("No app key configured; session start will carry an empty map_key");
        }

        let url = Url::parse(&self.endpoint)
            .with_context(|| format!("invalid upload endpoint '{}'", self.endpoint))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("upload endpoint must be http(s), got '{}'", url.scheme());
        }

        if self.plane_flush.period.is_zero() || self.point_cloud_flush.period.is_zero() {
            bail!("flush periods must be greater than zero");
        }

        Ok(())
    }

    /// Configuration for the standalone host, read from `MAP_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let app_key = env::var("MAP_APP_KEY").context("MAP_APP_KEY is not set")?;
        let capture_point_cloud = env::var("MAP_CAPTURE_POINT_CLOUD")
            .map(|value| parse_flag(&value))
            .unwrap_or(false);

        let mut config = Self::new(app_key, capture_point_cloud);
        if let Ok(endpoint) = env::var("MAP_UPLOAD_ENDPOINT") {
            config.endpoint = endpoint;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Where the standalone host keeps its identity file.
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = env::var("MAP_DATA_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|dir| dir.join("mapbuffers"))
        .context("no platform data directory; set MAP_DATA_DIR")
}
