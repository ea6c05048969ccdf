//! Container harness configuration

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{FilterError, FilterResult};

/// Default bound on waiting for the service to accept connections
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(60);

/// Default delay between readiness probes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Containers with our prefix older than this are treated as orphans
pub const DEFAULT_ORPHAN_AGE: Duration = Duration::from_secs(60 * 60);

/// How to provision one database container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub image: String,
    pub tag: String,

    /// Container names are `<name_prefix>_<uuid>`. Orphan cleanup matches on it.
    pub name_prefix: String,

    /// Port the service listens on inside the container
    pub container_port: u16,

    /// Host port tried first; falls back to the dynamic range if taken
    pub preferred_host_port: u16,

    /// Extra environment passed to the container
    pub env: BTreeMap<String, String>,

    pub ready_timeout: Duration,
    pub poll_interval: Duration,
    pub orphan_age: Duration,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self::mssql()
    }
}

impl ContainerConfig {
    pub fn new(
        image: impl Into<String>,
        tag: impl Into<String>,
        name_prefix: impl Into<String>,
        container_port: u16,
    ) -> Self {
        Self {
            image: image.into(),
            tag: tag.into(),
            name_prefix: name_prefix.into(),
            container_port,
            preferred_host_port: container_port,
            env: BTreeMap::new(),
            ready_timeout: DEFAULT_READY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            orphan_age: DEFAULT_ORPHAN_AGE,
        }
    }

    /// SQL Server on its default port
    pub fn mssql() -> Self {
        Self::new(
            "mcr.microsoft.com/mssql/server",
            "latest",
            "IntegrationTestsSqlDb",
            1433,
        )
    }

    /// `image:tag`
    pub fn image_reference(&self) -> String {
        format!("{}:{}", self.image, self.tag)
    }

    /// Parse from JSON; missing keys take the SQL Server defaults.
    pub fn from_json(json: &str) -> FilterResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FilterResult<()> {
        if self.image.trim().is_empty() {
            return Err(FilterError::invalid_argument("image", "must not be empty"));
        }
        if self.tag.trim().is_empty() {
            return Err(FilterError::invalid_argument("tag", "must not be empty"));
        }
        if self.name_prefix.trim().is_empty() {
            return Err(FilterError::invalid_argument(
                "name_prefix",
                "must not be empty",
            ));
        }
        if self.container_port == 0 {
            return Err(FilterError::invalid_argument(
                "container_port",
                "must be non-zero",
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(FilterError::invalid_argument(
                "poll_interval",
                "must be non-zero",
            ));
        }
        if self.ready_timeout < self.poll_interval {
            return Err(FilterError::invalid_argument(
                "ready_timeout",
                "must be at least one poll interval",
            ));
        }
        Ok(())
    }
}
