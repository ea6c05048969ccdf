//! Container lifecycle: provision, wait for readiness, tear down

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{FilterError, FilterResult};
use crate::session::checkpoint;

use super::config::ContainerConfig;
use super::credentials::Credentials;
use super::runtime::{ContainerRuntime, CreateContainer};
use super::service::ContainerService;

/// A started container
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub credentials: Credentials,
}

/// Provisions one service container through a runtime
pub struct ContainerRunner<R, S> {
    runtime: R,
    service: S,
    config: ContainerConfig,
}

impl<R: ContainerRuntime, S: ContainerService> ContainerRunner<R, S> {
    pub fn new(runtime: R, service: S, config: ContainerConfig) -> FilterResult<Self> {
        config.validate()?;
        Ok(Self {
            runtime,
            service,
            config,
        })
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Cleans up orphans, pulls the image, creates and starts a container
    /// and waits until the service accepts connections.
    ///
    /// A container that never becomes ready is removed before the error is
    /// returned.
    pub async fn start(&self, cancel: &CancellationToken) -> FilterResult<ContainerInfo> {
        self.cleanup_orphans(Utc::now(), cancel).await?;

        let image = self.config.image_reference();
        checkpoint(cancel)?;
        self.runtime.pull_image(&image).await?;

        let mut spec = CreateContainer {
            name: format!("{}_{}", self.config.name_prefix, Uuid::new_v4()),
            image,
            env: self
                .config
                .env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            ports: Vec::new(),
        };
        let credentials = self.service.configure(&self.config, &mut spec)?;

        checkpoint(cancel)?;
        let id = self.runtime.create(&spec).await?;
        if let Err(e) = self.start_and_wait(&id, &credentials, cancel).await {
            if let Err(cleanup) = self.stop_and_remove(Some(&id)).await {
                warn!(container = %id, error = %cleanup, "failed to remove unready container");
            }
            return Err(e);
        }

        info!(container = %spec.name, id = %id, "container ready");
        Ok(ContainerInfo {
            id,
            name: spec.name,
            credentials,
        })
    }

    async fn start_and_wait(
        &self,
        id: &str,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> FilterResult<()> {
        checkpoint(cancel)?;
        self.runtime.start(id).await?;
        self.wait_ready(credentials, cancel).await
    }

    /// Polls readiness every `poll_interval` until `ready_timeout` elapses
    pub async fn wait_ready(
        &self,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> FilterResult<()> {
        let deadline = Instant::now() + self.config.ready_timeout;
        loop {
            checkpoint(cancel)?;
            if self.service.is_ready(credentials, cancel).await {
                return Ok(());
            }
            if Instant::now() >= deadline {
                break;
            }
            debug!("waiting for service in container to accept connections");
            tokio::select! {
                _ = cancel.cancelled() => return Err(FilterError::Cancelled),
                _ = sleep(self.config.poll_interval) => {}
            }
        }
        Err(FilterError::harness(format!(
            "connection to the service could not be established within {:?}",
            self.config.ready_timeout
        )))
    }

    /// Stops and removes a container. `None` is a no-op.
    pub async fn stop_and_remove(&self, id: Option<&str>) -> FilterResult<()> {
        let Some(id) = id else {
            return Ok(());
        };
        self.runtime.stop(id).await?;
        self.runtime.remove(id).await?;
        debug!(container = %id, "container stopped and removed");
        Ok(())
    }

    /// Removes containers left behind by earlier runs: names containing the
    /// configured prefix and created at least `orphan_age` before `now`.
    /// Individual removal failures are logged and skipped.
    pub async fn cleanup_orphans(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> FilterResult<usize> {
        let age = chrono::Duration::from_std(self.config.orphan_age)
            .map_err(|e| FilterError::invalid_argument("orphan_age", e.to_string()))?;
        let cutoff = now - age;

        checkpoint(cancel)?;
        let containers = self.runtime.list().await?;

        let mut removed = 0;
        for container in containers.iter().filter(|c| {
            c.created <= cutoff
                && c.names
                    .iter()
                    .any(|n| n.contains(self.config.name_prefix.as_str()))
        }) {
            checkpoint(cancel)?;
            match self.stop_and_remove(Some(&container.id)).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(container = %container.id, error = %e, "failed to remove orphaned container")
                }
            }
        }
        if removed > 0 {
            info!(removed, "removed orphaned containers");
        }
        Ok(removed)
    }
}

/// Holds the container started for a test suite
pub struct ContainerFixture<R, S> {
    runner: ContainerRunner<R, S>,
    container_id: Mutex<Option<String>>,
}

impl<R: ContainerRuntime, S: ContainerService> ContainerFixture<R, S> {
    pub fn new(runner: ContainerRunner<R, S>) -> Self {
        Self {
            runner,
            container_id: Mutex::new(None),
        }
    }

    pub fn runner(&self) -> &ContainerRunner<R, S> {
        &self.runner
    }

    /// Starts the container and returns its credentials
    pub async fn initialize(&self, cancel: &CancellationToken) -> FilterResult<Credentials> {
        let info = self.runner.start(cancel).await?;
        *self.container_id.lock().await = Some(info.id);
        Ok(info.credentials)
    }

    /// Stops and removes the container, if one was started
    pub async fn terminate(&self) -> FilterResult<()> {
        let id = self.container_id.lock().await.take();
        self.runner.stop_and_remove(id.as_deref()).await
    }
}
