//! Service-specific container setup and readiness

use futures_util::future::BoxFuture;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use crate::errors::FilterResult;

use super::config::ContainerConfig;
use super::credentials::Credentials;
use super::ports::free_port;
use super::runtime::{CreateContainer, PortBinding};

/// A database service run inside a container
pub trait ContainerService: Send + Sync {
    /// Fills in service environment and port bindings, returning the
    /// credentials clients will connect with
    fn configure(
        &self,
        config: &ContainerConfig,
        spec: &mut CreateContainer,
    ) -> FilterResult<Credentials>;

    /// Whether the service accepts connections yet
    fn is_ready<'a>(
        &'a self,
        credentials: &'a Credentials,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, bool>;
}

/// SQL Server
#[derive(Debug, Clone)]
pub struct MssqlService {
    username: String,
    password: String,
}

impl Default for MssqlService {
    fn default() -> Self {
        Self::new("sa", "Passw0rd")
    }
}

impl MssqlService {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Splits a `host,port` server value
fn server_endpoint(server: &str) -> Option<(&str, u16)> {
    let (host, port) = server.split_once(',')?;
    Some((host.trim(), port.trim().parse().ok()?))
}

impl ContainerService for MssqlService {
    fn configure(
        &self,
        config: &ContainerConfig,
        spec: &mut CreateContainer,
    ) -> FilterResult<Credentials> {
        let port = free_port(Some(config.preferred_host_port))?;

        spec.env.push(("ACCEPT_EULA".to_string(), "Y".to_string()));
        spec.env
            .push(("SA_PASSWORD".to_string(), self.password.clone()));
        spec.ports.push(PortBinding {
            container_port: config.container_port,
            host_port: port,
        });

        Ok(Credentials::new([
            ("Server".to_string(), format!("localhost,{}", port)),
            ("User ID".to_string(), self.username.clone()),
            ("Password".to_string(), self.password.clone()),
            ("TrustServerCertificate".to_string(), "True".to_string()),
        ]))
    }

    fn is_ready<'a>(
        &'a self,
        credentials: &'a Credentials,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            let Some((host, port)) = credentials.get("Server").and_then(server_endpoint) else {
                return false;
            };
            tokio::select! {
                _ = cancel.cancelled() => false,
                connected = TcpStream::connect((host, port)) => connected.is_ok(),
            }
        })
    }
}
