//! Container runtime seam
//!
//! `DockerCli` drives the `docker` binary. Tests substitute an in-memory
//! runtime through the same trait.

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use tokio::process::Command;
use tracing::debug;

use crate::errors::{FilterError, FilterResult};

/// Host port published for a container port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortBinding {
    pub container_port: u16,
    pub host_port: u16,
}

/// Parameters of a container to create
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateContainer {
    pub name: String,
    pub image: String,
    pub env: Vec<(String, String)>,
    pub ports: Vec<PortBinding>,
}

/// A container as reported by the runtime's listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
    pub names: Vec<String>,
    pub created: DateTime<Utc>,
}

/// Container lifecycle operations
pub trait ContainerRuntime: Send + Sync {
    fn pull_image<'a>(&'a self, image: &'a str) -> BoxFuture<'a, FilterResult<()>>;

    /// Creates a container and returns its id
    fn create<'a>(&'a self, spec: &'a CreateContainer) -> BoxFuture<'a, FilterResult<String>>;

    fn start<'a>(&'a self, id: &'a str) -> BoxFuture<'a, FilterResult<()>>;

    fn stop<'a>(&'a self, id: &'a str) -> BoxFuture<'a, FilterResult<()>>;

    fn remove<'a>(&'a self, id: &'a str) -> BoxFuture<'a, FilterResult<()>>;

    /// Running containers
    fn list(&self) -> BoxFuture<'_, FilterResult<Vec<ContainerSummary>>>;
}

const PS_FORMAT: &str = "{{.ID}}\t{{.Names}}\t{{.CreatedAt}}";

/// Parses one line of `docker ps --format` output in `PS_FORMAT`.
///
/// `CreatedAt` looks like `2024-01-15 10:30:00 +0000 UTC`.
pub fn parse_ps_line(line: &str) -> FilterResult<ContainerSummary> {
    let mut fields = line.split('\t');
    let (Some(id), Some(names), Some(created)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(FilterError::harness(format!(
            "unexpected container listing line: {}",
            line
        )));
    };

    let timestamp: Vec<&str> = created.split_whitespace().take(3).collect();
    let created = DateTime::parse_from_str(&timestamp.join(" "), "%Y-%m-%d %H:%M:%S %z")
        .map_err(|e| FilterError::harness(format!("bad container timestamp '{}': {}", created, e)))?
        .with_timezone(&Utc);

    Ok(ContainerSummary {
        id: id.trim().to_string(),
        names: names
            .split(',')
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect(),
        created,
    })
}

/// Runtime backed by the `docker` command line client
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn run(&self, args: Vec<String>) -> FilterResult<String> {
        let command = args.first().cloned().unwrap_or_default();
        debug!(binary = %self.binary, command = %command, "running container command");

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .await
            .map_err(|e| FilterError::harness(format!("failed to execute {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FilterError::harness(format!(
                "{} {} failed: {}",
                self.binary,
                command,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn create_args(spec: &CreateContainer) -> Vec<String> {
    let mut args = vec!["create".to_string(), "--name".to_string(), spec.name.clone()];
    for (key, value) in &spec.env {
        args.push("-e".to_string());
        args.push(format!("{}={}", key, value));
    }
    for binding in &spec.ports {
        args.push("-p".to_string());
        args.push(format!("{}:{}/tcp", binding.host_port, binding.container_port));
    }
    args.push(spec.image.clone());
    args
}

impl ContainerRuntime for DockerCli {
    fn pull_image<'a>(&'a self, image: &'a str) -> BoxFuture<'a, FilterResult<()>> {
        Box::pin(async move {
            self.run(vec!["pull".to_string(), image.to_string()]).await?;
            Ok(())
        })
    }

    fn create<'a>(&'a self, spec: &'a CreateContainer) -> BoxFuture<'a, FilterResult<String>> {
        Box::pin(async move { self.run(create_args(spec)).await })
    }

    fn start<'a>(&'a self, id: &'a str) -> BoxFuture<'a, FilterResult<()>> {
        Box::pin(async move {
            self.run(vec!["start".to_string(), id.to_string()]).await?;
            Ok(())
        })
    }

    fn stop<'a>(&'a self, id: &'a str) -> BoxFuture<'a, FilterResult<()>> {
        Box::pin(async move {
            self.run(vec!["stop".to_string(), id.to_string()]).await?;
            Ok(())
        })
    }

    fn remove<'a>(&'a self, id: &'a str) -> BoxFuture<'a, FilterResult<()>> {
        Box::pin(async move {
            self.run(vec!["rm".to_string(), id.to_string()]).await?;
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, FilterResult<Vec<ContainerSummary>>> {
        Box::pin(async move {
            let output = self
                .run(vec![
                    "ps".to_string(),
                    "--no-trunc".to_string(),
                    "--format".to_string(),
                    PS_FORMAT.to_string(),
                ])
                .await?;
            output
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(parse_ps_line)
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_ps_line() {
        let summary =
            parse_ps_line("abc123\tIntegrationTestsSqlDb_1,alias\t2024-01-15 10:30:00 +0000 UTC")
                .unwrap();
        assert_eq!(summary.id, "abc123");
        assert_eq!(summary.names, vec!["IntegrationTestsSqlDb_1", "alias"]);
        assert_eq!(
            summary.created,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_ps_line_with_offset() {
        let summary = parse_ps_line("id\tname\t2024-01-15 12:30:00 +0200 CEST").unwrap();
        assert_eq!(
            summary.created,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_ps_line_rejects_garbage() {
        assert!(parse_ps_line("only-one-field").is_err());
        assert!(parse_ps_line("id\tname\tyesterday").is_err());
    }

    #[test]
    fn test_create_args() {
        let spec = CreateContainer {
            name: "db_1".to_string(),
            image: "img:1".to_string(),
            env: vec![("ACCEPT_EULA".to_string(), "Y".to_string())],
            ports: vec![PortBinding {
                container_port: 1433,
                host_port: 49152,
            }],
        };
        assert_eq!(
            create_args(&spec),
            vec!["create", "--name", "db_1", "-e", "ACCEPT_EULA=Y", "-p", "49152:1433/tcp", "img:1"]
        );
    }
}
