//! Database container harness for integration tests
//!
//! Provisions a real database in a container: picks a free host port, starts
//! the container, waits for the service with a bounded poll, and removes it
//! afterwards. Containers from earlier runs that share the name prefix and
//! are older than the orphan age are removed on start.

mod config;
mod credentials;
mod ports;
mod runner;
mod runtime;
mod service;

pub use config::{
    ContainerConfig, DEFAULT_ORPHAN_AGE, DEFAULT_POLL_INTERVAL, DEFAULT_READY_TIMEOUT,
};
pub use credentials::Credentials;
pub use ports::{free_port, DYNAMIC_PORT_START};
pub use runner::{ContainerFixture, ContainerInfo, ContainerRunner};
pub use runtime::{
    parse_ps_line, ContainerRuntime, ContainerSummary, CreateContainer, DockerCli, PortBinding,
};
pub use service::{ContainerService, MssqlService};
