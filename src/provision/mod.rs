//! Worker provisioning, readiness and teardown
//!
//! The [`Provisioner`] turns a worker count into running containers and
//! later removes them. It owns the container backend and the port
//! allocator but never the worker handles: those live in a caller-owned
//! list so they survive a provisioning failure and can still be torn
//! down.

pub mod ports;

pub use ports::{PortAllocator, SequentialPorts};

use crate::config::ProvisionConfig;
use crate::error::ProvisionError;
use crate::runtime::{ContainerRuntime, ContainerSpec};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Container name prefix; the published host port makes each name unique
const CONTAINER_NAME_PREFIX: &str = "wordcount";

/// Lifecycle state of one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Created and started, not yet accepting connections
    Creating,

    /// Accepting connections
    Running,

    /// Removed by teardown
    Stopped,

    /// Never became ready
    Failed,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkerState::Creating => "creating",
            WorkerState::Running => "running",
            WorkerState::Stopped => "stopped",
            WorkerState::Failed => "failed",
        };
        write!(f, "{label}")
    }
}

/// Network address a worker serves on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Base URL for requests to this worker
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One provisioned worker container
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    /// Position in the fleet; worker `i` serves input file `i`
    pub index: usize,

    /// Backend container id
    pub id: String,

    /// Container name
    pub name: String,

    /// Endpoint the orchestrator dispatches to
    pub endpoint: Endpoint,

    /// Current lifecycle state
    pub state: WorkerState,
}

/// Outcome of a teardown pass
#[derive(Debug, Default)]
pub struct TeardownReport {
    /// Containers removed by this pass
    pub removed: usize,

    /// Handles already stopped when this pass ran
    pub skipped: usize,

    /// Removals that failed; the affected handles keep their state
    pub failures: Vec<TeardownFailure>,
}

impl TeardownReport {
    /// Whether every live handle was removed
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One failed container removal
#[derive(Debug)]
pub struct TeardownFailure {
    pub name: String,
    pub id: String,
    pub error: ProvisionError,
}

/// Provisions worker containers and tears them down
pub struct Provisioner {
    runtime: Arc<dyn ContainerRuntime>,
    ports: Box<dyn PortAllocator>,
    config: ProvisionConfig,
}

impl Provisioner {
    /// Build a provisioner that allocates sequential host ports
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: ProvisionConfig) -> Self {
        let ports = Box::new(SequentialPorts::new(config.base_port, config.port_span));
        Self {
            runtime,
            ports,
            config,
        }
    }

    /// Build a provisioner with a caller-supplied port allocator
    pub fn with_port_allocator(
        runtime: Arc<dyn ContainerRuntime>,
        config: ProvisionConfig,
        ports: Box<dyn PortAllocator>,
    ) -> Self {
        Self {
            runtime,
            ports,
            config,
        }
    }

    /// Make the configured worker image available locally
    pub async fn ensure_image(&self) -> Result<(), ProvisionError> {
        self.runtime.ensure_image(&self.config.image).await
    }

    /// Create and start `count` workers, appending each to `handles`
    ///
    /// A handle is appended as soon as its container exists, before the
    /// start call. On failure the caller therefore still holds every
    /// container created so far and must pass the list to
    /// [`teardown`](Self::teardown).
    pub async fn provision(
        &mut self,
        count: usize,
        handles: &mut Vec<WorkerHandle>,
    ) -> Result<(), ProvisionError> {
        for _ in 0..count {
            let port = self.ports.allocate()?;
            let name = format!("{CONTAINER_NAME_PREFIX}-{port}");
            let spec = ContainerSpec {
                image: self.config.image.clone(),
                name: name.clone(),
                container_port: self.config.container_port,
                host_port: port,
            };

            let id = self.runtime.create_instance(&spec).await?;
            handles.push(WorkerHandle {
                index: handles.len(),
                id: id.clone(),
                name,
                endpoint: Endpoint {
                    host: self.config.host.clone(),
                    port,
                },
                state: WorkerState::Creating,
            });

            self.runtime.start_instance(&id).await?;
        }
        Ok(())
    }

    /// Wait until `handle` accepts TCP connections
    ///
    /// Probes the endpoint at the configured interval. Marks the handle
    /// Running on the first successful connect, Failed once the deadline
    /// passes without one.
    pub async fn await_ready(&self, handle: &mut WorkerHandle) -> Result<(), ProvisionError> {
        let deadline = Instant::now() + self.config.ready_timeout();
        loop {
            let address = (handle.endpoint.host.as_str(), handle.endpoint.port);
            match tokio::net::TcpStream::connect(address).await {
                Ok(_) => {
                    handle.state = WorkerState::Running;
                    return Ok(());
                }
                Err(_) if Instant::now() < deadline => {
                    tokio::time::sleep(self.config.poll_interval()).await;
                }
                Err(_) => {
                    handle.state = WorkerState::Failed;
                    return Err(ProvisionError::ReadyTimeout {
                        worker: handle.index,
                        endpoint: handle.endpoint.to_string(),
                        timeout_ms: self.config.ready_timeout_ms,
                    });
                }
            }
        }
    }

    /// Remove every container in `handles`
    ///
    /// Attempts all removals even when some fail; failures are collected
    /// in the report instead of short-circuiting. Handles already marked
    /// Stopped are skipped, so a second pass removes nothing twice.
    pub async fn teardown(&self, handles: &mut [WorkerHandle]) -> TeardownReport {
        let mut report = TeardownReport::default();
        for handle in handles.iter_mut() {
            if handle.state == WorkerState::Stopped {
                report.skipped += 1;
                continue;
            }
            match self.runtime.remove_instance(&handle.id).await {
                Ok(()) => {
                    handle.state = WorkerState::Stopped;
                    report.removed += 1;
                }
                Err(error) => {
                    report.failures.push(TeardownFailure {
                        name: handle.name.clone(),
                        id: handle.id.clone(),
                        error,
                    });
                }
            }
        }
        report
    }
}
