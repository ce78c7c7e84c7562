//! Container runtime abstraction
//!
//! Provisioning talks to containers through the [`ContainerRuntime`] trait,
//! so the Docker backend can be swapped for [`MockRuntime`] in tests.

pub mod docker;
pub mod mock;

pub use docker::DockerRuntime;
pub use mock::MockRuntime;

use crate::error::ProvisionError;
use async_trait::async_trait;

/// Everything the backend needs to create one worker container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Image to run
    pub image: String,

    /// Container name
    pub name: String,

    /// Port the worker listens on inside the container
    pub container_port: u16,

    /// Host port the container port is published at
    pub host_port: u16,
}

/// Abstraction over the container backend
///
/// # Lifecycle
///
/// 1. `ensure_image` - make the worker image available locally
/// 2. `create_instance` - create a container from a [`ContainerSpec`]
/// 3. `start_instance` - start the created container
/// 4. `remove_instance` - force-remove the container, running or not
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. The provisioner holds one behind
/// an `Arc` and calls it from async context.
///
/// # Error Handling
///
/// Every operation returns [`ProvisionError`] on failure. `remove_instance`
/// must accept containers in any state; teardown after a partial failure
/// relies on this.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Make `image` available locally, pulling it if necessary
    async fn ensure_image(&self, image: &str) -> Result<(), ProvisionError>;

    /// Create a container and return its backend id
    async fn create_instance(&self, spec: &ContainerSpec) -> Result<String, ProvisionError>;

    /// Start a previously created container
    async fn start_instance(&self, id: &str) -> Result<(), ProvisionError>;

    /// Force-remove a container by id
    async fn remove_instance(&self, id: &str) -> Result<(), ProvisionError>;
}
