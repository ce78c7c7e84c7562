//! Docker backend for the container runtime

use super::{ContainerRuntime, ContainerSpec};
use crate::error::ProvisionError;
use async_trait::async_trait;
use bollard::container::{
    Config as ContainerConfig, CreateContainerOptions, RemoveContainerOptions,
    StartContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, PortBinding};
use bollard::Docker;
use futures::TryStreamExt;
use std::collections::HashMap;

/// Container runtime backed by the local Docker daemon
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect to the local Docker daemon
    ///
    /// Uses the platform defaults: the Unix socket on Linux, the named
    /// pipe on Windows. Fails if no daemon is reachable.
    pub fn connect() -> Result<Self, ProvisionError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }
}

/// Build the container creation config for one worker
///
/// Publishes the worker's container port on all host interfaces at the
/// allocated host port. Docker wants the host port as a string.
fn container_config(spec: &ContainerSpec) -> ContainerConfig<String> {
    let exposed = format!("{}/tcp", spec.container_port);

    let mut port_bindings = HashMap::new();
    port_bindings.insert(
        exposed.clone(),
        Some(vec![PortBinding {
            host_ip: Some("0.0.0.0".to_string()),
            host_port: Some(spec.host_port.to_string()),
        }]),
    );

    let mut exposed_ports = HashMap::new();
    exposed_ports.insert(exposed, HashMap::new());

    ContainerConfig {
        image: Some(spec.image.clone()),
        exposed_ports: Some(exposed_ports),
        host_config: Some(HostConfig {
            port_bindings: Some(port_bindings),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn ensure_image(&self, image: &str) -> Result<(), ProvisionError> {
        let options = CreateImageOptions {
            from_image: image,
            ..Default::default()
        };

        // Drain the pull progress stream; the image is ready once it ends.
        self.docker
            .create_image(Some(options), None, None)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(())
    }

    async fn create_instance(&self, spec: &ContainerSpec) -> Result<String, ProvisionError> {
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(Some(options), container_config(spec))
            .await?;

        Ok(created.id)
    }

    async fn start_instance(&self, id: &str) -> Result<(), ProvisionError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn remove_instance(&self, id: &str) -> Result<(), ProvisionError> {
        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await?;
        Ok(())
    }
}
