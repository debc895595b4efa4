//! `ContainerRuntime` implementation backed by the Docker Engine API.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bollard::container::{Config, StopContainerOptions};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::image::ListImagesOptions;
use bollard::models::HostConfig;
use bollard::Docker;
use futures_util::StreamExt;
use tracing::{debug, instrument};

use crate::docker::{ContainerRuntime, ExecOutput, LaunchSpec};
use crate::error::{CfnLocalError, Result};

/// Docker Engine client speaking to the local daemon socket.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect with the platform's local defaults (`/var/run/docker.sock`).
    pub fn connect() -> Result<Arc<Self>> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Arc::new(Self { docker }))
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn image_count(&self, reference: &str) -> Result<usize> {
        let mut filters = HashMap::new();
        filters.insert("reference".to_string(), vec![reference.to_string()]);
        let images = self
            .docker
            .list_images(Some(ListImagesOptions { filters, ..Default::default() }))
            .await?;
        Ok(images.len())
    }

    #[instrument(skip(self, spec), fields(image = %spec.image))]
    async fn run_container(&self, spec: &LaunchSpec) -> Result<String> {
        let host_config = HostConfig {
            cap_add: Some(spec.cap_add.clone()),
            binds: Some(spec.binds.clone()),
            ..Default::default()
        };
        let config = Config {
            image: Some(spec.image.clone()),
            cmd: Some(spec.command.clone()),
            tty: Some(spec.tty),
            open_stdin: Some(spec.interactive),
            host_config: Some(host_config),
            ..Default::default()
        };

        let created = self.docker.create_container::<String, String>(None, config).await?;
        self.docker.start_container::<String>(&created.id, None).await?;
        debug!(id = %created.id, "Container started");
        Ok(created.id)
    }

    #[instrument(skip(self, command))]
    async fn exec(&self, container_id: &str, command: &[String]) -> Result<ExecOutput> {
        let exec = self
            .docker
            .create_exec(
                container_id,
                CreateExecOptions {
                    cmd: Some(command.to_vec()),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await?;

        let mut output = String::new();
        match self.docker.start_exec(&exec.id, None).await? {
            StartExecResults::Attached { output: mut stream, .. } => {
                while let Some(chunk) = stream.next().await {
                    output.push_str(&chunk?.to_string());
                }
            }
            StartExecResults::Detached => {}
        }

        let inspect = self.docker.inspect_exec(&exec.id).await?;
        let exit_code = inspect.exit_code.ok_or_else(|| {
            CfnLocalError::Internal(format!(
                "No exit code reported for exec in container {}",
                container_id
            ))
        })?;
        Ok(ExecOutput { exit_code, output })
    }

    async fn stop(&self, container_id: &str) -> Result<()> {
        self.docker.stop_container(container_id, None::<StopContainerOptions>).await?;
        Ok(())
    }
}
