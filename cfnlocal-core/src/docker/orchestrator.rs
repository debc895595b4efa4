//! Container startup and pod assembly.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::docker::{ContainerRuntime, InitContainer, LaunchSpec, Pod};
use crate::error::{CfnLocalError, Result};
use crate::paths::CONTAINER_SERVER_PATH;

/// Starts per-resource containers and groups them into a pod.
///
/// Setup failures here are fatal: tolerating per-resource failure is the
/// driver's job, not the orchestrator's.
pub struct ContainerOrchestrator {
    runtime: Arc<dyn ContainerRuntime>,
    /// Host path of the `cfnlocald` binary bind-mounted into every container.
    server_binary: PathBuf,
}

impl ContainerOrchestrator {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, server_binary: PathBuf) -> Self {
        Self { runtime, server_binary }
    }

    /// Start one container, binding its runtime id.
    ///
    /// Fails with `ImageNotFound` unless the image reference matches exactly
    /// one local image; the check runs before anything is launched.
    #[instrument(skip(self, container), fields(resource = container.resource_name()))]
    pub async fn start_container(&self, container: &mut InitContainer) -> Result<()> {
        let matches = self.runtime.image_count(container.image()).await?;
        if matches != 1 {
            return Err(CfnLocalError::ImageNotFound { image: container.image().to_string() });
        }

        let spec = LaunchSpec {
            image: container.image().to_string(),
            command: container.launch_command().to_vec(),
            cap_add: vec!["NET_ADMIN".to_string()],
            tty: true,
            interactive: true,
            binds: vec![format!(
                "{}:{}:ro",
                self.server_binary.display(),
                CONTAINER_SERVER_PATH
            )],
        };
        let id = self.runtime.run_container(&spec).await?;
        debug!(id = %id, "Started container");
        container.bind(id);
        Ok(())
    }

    /// Start every container in order and collect them into one pod.
    ///
    /// On a start failure the containers already running are stopped (best
    /// effort) before the error propagates — no partially-started pod ever
    /// escapes this function.
    pub async fn create_pod(&self, mut containers: Vec<InitContainer>) -> Result<Pod> {
        for index in 0..containers.len() {
            if let Err(e) = self.start_container(&mut containers[index]).await {
                error!(
                    resource = containers[index].resource_name(),
                    "Failed to start container: {}", e
                );
                let mut partial = Pod::new(containers);
                partial.stop_all().await;
                return Err(e);
            }
        }
        info!(containers = containers.len(), "Pod started");
        Ok(Pod::new(containers))
    }
}
