//! Docker orchestration for per-resource init containers.
//!
//! The container runtime itself is an external collaborator behind the
//! [`ContainerRuntime`] trait; everything above the trait (container values,
//! pods, the orchestrator) is runtime-agnostic and test-friendly.

mod container;
mod orchestrator;
mod runtime;

pub use container::{InitContainer, Pod};
pub use orchestrator::ContainerOrchestrator;
pub use runtime::DockerRuntime;

use async_trait::async_trait;

use crate::error::Result;

/// Launch parameters for one container.
#[derive(Debug, Clone, Default)]
pub struct LaunchSpec {
    /// Image reference to run.
    pub image: String,
    /// Command executed as the container's entry process.
    pub command: Vec<String>,
    /// Linux capabilities to add (the mock server rewrites the metadata route,
    /// which needs NET_ADMIN).
    pub cap_add: Vec<String>,
    /// Allocate a pseudo-TTY.
    pub tty: bool,
    /// Keep stdin open.
    pub interactive: bool,
    /// Bind mounts in `host:container:mode` form.
    pub binds: Vec<String>,
}

/// Result of executing a command inside a running container.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i64,
    pub output: String,
}

/// Seam to the external container runtime.
///
/// Only the four operations this tool needs; tests substitute a scripted
/// implementation.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Number of local images matching `reference`.
    async fn image_count(&self, reference: &str) -> Result<usize>;

    /// Create and start a detached container, returning its runtime id.
    async fn run_container(&self, spec: &LaunchSpec) -> Result<String>;

    /// Run a command inside a started container and wait for it.
    async fn exec(&self, container_id: &str, command: &[String]) -> Result<ExecOutput>;

    /// Stop a started container.
    async fn stop(&self, container_id: &str) -> Result<()>;
}
