//! The two-phase run driver.
//!
//! Runs cfn-init twice in every resource's container: once for real, once to
//! prove the metadata is idempotent. A failure is scoped to its resource —
//! the other containers still get their runs, and every container gets a
//! resume statement at the end so the operator can attach and dig in.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use indexmap::IndexMap;
use tracing::{debug, error, info};

use crate::cloudformation::Template;
use crate::docker::{ContainerOrchestrator, ContainerRuntime, InitContainer, Pod};
use crate::error::Result;
use crate::metadata::MetadataSources;

/// Inputs of one `run` invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Stack name the template is loaded as.
    pub template_name: String,
    /// Path to the template body on disk.
    pub template_body: PathBuf,
    /// Image reference every container runs.
    pub image: String,
    /// Per-resource metadata document overrides.
    pub metadata_paths: IndexMap<String, PathBuf>,
}

/// Drives one full validation run.
pub struct RunDriver {
    runtime: Arc<dyn ContainerRuntime>,
    orchestrator: ContainerOrchestrator,
}

impl RunDriver {
    /// `server_binary` is the host path of `cfnlocald`, bind-mounted into
    /// every container.
    pub fn new(runtime: Arc<dyn ContainerRuntime>, server_binary: PathBuf) -> Self {
        let orchestrator = ContainerOrchestrator::new(runtime.clone(), server_binary);
        Self { runtime, orchestrator }
    }

    /// Execute the run: discover resources, start containers, run cfn-init
    /// twice each, print resume statements, tear everything down.
    ///
    /// Per-resource init failures are reported, not returned; only setup
    /// failures (unreadable template, missing image, runtime refusal) error.
    pub async fn execute(&self, options: RunOptions) -> Result<()> {
        let template = Template::from_file(&options.template_body, &options.template_name)?;
        let sources = MetadataSources::new(options.metadata_paths);

        let mut containers = Vec::new();
        for resource in template.resources_with_init() {
            let metadata = sources.metadata_for(resource.name())?;
            containers.push(InitContainer::for_resource(
                self.runtime.clone(),
                options.image.as_str(),
                metadata,
                resource,
                template.name(),
            )?);
        }

        info!("Starting cfn-init-local...");
        let mut pod = self.orchestrator.create_pod(containers).await?;
        Self::run_all(&pod).await;
        Self::print_resume_statements(pod.containers());
        info!("Stopping containers");
        pod.stop_all().await;
        info!("Completed cfn-init-local");
        Ok(())
    }

    /// Run cfn-init twice per container, isolating failures per resource.
    async fn run_all(pod: &Pod) {
        for container in pod.containers() {
            let resource = container.resource_name();
            debug!(
                resource,
                id = container.id().unwrap_or("<unstarted>"),
                "Running cfn-init"
            );
            if let Err(e) = container.run_cfn_init().await {
                error!(resource, "First run of cfn-init failed: {}", e);
                continue;
            }
            info!(resource, "First run of cfn-init passed");

            debug!(resource, "Executing second run of cfn-init for an idempotency check");
            match container.run_cfn_init().await {
                Ok(_) => info!(resource, "Second run of cfn-init passed"),
                Err(e) => error!(resource, "Second run of cfn-init failed: {}", e),
            }
        }
    }

    /// Print one reconnection command per container.
    fn print_resume_statements(containers: &[InitContainer]) {
        if containers.is_empty() {
            return;
        }
        println!(
            "\n{}",
            "Run the following commands to inspect each resource's container:".bold()
        );
        for container in containers {
            if let Some(statement) = container.resume_statement() {
                println!("\n{}:\n{}", container.resource_name().cyan(), statement);
            }
        }
        println!();
    }
}
