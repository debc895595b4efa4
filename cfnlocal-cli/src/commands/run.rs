//! `cfnlocal run` command

use std::path::PathBuf;

use anyhow::{Context, Result};
use indexmap::IndexMap;

use cfnlocal_core::docker::DockerRuntime;
use cfnlocal_core::driver::{RunDriver, RunOptions};
use cfnlocal_core::{init_observability, paths};

/// Validate every init-bearing resource of a template in its own container.
pub async fn run(
    template_name: String,
    template_body: PathBuf,
    image: String,
    metadata_paths: IndexMap<String, PathBuf>,
    verbose: bool,
) -> Result<()> {
    init_observability(verbose);

    let server_binary = paths::daemon_binary_path()
        .context("Cannot locate the cfnlocald binary to mount into containers")?;
    let runtime = DockerRuntime::connect()
        .context("Failed to connect to the local Docker daemon. Is it running?")?;

    let driver = RunDriver::new(runtime, server_binary);
    let options = RunOptions { template_name, template_body, image, metadata_paths };
    driver.execute(options).await?;

    Ok(())
}
