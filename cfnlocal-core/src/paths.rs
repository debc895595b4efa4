//! Centralized path configuration.
//!
//! The host bind-mounts the `cfnlocald` server binary into every container it
//! launches; both sides of that mount are defined here so the orchestrator and
//! the container launch command cannot drift apart.

use std::path::PathBuf;

use crate::error::{CfnLocalError, Result};

/// Full in-container path of the mock server binary.
pub const CONTAINER_SERVER_PATH: &str = "/var/cfn-init-local/cfnlocald";

/// Path of the cfn-init agent inside the image under test.
pub const CONTAINER_CFN_INIT_PATH: &str = "/opt/aws/bin/cfn-init";

/// Locate the `cfnlocald` binary on the host.
///
/// Resolution order:
/// 1. `CFNLOCAL_DAEMON_PATH` environment variable
/// 2. a `cfnlocald` binary next to the current executable
pub fn daemon_binary_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CFNLOCAL_DAEMON_PATH") {
        return Ok(PathBuf::from(path));
    }

    let exe = std::env::current_exe()
        .map_err(|e| CfnLocalError::Internal(format!("Failed to locate current executable: {}", e)))?;
    let sibling = exe.with_file_name("cfnlocald");
    if sibling.exists() {
        return Ok(sibling);
    }

    Err(CfnLocalError::Internal(format!(
        "cfnlocald binary not found at {} (set CFNLOCAL_DAEMON_PATH to override)",
        sibling.display()
    )))
}
