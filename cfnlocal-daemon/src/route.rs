//! Instance-metadata route rewriting for container mode.

use tokio::process::Command;
use tracing::{info, warn};

/// iptables rule sending traffic for the well-known metadata address to localhost.
const SET_METADATA_ROUTE_ARGS: &[&str] = &[
    "-t",
    "nat",
    "-A",
    "OUTPUT",
    "-d",
    "169.254.169.254",
    "-j",
    "DNAT",
    "--to-destination",
    "127.0.0.1",
];

/// Reroute the EC2 metadata address (169.254.169.254) to 127.0.0.1.
///
/// Best effort: a failure is logged but does not abort startup, matching the
/// behavior of running without the rule (cfn-init just won't reach the
/// metadata endpoint).
pub async fn mock_metadata_route() {
    match Command::new("iptables").args(SET_METADATA_ROUTE_ARGS).status().await {
        Ok(status) if status.success() => {
            info!("Rerouted 169.254.169.254 to 127.0.0.1");
        }
        Ok(status) => {
            warn!("iptables exited with {} while setting the metadata route", status);
        }
        Err(e) => {
            warn!("Failed to invoke iptables: {}", e);
        }
    }
}
