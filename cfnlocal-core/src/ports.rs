//! Fixed ports for the mock AWS endpoints.
//!
//! cfn-init resolves the instance-metadata service at 169.254.169.254:80.
//! Outside a container we cannot bind 80 without privileges, so the metadata
//! listener defaults to a high port and only moves to 80 in container mode,
//! where the DNAT rule reroutes the well-known address to localhost.

/// Instance-metadata endpoint outside container mode.
pub const PORT_INSTANCE_METADATA: u16 = 5000;

/// Instance-metadata endpoint inside a container (cfn-init expects port 80).
pub const PORT_INSTANCE_METADATA_CONTAINER: u16 = 80;

/// Describe-stack-resource endpoint (same port in and out of container mode).
pub const PORT_STACK_RESOURCE: u16 = 5001;
