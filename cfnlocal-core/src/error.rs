//! Error types for cfn-init-local.
//!
//! All errors use `thiserror` for ergonomic error handling and proper error chains.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cfn-init-local operations.
pub type Result<T> = std::result::Result<T, CfnLocalError>;

/// Main error type for cfn-init-local.
#[derive(Error, Debug)]
pub enum CfnLocalError {
    // Metadata resolution errors
    #[error("Metadata path not found: {path}")]
    MetadataNotFound { path: String },

    #[error("Invalid metadata document: {reason}")]
    MetadataParse { reason: String },

    #[error("Failed to read metadata file {path:?}: {source}")]
    MetadataFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Template errors
    #[error("Failed to read template {path:?}: {source}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse template {path:?}: {reason}")]
    TemplateParse { path: PathBuf, reason: String },

    // Docker errors
    #[error("Did not find exactly one image matching '{image}' in the local Docker repository")]
    ImageNotFound { image: String },

    #[error("cfn-init failed for resource '{resource}' (exit code {exit_code}): {output}")]
    InitCommandFailed { resource: String, exit_code: i64, output: String },

    #[error("Container for resource '{resource}' has not been started")]
    ContainerNotStarted { resource: String },

    #[error("Docker runtime error: {0}")]
    Docker(#[from] bollard::errors::Error),

    // Server errors
    #[error("Failed to bind listener on {addr}: {source}")]
    ServerBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
