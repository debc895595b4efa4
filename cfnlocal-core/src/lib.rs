//! cfn-init-local core library.
//!
//! Shared types and services for validating `AWS::CloudFormation::Init`
//! metadata locally: the CloudFormation template model, the mock EC2
//! metadata / describe-stack-resource HTTP services, the Docker
//! orchestration layer, and the two-phase run driver.

pub mod cloudformation;
pub mod docker;
pub mod driver;
pub mod error;
pub mod http;
pub mod metadata;
pub mod observability;
pub mod paths;
pub mod ports;

// Re-export commonly used items
pub use cloudformation::{Resource, Template};
pub use error::{CfnLocalError, Result};
pub use http::{HttpServer, InstanceMetadataHandler, StackResourceHandler};
pub use metadata::{MetadataNode, MetadataSources};
pub use observability::init as init_observability;
