//! The two endpoint implementations behind [`RequestHandler`].

use tracing::debug;

use crate::error::CfnLocalError;
use crate::http::{HttpResponse, RequestHandler};
use crate::metadata::MetadataNode;

/// Mock EC2 instance-metadata endpoint.
///
/// Owns its document exclusively; every GET resolves the request path against
/// it. See <https://docs.aws.amazon.com/AWSEC2/latest/UserGuide/ec2-instance-metadata.html>.
pub struct InstanceMetadataHandler {
    document: MetadataNode,
}

impl InstanceMetadataHandler {
    pub fn new(document: MetadataNode) -> Self {
        Self { document }
    }
}

impl RequestHandler for InstanceMetadataHandler {
    fn handle(&self, path: &str) -> HttpResponse {
        match self.document.resolve(path) {
            Ok(value) => HttpResponse::ok_text(value),
            Err(CfnLocalError::MetadataNotFound { path }) => {
                debug!(path = %path, "Metadata path not found");
                HttpResponse::not_found()
            }
            Err(e) => {
                debug!(path = %path, error = %e, "Metadata resolution failed");
                HttpResponse::not_found()
            }
        }
    }
}

/// Mock CloudFormation describe-stack-resource endpoint.
///
/// Serves one pre-serialized response for every GET, whatever the path.
/// cfn-init issues a fixed-shape query; nothing else ever talks to this
/// endpoint, so no routing is needed.
pub struct StackResourceHandler {
    payload: String,
}

impl StackResourceHandler {
    pub fn new(payload: impl Into<String>) -> Self {
        Self { payload: payload.into() }
    }
}

impl RequestHandler for StackResourceHandler {
    fn handle(&self, _path: &str) -> HttpResponse {
        HttpResponse::ok_json(self.payload.clone())
    }
}
