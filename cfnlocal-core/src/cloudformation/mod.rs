//! CloudFormation template model.
//!
//! Parses a stack template and extracts the resources that embed
//! `AWS::CloudFormation::Init` metadata, together with the canned
//! describe-stack-resource response each resource's container will serve.

use std::path::Path;

use serde_json::{json, Value};
use tracing::debug;

use crate::error::{CfnLocalError, Result};

/// Metadata key marking a resource as using cfn-init.
pub const CFN_INIT_KEY: &str = "AWS::CloudFormation::Init";

/// One resource declaration from a stack template.
///
/// Derived once at template load time and immutable thereafter. The
/// describe-stack-resource response is precomputed so the container launch
/// command can embed it verbatim.
#[derive(Debug, Clone)]
pub struct Resource {
    name: String,
    init: Option<Value>,
    describe_response: Option<String>,
}

impl Resource {
    /// Build a resource from its logical id and template body.
    pub fn new(name: impl Into<String>, body: &Value) -> Self {
        let name = name.into();
        let init = body
            .get("Metadata")
            .and_then(|m| m.get(CFN_INIT_KEY))
            .filter(|data| !data.is_null())
            .map(|data| json!({ CFN_INIT_KEY: data.clone() }));
        let describe_response = init.as_ref().map(describe_stack_resource_response);
        Self { name, init, describe_response }
    }

    /// Logical id of the resource.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `{"AWS::CloudFormation::Init": ...}` object, if the resource has one.
    pub fn init_metadata(&self) -> Option<&Value> {
        self.init.as_ref()
    }

    /// Serialized describe-stack-resource response embedding the init payload.
    ///
    /// `None` for resources without init metadata.
    pub fn describe_stack_resource_response(&self) -> Option<&str> {
        self.describe_response.as_deref()
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Render the DescribeStackResource response for one resource.
///
/// The shape mirrors what the CloudFormation control plane returns; cfn-init
/// only consumes `StackResourceDetail.Metadata`, which must be the init
/// payload as a JSON *string*, not a nested object.
fn describe_stack_resource_response(init: &Value) -> String {
    json!({
        "DescribeStackResourceResponse": {
            "DescribeStackResourceResult": {
                "StackResourceDetail": {
                    "StackId": "STACK_ID_PLACEHOLDER",
                    "ResourceStatus": "CREATE_COMPLETE",
                    "DriftInformation": {
                        "StackResourceDriftStatus": "NOT_CHECKED"
                    },
                    "ResourceType": "RESOURCE_TYPE_PLACEHOLDER",
                    "LastUpdatedTimestamp": 1557817451.95397,
                    "StackName": "STACK_NAME_PLACEHOLDER",
                    "PhysicalResourceId": "PHYSICAL_RESOURCE_ID_PLACEHOLDER",
                    "Metadata": init.to_string(),
                    "LogicalResourceId": "LOGICAL_RESOURCE_ID_PLACEHOLDER"
                }
            }
        }
    })
    .to_string()
}

/// A parsed CloudFormation stack template.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    body: Value,
}

impl Template {
    /// Wrap an already-parsed template body.
    pub fn new(name: impl Into<String>, body: Value) -> Self {
        Self { name: name.into(), body }
    }

    /// Load a template from a JSON file.
    pub fn from_file(path: impl AsRef<Path>, name: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| CfnLocalError::TemplateRead { path: path.to_path_buf(), source: e })?;
        let body: Value = serde_json::from_str(&content).map_err(|e| {
            CfnLocalError::TemplateParse { path: path.to_path_buf(), reason: e.to_string() }
        })?;
        Ok(Self::new(name, body))
    }

    /// Stack name this template was loaded as.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw template body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Extract the resources that carry init metadata, in document order.
    pub fn resources_with_init(&self) -> Vec<Resource> {
        let mut resources = Vec::new();
        if let Some(declarations) = self.body.get("Resources").and_then(Value::as_object) {
            for (name, body) in declarations {
                let resource = Resource::new(name, body);
                if resource.init_metadata().is_some() {
                    resources.push(resource);
                } else {
                    debug!(resource = %name, "Resource has no cfn-init metadata, skipping");
                }
            }
        }
        resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn body_with_init() -> Value {
        json!({ "Metadata": { CFN_INIT_KEY: { "config": { "packages": {} } } } })
    }

    #[test]
    fn test_resource_name() {
        let resource = Resource::new("Web", &json!({}));
        assert_eq!(resource.name(), "Web");
    }

    #[test]
    fn test_resource_without_init_has_no_metadata_or_response() {
        let resource = Resource::new("Web", &json!({}));
        assert!(resource.init_metadata().is_none());
        assert!(resource.describe_stack_resource_response().is_none());
    }

    #[test]
    fn test_null_init_payload_counts_as_absent() {
        let resource = Resource::new("Web", &json!({ "Metadata": { CFN_INIT_KEY: null } }));
        assert!(resource.init_metadata().is_none());
    }

    #[test]
    fn test_resource_with_init_exposes_wrapped_payload() {
        let resource = Resource::new("Web", &body_with_init());
        let init = resource.init_metadata().unwrap();
        assert_eq!(init, &json!({ CFN_INIT_KEY: { "config": { "packages": {} } } }));
    }

    #[test]
    fn test_describe_response_embeds_stringified_init_payload() {
        let resource = Resource::new("Web", &body_with_init());
        let response: Value =
            serde_json::from_str(resource.describe_stack_resource_response().unwrap()).unwrap();
        let detail = &response["DescribeStackResourceResponse"]["DescribeStackResourceResult"]
            ["StackResourceDetail"];
        assert_eq!(detail["ResourceStatus"], "CREATE_COMPLETE");
        assert_eq!(detail["DriftInformation"]["StackResourceDriftStatus"], "NOT_CHECKED");

        // Metadata is the init payload serialized to a string
        let embedded: Value = serde_json::from_str(detail["Metadata"].as_str().unwrap()).unwrap();
        assert_eq!(embedded, *resource.init_metadata().unwrap());
    }

    #[test]
    fn test_resources_with_init_filters_resources_without_metadata() {
        let template = Template::new(
            "stack",
            json!({
                "Resources": {
                    "WithInit": body_with_init(),
                    "WithoutInit": {}
                }
            }),
        );
        let resources = template.resources_with_init();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].name(), "WithInit");
    }

    #[test]
    fn test_resources_with_init_empty_when_none_match() {
        let template = Template::new("stack", json!({ "Resources": { "Plain": {} } }));
        assert!(template.resources_with_init().is_empty());
    }

    #[test]
    fn test_resources_with_init_tolerates_missing_resources_section() {
        let template = Template::new("stack", json!({}));
        assert!(template.resources_with_init().is_empty());
    }

    #[test]
    fn test_resources_with_init_preserves_document_order() {
        let template = Template::new(
            "stack",
            json!({
                "Resources": {
                    "Zebra": body_with_init(),
                    "Alpha": body_with_init(),
                    "Mid": body_with_init()
                }
            }),
        );
        let names: Vec<_> =
            template.resources_with_init().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, vec!["Zebra", "Alpha", "Mid"]);
    }

    #[test]
    fn test_from_file_reads_template() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Resources": {{"Web": {{}}}}}}"#).unwrap();
        let template = Template::from_file(file.path(), "stack").unwrap();
        assert_eq!(template.name(), "stack");
        assert!(template.body().get("Resources").is_some());
    }

    #[test]
    fn test_from_file_missing_file_is_an_error() {
        let err = Template::from_file("/nonexistent/template.json", "stack").unwrap_err();
        assert!(matches!(err, CfnLocalError::TemplateRead { .. }));
    }

    #[test]
    fn test_from_file_invalid_json_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = Template::from_file(file.path(), "stack").unwrap_err();
        assert!(matches!(err, CfnLocalError::TemplateParse { .. }));
    }
}
