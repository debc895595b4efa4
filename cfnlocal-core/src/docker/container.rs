//! Container and pod value objects.

use std::sync::Arc;

use tracing::warn;

use crate::cloudformation::Resource;
use crate::docker::ContainerRuntime;
use crate::error::{CfnLocalError, Result};
use crate::paths::{CONTAINER_CFN_INIT_PATH, CONTAINER_SERVER_PATH};
use crate::ports::PORT_STACK_RESOURCE;

/// One container validating one resource's init metadata.
///
/// Created unbound; the orchestrator binds a runtime id on start. The id is
/// retained after stop so resume statements stay printable.
pub struct InitContainer {
    runtime: Arc<dyn ContainerRuntime>,
    image: String,
    launch_command: Vec<String>,
    stack_name: String,
    resource: Resource,
    id: Option<String>,
}

impl InitContainer {
    /// Build the container for one init-bearing resource.
    ///
    /// The launch command starts the bind-mounted `cfnlocald` in container
    /// mode, seeded with the resource's metadata document and its canned
    /// describe-stack-resource response.
    pub fn for_resource(
        runtime: Arc<dyn ContainerRuntime>,
        image: impl Into<String>,
        metadata_json: impl Into<String>,
        resource: Resource,
        stack_name: impl Into<String>,
    ) -> Result<Self> {
        let describe_response =
            resource.describe_stack_resource_response().ok_or_else(|| {
                CfnLocalError::Internal(format!(
                    "Resource '{}' has no cfn-init metadata",
                    resource.name()
                ))
            })?;
        let launch_command = vec![
            CONTAINER_SERVER_PATH.to_string(),
            "--metadata".to_string(),
            metadata_json.into(),
            "--cfn-resource".to_string(),
            describe_response.to_string(),
            "--container-mode".to_string(),
        ];
        Ok(Self {
            runtime,
            image: image.into(),
            launch_command,
            stack_name: stack_name.into(),
            resource,
            id: None,
        })
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn launch_command(&self) -> &[String] {
        &self.launch_command
    }

    /// Runtime id, once started.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Logical id of the resource this container validates.
    pub fn resource_name(&self) -> &str {
        self.resource.name()
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub(crate) fn bind(&mut self, id: String) {
        self.id = Some(id);
    }

    /// The cfn-init invocation run inside the container.
    fn cfn_init_command(&self) -> Vec<String> {
        vec![
            CONTAINER_CFN_INIT_PATH.to_string(),
            "-v".to_string(),
            "--stack".to_string(),
            self.stack_name.clone(),
            "--resource".to_string(),
            self.resource.name().to_string(),
            "--url".to_string(),
            format!("http://127.0.0.1:{}", PORT_STACK_RESOURCE),
        ]
    }

    /// Execute cfn-init inside the container, failing on non-zero exit.
    pub async fn run_cfn_init(&self) -> Result<String> {
        let id = self.id.as_deref().ok_or_else(|| CfnLocalError::ContainerNotStarted {
            resource: self.resource.name().to_string(),
        })?;
        let result = self.runtime.exec(id, &self.cfn_init_command()).await?;
        if result.exit_code != 0 {
            return Err(CfnLocalError::InitCommandFailed {
                resource: self.resource.name().to_string(),
                exit_code: result.exit_code,
                output: result.output,
            });
        }
        Ok(result.output)
    }

    /// Shell command an operator can run to reattach to this container.
    pub fn resume_statement(&self) -> Option<String> {
        self.id
            .as_deref()
            .map(|id| format!("docker start {} && docker exec -it {} bash", id, id))
    }

    /// Stop the container if it was ever started.
    pub async fn stop(&self) -> Result<()> {
        match self.id.as_deref() {
            Some(id) => self.runtime.stop(id).await,
            None => Ok(()),
        }
    }
}

impl std::fmt::Display for InitContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Container(id={}, stack={}, resource={})",
            self.id.as_deref().unwrap_or("<unstarted>"),
            self.stack_name,
            self.resource.name()
        )
    }
}

/// The set of containers belonging to one run, sharing a teardown scope.
///
/// Not a scheduling unit: its only job is to stop every container exactly
/// once when the run is over, whatever happened in between.
pub struct Pod {
    containers: Vec<InitContainer>,
    stopped: bool,
}

impl Pod {
    pub fn new(containers: Vec<InitContainer>) -> Self {
        Self { containers, stopped: false }
    }

    pub fn containers(&self) -> &[InitContainer] {
        &self.containers
    }

    pub fn add_container(&mut self, container: InitContainer) {
        self.containers.push(container);
    }

    /// Stop every container, best effort.
    ///
    /// Never-started containers are tolerated and a failed stop does not
    /// prevent the remaining containers from being stopped. Idempotent.
    pub async fn stop_all(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        for container in &self.containers {
            if let Err(e) = container.stop().await {
                warn!(
                    resource = container.resource_name(),
                    "Failed to stop container {}: {}",
                    container.id().unwrap_or("<unstarted>"),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::{ExecOutput, LaunchSpec};
    use async_trait::async_trait;
    use serde_json::json;

    struct NoopRuntime;

    #[async_trait]
    impl ContainerRuntime for NoopRuntime {
        async fn image_count(&self, _reference: &str) -> Result<usize> {
            Ok(1)
        }
        async fn run_container(&self, _spec: &LaunchSpec) -> Result<String> {
            Ok("noop".to_string())
        }
        async fn exec(&self, _container_id: &str, _command: &[String]) -> Result<ExecOutput> {
            Ok(ExecOutput { exit_code: 0, output: String::new() })
        }
        async fn stop(&self, _container_id: &str) -> Result<()> {
            Ok(())
        }
    }

    fn resource_with_init(name: &str) -> Resource {
        Resource::new(
            name,
            &json!({ "Metadata": { "AWS::CloudFormation::Init": { "config": {} } } }),
        )
    }

    fn container() -> InitContainer {
        InitContainer::for_resource(
            Arc::new(NoopRuntime),
            "image",
            r#"{"foo": "bar"}"#,
            resource_with_init("Web"),
            "stack",
        )
        .unwrap()
    }

    #[test]
    fn test_launch_command_starts_server_in_container_mode() {
        let container = container();
        let cmd = container.launch_command();
        assert_eq!(cmd[0], CONTAINER_SERVER_PATH);
        assert_eq!(cmd[1], "--metadata");
        assert_eq!(cmd[2], r#"{"foo": "bar"}"#);
        assert_eq!(cmd[3], "--cfn-resource");
        assert!(cmd[4].contains("DescribeStackResourceResponse"));
        assert_eq!(cmd[5], "--container-mode");
    }

    #[test]
    fn test_for_resource_rejects_resources_without_init() {
        let result = InitContainer::for_resource(
            Arc::new(NoopRuntime),
            "image",
            "{}",
            Resource::new("Plain", &json!({})),
            "stack",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_cfn_init_command_shape() {
        let mut container = container();
        container.bind("abc123".to_string());
        let cmd = container.cfn_init_command();
        assert_eq!(
            cmd,
            vec![
                "/opt/aws/bin/cfn-init",
                "-v",
                "--stack",
                "stack",
                "--resource",
                "Web",
                "--url",
                "http://127.0.0.1:5001",
            ]
        );
    }

    #[test]
    fn test_resume_statement_requires_started_container() {
        let mut container = container();
        assert!(container.resume_statement().is_none());
        container.bind("abc123".to_string());
        assert_eq!(
            container.resume_statement().unwrap(),
            "docker start abc123 && docker exec -it abc123 bash"
        );
    }

    #[tokio::test]
    async fn test_run_cfn_init_on_unstarted_container_is_an_error() {
        let err = container().run_cfn_init().await.unwrap_err();
        assert!(matches!(err, CfnLocalError::ContainerNotStarted { .. }));
    }

    #[tokio::test]
    async fn test_stop_on_unstarted_container_is_a_noop() {
        container().stop().await.unwrap();
    }

    struct CountingRuntime {
        stops: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ContainerRuntime for CountingRuntime {
        async fn image_count(&self, _reference: &str) -> Result<usize> {
            Ok(1)
        }
        async fn run_container(&self, _spec: &LaunchSpec) -> Result<String> {
            Ok("counted".to_string())
        }
        async fn exec(&self, _container_id: &str, _command: &[String]) -> Result<ExecOutput> {
            Ok(ExecOutput { exit_code: 0, output: String::new() })
        }
        async fn stop(&self, container_id: &str) -> Result<()> {
            self.stops.lock().unwrap().push(container_id.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_pod_stop_all_stops_each_started_container_exactly_once() {
        let runtime = Arc::new(CountingRuntime { stops: std::sync::Mutex::new(Vec::new()) });

        let mut started = InitContainer::for_resource(
            runtime.clone(),
            "image",
            "{}",
            resource_with_init("Started"),
            "stack",
        )
        .unwrap();
        started.bind("abc".to_string());
        let unstarted = InitContainer::for_resource(
            runtime.clone(),
            "image",
            "{}",
            resource_with_init("Unstarted"),
            "stack",
        )
        .unwrap();

        let mut pod = Pod::new(vec![started]);
        pod.add_container(unstarted);
        assert_eq!(pod.containers().len(), 2);

        pod.stop_all().await;
        pod.stop_all().await;

        assert_eq!(*runtime.stops.lock().unwrap(), vec!["abc".to_string()]);
    }
}
