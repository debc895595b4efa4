//! `cfnlocald` — the mock AWS endpoint server.
//!
//! Launched by the orchestrator as every container's entry process, seeded
//! with one resource's metadata document and describe-stack-resource blob.
//! Also runnable on the host for poking at the endpoints directly.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cfnlocal_core::http::{HttpServer, InstanceMetadataHandler, StackResourceHandler};
use cfnlocal_core::metadata::MetadataNode;
use cfnlocal_core::ports::{
    PORT_INSTANCE_METADATA, PORT_INSTANCE_METADATA_CONTAINER, PORT_STACK_RESOURCE,
};

mod route;
mod shutdown;

#[derive(Parser)]
#[command(name = "cfnlocald")]
#[command(about = "Mock EC2 instance-metadata and CloudFormation describe-stack-resource server", long_about = None)]
struct Args {
    /// Instance-metadata document (JSON)
    #[arg(long)]
    metadata: Option<String>,

    /// Canned describe-stack-resource response (JSON)
    #[arg(long)]
    cfn_resource: Option<String>,

    /// Bind the metadata endpoint to port 80 and reroute 169.254.169.254 to localhost
    #[arg(long)]
    container_mode: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    cfnlocal_core::init_observability(false);
    let args = Args::parse();

    let metadata_port = if args.container_mode {
        route::mock_metadata_route().await;
        PORT_INSTANCE_METADATA_CONTAINER
    } else {
        PORT_INSTANCE_METADATA
    };

    let mut servers: Vec<Arc<HttpServer>> = Vec::new();
    if let Some(metadata) = args.metadata.as_deref() {
        let document = MetadataNode::from_json(metadata)?;
        servers.push(Arc::new(HttpServer::new(
            "instance-metadata",
            metadata_port,
            InstanceMetadataHandler::new(document),
        )));
    }
    if let Some(payload) = args.cfn_resource {
        servers.push(Arc::new(HttpServer::new(
            "stack-resource",
            PORT_STACK_RESOURCE,
            StackResourceHandler::new(payload),
        )));
    }
    if servers.is_empty() {
        info!("No documents supplied, nothing to serve");
        return Ok(());
    }

    for server in &servers {
        server.serve().await?;
    }

    // One signal (SIGTERM or ctrl-c) shuts down every listener
    let mut signal_rx = shutdown::shutdown_signal();
    let targets = servers.clone();
    tokio::spawn(async move {
        let _ = signal_rx.recv().await;
        for server in &targets {
            server.shutdown().await;
        }
    });

    info!("Waiting for servers to finish");
    for server in &servers {
        server.wait().await;
    }

    info!("Completed. Exiting...");
    Ok(())
}
