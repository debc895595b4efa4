use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use indexmap::IndexMap;

mod commands;

#[derive(Parser)]
#[command(name = "cfnlocal")]
#[command(about = "Validate AWS::CloudFormation::Init metadata in local containers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cfn-init twice per resource in throwaway containers
    Run {
        /// Stack name the template is loaded as
        #[arg(long)]
        template_name: String,

        /// Path to the CloudFormation template body (JSON)
        #[arg(long)]
        template_body: PathBuf,

        /// Image to launch for each resource (must exist locally)
        #[arg(long)]
        image: String,

        /// Per-resource metadata overrides (RESOURCE=PATH)
        #[arg(long = "metadata-path")]
        metadata_path: Vec<String>,

        /// Enable debug logging
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { template_name, template_body, image, metadata_path, verbose } => {
            // Parse metadata overrides
            let metadata_paths: IndexMap<String, PathBuf> = metadata_path
                .iter()
                .map(|entry| {
                    let parts: Vec<&str> = entry.splitn(2, '=').collect();
                    if parts.len() != 2 {
                        return Err(anyhow::anyhow!(
                            "Invalid metadata path format: {} (expected RESOURCE=PATH)",
                            entry
                        ));
                    }
                    Ok((parts[0].to_string(), PathBuf::from(parts[1])))
                })
                .collect::<Result<IndexMap<_, _>>>()?;

            commands::run(template_name, template_body, image, metadata_paths, verbose).await?;
        }
    }

    Ok(())
}
