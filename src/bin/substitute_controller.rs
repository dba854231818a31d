// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
use anyhow::Result;
use clap::{Parser, Subcommand};
use substitute_controller::config::ControllerConfig;
use substitute_controller::controller_runtime::run_controller;
use substitute_controller::crds::export_crds;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "substitute-controller", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the custom resource definitions as YAML
    Export,
    /// Run the controller against the current kubeconfig context
    Run(ControllerConfig),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `export` output can be piped to kubectl.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Export => {
            print!("{}", export_crds()?);
        }
        Command::Run(config) => {
            info!("running substitute-controller");
            run_controller(config).await?;
        }
    }
    Ok(())
}
