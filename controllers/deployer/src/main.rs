//! Deployer
//!
//! One-shot reconciler for an application's `Deployment` and `Service`:
//! - `deployer version`: prints the API server version
//! - `deployer deploy`: creates or updates the compiled-in application
//!
//! Connection parameters come from the environment (`SERVER`, `TOKEN`,
//! `CA_FILE`, `NAMESPACE`). Any failure is logged and ends the process with a
//! non-zero exit status.

mod builder;
mod config;
mod error;
mod operation;
mod reconcile_helpers;
mod reconcile_helpers_test;
mod reconciler;
mod reporter;
mod test_utils;

use crate::config::{CA_FILE_ENV_VAR, ConnectionConfig, SERVER_ENV_VAR, TOKEN_ENV_VAR};
use crate::error::ControllerError;
use crate::operation::{Cli, Operation};
use crate::reconciler::Reconciler;
use crate::reporter::TracingReporter;
use anyhow::Context;
use clap::Parser;
use cluster_client::{ClientError, KubeClusterClient};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Usage errors exit here, before any configuration is read
    let cli = Cli::parse();

    // No timestamps: output is meant to be read as a one-shot report
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .without_time()
        .init();

    match run(Operation::from(cli.operation)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(operation: Operation) -> anyhow::Result<()> {
    let config = ConnectionConfig::from_env();

    info!("Configuration:");
    info!("  Server: {}", config.server);
    info!("  Namespace: {}", config.namespace);
    info!("  CA file: {}", config.ca_file.as_deref().map_or_else(|| "none".to_string(), |p| p.display().to_string()));

    let kube_config = config
        .to_kube_config()
        .context("failed to parse configuration parameters")?;
    let client = KubeClusterClient::try_from_config(kube_config)
        .context("could not connect to Kubernetes API")?;

    let reconciler = Reconciler::new(
        Box::new(client),
        config.namespace.clone(),
        Box::new(TracingReporter),
    );

    operation
        .run(&reconciler)
        .await
        .inspect_err(|e| log_connectivity_hint(e, &config))?;

    Ok(())
}

fn log_connectivity_hint(err: &ControllerError, config: &ConnectionConfig) {
    if let Some(ClientError::Connectivity(_)) = err.client_error() {
        error!("Could not reach the API server. Please ensure:");
        error!("  1. {} ({}) is reachable", SERVER_ENV_VAR, config.server);
        error!("  2. {} and {} are valid for that server", TOKEN_ENV_VAR, CA_FILE_ENV_VAR);
    }
}
