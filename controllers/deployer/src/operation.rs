//! Operation dispatch.
//!
//! The CLI names an operation; [`Operation`] is the closed set of things the
//! deployer can do, each carrying only the data it needs.

use crate::builder::AppParams;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use clap::{Parser, ValueEnum};
use tracing::info;

/// Command line
#[derive(Debug, Parser)]
#[command(name = "deployer", version, about = "Reconcile an application Deployment and Service")]
pub struct Cli {
    /// Operation to run
    #[arg(value_enum)]
    pub operation: OperationName,
}

/// Operation names accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OperationName {
    /// Print the API server version
    Version,
    /// Create or update the compiled-in application
    Deploy,
}

/// An operation ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Version,
    Deploy(AppParams),
}

impl From<OperationName> for Operation {
    fn from(name: OperationName) -> Self {
        match name {
            OperationName::Version => Self::Version,
            OperationName::Deploy => Self::Deploy(AppParams::default()),
        }
    }
}

impl Operation {
    /// Run the operation to completion
    pub async fn run(&self, reconciler: &Reconciler) -> Result<(), ControllerError> {
        match self {
            Self::Version => {
                reconciler.server_version().await?;
            }
            Self::Deploy(params) => {
                let report = reconciler.deploy(params).await?;
                info!(
                    "{} reconciled in {}: deployment {}, service {}",
                    params.name,
                    reconciler.namespace(),
                    report.deployment,
                    report.service
                );
            }
        }
        Ok(())
    }
}
