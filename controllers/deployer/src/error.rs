//! Controller-specific error types.
//!
//! This module defines error types specific to the deployer that are not
//! covered by the cluster client's own errors.

use cluster_client::ClientError;
use thiserror::Error;

/// Errors that can occur in the deployer.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Cluster API error outside of a reconciliation step
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Invalid connection configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A reconciliation step failed; `action` says which one.
    /// The client error is part of the message, not a separate cause.
    #[error("{action} {name}: {error}")]
    Reconcile {
        action: &'static str,
        name: String,
        error: ClientError,
    },
}

impl ControllerError {
    /// Wrap a client error from a reconciliation step
    pub fn reconcile(action: &'static str, name: &str, error: ClientError) -> Self {
        Self::Reconcile {
            action,
            name: name.to_string(),
            error,
        }
    }

    /// The underlying client error, if any
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            Self::Client(e) | Self::Reconcile { error: e, .. } => Some(e),
            Self::InvalidConfig(_) => None,
        }
    }
}
