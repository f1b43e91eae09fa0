//! Outcome reporting.
//!
//! The reconciler reports what it did through a [`Reporter`] handed to it at
//! construction instead of writing to a global logger, so tests can capture
//! outcomes per reconciler.

use crate::error::ControllerError;
use std::fmt;
#[cfg(test)]
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

/// What one reconciliation did to the remote object.
///
/// Failures are the `Err` side of the reconcile result, never an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created,
    Updated,
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Updated => f.write_str("updated"),
        }
    }
}

/// Receives one event per reconciliation, successful or not.
///
/// A failure is reported here before the error is returned to the caller.
pub trait Reporter: Send + Sync {
    /// `kind` is a human label such as "deployment controller" or "service"
    fn reconciled(&self, kind: &str, name: &str, outcome: ReconcileOutcome);

    /// The reconciliation of `name` stopped with `error`
    fn failed(&self, kind: &str, name: &str, error: &ControllerError);
}

/// Logs outcomes through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn reconciled(&self, kind: &str, name: &str, outcome: ReconcileOutcome) {
        info!(name, "{} {}", kind, outcome);
    }

    fn failed(&self, kind: &str, name: &str, error: &ControllerError) {
        warn!(name, "{} not reconciled: {}", kind, error);
    }
}

/// Keeps outcomes in memory
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<(String, String, ReconcileOutcome)>>>,
    failures: Arc<Mutex<Vec<(String, String, String)>>>,
}

#[cfg(test)]
impl RecordingReporter {
    /// `(kind, name, outcome)` in the order they were reported
    pub fn events(&self) -> Vec<(String, String, ReconcileOutcome)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `(kind, name, error message)` in the order they were reported
    pub fn failures(&self) -> Vec<(String, String, String)> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
impl Reporter for RecordingReporter {
    fn reconciled(&self, kind: &str, name: &str, outcome: ReconcileOutcome) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind.to_string(), name.to_string(), outcome));
    }

    fn failed(&self, kind: &str, name: &str, error: &ControllerError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind.to_string(), name.to_string(), error.to_string()));
    }
}
