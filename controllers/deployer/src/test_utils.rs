//! Test utilities for unit testing reconcilers
//!
//! This module provides helpers for creating test data and setting up test scenarios.

#[cfg(test)]
use crate::builder::AppParams;
#[cfg(test)]
use crate::reconciler::Reconciler;
#[cfg(test)]
use crate::reporter::RecordingReporter;
#[cfg(test)]
use cluster_client::{MockClusterClient, RecordedCall, ResourceKind, Verb};
#[cfg(test)]
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
#[cfg(test)]
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
#[cfg(test)]
use std::num::NonZeroU16;

/// Helper to create a reconciler backed by `mock`, with a recording reporter
#[cfg(test)]
pub fn create_test_reconciler(
    mock: &MockClusterClient,
    namespace: &str,
) -> (Reconciler, RecordingReporter) {
    let reporter = RecordingReporter::default();
    let reconciler = Reconciler::new(Box::new(mock.clone()), namespace, Box::new(reporter.clone()));
    (reconciler, reporter)
}

/// Helper to create the parameters `deploy` uses
#[cfg(test)]
pub fn nginx_params() -> AppParams {
    AppParams::new("nginx", "nginx:latest", NonZeroU16::new(8080).unwrap())
}

/// Helper to create a live Service as the server would hold it
#[cfg(test)]
pub fn create_test_service(name: &str, resource_version: &str, cluster_ip: &str) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            resource_version: Some(resource_version.to_string()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            cluster_ip: Some(cluster_ip.to_string()),
            cluster_ips: Some(vec![cluster_ip.to_string()]),
            ports: Some(vec![ServicePort {
                port: 80,
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Recorded calls matching `kind` and `verb`
#[cfg(test)]
pub fn calls_of(mock: &MockClusterClient, kind: ResourceKind, verb: Verb) -> Vec<RecordedCall> {
    mock.calls_for(kind)
        .into_iter()
        .filter(|c| c.verb == verb)
        .collect()
}

/// (kind, verb) of every recorded call, in order
#[cfg(test)]
pub fn call_sequence(mock: &MockClusterClient) -> Vec<(ResourceKind, Verb)> {
    mock.calls().into_iter().map(|c| (c.kind, c.verb)).collect()
}
