//! Desired-state builder.
//!
//! Turns an application's name, image and port into the `Deployment` and
//! `Service` objects submitted to the API server. Everything besides those
//! inputs is fixed policy, defined by the constants below.
//!
//! The pod-template labels, the deployment selector and the service selector
//! all come from [`app_labels`]; if they ever diverged, the service would
//! silently stop routing traffic to the pods.

use crate::error::ControllerError;
use k8s_openapi::api::apps::v1::{
    Deployment, DeploymentSpec, DeploymentStrategy, RollingUpdateDeployment,
};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, PodSpec, PodTemplateSpec, ResourceRequirements, Service,
    ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;
use std::num::NonZeroU16;

/// Label key linking the service selector to the workload's pods
pub const APP_LABEL: &str = "app";

/// Port the service exposes inside the cluster
pub const SERVICE_PORT: i32 = 80;

/// Replica count when none is given
pub const DEFAULT_REPLICAS: i32 = 1;

/// CPU limit for the application container
pub const CPU_LIMIT: &str = "100m";

/// Memory limit for the application container
pub const MEMORY_LIMIT: &str = "256Mi";

/// Rolling update never takes a pod down before its replacement is ready
pub const MAX_UNAVAILABLE: i32 = 0;

/// Rolling update adds at most one extra pod at a time
pub const MAX_SURGE: i32 = 1;

/// Old ReplicaSets kept for rollback
pub const REVISION_HISTORY_LIMIT: i32 = 10;

/// Compiled-in application deployed by the `deploy` operation
pub const DEFAULT_APP_NAME: &str = "nginx";
pub const DEFAULT_IMAGE: &str = "nginx:latest";
pub const DEFAULT_PORT: NonZeroU16 = match NonZeroU16::new(8080) {
    Some(port) => port,
    None => unreachable!(),
};

/// Inputs for one application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppParams {
    /// Name of both objects, and value of the `app` label
    pub name: String,
    /// Container image reference
    pub image: String,
    /// Port the container listens on
    pub port: NonZeroU16,
    /// Always within `0..=i32::MAX`, see [`AppParams::with_replicas`]
    replicas: i32,
}

impl AppParams {
    /// Parameters with the default replica count
    pub fn new(name: impl Into<String>, image: impl Into<String>, port: NonZeroU16) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            port,
            replicas: DEFAULT_REPLICAS,
        }
    }

    /// Same parameters with a different replica count.
    ///
    /// Counts the API cannot represent (above `i32::MAX`) are rejected rather
    /// than clamped.
    pub fn with_replicas(mut self, replicas: u32) -> Result<Self, ControllerError> {
        self.replicas = i32::try_from(replicas).map_err(|_| {
            ControllerError::InvalidConfig(format!(
                "replica count {replicas} exceeds the maximum of {}",
                i32::MAX
            ))
        })?;
        Ok(self)
    }

    /// Replica count submitted in the deployment spec
    pub fn replicas(&self) -> i32 {
        self.replicas
    }
}

impl Default for AppParams {
    fn default() -> Self {
        Self::new(DEFAULT_APP_NAME, DEFAULT_IMAGE, DEFAULT_PORT)
    }
}

/// `{app: name}`, the single source of the selector and pod labels
pub fn app_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(APP_LABEL.to_string(), name.to_string())])
}

/// Build the desired `Deployment`
pub fn build_deployment(params: &AppParams) -> Deployment {
    let labels = app_labels(&params.name);
    let limits = BTreeMap::from([
        ("cpu".to_string(), Quantity(CPU_LIMIT.to_string())),
        ("memory".to_string(), Quantity(MEMORY_LIMIT.to_string())),
    ]);

    Deployment {
        metadata: ObjectMeta {
            name: Some(params.name.clone()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(params.replicas),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            strategy: Some(DeploymentStrategy {
                type_: Some("RollingUpdate".to_string()),
                rolling_update: Some(RollingUpdateDeployment {
                    max_unavailable: Some(IntOrString::Int(MAX_UNAVAILABLE)),
                    max_surge: Some(IntOrString::Int(MAX_SURGE)),
                }),
            }),
            revision_history_limit: Some(REVISION_HISTORY_LIMIT),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    name: Some(params.name.clone()),
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: params.name.clone(),
                        image: Some(params.image.clone()),
                        ports: Some(vec![ContainerPort {
                            container_port: i32::from(params.port.get()),
                            protocol: Some("TCP".to_string()),
                            ..Default::default()
                        }]),
                        resources: Some(ResourceRequirements {
                            limits: Some(limits),
                            ..Default::default()
                        }),
                        image_pull_policy: Some("IfNotPresent".to_string()),
                        ..Default::default()
                    }],
                    restart_policy: Some("Always".to_string()),
                    dns_policy: Some("ClusterFirst".to_string()),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Build the desired `Service`
///
/// Leaves `resourceVersion` and `clusterIP` unset; both are server-assigned
/// and get merged in from the live object before an update.
pub fn build_service(params: &AppParams) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(params.name.clone()),
            labels: Some(app_labels(&params.name)),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            selector: Some(app_labels(&params.name)),
            ports: Some(vec![ServicePort {
                protocol: Some("TCP".to_string()),
                port: SERVICE_PORT,
                target_port: Some(IntOrString::Int(i32::from(params.port.get()))),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}
