//! Reconciliation logic for an application's Deployment and Service.
//!
//! The two kinds are sequenced differently on purpose:
//! - a `Deployment` is fully specified by the client, so it is updated
//!   directly and created only if the update reports NotFound
//! - a `Service` carries a version token and an allocated cluster IP that
//!   belong to the server, so it is always fetched first and those fields
//!   are echoed back in the update
//!
//! Every API call is awaited before the next one is issued, and each
//! resource is reconciled at most once per call. There is no retry.

use crate::builder::{AppParams, build_deployment, build_service};
use crate::error::ControllerError;
use crate::reconcile_helpers::{
    DEPLOYMENT_MESSAGES, SERVICE_MESSAGES, SERVICE_PRESERVE_RULES, get_merge_update_or_create,
    update_or_create,
};
use crate::reporter::{ReconcileOutcome, Reporter};
use cluster_client::{ClusterClientTrait, ServerVersion};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use tracing::{debug, info};

/// What `deploy` did to each object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployReport {
    pub deployment: ReconcileOutcome,
    pub service: ReconcileOutcome,
}

/// Reconciles an application's resources in one namespace.
pub struct Reconciler {
    client: Box<dyn ClusterClientTrait>,
    namespace: String,
    reporter: Box<dyn Reporter>,
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(
        client: Box<dyn ClusterClientTrait>,
        namespace: impl Into<String>,
        reporter: Box<dyn Reporter>,
    ) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            reporter,
        }
    }

    /// Namespace the reconciler writes to
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Reconciles the workload controller.
    ///
    /// This method:
    /// 1. Updates the deployment
    /// 2. On NotFound, creates it instead
    ///
    /// Any other update error is returned without attempting a create.
    pub async fn reconcile_workload(
        &self,
        desired: &Deployment,
    ) -> Result<ReconcileOutcome, ControllerError> {
        let name = desired.name_any();
        let api = self.client.deployments(&self.namespace);
        let reconciled = update_or_create(api.as_ref(), desired, &DEPLOYMENT_MESSAGES)
            .await
            .inspect_err(|e| self.reporter.failed(DEPLOYMENT_MESSAGES.kind, &name, e))?;
        debug!(
            "deployment {}/{} stored at resourceVersion {:?}",
            self.namespace, name, reconciled.object.metadata.resource_version
        );
        self.reporter.reconciled(DEPLOYMENT_MESSAGES.kind, &name, reconciled.outcome);
        Ok(reconciled.outcome)
    }

    /// Reconciles the endpoint.
    ///
    /// This method:
    /// 1. Fetches the live service
    /// 2. If found, copies its resourceVersion and cluster IP into `desired`
    ///    and updates
    /// 3. On NotFound, creates `desired` as built (the server assigns both)
    ///
    /// Any other get error is returned without attempting a create or update.
    pub async fn reconcile_endpoint(
        &self,
        desired: Service,
    ) -> Result<ReconcileOutcome, ControllerError> {
        let name = desired.name_any();
        let api = self.client.services(&self.namespace);
        let reconciled =
            get_merge_update_or_create(api.as_ref(), desired, SERVICE_PRESERVE_RULES, &SERVICE_MESSAGES)
                .await
                .inspect_err(|e| self.reporter.failed(SERVICE_MESSAGES.kind, &name, e))?;
        debug!(
            "service {}/{} stored at resourceVersion {:?}, clusterIP {:?}",
            self.namespace,
            name,
            reconciled.object.metadata.resource_version,
            reconciled.object.spec.as_ref().and_then(|s| s.cluster_ip.as_deref())
        );
        self.reporter.reconciled(SERVICE_MESSAGES.kind, &name, reconciled.outcome);
        Ok(reconciled.outcome)
    }

    /// Builds and reconciles the deployment, then the service.
    ///
    /// Stops at the first failure; the service is not touched if the
    /// deployment could not be reconciled.
    pub async fn deploy(&self, params: &AppParams) -> Result<DeployReport, ControllerError> {
        info!(
            "Deploying {} ({}, port {}) to namespace {}",
            params.name, params.image, params.port, self.namespace
        );

        let deployment = self.reconcile_workload(&build_deployment(params)).await?;
        let service = self.reconcile_endpoint(build_service(params)).await?;

        Ok(DeployReport { deployment, service })
    }

    /// Queries the API server version. A failure is returned as-is.
    pub async fn server_version(&self) -> Result<ServerVersion, ControllerError> {
        let version = self.client.server_version().await?;
        info!("server API version information: {}", version);
        Ok(version)
    }
}
