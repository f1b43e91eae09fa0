//! Client traits for mocking
//!
//! These traits abstract the Kubernetes client so the reconciler can run
//! against `KubeClusterClient` in production and `MockClusterClient` in tests.

use crate::error::ClientError;
use crate::models::ServerVersion;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;

/// Get/Create/Update for one resource kind in one namespace
///
/// Every method returns the object as stored by the server.
/// All async methods must be `Send` to work with Tokio's runtime.
#[async_trait::async_trait]
pub trait ResourceClient<K>: Send + Sync {
    /// Namespace this handle is bound to
    fn namespace(&self) -> &str;

    /// Fetch an object by name
    async fn get(&self, name: &str) -> Result<K, ClientError>;

    /// Create a new object
    async fn create(&self, object: &K) -> Result<K, ClientError>;

    /// Replace an existing object (full update, not a patch)
    async fn update(&self, object: &K) -> Result<K, ClientError>;
}

/// Trait for cluster API operations
#[async_trait::async_trait]
pub trait ClusterClientTrait: Send + Sync {
    /// Deployment handle for `namespace`
    fn deployments(&self, namespace: &str) -> Box<dyn ResourceClient<Deployment>>;

    /// Service handle for `namespace`
    fn services(&self, namespace: &str) -> Box<dyn ResourceClient<Service>>;

    /// Query the discovery endpoint for the server version
    async fn server_version(&self) -> Result<ServerVersion, ClientError>;
}
