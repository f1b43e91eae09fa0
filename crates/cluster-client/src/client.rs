//! Kubernetes API client
//!
//! Implements the facade traits on top of `kube::Client`.
//! Update maps to a full `PUT` (`Api::replace`), never a patch, so whatever
//! the caller submits is exactly what the server validates.

use crate::cluster_trait::{ClusterClientTrait, ResourceClient};
use crate::error::ClientError;
use crate::models::ServerVersion;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::api::{Api, PostParams};
use kube::{Client, Config, Resource};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::debug;

/// Kubernetes API client
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    /// Wrap an already connected `kube::Client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from an explicit configuration
    ///
    /// # Arguments
    /// * `config` - Cluster URL, credentials and CA roots
    pub fn try_from_config(config: Config) -> Result<Self, ClientError> {
        install_crypto_provider();
        let client = Client::try_from(config)?;
        Ok(Self::new(client))
    }
}

/// Install the ring provider as the process-wide rustls default
fn install_crypto_provider() {
    // Err only means another provider was installed first
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        debug!("rustls crypto provider already installed");
    }
}

#[async_trait::async_trait]
impl ClusterClientTrait for KubeClusterClient {
    fn deployments(&self, namespace: &str) -> Box<dyn ResourceClient<Deployment>> {
        Box::new(KubeResourceClient::namespaced(self.client.clone(), namespace))
    }

    fn services(&self, namespace: &str) -> Box<dyn ResourceClient<Service>> {
        Box::new(KubeResourceClient::namespaced(self.client.clone(), namespace))
    }

    async fn server_version(&self) -> Result<ServerVersion, ClientError> {
        debug!("Querying API server version");
        let info = self.client.apiserver_version().await?;
        Ok(ServerVersion::from(info))
    }
}

/// Namespaced handle for a single resource kind
pub struct KubeResourceClient<K> {
    api: Api<K>,
    namespace: String,
}

impl<K> KubeResourceClient<K>
where
    K: Resource<Scope = NamespaceResourceScope>,
    <K as Resource>::DynamicType: Default,
{
    /// Bind a handle to `namespace`
    pub fn namespaced(client: Client, namespace: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl<K> ResourceClient<K> for KubeResourceClient<K>
where
    K: Resource + Clone + Debug + DeserializeOwned + Serialize + Send + Sync + 'static,
{
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get(&self, name: &str) -> Result<K, ClientError> {
        debug!("GET {}/{}", self.namespace, name);
        Ok(self.api.get(name).await?)
    }

    async fn create(&self, object: &K) -> Result<K, ClientError> {
        debug!("POST {}/{}", self.namespace, object.meta().name.as_deref().unwrap_or_default());
        Ok(self.api.create(&PostParams::default(), object).await?)
    }

    async fn update(&self, object: &K) -> Result<K, ClientError> {
        let name = object
            .meta()
            .name
            .as_deref()
            .ok_or_else(|| ClientError::Invalid("metadata.name is required for update".to_string()))?;
        debug!("PUT {}/{}", self.namespace, name);
        Ok(self.api.replace(name, &PostParams::default(), object).await?)
    }
}
