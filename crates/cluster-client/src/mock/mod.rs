//! Mock cluster client for unit testing
//!
//! This module provides a stateful, in-memory stand-in for the Kubernetes API
//! that implements `ClusterClientTrait`. It enforces the server behaviours the
//! reconciler depends on and records every call it receives.
//!
//! The mock is organized by API group:
//! - `apps_v1.rs` - Deployments
//! - `core_v1.rs` - Services (cluster IP allocation and immutability)

mod apps_v1;
mod core_v1;

use crate::cluster_trait::{ClusterClientTrait, ResourceClient};
use crate::error::ClientError;
use crate::models::ServerVersion;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::Resource;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Resource kinds the mock serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Deployment,
    Service,
    /// The `/version` endpoint
    Discovery,
}

/// API verbs the mock records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Create,
    Update,
}

/// One request received by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub kind: ResourceKind,
    pub verb: Verb,
    pub namespace: String,
    pub name: String,
    /// Request body as submitted (Create and Update only)
    pub body: Option<serde_json::Value>,
}

type ObjectKey = (String, String);

#[derive(Debug)]
pub(crate) struct MockState {
    pub(crate) deployments: HashMap<ObjectKey, Deployment>,
    pub(crate) services: HashMap<ObjectKey, Service>,
    calls: Vec<RecordedCall>,
    failures: HashMap<(ResourceKind, Verb), VecDeque<ClientError>>,
    next_resource_version: u64,
    pub(crate) next_cluster_ip: u32,
    server_version: ServerVersion,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            deployments: HashMap::new(),
            services: HashMap::new(),
            calls: Vec::new(),
            failures: HashMap::new(),
            next_resource_version: 1,
            next_cluster_ip: 1,
            server_version: ServerVersion {
                major: "1".to_string(),
                minor: "30".to_string(),
                git_version: "v1.30.0".to_string(),
                platform: "linux/amd64".to_string(),
            },
        }
    }
}

impl MockState {
    fn next_resource_version(&mut self) -> String {
        let current = self.next_resource_version;
        self.next_resource_version += 1;
        current.to_string()
    }

    /// Keep generated versions ahead of any version seeded by a test
    fn observe_resource_version(&mut self, resource_version: Option<&str>) {
        if let Some(seen) = resource_version.and_then(|v| v.parse::<u64>().ok()) {
            self.next_resource_version = self.next_resource_version.max(seen + 1);
        }
    }

    fn take_failure(&mut self, kind: ResourceKind, verb: Verb) -> Option<ClientError> {
        self.failures.get_mut(&(kind, verb)).and_then(VecDeque::pop_front)
    }
}

/// Per-kind storage and server-side rules
pub(crate) trait MockStored: Resource + Clone + Serialize + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn store(state: &mut MockState) -> &mut HashMap<ObjectKey, Self>;

    /// Server-assigned fields set on create
    fn on_create(_state: &mut MockState, _object: &mut Self) {}

    /// Reject updates the real server would reject
    fn validate_update(_existing: &Self, _update: &Self) -> Result<(), ClientError> {
        Ok(())
    }
}

/// Mock cluster client for testing
///
/// Clones share the same in-memory server, so a test can keep one handle for
/// assertions and hand another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct MockClusterClient {
    state: Arc<Mutex<MockState>>,
}

impl MockClusterClient {
    /// Create an empty mock server
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a deployment to the mock store as-is (for test setup)
    pub fn add_deployment(&self, namespace: &str, deployment: Deployment) {
        self.seed(namespace, deployment);
    }

    /// Add a service to the mock store as-is (for test setup)
    pub fn add_service(&self, namespace: &str, service: Service) {
        self.seed(namespace, service);
    }

    fn seed<K: MockStored>(&self, namespace: &str, object: K) {
        let mut state = self.lock();
        state.observe_resource_version(object.meta().resource_version.as_deref());
        let name = object.meta().name.clone().unwrap_or_default();
        K::store(&mut state).insert((namespace.to_string(), name), object);
    }

    /// Stored deployment, if any
    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        self.lock().deployments.get(&(namespace.to_string(), name.to_string())).cloned()
    }

    /// Stored service, if any
    pub fn service(&self, namespace: &str, name: &str) -> Option<Service> {
        self.lock().services.get(&(namespace.to_string(), name.to_string())).cloned()
    }

    /// Fail the next `verb` on `kind` with `error` (one-shot, queued in order)
    pub fn fail_next(&self, kind: ResourceKind, verb: Verb, error: ClientError) {
        self.lock().failures.entry((kind, verb)).or_default().push_back(error);
    }

    /// Override the version reported by the discovery endpoint
    pub fn set_server_version(&self, version: ServerVersion) {
        self.lock().server_version = version;
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Calls received for one kind, in order
    pub fn calls_for(&self, kind: ResourceKind) -> Vec<RecordedCall> {
        self.lock().calls.iter().filter(|c| c.kind == kind).cloned().collect()
    }

    /// Forget recorded calls (stored objects are kept)
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn handle<K>(&self, namespace: &str) -> Box<MockResourceClient<K>> {
        Box::new(MockResourceClient {
            state: Arc::clone(&self.state),
            namespace: namespace.to_string(),
            _kind: PhantomData,
        })
    }
}

#[async_trait::async_trait]
impl ClusterClientTrait for MockClusterClient {
    fn deployments(&self, namespace: &str) -> Box<dyn ResourceClient<Deployment>> {
        self.handle::<Deployment>(namespace)
    }

    fn services(&self, namespace: &str) -> Box<dyn ResourceClient<Service>> {
        self.handle::<Service>(namespace)
    }

    async fn server_version(&self) -> Result<ServerVersion, ClientError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            kind: ResourceKind::Discovery,
            verb: Verb::Get,
            namespace: String::new(),
            name: "version".to_string(),
            body: None,
        });
        if let Some(err) = state.take_failure(ResourceKind::Discovery, Verb::Get) {
            return Err(err);
        }
        Ok(state.server_version.clone())
    }
}

/// Namespaced mock handle for one kind
pub struct MockResourceClient<K> {
    state: Arc<Mutex<MockState>>,
    namespace: String,
    _kind: PhantomData<fn() -> K>,
}

impl<K: MockStored> MockResourceClient<K> {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, state: &mut MockState, verb: Verb, name: &str, body: Option<&K>) {
        state.calls.push(RecordedCall {
            kind: K::KIND,
            verb,
            namespace: self.namespace.clone(),
            name: name.to_string(),
            body: body.and_then(|b| serde_json::to_value(b).ok()),
        });
    }

    fn key(&self, name: &str) -> ObjectKey {
        (self.namespace.clone(), name.to_string())
    }
}

fn object_name<K: Resource>(object: &K) -> Result<String, ClientError> {
    object
        .meta()
        .name
        .clone()
        .ok_or_else(|| ClientError::Invalid("metadata.name: Required value".to_string()))
}

fn not_found(kind: ResourceKind, name: &str) -> ClientError {
    ClientError::NotFound(format!("{kind:?} \"{name}\" not found"))
}

#[async_trait::async_trait]
impl<K: MockStored> ResourceClient<K> for MockResourceClient<K> {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get(&self, name: &str) -> Result<K, ClientError> {
        let mut state = self.lock();
        self.record(&mut state, Verb::Get, name, None);
        if let Some(err) = state.take_failure(K::KIND, Verb::Get) {
            return Err(err);
        }
        K::store(&mut state)
            .get(&self.key(name))
            .cloned()
            .ok_or_else(|| not_found(K::KIND, name))
    }

    async fn create(&self, object: &K) -> Result<K, ClientError> {
        let mut state = self.lock();
        let name = object.meta().name.clone().unwrap_or_default();
        self.record(&mut state, Verb::Create, &name, Some(object));
        if let Some(err) = state.take_failure(K::KIND, Verb::Create) {
            return Err(err);
        }
        let name = object_name(object)?;
        if K::store(&mut state).contains_key(&self.key(&name)) {
            return Err(ClientError::Conflict(format!("{:?} \"{name}\" already exists", K::KIND)));
        }

        let mut stored = object.clone();
        stored.meta_mut().namespace = Some(self.namespace.clone());
        stored.meta_mut().resource_version = Some(state.next_resource_version());
        K::on_create(&mut state, &mut stored);
        K::store(&mut state).insert(self.key(&name), stored.clone());
        Ok(stored)
    }

    async fn update(&self, object: &K) -> Result<K, ClientError> {
        let mut state = self.lock();
        let name = object.meta().name.clone().unwrap_or_default();
        self.record(&mut state, Verb::Update, &name, Some(object));
        if let Some(err) = state.take_failure(K::KIND, Verb::Update) {
            return Err(err);
        }
        let name = object_name(object)?;
        let existing = K::store(&mut state)
            .get(&self.key(&name))
            .cloned()
            .ok_or_else(|| not_found(K::KIND, &name))?;

        // An empty version token means an unconditional update
        if let Some(submitted) = object.meta().resource_version.as_deref() {
            if Some(submitted) != existing.meta().resource_version.as_deref() {
                return Err(ClientError::Conflict(format!(
                    "Operation cannot be fulfilled on {:?} \"{name}\": the object has been modified; \
                     please apply your changes to the latest version and try again",
                    K::KIND
                )));
            }
        }
        K::validate_update(&existing, object)?;

        let mut stored = object.clone();
        stored.meta_mut().namespace = Some(self.namespace.clone());
        stored.meta_mut().resource_version = existing.meta().resource_version.clone();

        // No-op writes keep the stored object and its version untouched
        let unchanged = serde_json::to_value(&stored).ok() == serde_json::to_value(&existing).ok();
        if unchanged {
            return Ok(existing);
        }
        stored.meta_mut().resource_version = Some(state.next_resource_version());
        K::store(&mut state).insert(self.key(&name), stored.clone());
        Ok(stored)
    }
}
