//! Cluster API Client
//!
//! A narrow facade over the Kubernetes API used by the deployer.
//! Exposes per-namespace, per-kind Get/Create/Update for `Deployment` and
//! `Service` objects plus the server version query, and nothing else.
//!
//! # Example
//!
//! ```no_run
//! use cluster_client::{ClusterClientTrait, KubeClusterClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // `kubectl proxy` on its default port
//! let config = kube::Config::new("http://127.0.0.1:8001".parse()?);
//! let client = KubeClusterClient::try_from_config(config)?;
//!
//! // Query the API server version
//! let version = client.server_version().await?;
//! println!("{version}");
//!
//! // Fetch a service from the default namespace
//! let service = client.services("default").get("nginx").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Error classification**: every failure maps to one of `NotFound`,
//!   `Conflict`, `Invalid`, `Connectivity` or `Unexpected`
//! - **Mocking**: `MockClusterClient` (feature `test-util`) is a stateful
//!   in-memory API server for unit tests

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod cluster_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::{KubeClusterClient, KubeResourceClient};
pub use cluster_trait::{ClusterClientTrait, ResourceClient};
pub use error::ClientError;
pub use models::ServerVersion;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockClusterClient, RecordedCall, ResourceKind, Verb};
