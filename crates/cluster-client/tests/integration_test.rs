//! Integration tests for the cluster client
//!
//! These tests require a reachable Kubernetes API server, typically through
//! `kubectl proxy` on the default port. Set SERVER to point elsewhere.

use cluster_client::{ClientError, ClusterClientTrait, KubeClusterClient, ResourceClient};

fn client() -> KubeClusterClient {
    let url = std::env::var("SERVER")
        .unwrap_or_else(|_| "http://127.0.0.1:8001".to_string());
    let uri = url.parse().expect("SERVER must be a valid URL");
    KubeClusterClient::try_from_config(kube::Config::new(uri))
        .expect("Failed to create client")
}

#[tokio::test]
#[ignore] // Requires running API server
async fn test_server_version() {
    let version = client().server_version().await
        .expect("Failed to query server version");

    println!("Server version: {version}");
    assert!(!version.git_version.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_get_missing_service_is_not_found() {
    let result = client()
        .services("default")
        .get("cluster-client-integration-missing")
        .await;

    match result {
        Err(ClientError::NotFound(_)) => {}
        other => panic!("Expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
#[ignore]
async fn test_update_missing_deployment_is_not_found() {
    use k8s_openapi::api::apps::v1::Deployment;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    let deployment = Deployment {
        metadata: ObjectMeta {
            name: Some("cluster-client-integration-missing".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    let err = client()
        .deployments("default")
        .update(&deployment)
        .await
        .expect_err("Update of a missing deployment must fail");
    assert!(err.is_not_found(), "Expected NotFound, got {err}");
}
