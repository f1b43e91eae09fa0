//! core/v1 resources for MockClusterClient
//!
//! Services get a cluster IP from `10.0.0.0/24` on create, and that IP is
//! immutable afterwards, like on a real API server.

use super::{MockState, MockStored, ObjectKey, ResourceKind};
use crate::error::ClientError;
use k8s_openapi::api::core::v1::Service;
use std::collections::HashMap;

fn allocate_cluster_ip(state: &mut MockState) -> String {
    let host = state.next_cluster_ip;
    state.next_cluster_ip += 1;
    format!("10.0.0.{host}")
}

fn cluster_ip(service: &Service) -> Option<&str> {
    service
        .spec
        .as_ref()
        .and_then(|spec| spec.cluster_ip.as_deref())
        .filter(|ip| !ip.is_empty())
}

impl MockStored for Service {
    const KIND: ResourceKind = ResourceKind::Service;

    fn store(state: &mut MockState) -> &mut HashMap<ObjectKey, Self> {
        &mut state.services
    }

    fn on_create(state: &mut MockState, object: &mut Self) {
        let spec = object.spec.get_or_insert_with(Default::default);
        let requested = spec.cluster_ip.clone().filter(|ip| !ip.is_empty());
        let ip = match requested {
            Some(ip) => ip,
            None => allocate_cluster_ip(state),
        };
        spec.cluster_ips = Some(vec![ip.clone()]);
        spec.cluster_ip = Some(ip);
    }

    fn validate_update(existing: &Self, update: &Self) -> Result<(), ClientError> {
        match (cluster_ip(existing), cluster_ip(update)) {
            (Some(allocated), Some(submitted)) if allocated == submitted => Ok(()),
            (Some(_), submitted) => Err(ClientError::Invalid(format!(
                "Service \"{}\" is invalid: spec.clusterIP: Invalid value: \"{}\": field is immutable",
                update.metadata.name.as_deref().unwrap_or_default(),
                submitted.unwrap_or_default()
            ))),
            (None, _) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cluster_trait::{ClusterClientTrait, ResourceClient};
    use crate::error::ClientError;
    use crate::mock::MockClusterClient;
    use k8s_openapi::api::core::v1::{Service, ServiceSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn service(name: &str, cluster_ip: Option<&str>) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                cluster_ip: cluster_ip.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_allocates_cluster_ip() {
        let mock = MockClusterClient::new();
        let api = mock.services("default");
        let first = api.create(&service("a", None)).await.unwrap();
        let second = api.create(&service("b", None)).await.unwrap();

        let first_spec = first.spec.unwrap();
        assert_eq!(first_spec.cluster_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(first_spec.cluster_ips, Some(vec!["10.0.0.1".to_string()]));
        assert_eq!(second.spec.unwrap().cluster_ip.as_deref(), Some("10.0.0.2"));
    }

    #[tokio::test]
    async fn test_update_without_cluster_ip_is_rejected() {
        let mock = MockClusterClient::new();
        let api = mock.services("default");
        api.create(&service("a", None)).await.unwrap();

        let err = api.update(&service("a", None)).await.unwrap_err();
        assert!(matches!(err, ClientError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_update_with_other_cluster_ip_is_rejected() {
        let mock = MockClusterClient::new();
        let api = mock.services("default");
        api.create(&service("a", None)).await.unwrap();

        let err = api.update(&service("a", Some("10.0.0.99"))).await.unwrap_err();
        assert!(err.to_string().contains("field is immutable"));
    }

    #[tokio::test]
    async fn test_update_with_allocated_cluster_ip_succeeds() {
        let mock = MockClusterClient::new();
        let api = mock.services("default");
        api.create(&service("a", None)).await.unwrap();

        let updated = api.update(&service("a", Some("10.0.0.1"))).await.unwrap();
        assert_eq!(updated.spec.unwrap().cluster_ip.as_deref(), Some("10.0.0.1"));
    }
}
