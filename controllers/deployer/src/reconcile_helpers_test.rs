//! Unit tests for reconcile_helpers

#[cfg(test)]
mod tests {
    use crate::builder::{build_deployment, build_service};
    use crate::reconcile_helpers::*;
    use crate::reporter::ReconcileOutcome;
    use crate::test_utils::*;
    use cluster_client::{ClientError, ClusterClientTrait, MockClusterClient, ResourceKind, Verb};
    use k8s_openapi::api::apps::v1::Deployment;
    use k8s_openapi::api::core::v1::{Service, ServiceSpec};

    #[test]
    fn test_preserve_resource_version() {
        let existing = create_test_service("nginx", "5", "10.0.0.7");
        let mut desired = build_service(&nginx_params());

        preserve_resource_version(&existing, &mut desired);
        assert_eq!(desired.metadata.resource_version.as_deref(), Some("5"));
    }

    #[test]
    fn test_preserve_cluster_ip_copies_both_fields() {
        let existing = create_test_service("nginx", "5", "10.0.0.7");
        let mut desired = build_service(&nginx_params());

        preserve_cluster_ip(&existing, &mut desired);
        let spec = desired.spec.unwrap();
        assert_eq!(spec.cluster_ip.as_deref(), Some("10.0.0.7"));
        assert_eq!(spec.cluster_ips, Some(vec!["10.0.0.7".to_string()]));
        // Everything else still comes from the builder
        assert_eq!(spec.type_.as_deref(), Some("ClusterIP"));
    }

    #[test]
    fn test_preserve_cluster_ip_without_existing_spec() {
        let existing = Service::default();
        let mut desired = build_service(&nginx_params());
        let before = desired.clone();

        preserve_cluster_ip(&existing, &mut desired);
        assert_eq!(desired, before);
    }

    #[test]
    fn test_preserve_cluster_ip_creates_missing_desired_spec() {
        let existing = create_test_service("nginx", "5", "10.0.0.7");
        let mut desired = Service {
            spec: None,
            ..build_service(&nginx_params())
        };

        preserve_cluster_ip(&existing, &mut desired);
        assert_eq!(
            desired.spec,
            Some(ServiceSpec {
                cluster_ip: Some("10.0.0.7".to_string()),
                cluster_ips: Some(vec!["10.0.0.7".to_string()]),
                ..Default::default()
            })
        );
    }

    #[tokio::test]
    async fn test_update_or_create_returns_stored_object() {
        let mock = MockClusterClient::new();
        let api = mock.deployments("default");

        let reconciled = update_or_create(api.as_ref(), &build_deployment(&nginx_params()), &DEPLOYMENT_MESSAGES)
            .await
            .unwrap();

        assert_eq!(reconciled.outcome, ReconcileOutcome::Created);
        assert_eq!(reconciled.object.metadata.namespace.as_deref(), Some("default"));
        assert!(reconciled.object.metadata.resource_version.is_some());
    }

    #[tokio::test]
    async fn test_update_or_create_conflict_is_not_treated_as_missing() {
        let mock = MockClusterClient::new();
        mock.fail_next(
            ResourceKind::Deployment,
            Verb::Update,
            ClientError::Conflict("the object has been modified".to_string()),
        );
        let api = mock.deployments("default");

        let err = update_or_create(api.as_ref(), &build_deployment(&nginx_params()), &DEPLOYMENT_MESSAGES)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "could not update deployment controller nginx: Conflict: the object has been modified"
        );
        assert!(calls_of(&mock, ResourceKind::Deployment, Verb::Create).is_empty());
    }

    #[tokio::test]
    async fn test_get_merge_update_or_create_runs_rules_in_order() {
        fn first(_: &Deployment, desired: &mut Deployment) {
            desired.metadata.labels.get_or_insert_with(Default::default).insert("order".to_string(), "first".to_string());
        }
        fn second(_: &Deployment, desired: &mut Deployment) {
            desired.metadata.labels.get_or_insert_with(Default::default).insert("order".to_string(), "second".to_string());
        }

        let mock = MockClusterClient::new();
        mock.add_deployment("default", build_deployment(&nginx_params()));
        let api = mock.deployments("default");

        let reconciled = get_merge_update_or_create(
            api.as_ref(),
            build_deployment(&nginx_params()),
            &[preserve_resource_version::<Deployment>, first, second],
            &DEPLOYMENT_MESSAGES,
        )
        .await
        .unwrap();

        assert_eq!(reconciled.outcome, ReconcileOutcome::Updated);
        let labels = reconciled.object.metadata.labels.unwrap();
        assert_eq!(labels.get("order").map(String::as_str), Some("second"));
    }

    #[tokio::test]
    async fn test_get_failed_message_is_per_kind() {
        let mock = MockClusterClient::new();
        mock.fail_next(
            ResourceKind::Deployment,
            Verb::Get,
            ClientError::Connectivity("connection refused".to_string()),
        );
        let api = mock.deployments("default");

        let err = get_merge_update_or_create(
            api.as_ref(),
            build_deployment(&nginx_params()),
            &[preserve_resource_version::<Deployment>],
            &DEPLOYMENT_MESSAGES,
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "could not fetch deployment controller nginx: Connectivity error: connection refused"
        );
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_update_or_create_never_gets() {
        let mock = MockClusterClient::new();
        mock.fail_next(
            ResourceKind::Deployment,
            Verb::Get,
            ClientError::Connectivity("connection refused".to_string()),
        );
        let api = mock.deployments("default");

        update_or_create(api.as_ref(), &build_deployment(&nginx_params()), &DEPLOYMENT_MESSAGES)
            .await
            .unwrap();
        assert!(calls_of(&mock, ResourceKind::Deployment, Verb::Get).is_empty());
    }

    #[tokio::test]
    async fn test_get_merge_update_or_create_skips_rules_on_create() {
        fn poison(_: &Service, desired: &mut Service) {
            desired.metadata.resource_version = Some("999".to_string());
        }

        let mock = MockClusterClient::new();
        let api = mock.services("default");

        let reconciled = get_merge_update_or_create(
            api.as_ref(),
            build_service(&nginx_params()),
            &[poison],
            &SERVICE_MESSAGES,
        )
        .await
        .unwrap();

        assert_eq!(reconciled.outcome, ReconcileOutcome::Created);
        let create = &calls_of(&mock, ResourceKind::Service, Verb::Create)[0];
        assert!(create.body.as_ref().unwrap()["metadata"].get("resourceVersion").is_none());
    }

    #[tokio::test]
    async fn test_get_merge_update_or_create_without_version_rule_conflicts_on_stale_token() {
        // Desired carries a stale token and no rule refreshes it
        let mock = MockClusterClient::new();
        mock.add_service("default", create_test_service("nginx", "5", "10.0.0.7"));
        let api = mock.services("default");
        let mut desired = build_service(&nginx_params());
        desired.metadata.resource_version = Some("4".to_string());

        let err = get_merge_update_or_create(api.as_ref(), desired, &[preserve_cluster_ip], &SERVICE_MESSAGES)
            .await
            .unwrap_err();

        assert!(matches!(err.client_error(), Some(ClientError::Conflict(_))));
        assert!(err.to_string().starts_with("failed to update service nginx"));
    }

    #[tokio::test]
    async fn test_service_rules_satisfy_immutable_cluster_ip() {
        let mock = MockClusterClient::new();
        mock.add_service("default", create_test_service("nginx", "5", "10.0.0.7"));
        let api = mock.services("default");

        // Without the cluster IP rule the server rejects the cleared field
        let err = get_merge_update_or_create(
            api.as_ref(),
            build_service(&nginx_params()),
            &[preserve_resource_version::<Service>],
            &SERVICE_MESSAGES,
        )
        .await
        .unwrap_err();
        assert!(matches!(err.client_error(), Some(ClientError::Invalid(_))));

        let reconciled = get_merge_update_or_create(
            api.as_ref(),
            build_service(&nginx_params()),
            SERVICE_PRESERVE_RULES,
            &SERVICE_MESSAGES,
        )
        .await
        .unwrap();
        assert_eq!(reconciled.outcome, ReconcileOutcome::Updated);
    }
}
