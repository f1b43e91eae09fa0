//! apps/v1 resources for MockClusterClient

use super::{MockState, MockStored, ObjectKey, ResourceKind};
use k8s_openapi::api::apps::v1::Deployment;
use std::collections::HashMap;

impl MockStored for Deployment {
    const KIND: ResourceKind = ResourceKind::Deployment;

    fn store(state: &mut MockState) -> &mut HashMap<ObjectKey, Self> {
        &mut state.deployments
    }
}
