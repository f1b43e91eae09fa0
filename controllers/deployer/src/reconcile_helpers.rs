//! Helper functions for common reconciliation patterns
//!
//! Both sequences the reconciler needs are generic over the resource kind:
//! - update, falling back to create on NotFound (fully client-specified kinds)
//! - get, merge server-owned fields, update, or create on NotFound (kinds
//!   with fields the server assigns and the client must echo back)
//!
//! NotFound is the only error either sequence recovers from. Anything else
//! ends the sequence with no further API calls.

use crate::error::ControllerError;
use crate::reporter::ReconcileOutcome;
use cluster_client::ResourceClient;
use k8s_openapi::api::core::v1::Service;
use kube::{Resource, ResourceExt};
use tracing::debug;

/// Copies one server-owned field from the live object into the desired one
pub type PreserveRule<K> = fn(existing: &K, desired: &mut K);

/// Error messages for one resource kind, one per step that can fail
#[derive(Debug, Clone, Copy)]
pub struct KindMessages {
    /// Label used in logs and reports, e.g. "service"
    pub kind: &'static str,
    /// Only used by [`get_merge_update_or_create`]; [`update_or_create`]
    /// never issues a Get, so the reconciler's deployment path cannot hit it
    pub get_failed: &'static str,
    pub update_failed: &'static str,
    pub create_failed: &'static str,
}

pub const DEPLOYMENT_MESSAGES: KindMessages = KindMessages {
    kind: "deployment controller",
    get_failed: "could not fetch deployment controller",
    update_failed: "could not update deployment controller",
    create_failed: "could not create deployment controller",
};

pub const SERVICE_MESSAGES: KindMessages = KindMessages {
    kind: "service",
    get_failed: "unexpected error",
    update_failed: "failed to update service",
    create_failed: "failed to create service",
};

/// Fields a `Service` update must carry over from the live object
pub const SERVICE_PRESERVE_RULES: &[PreserveRule<Service>] =
    &[preserve_resource_version::<Service>, preserve_cluster_ip];

/// Result of a successful reconciliation
#[derive(Debug, Clone)]
pub struct Reconciled<K> {
    pub outcome: ReconcileOutcome,
    /// The object as stored by the server
    pub object: K,
}

/// Echo the optimistic-concurrency token
pub fn preserve_resource_version<K: Resource>(existing: &K, desired: &mut K) {
    desired
        .meta_mut()
        .resource_version
        .clone_from(&existing.meta().resource_version);
}

/// Echo the allocated virtual IP(s); the server rejects any other value
pub fn preserve_cluster_ip(existing: &Service, desired: &mut Service) {
    let Some(existing_spec) = existing.spec.as_ref() else {
        return;
    };
    let spec = desired.spec.get_or_insert_with(Default::default);
    spec.cluster_ip.clone_from(&existing_spec.cluster_ip);
    spec.cluster_ips.clone_from(&existing_spec.cluster_ips);
}

async fn create<K>(
    api: &dyn ResourceClient<K>,
    desired: &K,
    messages: &KindMessages,
) -> Result<Reconciled<K>, ControllerError>
where
    K: Resource + Send + Sync,
{
    let name = desired.name_any();
    let object = api
        .create(desired)
        .await
        .map_err(|e| ControllerError::reconcile(messages.create_failed, &name, e))?;
    Ok(Reconciled {
        outcome: ReconcileOutcome::Created,
        object,
    })
}

/// Update `desired`, creating it if the server does not have it.
///
/// Returns:
/// - `Updated` if the update was accepted
/// - `Created` if the update hit NotFound and the create was accepted
/// - `Err` with `update_failed` for any other update error (no create is tried)
/// - `Err` with `create_failed` if the fallback create fails
pub async fn update_or_create<K>(
    api: &dyn ResourceClient<K>,
    desired: &K,
    messages: &KindMessages,
) -> Result<Reconciled<K>, ControllerError>
where
    K: Resource + Send + Sync,
{
    let name = desired.name_any();
    match api.update(desired).await {
        Ok(object) => Ok(Reconciled {
            outcome: ReconcileOutcome::Updated,
            object,
        }),
        Err(e) if e.is_not_found() => {
            debug!("{} {}/{} does not exist, creating", messages.kind, api.namespace(), name);
            create(api, desired, messages).await
        }
        Err(e) => Err(ControllerError::reconcile(messages.update_failed, &name, e)),
    }
}

/// Get the live object, merge preserved fields into `desired`, then update;
/// create instead if the object does not exist.
///
/// The get completes before the update is built, so the update always
/// carries the values the server returned. Rules run in order.
///
/// Returns:
/// - `Updated` if the object existed and the update was accepted
/// - `Created` if the get hit NotFound and the create was accepted
/// - `Err` with `get_failed` for any other get error (nothing else is tried)
/// - `Err` with `update_failed` / `create_failed` otherwise
pub async fn get_merge_update_or_create<K>(
    api: &dyn ResourceClient<K>,
    mut desired: K,
    rules: &[PreserveRule<K>],
    messages: &KindMessages,
) -> Result<Reconciled<K>, ControllerError>
where
    K: Resource + Send + Sync,
{
    let name = desired.name_any();
    match api.get(&name).await {
        Ok(existing) => {
            for rule in rules {
                rule(&existing, &mut desired);
            }
            debug!(
                "{} {}/{} exists (resourceVersion {:?}), updating",
                messages.kind,
                api.namespace(),
                name,
                desired.meta().resource_version
            );
            let object = api
                .update(&desired)
                .await
                .map_err(|e| ControllerError::reconcile(messages.update_failed, &name, e))?;
            Ok(Reconciled {
                outcome: ReconcileOutcome::Updated,
                object,
            })
        }
        Err(e) if e.is_not_found() => {
            debug!("{} {}/{} does not exist, creating", messages.kind, api.namespace(), name);
            create(api, &desired, messages).await
        }
        Err(e) => Err(ControllerError::reconcile(messages.get_failed, &name, e)),
    }
}
