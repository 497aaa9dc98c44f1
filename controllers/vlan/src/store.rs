//! Desired-state store for Vlan resources.
//!
//! `VlanStore` is the seam between the reconciler and the Kubernetes API so
//! the state machine can be tested against an in-memory store.

use crate::error::ControllerError;
use crate::reconciler::ObjectKey;
use crds::Vlan;
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client};
use tracing::debug;

/// Record storage operations used by the reconciler
#[async_trait::async_trait]
pub trait VlanStore: Send + Sync {
    /// Fetch the current record, `None` when it no longer exists.
    async fn get(&self, key: &ObjectKey) -> Result<Option<Vlan>, ControllerError>;

    /// Persist spec and metadata (finalizers). Fails on a stale resourceVersion.
    async fn update(&self, vlan: &Vlan) -> Result<Vlan, ControllerError>;

    /// Persist status only, through the status subresource.
    async fn update_status(&self, vlan: &Vlan) -> Result<Vlan, ControllerError>;
}

/// `VlanStore` backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeVlanStore {
    client: Client,
}

impl KubeVlanStore {
    /// Creates a store using `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: Option<&str>) -> Api<Vlan> {
        match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::default_namespaced(self.client.clone()),
        }
    }

    fn key_of(vlan: &Vlan) -> Result<ObjectKey, ControllerError> {
        ObjectKey::from_resource(vlan)
            .ok_or_else(|| ControllerError::Store("Vlan missing metadata.name".to_string()))
    }
}

#[async_trait::async_trait]
impl VlanStore for KubeVlanStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<Vlan>, ControllerError> {
        self.api(key.namespace.as_deref())
            .get_opt(&key.name)
            .await
            .map_err(|e| ControllerError::Store(format!("failed to get Vlan {key}: {e}")))
    }

    async fn update(&self, vlan: &Vlan) -> Result<Vlan, ControllerError> {
        let key = Self::key_of(vlan)?;
        let updated = self
            .api(key.namespace.as_deref())
            .replace(&key.name, &PostParams::default(), vlan)
            .await
            .map_err(|e| ControllerError::Store(format!("failed to update Vlan {key}: {e}")))?;
        debug!("Updated Vlan {} (resourceVersion {:?})", key, updated.metadata.resource_version);
        Ok(updated)
    }

    async fn update_status(&self, vlan: &Vlan) -> Result<Vlan, ControllerError> {
        let key = Self::key_of(vlan)?;
        let status_patch = serde_json::json!({
            "status": vlan.status
        });

        let pp = PatchParams::default();
        self.api(key.namespace.as_deref())
            .patch_status(&key.name, &pp, &Patch::Merge(&status_patch))
            .await
            .map_err(|e| ControllerError::Store(format!("failed to update Vlan {key} status: {e}")))
    }
}
