//! Test utilities for unit testing the reconciler
//!
//! This module provides helpers for creating test data and in-memory
//! stand-ins for the Kubernetes API.

use crate::error::ControllerError;
use crate::events::{EventSink, VlanEvent};
use crate::reconciler::{ObjectKey, VlanReconciler};
use crate::store::VlanStore;
use crds::{Vlan, VlanSpec};
use iface_driver::MockInterfaceDriver;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Namespace used by all test records
pub const TEST_NAMESPACE: &str = "default";

/// Helper to create a test Vlan with no finalizer, name, mtu or status
pub fn create_test_vlan(
    name: &str,
    node_name: &str,
    master: Option<&str>,
    vlan_id: Option<u16>,
) -> Vlan {
    Vlan {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(TEST_NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: VlanSpec {
            node_name: node_name.to_string(),
            name: None,
            vlan_id,
            master: master.map(|s| s.to_string()),
            mtu: None,
        },
        status: None,
    }
}

/// Key of a record created by `create_test_vlan`
pub fn test_key(name: &str) -> ObjectKey {
    ObjectKey::new(TEST_NAMESPACE, name)
}

/// Sets a deletion timestamp on `vlan`
pub fn mark_deleted(vlan: &mut Vlan) {
    let timestamp: Time = serde_json::from_value(serde_json::json!("2025-01-01T00:00:00Z"))
        .expect("valid RFC 3339 timestamp");
    vlan.metadata.deletion_timestamp = Some(timestamp);
}

/// In-memory VlanStore
///
/// Emulates the API server semantics the reconciler depends on:
/// - `update` rejects a stale resourceVersion and never touches status
/// - `update_status` only touches status
/// - a record marked for deletion is removed once its finalizers are empty
///
/// Clones share state.
#[derive(Clone, Default)]
pub struct MockVlanStore {
    items: Arc<Mutex<HashMap<ObjectKey, Vlan>>>,
    next_version: Arc<Mutex<u64>>,
    fail_get: Arc<Mutex<Option<String>>>,
    fail_update: Arc<Mutex<Option<String>>>,
    fail_update_status: Arc<Mutex<Option<String>>>,
    updates: Arc<Mutex<Vec<Vlan>>>,
    status_updates: Arc<Mutex<Vec<Vlan>>>,
}

impl MockVlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump_version(&self, vlan: &mut Vlan) {
        let mut next = self.next_version.lock().unwrap();
        *next += 1;
        vlan.metadata.resource_version = Some(next.to_string());
    }

    /// Store `vlan` as-is (for test setup), assigning a resourceVersion
    pub fn insert(&self, mut vlan: Vlan) {
        let key = ObjectKey::from_resource(&vlan).expect("test Vlan has a name");
        self.bump_version(&mut vlan);
        self.items.lock().unwrap().insert(key, vlan);
    }

    /// Current stored copy of a record
    pub fn stored(&self, name: &str) -> Option<Vlan> {
        self.items.lock().unwrap().get(&test_key(name)).cloned()
    }

    /// Every successful `update` call, in order
    pub fn updates(&self) -> Vec<Vlan> {
        self.updates.lock().unwrap().clone()
    }

    /// Every successful `update_status` call, in order
    pub fn status_updates(&self) -> Vec<Vlan> {
        self.status_updates.lock().unwrap().clone()
    }

    /// Total number of successful writes of either kind
    pub fn write_count(&self) -> usize {
        self.updates.lock().unwrap().len() + self.status_updates.lock().unwrap().len()
    }

    /// Fail the next `get` with `message`
    pub fn fail_next_get(&self, message: &str) {
        *self.fail_get.lock().unwrap() = Some(message.to_string());
    }

    /// Fail the next `update` with `message`
    pub fn fail_next_update(&self, message: &str) {
        *self.fail_update.lock().unwrap() = Some(message.to_string());
    }

    /// Fail the next `update_status` with `message`
    pub fn fail_next_update_status(&self, message: &str) {
        *self.fail_update_status.lock().unwrap() = Some(message.to_string());
    }

    fn injected_failure(slot: &Mutex<Option<String>>) -> Result<(), ControllerError> {
        match slot.lock().unwrap().take() {
            Some(message) => Err(ControllerError::Store(message)),
            None => Ok(()),
        }
    }

    fn current(&self, vlan: &Vlan) -> Result<(ObjectKey, Vlan), ControllerError> {
        let key = ObjectKey::from_resource(vlan)
            .ok_or_else(|| ControllerError::Store("Vlan missing metadata.name".to_string()))?;
        let stored = self
            .items
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| ControllerError::Store(format!("Vlan {key} not found")))?;
        if vlan.metadata.resource_version.is_some()
            && vlan.metadata.resource_version != stored.metadata.resource_version
        {
            return Err(ControllerError::Store(format!(
                "conflict: Vlan {key} has been modified"
            )));
        }
        Ok((key, stored))
    }
}

#[async_trait::async_trait]
impl VlanStore for MockVlanStore {
    async fn get(&self, key: &ObjectKey) -> Result<Option<Vlan>, ControllerError> {
        Self::injected_failure(&self.fail_get)?;
        Ok(self.items.lock().unwrap().get(key).cloned())
    }

    async fn update(&self, vlan: &Vlan) -> Result<Vlan, ControllerError> {
        Self::injected_failure(&self.fail_update)?;
        let (key, stored) = self.current(vlan)?;

        let mut updated = vlan.clone();
        updated.status = stored.status;
        self.bump_version(&mut updated);
        self.updates.lock().unwrap().push(updated.clone());

        let mut items = self.items.lock().unwrap();
        if updated.metadata.deletion_timestamp.is_some()
            && updated.metadata.finalizers.as_ref().is_none_or(|f| f.is_empty())
        {
            items.remove(&key);
        } else {
            items.insert(key, updated.clone());
        }
        Ok(updated)
    }

    async fn update_status(&self, vlan: &Vlan) -> Result<Vlan, ControllerError> {
        Self::injected_failure(&self.fail_update_status)?;
        let (key, mut stored) = self.current(vlan)?;

        stored.status = vlan.status.clone();
        self.bump_version(&mut stored);
        self.status_updates.lock().unwrap().push(stored.clone());
        self.items.lock().unwrap().insert(key, stored.clone());
        Ok(stored)
    }
}

/// EventSink that records every published event
#[derive(Clone, Default)]
pub struct RecordingEventSink {
    events: Arc<Mutex<Vec<(String, VlanEvent)>>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Published events as `(resource name, event)` pairs
    pub fn events(&self) -> Vec<(String, VlanEvent)> {
        self.events.lock().unwrap().clone()
    }

    /// Reasons of all published events, in order
    pub fn reasons(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|(_, e)| e.reason()).collect()
    }
}

#[async_trait::async_trait]
impl EventSink for RecordingEventSink {
    async fn publish(&self, vlan: &Vlan, event: VlanEvent) {
        let name = vlan.metadata.name.clone().unwrap_or_default();
        self.events.lock().unwrap().push((name, event));
    }
}

/// A reconciler for `node_name` wired to fresh mocks
pub struct TestHarness {
    pub reconciler: VlanReconciler,
    pub store: MockVlanStore,
    pub driver: MockInterfaceDriver,
    pub events: RecordingEventSink,
}

/// Helper to create a reconciler backed by in-memory mocks
pub fn create_test_reconciler(node_name: &str) -> TestHarness {
    let store = MockVlanStore::new();
    let driver = MockInterfaceDriver::new();
    let events = RecordingEventSink::new();
    let reconciler = VlanReconciler::new(node_name, store.clone(), driver.clone(), events.clone());
    TestHarness {
        reconciler,
        store,
        driver,
        events,
    }
}
