//! Reconciliation logic for Vlan resources.
//!
//! The reconciler is invoked once per change notification with the identity
//! of a record, re-fetches the record, and drives the host interface and the
//! record status towards the declared state:
//! - `ownership`: records addressed to other nodes are ignored
//! - `finalizer`: cleanup guarantee before any host state is created
//! - `vlan`: the create/update and deletion state machine
//! - `status`: mirrors a successful apply into the record status

pub mod finalizer;
pub mod ownership;
pub mod status;
pub mod vlan;


use crate::error::ControllerError;
use crate::events::EventSink;
use crate::store::VlanStore;
use iface_driver::InterfaceDriver;
use kube::ResourceExt;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Finalizer token guarding host interface cleanup
pub const VLAN_FINALIZER: &str = "vlan.interface.dcops.microscaler.io/finalizer";

/// Requeue delay after a failed store write
pub const SHORT_REQUEUE: Duration = Duration::from_secs(5);

/// Requeue delay after a failed interface create/update
pub const LONG_REQUEUE: Duration = Duration::from_secs(10);

/// Identity of a Vlan record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    /// Namespace, `None` for the client's default namespace
    pub namespace: Option<String>,
    /// Resource name
    pub name: String,
}

impl ObjectKey {
    /// Creates a key for `namespace/name`.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    /// Key of an existing resource, `None` when it has no name.
    pub fn from_resource<K: ResourceExt>(resource: &K) -> Option<Self> {
        Some(Self {
            namespace: resource.namespace(),
            name: resource.meta().name.clone()?,
        })
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}/{}", namespace, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Outcome of a successful reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requeue {
    /// Nothing left to do until the record changes again
    Done,
    /// Run again after the given delay
    After(Duration),
}

/// A failed reconciliation pass
///
/// Carries an explicit requeue delay when the failing step asks for one;
/// otherwise the dispatcher applies its default backoff.
#[derive(Debug, Error)]
#[error("{inner}")]
pub struct ReconcileError {
    inner: ControllerError,
    requeue_after: Option<Duration>,
}

impl ReconcileError {
    /// Retry after exactly `delay`.
    pub fn requeue_after(inner: ControllerError, delay: Duration) -> Self {
        Self {
            inner,
            requeue_after: Some(delay),
        }
    }

    /// Retry using the dispatcher's default backoff.
    pub fn with_default_backoff(inner: ControllerError) -> Self {
        Self {
            inner,
            requeue_after: None,
        }
    }

    /// Explicit requeue delay, if any
    pub fn delay(&self) -> Option<Duration> {
        self.requeue_after
    }

    /// The underlying error
    pub fn error(&self) -> &ControllerError {
        &self.inner
    }
}

/// One reconciliation pass for one record identity
///
/// Invoked by the watcher; implementations must re-fetch the record rather
/// than trust notification payloads.
#[async_trait::async_trait]
pub trait Reconcile: Send + Sync {
    /// Converge the record identified by `key`.
    async fn reconcile(&self, key: &ObjectKey) -> Result<Requeue, ReconcileError>;
}

/// Reconciles Vlan resources addressed to the local node.
pub struct VlanReconciler {
    pub(crate) node_name: String,
    pub(crate) store: Box<dyn VlanStore>,
    pub(crate) driver: Box<dyn InterfaceDriver>,
    pub(crate) events: Box<dyn EventSink>,
}

impl VlanReconciler {
    /// Creates a new reconciler instance for `node_name`.
    pub fn new(
        node_name: impl Into<String>,
        store: impl VlanStore + 'static,
        driver: impl InterfaceDriver + 'static,
        events: impl EventSink + 'static,
    ) -> Self {
        Self {
            node_name: node_name.into(),
            store: Box::new(store),
            driver: Box::new(driver),
            events: Box::new(events),
        }
    }
}

#[async_trait::async_trait]
impl Reconcile for VlanReconciler {
    async fn reconcile(&self, key: &ObjectKey) -> Result<Requeue, ReconcileError> {
        self.reconcile_vlan(key).await
    }
}
