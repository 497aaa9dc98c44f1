//! Kubernetes events attached to Vlan resources.
//!
//! Events are informational and best-effort: a failure to publish is logged
//! and never fails the reconciliation.

use crds::Vlan;
use kube::{Client, Resource};
use kube_runtime::events::{Event, EventType, Recorder, Reporter};
use tracing::warn;

/// Reporting controller name on published events
pub const CONTROLLER_NAME: &str = "vlan-controller";

/// Kubernetes rejects event notes longer than this
const MAX_NOTE_LEN: usize = 1024;

/// Lifecycle events emitted while reconciling a Vlan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VlanEvent {
    /// Host interface cleanup started
    Deleting,
    /// Host interface cleanup failed
    FailedDeleting(String),
    /// Creating or updating the host interface failed
    FailedCreateOrUpdate(String),
    /// Writing the observed status failed
    FailedUpdateStatus(String),
}

impl VlanEvent {
    /// Machine readable event reason
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Deleting => "DeletingVlanInterface",
            Self::FailedDeleting(_) => "FailedDeletingVlanInterface",
            Self::FailedCreateOrUpdate(_) => "FailedCreateOrUpdateVlanInterface",
            Self::FailedUpdateStatus(_) => "FailedUpdateStatus",
        }
    }

    /// Action the controller was taking
    pub fn action(&self) -> &'static str {
        match self {
            Self::Deleting | Self::FailedDeleting(_) => "Delete",
            Self::FailedCreateOrUpdate(_) => "CreateOrUpdate",
            Self::FailedUpdateStatus(_) => "UpdateStatus",
        }
    }

    /// Human readable note
    pub fn note(&self) -> String {
        let note = match self {
            Self::Deleting => "Deleting VLAN interface".to_string(),
            Self::FailedDeleting(reason)
            | Self::FailedCreateOrUpdate(reason)
            | Self::FailedUpdateStatus(reason) => reason.clone(),
        };
        truncate(note, MAX_NOTE_LEN)
    }

    /// Whether this is a Warning rather than a Normal event
    pub fn is_warning(&self) -> bool {
        !matches!(self, Self::Deleting)
    }
}

fn truncate(mut s: String, max: usize) -> String {
    if s.len() > max {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
    }
    s
}

/// Destination for Vlan events
#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    /// Publish `event` against `vlan`; never fails.
    async fn publish(&self, vlan: &Vlan, event: VlanEvent);
}

/// `EventSink` publishing `events.k8s.io` events through the API server
#[derive(Clone)]
pub struct KubeEventSink {
    recorder: Recorder,
}

impl KubeEventSink {
    /// Creates a sink reporting as `vlan-controller` on `node_name`.
    pub fn new(client: Client, node_name: &str) -> Self {
        let reporter = Reporter {
            controller: CONTROLLER_NAME.to_string(),
            instance: Some(node_name.to_string()),
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait::async_trait]
impl EventSink for KubeEventSink {
    async fn publish(&self, vlan: &Vlan, event: VlanEvent) {
        let k8s_event = Event {
            type_: if event.is_warning() { EventType::Warning } else { EventType::Normal },
            reason: event.reason().to_string(),
            note: Some(event.note()),
            action: event.action().to_string(),
            secondary: None,
        };

        if let Err(e) = self.recorder.publish(&k8s_event, &vlan.object_ref(&())).await {
            warn!(
                "Failed to publish {} event for Vlan {}: {}",
                event.reason(),
                vlan.metadata.name.as_deref().unwrap_or("<unknown>"),
                e
            );
        }
    }
}
