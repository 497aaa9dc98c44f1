//! Vlan state machine
//!
//! One pass re-fetches the record and takes exactly one of three paths:
//! skip (gone or owned by another node), finalize (deletion requested), or
//! apply (create/update the host interface and sync status). Adding the
//! finalizer ends a pass on its own; the resulting watch event starts the
//! next one.

use super::finalizer::{add_finalizer, deletion_requested, has_finalizer, remove_finalizer};
use super::ownership::belongs_to_node;
use super::status::{applied_status, status_needs_update};
use super::{LONG_REQUEUE, ObjectKey, ReconcileError, Requeue, SHORT_REQUEUE, VlanReconciler};
use crate::error::ControllerError;
use crate::events::VlanEvent;
use crds::{Vlan, VlanSpec, derive_interface_name};
use iface_driver::{DriverError, VlanLink, validate_name};
use std::ops::RangeInclusive;
use tracing::{debug, error, info, warn};

/// Valid 802.1Q VLAN IDs
const VLAN_ID_RANGE: RangeInclusive<u16> = 1..=4094;

/// Accepted MTU values
const MTU_RANGE: RangeInclusive<u32> = 68..=8996;

/// Spec fields required to create the interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ApplyParams {
    /// Explicit name, or the one derived from master and VLAN ID
    pub name: String,
    pub master: String,
    pub vlan_id: u16,
    pub mtu: Option<u32>,
}

/// Checks that `spec` can be applied, returning the required fields.
pub(crate) fn validate_spec(spec: &VlanSpec) -> Result<ApplyParams, String> {
    let master = spec
        .master
        .as_deref()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| "spec.master is required".to_string())?;
    let vlan_id = spec.vlan_id.ok_or_else(|| "spec.id is required".to_string())?;
    if !VLAN_ID_RANGE.contains(&vlan_id) {
        return Err(format!("spec.id {vlan_id} is outside 1-4094"));
    }
    if let Some(mtu) = spec.mtu {
        if !MTU_RANGE.contains(&mtu) {
            return Err(format!("spec.mtu {mtu} is outside 68-8996"));
        }
    }
    let name = match spec.resolved_name() {
        Some(name) => name.to_string(),
        None => derive_interface_name(master, vlan_id),
    };
    validate_name(&name).map_err(|e| match e {
        DriverError::InvalidRequest(reason) => format!("interface name {name:?}: {reason}"),
        other => other.to_string(),
    })?;

    Ok(ApplyParams {
        name,
        master: master.to_string(),
        vlan_id,
        mtu: spec.mtu,
    })
}

/// Name of the host interface to remove when `vlan` is deleted.
///
/// Prefers the name recorded in status (what was actually created) over the
/// spec.
pub(crate) fn cleanup_name(vlan: &Vlan) -> Option<&str> {
    vlan.status
        .as_ref()
        .map(|s| s.name.as_str())
        .filter(|n| !n.is_empty())
        .or_else(|| vlan.spec.resolved_name())
}

/// The link expected to exist for a deleted `vlan`.
///
/// `None` when the record lacks a name, master or VLAN ID, in which case
/// ownership of any host interface cannot be established.
pub(crate) fn cleanup_link(vlan: &Vlan) -> Option<VlanLink> {
    Some(VlanLink {
        name: cleanup_name(vlan)?.to_string(),
        master: vlan.spec.master.clone().filter(|m| !m.is_empty())?,
        vlan_id: vlan.spec.vlan_id?,
        mtu: None,
    })
}

impl VlanReconciler {
    /// Runs one reconciliation pass for the Vlan identified by `key`.
    pub async fn reconcile_vlan(&self, key: &ObjectKey) -> Result<Requeue, ReconcileError> {
        info!("Reconciling Vlan {}", key);

        let vlan = match self.store.get(key).await {
            Ok(Some(vlan)) => vlan,
            Ok(None) => {
                debug!("Vlan {} not found, nothing to do", key);
                return Ok(Requeue::Done);
            }
            Err(e) => {
                error!("Failed to fetch Vlan {}: {}", key, e);
                return Err(ReconcileError::with_default_backoff(e));
            }
        };

        if !belongs_to_node(&vlan, &self.node_name) {
            debug!(
                "Vlan {} belongs to node {}, skipping on {}",
                key, vlan.spec.node_name, self.node_name
            );
            return Ok(Requeue::Done);
        }

        if deletion_requested(&vlan) {
            self.finalize(key, vlan).await
        } else {
            self.apply(key, vlan).await
        }
    }

    /// Deletion branch: remove the host interface, then release the record.
    async fn finalize(&self, key: &ObjectKey, mut vlan: Vlan) -> Result<Requeue, ReconcileError> {
        if !has_finalizer(&vlan) {
            debug!("Vlan {} is being deleted and has no finalizer, nothing to do", key);
            return Ok(Requeue::Done);
        }

        self.events.publish(&vlan, VlanEvent::Deleting).await;

        match cleanup_link(&vlan) {
            Some(link) => {
                info!("Deleting interface {} for Vlan {}", link.name, key);
                match self.driver.delete(&link).await {
                    Ok(()) => {}
                    Err(e @ (DriverError::Conflict { .. } | DriverError::InvalidRequest(_))) => {
                        warn!("Leaving interface {} in place for Vlan {}: {}", link.name, key, e);
                        self.events
                            .publish(&vlan, VlanEvent::FailedDeleting(e.to_string()))
                            .await;
                    }
                    Err(e) => {
                        error!("Failed to delete interface {} for Vlan {}: {}", link.name, key, e);
                        self.events
                            .publish(&vlan, VlanEvent::FailedDeleting(e.to_string()))
                            .await;
                        return Err(ReconcileError::with_default_backoff(e.into()));
                    }
                }
            }
            None => {
                debug!("Vlan {} never described a complete interface, skipping driver", key);
            }
        }

        remove_finalizer(&mut vlan);
        if let Err(e) = self.store.update(&vlan).await {
            error!("Failed to remove finalizer from Vlan {}: {}", key, e);
            return Err(ReconcileError::with_default_backoff(e));
        }

        info!("Released Vlan {}", key);
        Ok(Requeue::Done)
    }

    /// Creation/update branch.
    async fn apply(&self, key: &ObjectKey, mut vlan: Vlan) -> Result<Requeue, ReconcileError> {
        let params = match validate_spec(&vlan.spec) {
            Ok(params) => params,
            Err(reason) => {
                error!("Vlan {} cannot be applied: {}", key, reason);
                self.events
                    .publish(&vlan, VlanEvent::FailedCreateOrUpdate(reason.clone()))
                    .await;
                return Err(ReconcileError::with_default_backoff(ControllerError::InvalidSpec(
                    reason,
                )));
            }
        };

        if add_finalizer(&mut vlan) {
            if let Err(e) = self.store.update(&vlan).await {
                error!("Failed to add finalizer to Vlan {}: {}", key, e);
                return Err(ReconcileError::requeue_after(e, SHORT_REQUEUE));
            }
            info!("Added finalizer to Vlan {}", key);
            return Ok(Requeue::Done);
        }

        if vlan.spec.resolved_name().is_none() {
            vlan.spec.name = Some(params.name.clone());
            vlan = match self.store.update(&vlan).await {
                Ok(updated) => updated,
                Err(e) => {
                    error!("Failed to persist derived name {} for Vlan {}: {}", params.name, key, e);
                    return Err(ReconcileError::requeue_after(e, SHORT_REQUEUE));
                }
            };
            debug!("Derived interface name {} for Vlan {}", params.name, key);
        }

        let link = VlanLink {
            master: params.master,
            name: params.name,
            vlan_id: params.vlan_id,
            mtu: params.mtu,
        };
        if let Err(e) = self.driver.create_or_update(&link).await {
            error!("Failed to create or update interface {} for Vlan {}: {}", link.name, key, e);
            self.events
                .publish(&vlan, VlanEvent::FailedCreateOrUpdate(e.to_string()))
                .await;
            return Err(ReconcileError::requeue_after(e.into(), LONG_REQUEUE));
        }

        let desired = applied_status(&link.name);
        if status_needs_update(vlan.status.as_ref(), &desired) {
            vlan.status = Some(desired);
            if let Err(e) = self.store.update_status(&vlan).await {
                error!("Failed to update Vlan {} status: {}", key, e);
                self.events
                    .publish(&vlan, VlanEvent::FailedUpdateStatus(e.to_string()))
                    .await;
                return Err(ReconcileError::requeue_after(e, SHORT_REQUEUE));
            }
            info!("Vlan {} interface {} is up", key, link.name);
        } else {
            debug!("Vlan {} status already up to date", key);
        }

        Ok(Requeue::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_vlan;
    use crds::{InterfaceState, VlanStatus};

    #[test]
    fn test_validate_spec() {
        let vlan = create_test_vlan("vlan100", "node-a", Some("eth0"), Some(100));
        assert_eq!(
            validate_spec(&vlan.spec),
            Ok(ApplyParams {
                name: "ki.eth0.100".to_string(),
                master: "eth0".to_string(),
                vlan_id: 100,
                mtu: None,
            })
        );
    }

    #[test]
    fn test_validate_spec_rejects_missing_fields() {
        let no_master = create_test_vlan("vlan100", "node-a", None, Some(100));
        assert!(validate_spec(&no_master.spec).unwrap_err().contains("master"));

        let empty_master = create_test_vlan("vlan100", "node-a", Some(""), Some(100));
        assert!(validate_spec(&empty_master.spec).is_err());

        let no_id = create_test_vlan("vlan100", "node-a", Some("eth0"), None);
        assert!(validate_spec(&no_id.spec).unwrap_err().contains("spec.id"));
    }

    #[test]
    fn test_validate_spec_ranges() {
        let mut vlan = create_test_vlan("vlan100", "node-a", Some("eth0"), Some(0));
        assert!(validate_spec(&vlan.spec).is_err());
        vlan.spec.vlan_id = Some(4095);
        assert!(validate_spec(&vlan.spec).is_err());
        vlan.spec.vlan_id = Some(4094);
        assert!(validate_spec(&vlan.spec).is_ok());

        vlan.spec.mtu = Some(67);
        assert!(validate_spec(&vlan.spec).unwrap_err().contains("mtu"));
        vlan.spec.mtu = Some(9000);
        assert!(validate_spec(&vlan.spec).is_err());
        vlan.spec.mtu = Some(1496);
        assert_eq!(validate_spec(&vlan.spec).unwrap().mtu, Some(1496));
    }

    #[test]
    fn test_validate_spec_checks_interface_name() {
        let mut vlan = create_test_vlan("vlan100", "node-a", Some("enp0s31f6"), Some(100));
        let reason = validate_spec(&vlan.spec).unwrap_err();
        assert!(reason.contains("ki.enp0s31f6.100"), "{reason}");

        vlan.spec.name = Some("lan100".to_string());
        assert_eq!(validate_spec(&vlan.spec).unwrap().name, "lan100");

        vlan.spec.name = Some("uplink/100".to_string());
        assert!(validate_spec(&vlan.spec).is_err());
        vlan.spec.name = Some("this.name.is.long".to_string());
        assert!(validate_spec(&vlan.spec).is_err());
    }

    #[test]
    fn test_cleanup_link_requires_full_definition() {
        let mut vlan = create_test_vlan("vlan100", "node-a", Some("eth0"), Some(100));
        assert_eq!(cleanup_link(&vlan), None);

        vlan.spec.name = Some("ki.eth0.100".to_string());
        let link = cleanup_link(&vlan).unwrap();
        assert_eq!((link.name.as_str(), link.master.as_str(), link.vlan_id), ("ki.eth0.100", "eth0", 100));

        vlan.spec.master = None;
        assert_eq!(cleanup_link(&vlan), None);
    }

    #[test]
    fn test_cleanup_name_prefers_status() {
        let mut vlan = create_test_vlan("vlan100", "node-a", Some("eth0"), Some(100));
        assert_eq!(cleanup_name(&vlan), None);

        vlan.spec.name = Some("uplink.100".to_string());
        assert_eq!(cleanup_name(&vlan), Some("uplink.100"));

        vlan.status = Some(VlanStatus {
            state: InterfaceState::Up,
            name: "ki.eth0.100".to_string(),
        });
        assert_eq!(cleanup_name(&vlan), Some("ki.eth0.100"));

        vlan.status = Some(VlanStatus::default());
        assert_eq!(cleanup_name(&vlan), Some("uplink.100"));
    }
}
