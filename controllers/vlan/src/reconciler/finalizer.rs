//! Finalizer helpers

use super::VLAN_FINALIZER;
use crds::Vlan;
use kube::ResourceExt;

/// Whether the controller's finalizer is present.
pub fn has_finalizer(vlan: &Vlan) -> bool {
    vlan.finalizers().iter().any(|f| f == VLAN_FINALIZER)
}

/// Adds the controller's finalizer in memory; returns false if already present.
pub fn add_finalizer(vlan: &mut Vlan) -> bool {
    if has_finalizer(vlan) {
        return false;
    }
    vlan.finalizers_mut().push(VLAN_FINALIZER.to_string());
    true
}

/// Removes the controller's finalizer in memory, keeping foreign tokens.
pub fn remove_finalizer(vlan: &mut Vlan) -> bool {
    let before = vlan.finalizers().len();
    vlan.finalizers_mut().retain(|f| f != VLAN_FINALIZER);
    vlan.finalizers().len() != before
}

/// Whether deletion has been requested (deletionTimestamp set).
pub fn deletion_requested(vlan: &Vlan) -> bool {
    vlan.metadata.deletion_timestamp.is_some()
}
