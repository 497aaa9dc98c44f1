//! Status helpers for Vlan resources

use crds::{InterfaceState, VlanStatus};

/// Status recorded after a successful create/update of `interface_name`.
pub fn applied_status(interface_name: &str) -> VlanStatus {
    VlanStatus {
        state: InterfaceState::Up,
        name: interface_name.to_string(),
    }
}

/// Checks if status needs to be updated.
///
/// Returns true when there is no status yet or any field differs, so that a
/// converged record does not generate a write (and a new watch event) on
/// every pass.
pub fn status_needs_update(current: Option<&VlanStatus>, desired: &VlanStatus) -> bool {
    match current {
        None => true,
        Some(status) => status != desired,
    }
}
