//! Convergence planning
//!
//! Decides which commands bring the host from its current link state to the
//! desired `VlanLink`. Kept free of I/O so the decision table is unit tested.

use crate::error::DriverError;
use crate::models::{LinkDetails, VlanLink, VLAN_KIND};

/// A single step towards the desired link state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Create the VLAN interface
    Create,
    /// Change the MTU of the existing interface
    SetMtu(u32),
    /// Bring the interface administratively up
    SetUp,
}

/// Checks that an existing link is the VLAN interface `expected` describes.
///
/// A link that is not a VLAN, carries another VLAN ID or hangs off another
/// parent was not created for `expected` and is reported as a conflict. The
/// driver never modifies or removes such a link.
pub fn check_owned(current: &LinkDetails, expected: &VlanLink) -> Result<(), DriverError> {
    let conflict = |reason: String| DriverError::Conflict {
        name: expected.name.clone(),
        reason,
    };

    match current.kind() {
        Some(VLAN_KIND) => {}
        Some(kind) => return Err(conflict(format!("link kind is {kind}, expected {VLAN_KIND}"))),
        None => return Err(conflict(format!("link is not a {VLAN_KIND} interface"))),
    }

    if current.vlan_id() != Some(expected.vlan_id) {
        return Err(conflict(format!(
            "VLAN ID is {}, expected {}",
            current.vlan_id().map_or_else(|| "unset".to_string(), |id| id.to_string()),
            expected.vlan_id
        )));
    }

    if current.link.as_deref() != Some(expected.master.as_str()) {
        return Err(conflict(format!(
            "parent is {}, expected {}",
            current.link.as_deref().unwrap_or("unknown"),
            expected.master
        )));
    }

    Ok(())
}

/// Plans the actions needed to converge `current` to `desired`.
///
/// Fails with a conflict when `check_owned` rejects the existing link. An
/// empty plan means the interface is already correct.
pub fn plan_link(current: Option<&LinkDetails>, desired: &VlanLink) -> Result<Vec<LinkAction>, DriverError> {
    let Some(current) = current else {
        return Ok(vec![LinkAction::Create, LinkAction::SetUp]);
    };
    check_owned(current, desired)?;

    let mut actions = Vec::new();
    if let Some(mtu) = desired.mtu {
        if current.mtu != Some(mtu) {
            actions.push(LinkAction::SetMtu(mtu));
        }
    }
    if !current.is_admin_up() {
        actions.push(LinkAction::SetUp);
    }
    Ok(actions)
}
