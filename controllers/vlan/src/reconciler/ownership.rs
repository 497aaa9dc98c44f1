//! Node ownership filter

use crds::Vlan;

/// Whether `vlan` is addressed to `local_node`.
///
/// Evaluated before any finalizer mutation or driver call; records for other
/// nodes are left entirely untouched.
pub fn belongs_to_node(vlan: &Vlan, local_node: &str) -> bool {
    vlan.spec.node_name == local_node
}
