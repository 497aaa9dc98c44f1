//! Vlan Custom Resource Definition
//!
//! Declares one 802.1Q VLAN sub-interface that must exist on a specific node.
//! The node-local controller owning `spec.nodeName` creates the interface,
//! mirrors the observed state into `status`, and removes the interface when
//! the resource is deleted.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Prefix of interface names derived from `master` and `id`.
pub const DERIVED_NAME_PREFIX: &str = "ki";

/// VlanSpec defines the desired state of a VLAN interface
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[kube(
    group = "interface.dcops.microscaler.io",
    version = "v1alpha1",
    kind = "Vlan",
    namespaced,
    status = "VlanStatus",
    shortname = "vlan",
    derive = "PartialEq",
    printcolumn = r#"{"name":"Node","type":"string","jsonPath":".spec.nodeName"}"#,
    printcolumn = r#"{"name":"Interface","type":"string","jsonPath":".status.name"}"#,
    printcolumn = r#"{"name":"VLAN","type":"integer","jsonPath":".spec.id"}"#,
    printcolumn = r#"{"name":"State","type":"string","jsonPath":".status.state"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct VlanSpec {
    /// Node that the VLAN interface is created on
    pub node_name: String,

    /// Name of the VLAN interface
    ///
    /// Defaults to `ki.<master>.<id>`; the derived name is written back here
    /// on first reconciliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(min = 1, max = 15))]
    pub name: Option<String>,

    /// VLAN ID (1-4094)
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 1, max = 4094))]
    pub vlan_id: Option<u16>,

    /// Master (parent) interface name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master: Option<String>,

    /// MTU of the VLAN interface (68-8996), driver default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 68, max = 8996))]
    pub mtu: Option<u32>,
}

impl VlanSpec {
    /// Returns the explicitly configured interface name, treating `""` as unset.
    pub fn resolved_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

/// Derives the default interface name for a VLAN on `master`.
///
/// ```
/// assert_eq!(crds::derive_interface_name("eth0", 100), "ki.eth0.100");
/// ```
pub fn derive_interface_name(master: &str, vlan_id: u16) -> String {
    format!("{DERIVED_NAME_PREFIX}.{master}.{vlan_id}")
}

/// VlanStatus defines the observed state of a VLAN interface
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VlanStatus {
    /// Current state of the VLAN interface
    #[serde(default)]
    pub state: InterfaceState,

    /// Interface name the state refers to
    #[serde(default)]
    pub name: String,
}

/// Observed interface state
///
/// Serializes lowercase ("up", "down", "unknown") to match what `ip link`
/// reports as operational state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceState {
    /// Not yet applied
    #[default]
    Unknown,

    /// Last create/update reported success
    Up,

    /// Interface is down
    Down,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::CustomResourceExt;

    #[test]
    fn test_derive_interface_name() {
        assert_eq!(derive_interface_name("eth0", 100), "ki.eth0.100");
        assert_eq!(derive_interface_name("bond0", 4094), "ki.bond0.4094");
        // Stable across repeated derivations
        assert_eq!(derive_interface_name("eth1", 7), derive_interface_name("eth1", 7));
    }

    #[test]
    fn test_resolved_name_treats_empty_as_unset() {
        let mut spec = VlanSpec {
            node_name: "node-a".to_string(),
            ..Default::default()
        };
        assert_eq!(spec.resolved_name(), None);

        spec.name = Some(String::new());
        assert_eq!(spec.resolved_name(), None);

        spec.name = Some("uplink".to_string());
        assert_eq!(spec.resolved_name(), Some("uplink"));
    }

    #[test]
    fn test_spec_wire_format() {
        let spec: VlanSpec = serde_json::from_value(serde_json::json!({
            "nodeName": "node-a",
            "master": "eth0",
            "id": 100
        }))
        .unwrap();

        assert_eq!(spec.node_name, "node-a");
        assert_eq!(spec.master.as_deref(), Some("eth0"));
        assert_eq!(spec.vlan_id, Some(100));
        assert_eq!(spec.name, None);
        assert_eq!(spec.mtu, None);

        // Unset optionals are omitted rather than serialized as null
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "nodeName": "node-a", "master": "eth0", "id": 100 })
        );
    }

    #[test]
    fn test_status_defaults_and_state_format() {
        let status: VlanStatus = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(status.state, InterfaceState::Unknown);
        assert!(status.name.is_empty());

        let status = VlanStatus {
            state: InterfaceState::Up,
            name: "ki.eth0.100".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            serde_json::json!({ "state": "up", "name": "ki.eth0.100" })
        );
    }

    #[test]
    fn test_crd_metadata() {
        let crd = Vlan::crd();
        assert_eq!(crd.spec.group, "interface.dcops.microscaler.io");
        assert_eq!(crd.spec.names.kind, "Vlan");
        assert_eq!(crd.spec.names.plural, "vlans");
        assert_eq!(crd.spec.scope, "Namespaced");

        let version = &crd.spec.versions[0];
        assert_eq!(version.name, "v1alpha1");
        assert!(
            version.subresources.as_ref().and_then(|s| s.status.as_ref()).is_some(),
            "status subresource must be enabled so status writes do not bump spec"
        );
    }
}
