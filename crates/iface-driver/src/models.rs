//! Link models
//!
//! `VlanLink` is the desired definition handed to the driver; `LinkDetails`
//! mirrors the subset of `ip -details -json link show` output the driver
//! inspects.

use serde::{Deserialize, Serialize};

/// Kernel `info_kind` of 802.1Q sub-interfaces
pub const VLAN_KIND: &str = "vlan";

/// Desired VLAN sub-interface definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanLink {
    /// Parent interface
    pub master: String,
    /// Interface name
    pub name: String,
    /// 802.1Q VLAN ID
    pub vlan_id: u16,
    /// MTU, driver default when `None`
    pub mtu: Option<u32>,
}

/// One entry of `ip -details -json link show`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDetails {
    /// Interface name
    pub ifname: String,

    /// Parent interface (absent for physical links or parents in another netns)
    #[serde(default)]
    pub link: Option<String>,

    /// Current MTU
    #[serde(default)]
    pub mtu: Option<u32>,

    /// Interface flags (e.g. `UP`, `LOWER_UP`)
    #[serde(default)]
    pub flags: Vec<String>,

    /// Operational state (e.g. `UP`, `DOWN`, `LOWERLAYERDOWN`)
    #[serde(default)]
    pub operstate: Option<String>,

    /// Driver specific details
    #[serde(default)]
    pub linkinfo: Option<LinkInfo>,
}

/// `linkinfo` section of link details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInfo {
    /// Link kind (`vlan`, `bridge`, `dummy`, ...)
    #[serde(default)]
    pub info_kind: Option<String>,

    /// Kind specific data
    #[serde(default)]
    pub info_data: Option<VlanInfoData>,
}

/// `info_data` of a VLAN link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanInfoData {
    /// 802.1Q / 802.1ad
    #[serde(default)]
    pub protocol: Option<String>,

    /// VLAN ID
    #[serde(default)]
    pub id: Option<u16>,
}

impl LinkDetails {
    /// Link kind, `None` for plain physical interfaces.
    pub fn kind(&self) -> Option<&str> {
        self.linkinfo.as_ref()?.info_kind.as_deref()
    }

    /// VLAN ID when this is a VLAN link.
    pub fn vlan_id(&self) -> Option<u16> {
        self.linkinfo.as_ref()?.info_data.as_ref()?.id
    }

    /// Whether the link is administratively up.
    pub fn is_admin_up(&self) -> bool {
        self.flags.iter().any(|f| f == "UP")
    }

    /// Parses the JSON array printed by `ip -json link show dev <name>`.
    pub fn parse_list(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VLAN_SHOW: &str = r#"[{"ifindex":7,"link":"eth0","ifname":"ki.eth0.100","flags":["BROADCAST","MULTICAST","UP","LOWER_UP"],"mtu":1496,"qdisc":"noqueue","operstate":"UP","linkmode":"DEFAULT","group":"default","link_type":"ether","address":"52:54:00:12:34:56","broadcast":"ff:ff:ff:ff:ff:ff","promiscuity":0,"min_mtu":0,"max_mtu":65535,"linkinfo":{"info_kind":"vlan","info_data":{"protocol":"802.1Q","id":100,"flags":["REORDER_HDR"]}},"num_tx_queues":1,"num_rx_queues":1}]"#;

    const PHYSICAL_SHOW: &str = r#"[{"ifindex":2,"ifname":"eth0","flags":["BROADCAST","MULTICAST","UP","LOWER_UP"],"mtu":1500,"qdisc":"fq_codel","operstate":"UP","linkmode":"DEFAULT","group":"default","txqlen":1000,"link_type":"ether","address":"52:54:00:12:34:56"}]"#;

    #[test]
    fn test_parse_vlan_link() {
        let links = LinkDetails::parse_list(VLAN_SHOW).unwrap();
        assert_eq!(links.len(), 1);

        let link = &links[0];
        assert_eq!(link.ifname, "ki.eth0.100");
        assert_eq!(link.link.as_deref(), Some("eth0"));
        assert_eq!(link.mtu, Some(1496));
        assert_eq!(link.kind(), Some(VLAN_KIND));
        assert_eq!(link.vlan_id(), Some(100));
        assert!(link.is_admin_up());
    }

    #[test]
    fn test_parse_physical_link() {
        let links = LinkDetails::parse_list(PHYSICAL_SHOW).unwrap();
        let link = &links[0];
        assert_eq!(link.kind(), None);
        assert_eq!(link.vlan_id(), None);
        assert_eq!(link.link, None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(LinkDetails::parse_list("Device \"x\" does not exist.").is_err());
    }
}
